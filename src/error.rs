use thiserror::Error;

/// Errors raised while building a rule graph.
///
/// Failing to *match* is not an error; a read that matches nothing simply
/// leaves `read_count` at zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum GrammarError {
    /// A combinator operand or a `define` target is owned by another ruleset.
    #[error("rule belongs to a different ruleset")]
    ForeignRule,
}
