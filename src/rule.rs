use core::fmt;
use std::collections::BTreeMap;

/// Sentinel for a repetition with no upper bound.
pub(crate) const UNBOUNDED: usize = usize::MAX;

/// One node of a rule graph.
///
/// Combinator edges are indices into the owning ruleset's arena; a node may be
/// referenced from several parents, so the graph is a DAG rather than a tree.
#[derive(Clone)]
pub(crate) enum RuleKind {
    Empty,
    Eof,
    Byte(u8),
    Literal(Box<str>),
    Predicate(fn(u8) -> bool),
    Range(u8, u8),
    AnyOf(Box<[u8]>),
    Alternate(usize, usize),
    Concat(usize, usize),
    Repeat { min: usize, max: usize, body: usize },
}

impl RuleKind {
    /// Clone for inclusion into another arena, shifting child edges so the
    /// copied subgraph keeps its internal sharing.
    pub(crate) fn shifted(&self, offset: usize) -> RuleKind {
        match self {
            RuleKind::Alternate(l, r) => RuleKind::Alternate(l + offset, r + offset),
            RuleKind::Concat(l, r) => RuleKind::Concat(l + offset, r + offset),
            RuleKind::Repeat { min, max, body } => RuleKind::Repeat {
                min: *min,
                max: *max,
                body: body + offset,
            },
            other => other.clone(),
        }
    }

    pub(crate) fn for_each_child(&self, mut visit: impl FnMut(usize)) {
        match *self {
            RuleKind::Alternate(l, r) | RuleKind::Concat(l, r) => {
                visit(l);
                visit(r);
            }
            RuleKind::Repeat { body, .. } => visit(body),
            _ => {}
        }
    }
}

/// Rendering precedence, lowest binds loosest.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) enum Prec {
    Alt,
    Seq,
    Atom,
}

/// Render a rule as ABNF-style text, substituting names for nodes that have
/// them and parenthesizing where the surrounding context binds tighter.
pub(crate) fn fmt_rule(
    f: &mut fmt::Formatter<'_>,
    kinds: &[RuleKind],
    names: &BTreeMap<usize, &str>,
    ix: usize,
    prec: Prec,
) -> fmt::Result {
    let fmt_child = |f: &mut fmt::Formatter<'_>, child: usize, prec: Prec| match names.get(&child) {
        Some(name) => f.write_str(name),
        None => fmt_rule(f, kinds, names, child, prec),
    };

    match &kinds[ix] {
        RuleKind::Empty => f.write_str("<empty>"),
        RuleKind::Eof => f.write_str("<eof>"),
        RuleKind::Byte(b) => write!(f, "%x{b:02X}"),
        RuleKind::Literal(s) => write!(f, "\"{s}\""),
        RuleKind::Predicate(_) => f.write_str("<predicate>"),
        RuleKind::Range(lo, hi) => write!(f, "%x{lo:02X}-{hi:02X}"),
        RuleKind::AnyOf(set) => {
            f.write_str("( ")?;
            for (i, b) in set.iter().enumerate() {
                if i > 0 {
                    f.write_str(" / ")?;
                }
                write!(f, "\"{}\"", *b as char)?;
            }
            f.write_str(" )")
        }
        RuleKind::Alternate(l, r) => group(f, prec > Prec::Alt, |f| {
            fmt_child(f, *l, Prec::Alt)?;
            f.write_str(" / ")?;
            fmt_child(f, *r, Prec::Alt)
        }),
        RuleKind::Concat(l, r) => group(f, prec > Prec::Seq, |f| {
            fmt_child(f, *l, Prec::Seq)?;
            f.write_str(" ")?;
            fmt_child(f, *r, Prec::Seq)
        }),
        RuleKind::Repeat { min, max, body } => {
            match (*min, *max) {
                (0, UNBOUNDED) => f.write_str("*")?,
                (min, UNBOUNDED) => write!(f, "{min}*")?,
                (min, max) if min == max => write!(f, "{min}")?,
                (min, max) => write!(f, "{min}*{max}")?,
            }
            fmt_child(f, *body, Prec::Atom)
        }
    }
}

fn group(
    f: &mut fmt::Formatter<'_>,
    needed: bool,
    block: impl FnOnce(&mut fmt::Formatter<'_>) -> fmt::Result,
) -> fmt::Result {
    if needed {
        f.write_str("( ")?;
        block(f)?;
        f.write_str(" )")
    } else {
        block(f)
    }
}
