use crate::rule::RuleKind;
use crate::source::Source;

use super::Matcher;

/// Ordered choice: the left side is explored exhaustively before the right
/// side is consulted, which makes alternation deterministic.
pub(super) struct AlternateMatcher<'r> {
    took_left: bool,
    pub(super) left: Matcher<'r>,
    pub(super) right: Matcher<'r>,
}

impl<'r> AlternateMatcher<'r> {
    pub(super) fn new(rules: &'r [RuleKind], left: usize, right: usize) -> Self {
        AlternateMatcher {
            took_left: false,
            left: Matcher::new(rules, left),
            right: Matcher::new(rules, right),
        }
    }

    pub(super) fn attempt<S>(&mut self, begin: u64, rules: &'r [RuleKind], src: &mut S) -> bool
    where
        S: Source + ?Sized,
    {
        // a repeated attempt must not replay the previous winner
        if self.took_left && self.left.matched {
            self.left.mismatch();
        } else if self.right.matched {
            self.right.mismatch();
        }

        if self.left.matches(rules, src) {
            self.took_left = true;
            return true;
        }
        src.seek(begin);
        self.took_left = false;
        self.right.matches(rules, src)
    }

    /// The side the last successful match came from.
    pub(super) fn taken(&self) -> &Matcher<'r> {
        if self.took_left {
            &self.left
        } else {
            &self.right
        }
    }
}
