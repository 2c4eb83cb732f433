use crate::rule::RuleKind;
use crate::source::Source;

use super::Matcher;

/// Left-right sequencing. When the right side runs dry the left side is asked
/// for a different match and the right side is rebuilt from scratch; the pair
/// only succeeds as a whole.
pub(super) struct ConcatMatcher<'r> {
    right_rule: usize,
    pub(super) left: Matcher<'r>,
    pub(super) right: Matcher<'r>,
}

impl<'r> ConcatMatcher<'r> {
    pub(super) fn new(rules: &'r [RuleKind], left: usize, right: usize) -> Self {
        ConcatMatcher {
            right_rule: right,
            left: Matcher::new(rules, left),
            right: Matcher::new(rules, right),
        }
    }

    pub(super) fn attempt<S>(&mut self, begin: u64, rules: &'r [RuleKind], src: &mut S) -> bool
    where
        S: Source + ?Sized,
    {
        if self.left.matched && self.right.matched {
            // a repeated attempt; the right side moves first
            self.right.mismatch();
        }
        loop {
            src.seek(begin);
            if !self.left.matches(rules, src) {
                return false;
            }
            if self.right.matches(rules, src) {
                return true;
            }
            if !self.left.available {
                return false;
            }
            self.left.mismatch();
            self.right = Matcher::new(rules, self.right_rule);
        }
    }
}
