use smallvec::SmallVec;

use crate::rule::RuleKind;
use crate::source::Source;

use super::Matcher;

/// Greedy repetition with shrink-on-failure backtracking.
///
/// The first match adopts occurrences greedily up to `max` (a zero-minimum
/// repetition hands out its empty expansion first instead). Every further
/// attempt produces the next expansion in backtracking order: vary the
/// deepest occurrence that can still match differently and regrow the tail,
/// or give up one occurrence when nothing can.
pub(super) struct RepeatMatcher<'r> {
    min: usize,
    max: usize,
    body: usize,
    first_try: bool,
    pub(super) children: SmallVec<[Matcher<'r>; 2]>,
}

impl<'r> RepeatMatcher<'r> {
    pub(super) fn new(min: usize, max: usize, body: usize) -> Self {
        RepeatMatcher {
            min,
            max,
            body,
            first_try: true,
            children: SmallVec::new(),
        }
    }

    /// Fewest occurrences a further expansion may keep. The empty expansion
    /// is produced exactly once, so shrinking below one occurrence is never
    /// useful.
    fn floor(&self) -> usize {
        self.min.max(1)
    }

    pub(super) fn more_available(&self) -> bool {
        self.children.iter().any(|m| m.available)
            || self.children.len() < self.max
            || self.children.len() > self.floor()
    }

    pub(super) fn attempt<S>(&mut self, rules: &'r [RuleKind], src: &mut S) -> bool
    where
        S: Source + ?Sized,
    {
        if core::mem::take(&mut self.first_try) {
            if self.min == 0 {
                return true; // the empty expansion; occurrences grow on demand
            }
            self.extend(rules, src);
            if self.children.len() >= self.min {
                return true;
            }
        } else if self.children.is_empty() {
            // the empty expansion is spent; now at least one occurrence
            self.extend(rules, src);
            return !self.children.is_empty();
        }
        self.next_expansion(rules, src)
    }

    /// Unwind to the deepest occurrence able to match differently, regrow the
    /// tail greedily, and repeat until an acceptable expansion appears or
    /// every alternative is spent. Giving up an occurrence yields the shorter
    /// match directly when it is still long enough.
    fn next_expansion<S>(&mut self, rules: &'r [RuleKind], src: &mut S) -> bool
    where
        S: Source + ?Sized,
    {
        loop {
            loop {
                let Some(last) = self.children.last_mut() else {
                    return false;
                };
                if last.available {
                    src.seek(last.begin);
                    last.mismatch();
                    if last.matches(rules, src) {
                        break; // cursor sits at this occurrence's new end
                    }
                }
                self.children.pop();
                if self.children.len() >= self.floor() {
                    return self.replay(rules, src);
                }
            }
            self.extend(rules, src);
            if self.children.len() >= self.floor() {
                return true;
            }
        }
    }

    /// Adopt occurrences greedily while the body keeps matching, up to `max`.
    /// A zero-width occurrence is adopted but ends the growth, so a body that
    /// stops consuming input cannot repeat forever.
    fn extend<S>(&mut self, rules: &'r [RuleKind], src: &mut S)
    where
        S: Source + ?Sized,
    {
        while self.children.len() < self.max {
            let tail = src.pos();
            let mut occurrence = Matcher::new(rules, self.body);
            if !occurrence.matches(rules, src) {
                src.seek(tail);
                break;
            }
            let progressed = src.pos() != tail;
            self.children.push(occurrence);
            if !progressed {
                break;
            }
        }
    }

    /// Re-seek through the kept occurrences; the cursor ends after the last.
    fn replay<S>(&mut self, rules: &'r [RuleKind], src: &mut S) -> bool
    where
        S: Source + ?Sized,
    {
        for occurrence in &mut self.children {
            occurrence.matches(rules, src);
        }
        true
    }
}
