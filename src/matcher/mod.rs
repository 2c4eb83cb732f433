//! Transient evaluation trees driving one backtracking parse.
//!
//! A matcher tree is built from a rule subgraph for every top-level read and
//! dropped when the read returns. Each matcher records the span of its last
//! attempt and whether asking again could yield a different match; parent
//! combinators steer backtracking through exactly three operations:
//! [`Matcher::matches`], [`Matcher::mismatch`] and [`Matcher::commit`].

mod alternate;
mod concat;
mod repeat;
mod terminal;

use crate::rule::RuleKind;
use crate::source::{Segment, Source};

use alternate::AlternateMatcher;
use concat::ConcatMatcher;
use repeat::RepeatMatcher;

pub(crate) struct Matcher<'r> {
    rule: usize,
    matched: bool,
    available: bool,
    begin: u64,
    end: u64,
    kind: MatcherKind<'r>,
}

enum MatcherKind<'r> {
    Empty,
    Eof,
    Byte(u8),
    Literal(&'r str),
    Predicate(fn(u8) -> bool),
    Range(u8, u8),
    AnyOf(&'r [u8]),
    Alternate(Box<AlternateMatcher<'r>>),
    Concat(Box<ConcatMatcher<'r>>),
    Repeat(Box<RepeatMatcher<'r>>),
}

impl<'r> Matcher<'r> {
    pub(crate) fn new(rules: &'r [RuleKind], rule: usize) -> Self {
        let kind = match &rules[rule] {
            RuleKind::Empty => MatcherKind::Empty,
            RuleKind::Eof => MatcherKind::Eof,
            RuleKind::Byte(b) => MatcherKind::Byte(*b),
            RuleKind::Literal(s) => MatcherKind::Literal(&**s),
            RuleKind::Predicate(test) => MatcherKind::Predicate(*test),
            RuleKind::Range(lo, hi) => MatcherKind::Range(*lo, *hi),
            RuleKind::AnyOf(set) => MatcherKind::AnyOf(&**set),
            RuleKind::Alternate(l, r) => {
                MatcherKind::Alternate(Box::new(AlternateMatcher::new(rules, *l, *r)))
            }
            RuleKind::Concat(l, r) => {
                MatcherKind::Concat(Box::new(ConcatMatcher::new(rules, *l, *r)))
            }
            RuleKind::Repeat { min, max, body } => {
                MatcherKind::Repeat(Box::new(RepeatMatcher::new(*min, *max, *body)))
            }
        };
        Matcher {
            rule,
            matched: false,
            available: true,
            begin: 0,
            end: 0,
            kind,
        }
    }

    /// Attempt the next match from the current cursor.
    ///
    /// A matcher that already matched replays by seeking to its recorded end
    /// without re-running its driver; an exhausted matcher refuses outright.
    /// Otherwise the kind-specific driver runs once and the outcome updates
    /// `matched` and `available`.
    pub(crate) fn matches<S>(&mut self, rules: &'r [RuleKind], src: &mut S) -> bool
    where
        S: Source + ?Sized,
    {
        if self.matched {
            src.seek(self.end);
            return true;
        }
        if !self.available {
            return false;
        }
        self.begin = src.pos();
        let matched = self.attempt(rules, src);
        self.end = src.pos();
        self.matched = matched;
        self.available = matched && self.more_available();
        matched
    }

    /// Demand a different match on the next `matches` call.
    pub(crate) fn mismatch(&mut self) {
        self.matched = false;
    }

    fn attempt<S>(&mut self, rules: &'r [RuleKind], src: &mut S) -> bool
    where
        S: Source + ?Sized,
    {
        let begin = self.begin;
        match &mut self.kind {
            MatcherKind::Empty => false,
            MatcherKind::Eof => terminal::eof(src),
            MatcherKind::Byte(b) => terminal::byte(src, *b),
            MatcherKind::Literal(text) => terminal::literal(src, text),
            MatcherKind::Predicate(test) => terminal::predicate(src, *test),
            MatcherKind::Range(lo, hi) => terminal::range(src, *lo, *hi),
            MatcherKind::AnyOf(set) => terminal::any_of(src, set),
            MatcherKind::Alternate(alt) => alt.attempt(begin, rules, src),
            MatcherKind::Concat(con) => con.attempt(begin, rules, src),
            MatcherKind::Repeat(rep) => rep.attempt(rules, src),
        }
    }

    /// Whether another attempt could produce a different match without the
    /// enclosing cursor moving.
    fn more_available(&self) -> bool {
        match &self.kind {
            MatcherKind::Alternate(alt) => alt.left.available || alt.right.available,
            MatcherKind::Concat(con) => con.left.available || con.right.available,
            MatcherKind::Repeat(rep) => rep.more_available(),
            _ => false,
        }
    }

    /// Record the matched span on the rule and recurse into whichever
    /// children took part. Empty matches are never recorded.
    pub(crate) fn commit(&self, segments: &mut [Vec<Segment>]) {
        if self.end > self.begin {
            segments[self.rule].push(Segment::new(self.begin, self.end));
            match &self.kind {
                MatcherKind::Alternate(alt) => alt.taken().commit(segments),
                MatcherKind::Concat(con) => {
                    con.left.commit(segments);
                    con.right.commit(segments);
                }
                MatcherKind::Repeat(rep) => {
                    for occurrence in &rep.children {
                        occurrence.commit(segments);
                    }
                }
                _ => {}
            }
        }
    }
}
