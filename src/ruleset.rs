use core::fmt;
use std::collections::BTreeMap;
use std::io::{self, Write};
use std::ops::{Bound, RangeBounds};
use std::sync::atomic::{AtomicU32, Ordering};

use once_cell::sync::Lazy;

use crate::error::GrammarError;
use crate::matcher::Matcher;
use crate::rule::{fmt_rule, Prec, RuleKind, UNBOUNDED};
use crate::source::{Segment, Source};

/// Stable handle to a rule inside the ruleset that created it.
///
/// Handles are tagged with their owner's identity: feeding a rule from one
/// ruleset into another ruleset's combinators is rejected with
/// [`GrammarError::ForeignRule`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct RuleId {
    set: u32,
    index: u32,
}

/// Arena index of the sentinel empty rule every ruleset starts with.
const EMPTY: usize = 0;

static NEXT_TAG: AtomicU32 = AtomicU32::new(0);

/// Owner of a rule graph and its name index.
///
/// Rules are created through the factory methods and referenced by
/// [`RuleId`]; combinators take previously created rules as operands, so a
/// grammar is built bottom-up. Naming a rule with [`define`](Ruleset::define)
/// makes it retrievable with [`get`](Ruleset::get) under its
/// case-insensitive name.
///
/// Matching state lives on the rules themselves: after a successful
/// [`read`](Ruleset::read), every rule that took part holds the input spans
/// it matched, in source order, until the next `read` or
/// [`clear`](Ruleset::clear).
pub struct Ruleset {
    tag: u32,
    kinds: Vec<RuleKind>,
    segments: Vec<Vec<Segment>>,
    names: BTreeMap<String, usize>,
}

impl Ruleset {
    /// Creates a ruleset holding only the sentinel empty rule.
    pub fn new() -> Ruleset {
        let mut rs = Ruleset {
            tag: NEXT_TAG.fetch_add(1, Ordering::Relaxed),
            kinds: Vec::new(),
            segments: Vec::new(),
            names: BTreeMap::new(),
        };
        rs.push(RuleKind::Empty);
        rs
    }

    /// A fresh copy of the RFC 5234 core ruleset.
    ///
    /// Defines exactly ALPHA, BIT, CHAR, CR, CRLF, CTL, DIGIT, DQUOTE,
    /// HEXDIG, HTAB, LF, LWSP, OCTET, SP, VCHAR and WSP. The underlying
    /// template is built once; every call returns an independent copy that
    /// can be read from and extended freely.
    pub fn core() -> Ruleset {
        static CORE: Lazy<Ruleset> = Lazy::new(core_template);
        CORE.clone()
    }

    fn push(&mut self, kind: RuleKind) -> RuleId {
        let index = self.kinds.len();
        self.kinds.push(kind);
        self.segments.push(Vec::new());
        RuleId {
            set: self.tag,
            index: index as u32,
        }
    }

    /// Whether this ruleset created the rule behind the handle.
    pub fn owns(&self, rule: RuleId) -> bool {
        rule.set == self.tag
    }

    /// Operand admission for combinators and `define`.
    fn admit(&self, rule: RuleId) -> Result<usize, GrammarError> {
        if self.owns(rule) {
            Ok(rule.index as usize)
        } else {
            Err(GrammarError::ForeignRule)
        }
    }

    /// Like `admit`, for read-side operations where a foreign handle is a
    /// programming error rather than a recoverable condition.
    fn slot(&self, rule: RuleId) -> usize {
        assert!(self.owns(rule), "rule belongs to a different ruleset");
        rule.index as usize
    }

    /// Rule matching at end of input only. Its match is empty and therefore
    /// never recorded, but a read containing it still succeeds.
    pub fn eof(&mut self) -> RuleId {
        self.push(RuleKind::Eof)
    }

    /// Terminal matching one fixed byte.
    pub fn byte(&mut self, byte: u8) -> RuleId {
        self.push(RuleKind::Byte(byte))
    }

    /// Terminal matching a string byte-for-byte, ASCII case-insensitively.
    /// The empty string matches nothing.
    pub fn literal(&mut self, text: &str) -> RuleId {
        self.push(RuleKind::Literal(text.into()))
    }

    /// Terminal matching any single byte the predicate accepts.
    pub fn predicate(&mut self, test: fn(u8) -> bool) -> RuleId {
        self.push(RuleKind::Predicate(test))
    }

    /// Terminal matching one byte in `lo..=hi` (normalized so the upper bound
    /// is never below the lower).
    pub fn range(&mut self, lo: u8, hi: u8) -> RuleId {
        self.push(RuleKind::Range(lo, hi.max(lo)))
    }

    /// Terminal matching any single byte of `set`. The empty set matches
    /// nothing.
    pub fn any_of(&mut self, set: &str) -> RuleId {
        self.push(RuleKind::AnyOf(set.as_bytes().into()))
    }

    /// Sequencing of two rules.
    pub fn concat(&mut self, left: RuleId, right: RuleId) -> Result<RuleId, GrammarError> {
        let l = self.admit(left)?;
        let r = self.admit(right)?;
        Ok(self.push(RuleKind::Concat(l, r)))
    }

    /// Ordered choice between two rules; the left side wins when both match.
    pub fn alternate(&mut self, left: RuleId, right: RuleId) -> Result<RuleId, GrammarError> {
        let l = self.admit(left)?;
        let r = self.admit(right)?;
        Ok(self.push(RuleKind::Alternate(l, r)))
    }

    /// Repetition of a rule, with the occurrence count drawn from any range
    /// expression: `rules.repeat(0.., r)` for `*r`, `rules.repeat(2..=4, r)`
    /// for `2*4r`, `rules.repeat(0..=1, r)` for an optional rule.
    pub fn repeat<B>(&mut self, count: B, rule: RuleId) -> Result<RuleId, GrammarError>
    where
        B: RangeBounds<usize>,
    {
        let body = self.admit(rule)?;
        let min = match count.start_bound() {
            Bound::Included(&n) => n,
            Bound::Excluded(&n) => n.saturating_add(1),
            Bound::Unbounded => 0,
        };
        let max = match count.end_bound() {
            Bound::Included(&n) => n,
            Bound::Excluded(&n) => n.saturating_sub(1),
            Bound::Unbounded => UNBOUNDED,
        };
        let max = max.max(min);
        Ok(self.push(RuleKind::Repeat { min, max, body }))
    }

    /// Binds a case-insensitive name to a rule of this ruleset.
    pub fn define(&mut self, name: &str, rule: RuleId) -> Result<RuleId, GrammarError> {
        let index = self.admit(rule)?;
        self.names.insert(name.to_ascii_lowercase(), index);
        Ok(rule)
    }

    /// Whether a rule was defined under the given name.
    pub fn defined(&self, name: &str) -> bool {
        self.names.contains_key(&name.to_ascii_lowercase())
    }

    /// The rule defined under the given name. An unknown name yields the
    /// sentinel empty rule, which matches nothing, so a grammar referencing
    /// an undefined name degrades to "never matches at that slot".
    pub fn get(&self, name: &str) -> RuleId {
        let index = self
            .names
            .get(&name.to_ascii_lowercase())
            .copied()
            .unwrap_or(EMPTY);
        RuleId {
            set: self.tag,
            index: index as u32,
        }
    }

    /// Copies every rule and every name binding of `other` into this ruleset.
    ///
    /// The copy is structural: a rule shared by several parents in `other`
    /// stays shared among the copies. Bindings point at the copies, never
    /// back into `other`.
    pub fn include(&mut self, other: &Ruleset) {
        let offset = self.kinds.len();
        for kind in &other.kinds {
            self.kinds.push(kind.shifted(offset));
            self.segments.push(Vec::new());
        }
        for (name, &index) in &other.names {
            self.names.insert(name.clone(), index + offset);
        }
    }

    /// Runs one top-level match of `rule` against `src`.
    ///
    /// Previous results of the subtree are discarded first. On success the
    /// matched spans are recorded throughout the subtree and the cursor rests
    /// at the end of the match; on failure nothing is recorded and the cursor
    /// is returned to where the read started.
    pub fn read<S>(&mut self, rule: RuleId, src: &mut S) -> bool
    where
        S: Source + ?Sized,
    {
        let ix = self.slot(rule);
        self.clear_index(ix);
        let start = src.pos();
        let Ruleset {
            kinds, segments, ..
        } = self;
        let kinds: &[RuleKind] = kinds;
        let mut matcher = Matcher::new(kinds, ix);
        if matcher.matches(kinds, src) {
            matcher.commit(segments);
            true
        } else {
            src.seek(start);
            false
        }
    }

    /// Discards the recorded results of `rule` and every rule below it.
    pub fn clear(&mut self, rule: RuleId) {
        let ix = self.slot(rule);
        self.clear_index(ix);
    }

    fn clear_index(&mut self, ix: usize) {
        let mut seen = vec![false; self.kinds.len()];
        let mut stack = vec![ix];
        while let Some(i) = stack.pop() {
            if std::mem::replace(&mut seen[i], true) {
                continue;
            }
            self.segments[i].clear();
            self.kinds[i].for_each_child(|child| stack.push(child));
        }
    }

    /// Number of spans recorded on `rule` by the last read.
    pub fn read_count(&self, rule: RuleId) -> usize {
        self.segments[self.slot(rule)].len()
    }

    /// The `n`th recorded span of `rule`, if any.
    pub fn segment(&self, rule: RuleId, n: usize) -> Option<Segment> {
        self.segments[self.slot(rule)].get(n).copied()
    }

    /// Copies the `n`th recorded span of `rule` from `src` to `out`. Does
    /// nothing when `n` is out of range. The source cursor is restored.
    pub fn write<S, W>(&self, rule: RuleId, n: usize, src: &mut S, out: &mut W) -> io::Result<()>
    where
        S: Source + ?Sized,
        W: Write + ?Sized,
    {
        match self.segments[self.slot(rule)].get(n) {
            Some(segment) => segment.copy_to(src, out),
            None => Ok(()),
        }
    }
}

impl Default for Ruleset {
    fn default() -> Self {
        Ruleset::new()
    }
}

impl Clone for Ruleset {
    /// Structural copy under a fresh identity: the clone owns duplicates of
    /// every rule and name, and its handles cannot be mixed with the
    /// original's.
    fn clone(&self) -> Self {
        let mut copy = Ruleset::new();
        copy.include(self);
        copy
    }
}

impl fmt::Debug for Ruleset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let by_index: BTreeMap<usize, &str> = self
            .names
            .iter()
            .map(|(name, &index)| (index, name.as_str()))
            .collect();
        writeln!(f, "ruleset {{")?;
        for (name, &index) in &self.names {
            write!(f, "    {name} = ")?;
            fmt_rule(f, &self.kinds, &by_index, index, Prec::Alt)?;
            writeln!(f)?;
        }
        write!(f, "}}")
    }
}

/// RFC 5234 appendix B.1.
fn core_template() -> Ruleset {
    let mut rs = Ruleset::new();

    let alpha = rs.predicate(|b| b.is_ascii_alphabetic());
    let bit = rs.any_of("01");
    let chr = rs.range(0x01, 0x7f);
    let cr = rs.byte(0x0d);
    let lf = rs.byte(0x0a);
    let crlf = rs.concat(cr, lf).unwrap();
    let ctl = rs.predicate(|b| b.is_ascii_control());
    let digit = rs.predicate(|b| b.is_ascii_digit());
    let dquote = rs.byte(0x22);
    let hex_alpha = rs.any_of("ABCDEFabcdef");
    let hexdig = rs.alternate(digit, hex_alpha).unwrap();
    let htab = rs.byte(0x09);
    let sp = rs.byte(0x20);
    let wsp = rs.alternate(sp, htab).unwrap();
    let crlf_wsp = rs.concat(crlf, wsp).unwrap();
    let linear_white = rs.alternate(wsp, crlf_wsp).unwrap();
    let lwsp = rs.repeat(0.., linear_white).unwrap();
    let octet = rs.range(0x00, 0xff);
    let vchar = rs.range(0x21, 0x7e);

    let defs = [
        ("ALPHA", alpha),
        ("BIT", bit),
        ("CHAR", chr),
        ("CR", cr),
        ("CRLF", crlf),
        ("CTL", ctl),
        ("DIGIT", digit),
        ("DQUOTE", dquote),
        ("HEXDIG", hexdig),
        ("HTAB", htab),
        ("LF", lf),
        ("LWSP", lwsp),
        ("OCTET", octet),
        ("SP", sp),
        ("VCHAR", vchar),
        ("WSP", wsp),
    ];
    for (name, rule) in defs {
        rs.define(name, rule).unwrap();
    }
    rs
}
