//! Single-shot leaf matchers. Each consumes from the cursor and reports the
//! outcome; callers restore the cursor through the recorded begin position.

use crate::source::Source;

/// Matches at end of input without moving the cursor.
pub(super) fn eof<S: Source + ?Sized>(src: &mut S) -> bool {
    src.peek_byte().is_none()
}

pub(super) fn byte<S: Source + ?Sized>(src: &mut S, expect: u8) -> bool {
    src.next_byte() == Some(expect)
}

/// Byte-wise ASCII case-insensitive comparison. The empty literal matches
/// nothing. On a mismatch the cursor is left mid-literal.
pub(super) fn literal<S: Source + ?Sized>(src: &mut S, text: &str) -> bool {
    if text.is_empty() {
        return false;
    }
    text.bytes().all(|expect| match src.next_byte() {
        Some(byte) => byte.eq_ignore_ascii_case(&expect),
        None => false,
    })
}

pub(super) fn predicate<S: Source + ?Sized>(src: &mut S, test: fn(u8) -> bool) -> bool {
    src.next_byte().is_some_and(test)
}

pub(super) fn range<S: Source + ?Sized>(src: &mut S, lo: u8, hi: u8) -> bool {
    src.next_byte().is_some_and(|b| (lo..=hi).contains(&b))
}

pub(super) fn any_of<S: Source + ?Sized>(src: &mut S, set: &[u8]) -> bool {
    src.next_byte().is_some_and(|b| set.contains(&b))
}
