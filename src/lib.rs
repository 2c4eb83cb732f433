//! Programmable ABNF (RFC 5234) rule graphs matched against seekable byte
//! streams.
//!
//! A [`Ruleset`] owns a grammar built bottom-up from terminals,
//! concatenation, alternation and repetition. Reading a rule runs one
//! backtracking match over the input and records, on every rule that took
//! part, the spans of input it matched; the spans can then be copied back
//! out in source order.
//!
//! ```
//! use abnf_engine::Ruleset;
//! use std::io::Cursor;
//!
//! let mut rules = Ruleset::core();
//! let digit = rules.get("DIGIT");
//! let number = rules.repeat(1.., digit).unwrap();
//! rules.define("number", number).unwrap();
//!
//! let mut input = Cursor::new("8080/".as_bytes());
//! assert!(rules.read(number, &mut input));
//! assert_eq!(rules.read_count(number), 1);
//!
//! let mut out = Vec::new();
//! rules.write(number, 0, &mut input, &mut out).unwrap();
//! assert_eq!(out, b"8080");
//! ```
//!
//! The [`uri`] module is a complete client of the engine: an RFC 2396
//! URI-reference grammar with field extraction and canonical rendering.

mod error;
mod matcher;
mod rule;
mod ruleset;
mod source;
pub mod uri;

pub use error::GrammarError;
pub use ruleset::{RuleId, Ruleset};
pub use source::{Segment, Source};
pub use uri::{InvalidUri, Uri};
