//! Parsers for the textual output formats of the git CLI.
//!
//! Every parser is a pure function from raw text to a structured
//! entity, or `None` when the text is empty or nothing could be
//! parsed. Malformed or truncated input never errors: the most
//! complete parsable result is returned and the remainder dropped.
//! Numeric fields that fail to parse default to zero; dates are Unix
//! epoch seconds.
//!
//! The delimiter characters and field ordering used here are a fixed
//! contract with the arguments the retrieval layer passes to git;
//! both sides must agree bit-for-bit.

pub mod blame;
pub mod branch;
pub mod diff;
pub mod log;
pub mod reflog;
pub mod remote;
pub mod shortlog;
pub mod stash;
pub mod status;
pub mod tag;
pub mod tree;

/// Separates records in delimited log-style output (`%x1e`).
pub const RECORD_SEP: char = '\x1e';
/// Separates fields within a record (`%x1f`).
pub const FIELD_SEP: char = '\x1f';

pub(crate) fn parse_epoch(s: &str) -> chrono::DateTime<chrono::Utc> {
    let secs = s.trim().parse::<i64>().unwrap_or(0);
    chrono::DateTime::<chrono::Utc>::from_timestamp(secs, 0)
        .unwrap_or(chrono::DateTime::<chrono::Utc>::UNIX_EPOCH)
}
