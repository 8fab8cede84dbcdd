//! Revision identifiers and the pseudo-sha sentinels.
//!
//! Three sentinel values stand in for states that never resolve to real
//! history: the working tree, the staged index, and a file that was
//! deleted or never existed at the requested revision.

/// Working-tree changes that have not been staged.
pub const UNCOMMITTED: &str = "0000000000000000000000000000000000000000";

/// Changes staged in the index but not yet committed.
pub const UNCOMMITTED_STAGED: &str = "0000000000000000000000000000000000000000:";

/// The file is deleted or missing at the requested revision.
pub const DELETED_OR_MISSING: &str = "0000000000000000000000000000000000000000-";

pub fn is_uncommitted(sha: &str) -> bool {
    sha == UNCOMMITTED || sha == UNCOMMITTED_STAGED
}

pub fn is_uncommitted_staged(sha: &str) -> bool {
    sha == UNCOMMITTED_STAGED
}

pub fn is_deleted_or_missing(sha: &str) -> bool {
    sha == DELETED_OR_MISSING
}

pub fn is_sentinel(sha: &str) -> bool {
    is_uncommitted(sha) || is_deleted_or_missing(sha)
}

/// A full 40-hex object id (sentinels excluded).
pub fn is_sha(s: &str) -> bool {
    s.len() == 40 && s.chars().all(|c| c.is_ascii_hexdigit())
}

/// Abbreviate a sha for display. Sentinels keep a readable marker.
pub fn shorten(sha: &str) -> String {
    if is_uncommitted(sha) {
        return "working".to_string();
    }
    if is_deleted_or_missing(sha) {
        return "deleted".to_string();
    }
    sha.chars().take(7).collect()
}
