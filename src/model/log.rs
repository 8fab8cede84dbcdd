use std::collections::HashMap;
use std::path::PathBuf;

use serde::Serialize;

use crate::model::commit::GitCommit;

/// Line-scoped range for file logs (`-L start,end`). 1-based inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LogRange {
    pub start: u32,
    pub end: u32,
}

/// Everything needed to re-run or extend a log query. Stored on the
/// log itself so pagination is a value-level continuation rather than
/// a closure over mutable state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub authors: Vec<String>,
    pub merges: bool,
    pub reverse: bool,
    pub renames: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub range: Option<LogRange>,
}

impl LogQuery {
    pub fn for_ref(reference: Option<String>) -> Self {
        Self {
            reference,
            file: None,
            authors: Vec::new(),
            merges: false,
            reverse: false,
            renames: false,
            range: None,
        }
    }
}

/// Resume point for fetching older history: the oldest sha seen so far.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogCursor {
    pub oldest_sha: String,
}

/// How to extend a log: by a page of older commits, or up to (and
/// including) a specific sha.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoreBy {
    Limit(usize),
    Until(String),
}

/// A page (or several merged pages) of history.
///
/// `shas` preserves insertion order (chronological as returned by the
/// tool, newest first unless the query asked for reverse) and every
/// entry has a commit in `commits`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GitLog {
    pub repo_path: PathBuf,
    pub shas: Vec<String>,
    pub commits: HashMap<String, GitCommit>,
    pub count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
    pub has_more: bool,
    pub query: LogQuery,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cursor: Option<LogCursor>,
}

impl GitLog {
    pub fn new(repo_path: PathBuf, query: LogQuery) -> Self {
        Self {
            repo_path,
            shas: Vec::new(),
            commits: HashMap::new(),
            count: 0,
            limit: None,
            has_more: false,
            query,
            cursor: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.shas.is_empty()
    }

    pub fn contains(&self, sha: &str) -> bool {
        self.commits.contains_key(sha)
    }

    /// Commits in insertion order.
    pub fn commits_in_order(&self) -> impl Iterator<Item = &GitCommit> {
        self.shas.iter().filter_map(|sha| self.commits.get(sha))
    }

    pub fn oldest_sha(&self) -> Option<&str> {
        self.shas.last().map(String::as_str)
    }

    /// Merge a freshly fetched page of strictly older commits into this
    /// snapshot: existing entries first, then the new ones, duplicates
    /// dropped. `has_more`, count, and the cursor come from the merged
    /// state.
    pub fn merged_with_older(&self, older: &GitLog) -> GitLog {
        let mut merged = self.clone();
        for sha in &older.shas {
            if merged.commits.contains_key(sha) {
                continue;
            }
            if let Some(commit) = older.commits.get(sha) {
                merged.shas.push(sha.clone());
                merged.commits.insert(sha.clone(), commit.clone());
            }
        }
        merged.count = merged.shas.len();
        merged.limit = match (self.limit, older.limit) {
            (Some(a), Some(b)) => Some(a + b),
            _ => None,
        };
        merged.has_more = older.has_more;
        merged.cursor = merged.oldest_sha().map(|sha| LogCursor {
            oldest_sha: sha.to_string(),
        });
        merged
    }
}
