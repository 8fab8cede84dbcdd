use std::path::PathBuf;

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum GitTreeEntryKind {
    Blob,
    Tree,
    Commit,
}

/// One `ls-tree -l` entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GitTreeEntry {
    pub mode: String,
    pub kind: GitTreeEntryKind,
    pub sha: String,
    /// Object size in bytes; zero for trees (git prints `-`).
    pub size: u64,
    pub path: PathBuf,
}
