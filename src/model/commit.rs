use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::revision;

/// Which parser produced a commit, and therefore which fields are
/// populated. Blame commits carry no file list; file-scoped log commits
/// carry rename-tracking fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum GitCommitType {
    Blame,
    Log,
    LogFile,
}

/// Per-file change recorded on a log commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GitFileChange {
    pub status: GitFileStatus,
    pub path: PathBuf,
    /// Rename/copy source, when `status` says so.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_path: Option<PathBuf>,
    /// Rename similarity percentage from `R<score>` markers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub similarity: Option<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum GitFileStatus {
    Added,
    Copied,
    Deleted,
    Modified,
    Renamed,
    TypeChanged,
    Unmerged,
    Unknown,
}

impl GitFileStatus {
    pub fn from_char(c: char) -> Self {
        match c {
            'A' => Self::Added,
            'C' => Self::Copied,
            'D' => Self::Deleted,
            'M' => Self::Modified,
            'R' => Self::Renamed,
            'T' => Self::TypeChanged,
            'U' => Self::Unmerged,
            _ => Self::Unknown,
        }
    }
}

/// An immutable commit, shared by the blame and log models.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GitCommit {
    pub kind: GitCommitType,
    pub repo_path: PathBuf,
    pub sha: String,
    pub author: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub author_date: DateTime<Utc>,
    pub committer_date: DateTime<Utc>,
    /// Full message; the first line is the summary.
    pub message: String,
    pub parent_shas: Vec<String>,
    /// File the commit was reached through, for file-scoped logs.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_name: Option<PathBuf>,
    /// Rename source within this commit.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_path: Option<PathBuf>,
    /// Sha of the commit that previously touched the file.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_sha: Option<String>,
    /// Name the file had before this commit, for rename chains.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_file_name: Option<PathBuf>,
    /// Changed files, for log commits queried with file status.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub files: Vec<GitFileChange>,
}

impl GitCommit {
    pub fn new(kind: GitCommitType, repo_path: PathBuf, sha: String) -> Self {
        Self {
            kind,
            repo_path,
            sha,
            author: String::new(),
            email: None,
            author_date: DateTime::<Utc>::UNIX_EPOCH,
            committer_date: DateTime::<Utc>::UNIX_EPOCH,
            message: String::new(),
            parent_shas: Vec::new(),
            file_name: None,
            original_path: None,
            previous_sha: None,
            previous_file_name: None,
            files: Vec::new(),
        }
    }

    /// First line of the message.
    pub fn summary(&self) -> &str {
        self.message.lines().next().unwrap_or_default()
    }

    pub fn short_sha(&self) -> String {
        revision::shorten(&self.sha)
    }

    pub fn is_uncommitted(&self) -> bool {
        revision::is_uncommitted(&self.sha)
    }

    /// Default previous sha: the first parent, or `<sha>^` when parents
    /// are unknown (valid revision syntax either way).
    pub fn previous_sha_or_parent(&self) -> String {
        self.previous_sha
            .clone()
            .or_else(|| self.parent_shas.first().cloned())
            .unwrap_or_else(|| format!("{}^", self.sha))
    }
}
