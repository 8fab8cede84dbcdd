use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// One stash entry, keyed by its `stash@{n}` name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GitStash {
    pub repo_path: PathBuf,
    /// `stash@{0}` style ref.
    pub name: String,
    pub index: usize,
    pub sha: String,
    pub message: String,
    /// Branch the stash was taken on, when the message records one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
    pub date: DateTime<Utc>,
}
