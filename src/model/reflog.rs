use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// One reference movement, e.g. `checkout: moving from main to topic`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GitReflogRecord {
    pub sha: String,
    /// The `HEAD@{n}` style selector.
    pub selector: String,
    pub date: DateTime<Utc>,
    /// The command that moved the ref (`checkout`, `commit`, `pull`...).
    pub command: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GitReflog {
    pub repo_path: PathBuf,
    pub records: Vec<GitReflogRecord>,
    pub count: usize,
    pub has_more: bool,
}
