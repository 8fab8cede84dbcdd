use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::config::RefSort;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GitBranch {
    pub repo_path: PathBuf,
    pub name: String,
    pub current: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sha: Option<String>,
    /// True for `refs/remotes/...` entries.
    pub remote: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upstream: Option<String>,
    pub ahead: u32,
    pub behind: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<DateTime<Utc>>,
}

/// Stable sort: current branch first, local before remote, then name
/// or date per configuration.
pub fn sort_branches(branches: &mut [GitBranch], by: RefSort) {
    branches.sort_by(|a, b| {
        b.current
            .cmp(&a.current)
            .then(a.remote.cmp(&b.remote))
            .then_with(|| match by {
                RefSort::Name => a.name.cmp(&b.name),
                RefSort::Date => b.date.cmp(&a.date).then_with(|| a.name.cmp(&b.name)),
            })
    });
}
