use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::config::RefSort;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GitTag {
    pub repo_path: PathBuf,
    pub name: String,
    pub sha: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<DateTime<Utc>>,
    /// Annotation subject for annotated tags.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

pub fn sort_tags(tags: &mut [GitTag], by: RefSort) {
    tags.sort_by(|a, b| match by {
        RefSort::Name => a.name.cmp(&b.name),
        RefSort::Date => b.date.cmp(&a.date).then_with(|| a.name.cmp(&b.name)),
    });
}
