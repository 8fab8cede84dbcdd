use std::path::Path;

use crate::model::tag::GitTag;
use crate::parse::{parse_epoch, FIELD_SEP};

/// The `for-each-ref` format matching [`parse_tags`]. `creatordate`
/// covers both lightweight and annotated tags.
pub const TAG_FORMAT: &str =
    "%(refname:short)%1f%(objectname)%1f%(*objectname)%1f%(creatordate:unix)%1f%(subject)";

/// Parse `git for-each-ref refs/tags` output.
pub fn parse_tags(repo_path: &Path, raw: &str) -> Option<Vec<GitTag>> {
    if raw.trim().is_empty() {
        return None;
    }
    let mut tags = Vec::new();
    for line in raw.lines() {
        let fields: Vec<&str> = line.split(FIELD_SEP).collect();
        if fields.len() < 4 {
            continue;
        }
        let name = fields[0];
        if name.is_empty() {
            continue;
        }
        // annotated tags point at a tag object; the peeled sha is the
        // commit itself
        let sha = if fields[2].is_empty() { fields[1] } else { fields[2] };
        let message = fields.get(4).filter(|s| !s.is_empty());
        tags.push(GitTag {
            repo_path: repo_path.to_path_buf(),
            name: name.to_string(),
            sha: sha.to_string(),
            date: Some(parse_epoch(fields[3])),
            message: message.map(|s| s.to_string()),
        });
    }
    (!tags.is_empty()).then_some(tags)
}
