use std::path::PathBuf;

use crate::model::tree::{GitTreeEntry, GitTreeEntryKind};

/// Parse `git ls-tree -l` output:
/// `<mode> <type> <sha> <size><TAB><path>`; trees print `-` for size.
pub fn parse_tree(raw: &str) -> Option<Vec<GitTreeEntry>> {
    if raw.trim().is_empty() {
        return None;
    }
    let mut entries = Vec::new();
    for line in raw.lines() {
        let Some((meta, path)) = line.split_once('\t') else { continue };
        let fields: Vec<&str> = meta.split_whitespace().collect();
        if fields.len() < 4 {
            continue;
        }
        let kind = match fields[1] {
            "blob" => GitTreeEntryKind::Blob,
            "tree" => GitTreeEntryKind::Tree,
            "commit" => GitTreeEntryKind::Commit,
            _ => continue,
        };
        entries.push(GitTreeEntry {
            mode: fields[0].to_string(),
            kind,
            sha: fields[2].to_string(),
            size: fields[3].parse().unwrap_or(0),
            path: PathBuf::from(path),
        });
    }
    (!entries.is_empty()).then_some(entries)
}
