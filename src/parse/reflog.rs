use std::path::Path;

use crate::model::reflog::{GitReflog, GitReflogRecord};
use crate::parse::{parse_epoch, FIELD_SEP, RECORD_SEP};

/// The `--format` argument matching [`parse_reflog`].
pub const REFLOG_FORMAT: &str = "%x1e%H%x1f%gd%x1f%at%x1f%gs";

/// Parse `git log -g` delimited output. `%gs` carries the reflog
/// subject, e.g. `checkout: moving from main to topic`; the word
/// before the colon is the command that moved the ref.
pub fn parse_reflog(
    repo_path: &Path,
    raw: &str,
    limit: Option<usize>,
) -> Option<GitReflog> {
    if raw.trim().is_empty() {
        return None;
    }
    let mut records = Vec::new();
    for record in raw.split(RECORD_SEP).skip(1) {
        let fields: Vec<&str> = record.trim_end().split(FIELD_SEP).collect();
        if fields.len() < 4 {
            continue;
        }
        let subject = fields[3];
        let (command, detail) = match subject.split_once(':') {
            Some((cmd, rest)) => (cmd.trim().to_string(), Some(rest.trim().to_string())),
            None => (subject.trim().to_string(), None),
        };
        records.push(GitReflogRecord {
            sha: fields[0].to_string(),
            selector: fields[1].to_string(),
            date: parse_epoch(fields[2]),
            command,
            detail: detail.filter(|d| !d.is_empty()),
        });
    }
    if records.is_empty() {
        return None;
    }

    let mut has_more = false;
    if let Some(limit) = limit {
        if records.len() > limit {
            records.truncate(limit);
            has_more = true;
        }
    }
    let count = records.len();
    Some(GitReflog {
        repo_path: repo_path.to_path_buf(),
        records,
        count,
        has_more,
    })
}
