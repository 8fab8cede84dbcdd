use std::path::Path;

use crate::model::stash::GitStash;
use crate::parse::{parse_epoch, FIELD_SEP, RECORD_SEP};

/// The `--format` argument matching [`parse_stash_list`].
pub const STASH_FORMAT: &str = "%x1e%gd%x1f%H%x1f%at%x1f%gs";

/// Parse `git stash list` delimited output. The subject is either
/// `WIP on <branch>: <sha> <message>` or `On <branch>: <message>`.
pub fn parse_stash_list(repo_path: &Path, raw: &str) -> Option<Vec<GitStash>> {
    if raw.trim().is_empty() {
        return None;
    }
    let mut stashes = Vec::new();
    for (index, record) in raw.split(RECORD_SEP).skip(1).enumerate() {
        let fields: Vec<&str> = record.trim_end().split(FIELD_SEP).collect();
        if fields.len() < 4 {
            continue;
        }
        let subject = fields[3];
        let (branch, message) = split_subject(subject);
        stashes.push(GitStash {
            repo_path: repo_path.to_path_buf(),
            name: fields[0].to_string(),
            index,
            sha: fields[1].to_string(),
            message,
            branch,
            date: parse_epoch(fields[2]),
        });
    }
    (!stashes.is_empty()).then_some(stashes)
}

fn split_subject(subject: &str) -> (Option<String>, String) {
    for prefix in ["WIP on ", "On "] {
        if let Some(rest) = subject.strip_prefix(prefix) {
            if let Some((branch, message)) = rest.split_once(": ") {
                return (Some(branch.to_string()), message.to_string());
            }
        }
    }
    (None, subject.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_wip_and_named_stashes() {
        let raw = format!(
            "\x1estash@{{0}}\x1f{}\x1f200\x1fOn main: half-done refactor\n\
             \x1estash@{{1}}\x1f{}\x1f100\x1fWIP on topic: 1234abc earlier work\n",
            "a".repeat(40),
            "b".repeat(40)
        );
        let stashes = parse_stash_list(Path::new("/repo"), &raw).unwrap();
        assert_eq!(stashes.len(), 2);
        assert_eq!(stashes[0].name, "stash@{0}");
        assert_eq!(stashes[0].index, 0);
        assert_eq!(stashes[0].branch.as_deref(), Some("main"));
        assert_eq!(stashes[0].message, "half-done refactor");
        assert_eq!(stashes[1].branch.as_deref(), Some("topic"));
    }

    #[test]
    fn empty_is_none() {
        assert!(parse_stash_list(Path::new("/repo"), "").is_none());
    }
}
