use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::model::commit::{GitCommit, GitCommitType};
use crate::model::log::{GitLog, LogCursor, LogQuery};
use crate::parse::diff::parse_name_status_line;
use crate::parse::{parse_epoch, FIELD_SEP, RECORD_SEP};

/// The `--format` argument matching [`parse_log`]: records open with a
/// record separator, fields are separated by the unit separator, and
/// the body is terminated by a trailing field separator so that
/// `--name-status` lines can follow it.
pub const LOG_FORMAT: &str = "%x1e%H%x1f%an%x1f%ae%x1f%at%x1f%ct%x1f%P%x1f%B%x1f";

/// Parse delimited `git log` output into a [`GitLog`].
///
/// `limit` is the page size the query asked for; when one more record
/// than `limit` is present the extra is dropped and `has_more` is set.
/// For file-scoped queries each record's trailing `--name-status`
/// lines are attached to the commit, and rename chains are linked
/// across consecutive records.
pub fn parse_log(
    repo_path: &Path,
    raw: &str,
    query: LogQuery,
    limit: Option<usize>,
) -> Option<GitLog> {
    if raw.trim().is_empty() {
        return None;
    }

    let kind = if query.file.is_some() {
        GitCommitType::LogFile
    } else {
        GitCommitType::Log
    };

    let mut ordered: Vec<GitCommit> = Vec::new();
    for record in raw.split(RECORD_SEP).skip(1) {
        if let Some(commit) = parse_record(repo_path, record, kind, &query) {
            ordered.push(commit);
        }
    }

    if ordered.is_empty() {
        return None;
    }

    let mut has_more = false;
    if let Some(limit) = limit {
        if ordered.len() > limit {
            ordered.truncate(limit);
            has_more = true;
        }
    }

    if query.file.is_some() {
        link_rename_chain(&mut ordered, query.reverse);
    }

    let mut shas = Vec::with_capacity(ordered.len());
    let mut commits = HashMap::with_capacity(ordered.len());
    for commit in ordered {
        shas.push(commit.sha.clone());
        commits.insert(commit.sha.clone(), commit);
    }

    let count = shas.len();
    let cursor = shas.last().map(|sha| LogCursor {
        oldest_sha: sha.clone(),
    });
    Some(GitLog {
        repo_path: repo_path.to_path_buf(),
        shas,
        commits,
        count,
        limit,
        has_more,
        query,
        cursor,
    })
}

fn parse_record(
    repo_path: &Path,
    record: &str,
    kind: GitCommitType,
    query: &LogQuery,
) -> Option<GitCommit> {
    let mut fields = record.splitn(7, FIELD_SEP);
    let sha = fields.next()?.trim().to_string();
    if sha.is_empty() {
        return None;
    }
    let author = fields.next()?.to_string();
    let email = fields.next()?.to_string();
    let author_date = parse_epoch(fields.next()?);
    let committer_date = parse_epoch(fields.next()?);
    let parents = fields.next()?;
    // body + trailing name-status tail
    let rest = fields.next().unwrap_or_default();
    let (message, tail) = rest.split_once(FIELD_SEP).unwrap_or((rest, ""));

    let mut commit = GitCommit::new(kind, repo_path.to_path_buf(), sha);
    commit.author = author;
    commit.email = (!email.is_empty()).then_some(email);
    commit.author_date = author_date;
    commit.committer_date = committer_date;
    commit.message = message.trim_end_matches('\n').to_string();
    commit.parent_shas = parents
        .split_whitespace()
        .map(str::to_string)
        .collect();

    for line in tail.lines() {
        if line.trim().is_empty() {
            continue;
        }
        if let Some(change) = parse_name_status_line(line) {
            commit.files.push(change);
        }
    }

    if kind == GitCommitType::LogFile {
        // the file this commit was reached through: prefer the
        // name-status entry, fall back to the queried path
        if let Some(change) = commit.files.first() {
            commit.file_name = Some(change.path.clone());
            commit.original_path = change.original_path.clone();
        } else {
            commit.file_name = query.file.clone();
        }
    }

    Some(commit)
}

/// Link consecutive records of a file-scoped log so each commit knows
/// the sha and filename the file had one step earlier in history.
/// `git log` returns newest first; with `reverse` the direction flips.
fn link_rename_chain(ordered: &mut [GitCommit], reverse: bool) {
    if ordered.len() < 2 {
        return;
    }
    let len = ordered.len();
    for i in 0..len - 1 {
        let (newer_idx, older_idx) = if reverse { (i + 1, i) } else { (i, i + 1) };
        let older_sha = ordered[older_idx].sha.clone();
        let older_file = ordered[older_idx].file_name.clone();
        let newer = &mut ordered[newer_idx];
        if newer.previous_sha.is_none() {
            newer.previous_sha = Some(older_sha);
        }
        if newer.previous_file_name.is_none() && newer.file_name != older_file {
            newer.previous_file_name = older_file;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::commit::GitFileStatus;

    const C1: &str = "1111111111111111111111111111111111111111";
    const C2: &str = "2222222222222222222222222222222222222222";
    const C3: &str = "3333333333333333333333333333333333333333";

    fn record(sha: &str, author: &str, time: u64, parents: &str, message: &str, files: &str) -> String {
        format!(
            "\x1e{sha}\x1f{author}\x1f{author}@example.com\x1f{time}\x1f{time}\x1f{parents}\x1f{message}\x1f\n{files}"
        )
    }

    fn query_for(file: Option<&str>) -> LogQuery {
        LogQuery {
            reference: None,
            file: file.map(PathBuf::from),
            authors: Vec::new(),
            merges: false,
            reverse: false,
            renames: true,
            range: None,
        }
    }

    #[test]
    fn parses_commits_newest_first() {
        let raw = format!(
            "{}{}",
            record(C3, "alice", 300, C2, "third", ""),
            record(C2, "bob", 200, C1, "second", "")
        );
        let log = parse_log(Path::new("/repo"), &raw, query_for(None), None).unwrap();
        assert_eq!(log.shas, vec![C3, C2]);
        assert_eq!(log.count, 2);
        assert!(!log.has_more);
        let third = log.commits.get(C3).unwrap();
        assert_eq!(third.author, "alice");
        assert_eq!(third.parent_shas, vec![C2]);
        assert_eq!(third.summary(), "third");
    }

    #[test]
    fn multiline_message_is_preserved() {
        let raw = record(C1, "alice", 100, "", "subject\n\nbody line", "");
        let log = parse_log(Path::new("/repo"), &raw, query_for(None), None).unwrap();
        let commit = log.commits.get(C1).unwrap();
        assert_eq!(commit.summary(), "subject");
        assert!(commit.message.contains("body line"));
    }

    #[test]
    fn limit_plus_one_sets_has_more() {
        let raw = format!(
            "{}{}{}",
            record(C3, "a", 300, C2, "third", ""),
            record(C2, "a", 200, C1, "second", ""),
            record(C1, "a", 100, "", "first", "")
        );
        let log = parse_log(Path::new("/repo"), &raw, query_for(None), Some(2)).unwrap();
        assert_eq!(log.count, 2);
        assert!(log.has_more);
        assert_eq!(log.cursor.as_ref().unwrap().oldest_sha, C2);
    }

    #[test]
    fn file_log_attaches_name_status() {
        let raw = record(C1, "a", 100, "", "add", "A\tsrc/lib.rs\n");
        let log = parse_log(Path::new("/repo"), &raw, query_for(Some("src/lib.rs")), None).unwrap();
        let commit = log.commits.get(C1).unwrap();
        assert_eq!(commit.files.len(), 1);
        assert_eq!(commit.files[0].status, GitFileStatus::Added);
        assert_eq!(commit.file_name.as_deref(), Some(Path::new("src/lib.rs")));
    }

    #[test]
    fn rename_chain_links_previous_filename() {
        // newest record renamed old.rs -> new.rs; older record still
        // carries old.rs
        let raw = format!(
            "{}{}",
            record(C2, "a", 200, C1, "rename", "R100\told.rs\tnew.rs\n"),
            record(C1, "a", 100, "", "create", "A\told.rs\n")
        );
        let log = parse_log(Path::new("/repo"), &raw, query_for(Some("new.rs")), None).unwrap();
        let newer = log.commits.get(C2).unwrap();
        assert_eq!(newer.file_name.as_deref(), Some(Path::new("new.rs")));
        assert_eq!(newer.original_path.as_deref(), Some(Path::new("old.rs")));
        assert_eq!(newer.previous_sha.as_deref(), Some(C1));
        assert_eq!(newer.previous_file_name.as_deref(), Some(Path::new("old.rs")));
    }

    #[test]
    fn reverse_links_run_the_other_way() {
        let mut query = query_for(Some("new.rs"));
        query.reverse = true;
        // oldest first
        let raw = format!(
            "{}{}",
            record(C1, "a", 100, "", "create", "A\told.rs\n"),
            record(C2, "a", 200, C1, "rename", "R100\told.rs\tnew.rs\n")
        );
        let log = parse_log(Path::new("/repo"), &raw, query, None).unwrap();
        let newer = log.commits.get(C2).unwrap();
        assert_eq!(newer.previous_sha.as_deref(), Some(C1));
        assert_eq!(newer.previous_file_name.as_deref(), Some(Path::new("old.rs")));
    }

    #[test]
    fn empty_and_garbage_input_are_none() {
        assert!(parse_log(Path::new("/repo"), "", query_for(None), None).is_none());
        assert!(parse_log(Path::new("/repo"), "no records here", query_for(None), None).is_none());
    }
}
