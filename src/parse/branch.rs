use std::path::Path;

use crate::model::branch::GitBranch;
use crate::parse::{parse_epoch, FIELD_SEP};

/// The `for-each-ref` format matching [`parse_branches`].
pub const BRANCH_FORMAT: &str =
    "%(HEAD)%1f%(refname)%1f%(objectname)%1f%(upstream:short)%1f%(upstream:track)%1f%(committerdate:unix)";

/// Parse `git for-each-ref` output over `refs/heads` and
/// `refs/remotes`, one field-delimited record per line.
pub fn parse_branches(repo_path: &Path, raw: &str) -> Option<Vec<GitBranch>> {
    if raw.trim().is_empty() {
        return None;
    }
    let mut branches = Vec::new();
    for line in raw.lines() {
        let fields: Vec<&str> = line.split(FIELD_SEP).collect();
        if fields.len() < 6 {
            continue;
        }
        let current = fields[0] == "*";
        let refname = fields[1];
        let (name, remote) = if let Some(rest) = refname.strip_prefix("refs/heads/") {
            (rest.to_string(), false)
        } else if let Some(rest) = refname.strip_prefix("refs/remotes/") {
            // skip symbolic HEAD pointers like origin/HEAD
            if rest.ends_with("/HEAD") {
                continue;
            }
            (rest.to_string(), true)
        } else {
            continue;
        };
        let (ahead, behind) = parse_track(fields[4]);
        branches.push(GitBranch {
            repo_path: repo_path.to_path_buf(),
            name,
            current,
            sha: (!fields[2].is_empty()).then(|| fields[2].to_string()),
            remote,
            upstream: (!fields[3].is_empty()).then(|| fields[3].to_string()),
            ahead,
            behind,
            date: Some(parse_epoch(fields[5])),
        });
    }
    (!branches.is_empty()).then_some(branches)
}

/// `[ahead 2, behind 1]`, `[gone]`, or empty.
fn parse_track(track: &str) -> (u32, u32) {
    let track = track.trim_start_matches('[').trim_end_matches(']');
    let mut ahead = 0;
    let mut behind = 0;
    for part in track.split(',') {
        let part = part.trim();
        if let Some(n) = part.strip_prefix("ahead ") {
            ahead = n.parse().unwrap_or(0);
        } else if let Some(n) = part.strip_prefix("behind ") {
            behind = n.parse().unwrap_or(0);
        }
    }
    (ahead, behind)
}
