use std::path::{Path, PathBuf};

use crate::model::status::{GitStatus, GitStatusFile};

/// Parse `git status --porcelain --branch` (v1 format).
pub fn parse_status_v1(repo_path: &Path, raw: &str) -> Option<GitStatus> {
    if raw.is_empty() {
        return None;
    }
    let mut status = GitStatus::new(repo_path.to_path_buf());

    for line in raw.lines() {
        if let Some(branch_line) = line.strip_prefix("## ") {
            parse_branch_header(&mut status, branch_line);
            continue;
        }
        let mut chars = line.chars();
        let (Some(index), Some(working)) = (chars.next(), chars.next()) else {
            continue;
        };
        let Some(rest) = line.get(3..).filter(|r| !r.is_empty()) else {
            continue;
        };
        let (path, original) = match rest.split_once(" -> ") {
            Some((from, to)) => (to, Some(from)),
            None => (rest, None),
        };
        status.files.push(GitStatusFile {
            path: PathBuf::from(unquote(path)),
            index_status: normalize_letter(index),
            working_status: normalize_letter(working),
            original_path: original.map(|p| PathBuf::from(unquote(p))),
        });
    }
    Some(status)
}

/// Parse `git status --porcelain=v2 --branch`. Normalizes into the
/// same shape as v1.
pub fn parse_status_v2(repo_path: &Path, raw: &str) -> Option<GitStatus> {
    if raw.is_empty() {
        return None;
    }
    let mut status = GitStatus::new(repo_path.to_path_buf());

    for line in raw.lines() {
        if let Some(header) = line.strip_prefix("# ") {
            parse_v2_header(&mut status, header);
            continue;
        }
        let mut parts = line.split(' ');
        match parts.next() {
            Some("1") => {
                let xy = parts.next().unwrap_or("..");
                // sub, mH, mI, mW, hH, hI
                let path = line.splitn(9, ' ').nth(8).unwrap_or_default();
                if path.is_empty() {
                    continue;
                }
                push_v2_entry(&mut status, xy, path, None);
            }
            Some("2") => {
                let xy = parts.next().unwrap_or("..");
                // sub, mH, mI, mW, hH, hI, X<score>, then "path\torig"
                let tail = line.splitn(10, ' ').nth(9).unwrap_or_default();
                let (path, orig) = tail.split_once('\t').unwrap_or((tail, ""));
                if path.is_empty() {
                    continue;
                }
                push_v2_entry(&mut status, xy, path, (!orig.is_empty()).then_some(orig));
            }
            Some("?") => {
                let path = line.get(2..).unwrap_or_default();
                if path.is_empty() {
                    continue;
                }
                status.files.push(GitStatusFile {
                    path: PathBuf::from(unquote(path)),
                    index_status: Some('?'),
                    working_status: Some('?'),
                    original_path: None,
                });
            }
            Some("u") => {
                let xy = parts.next().unwrap_or("UU");
                let path = line.splitn(11, ' ').nth(10).unwrap_or_default();
                if path.is_empty() {
                    continue;
                }
                push_v2_entry(&mut status, xy, path, None);
            }
            _ => {}
        }
    }
    Some(status)
}

fn push_v2_entry(status: &mut GitStatus, xy: &str, path: &str, original: Option<&str>) {
    let mut chars = xy.chars();
    let index = chars.next().unwrap_or('.');
    let working = chars.next().unwrap_or('.');
    status.files.push(GitStatusFile {
        path: PathBuf::from(unquote(path)),
        index_status: normalize_letter(index),
        working_status: normalize_letter(working),
        original_path: original.map(|p| PathBuf::from(unquote(p))),
    });
}

/// `main...origin/main [ahead 1, behind 2]`, or `No commits yet on x`.
fn parse_branch_header(status: &mut GitStatus, line: &str) {
    let line = line.trim();
    let (names, track) = match line.split_once(" [") {
        Some((n, t)) => (n, Some(t.trim_end_matches(']'))),
        None => (line, None),
    };
    match names.split_once("...") {
        Some((local, upstream)) => {
            status.branch = Some(local.to_string());
            status.upstream = Some(upstream.to_string());
        }
        None => status.branch = Some(names.to_string()),
    }
    if let Some(track) = track {
        for part in track.split(',') {
            let part = part.trim();
            if let Some(n) = part.strip_prefix("ahead ") {
                status.ahead = n.parse().unwrap_or(0);
            } else if let Some(n) = part.strip_prefix("behind ") {
                status.behind = n.parse().unwrap_or(0);
            }
        }
    }
}

fn parse_v2_header(status: &mut GitStatus, header: &str) {
    if let Some(name) = header.strip_prefix("branch.head ") {
        if name != "(detached)" {
            status.branch = Some(name.to_string());
        }
    } else if let Some(upstream) = header.strip_prefix("branch.upstream ") {
        status.upstream = Some(upstream.to_string());
    } else if let Some(ab) = header.strip_prefix("branch.ab ") {
        for part in ab.split_whitespace() {
            if let Some(n) = part.strip_prefix('+') {
                status.ahead = n.parse().unwrap_or(0);
            } else if let Some(n) = part.strip_prefix('-') {
                status.behind = n.parse().unwrap_or(0);
            }
        }
    }
}

fn normalize_letter(c: char) -> Option<char> {
    match c {
        ' ' | '.' => None,
        other => Some(other),
    }
}

/// git quotes paths with special characters; strip the outer quotes.
fn unquote(path: &str) -> &str {
    path.strip_prefix('"')
        .and_then(|p| p.strip_suffix('"'))
        .unwrap_or(path)
}
