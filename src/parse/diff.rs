use std::path::PathBuf;

use crate::model::commit::{GitFileChange, GitFileStatus};
use crate::model::diff::{
    GitDiff, GitDiffHunk, GitDiffLine, GitDiffLineKind, GitDiffRange, GitDiffShortStat,
};

/// Parse unified diff output into hunks. File headers are skipped;
/// only `@@` blocks contribute. Returns `None` for empty input.
pub fn parse_diff(raw: &str) -> Option<GitDiff> {
    if raw.trim().is_empty() {
        return None;
    }

    let mut hunks: Vec<GitDiffHunk> = Vec::new();
    let mut current: Option<GitDiffHunk> = None;

    for line in raw.lines() {
        if line.starts_with("@@") {
            if let Some(hunk) = current.take() {
                hunks.push(hunk);
            }
            current = parse_hunk_header(line);
            continue;
        }
        let Some(hunk) = current.as_mut() else { continue };
        if line == "\\ No newline at end of file" {
            continue;
        }
        let (kind, content) = if let Some(rest) = line.strip_prefix('+') {
            (GitDiffLineKind::Added, rest)
        } else if let Some(rest) = line.strip_prefix('-') {
            (GitDiffLineKind::Removed, rest)
        } else if let Some(rest) = line.strip_prefix(' ') {
            (GitDiffLineKind::Context, rest)
        } else if line.is_empty() {
            // git occasionally omits the leading space on blank context
            (GitDiffLineKind::Context, "")
        } else {
            // next file's header block ends the hunk
            if let Some(hunk) = current.take() {
                hunks.push(hunk);
            }
            continue;
        };
        hunk.lines.push(GitDiffLine {
            kind,
            content: content.to_string(),
        });
    }
    if let Some(hunk) = current.take() {
        hunks.push(hunk);
    }

    Some(GitDiff { hunks })
}

/// `@@ -a[,b] +c[,d] @@ ...` → hunk with 1-based inclusive ranges.
fn parse_hunk_header(line: &str) -> Option<GitDiffHunk> {
    let rest = line.strip_prefix("@@ ")?;
    let end = rest.find(" @@")?;
    let mut parts = rest[..end].split(' ');
    let (prev_start, prev_count) = parse_start_count(parts.next()?.strip_prefix('-')?)?;
    let (cur_start, cur_count) = parse_start_count(parts.next()?.strip_prefix('+')?)?;
    Some(GitDiffHunk {
        current: GitDiffRange::from_start_count(cur_start, cur_count),
        previous: GitDiffRange::from_start_count(prev_start, prev_count),
        lines: Vec::new(),
    })
}

/// `start[,count]`; count defaults to 1.
fn parse_start_count(s: &str) -> Option<(u32, u32)> {
    match s.split_once(',') {
        Some((start, count)) => Some((start.parse().ok()?, count.parse().unwrap_or(0))),
        None => Some((s.parse().ok()?, 1)),
    }
}

/// Parse the `--shortstat` summary line:
/// `3 files changed, 10 insertions(+), 2 deletions(-)`.
/// Absent segments default to zero.
pub fn parse_shortstat(raw: &str) -> Option<GitDiffShortStat> {
    let line = raw.lines().find(|l| l.contains("changed"))?;
    let mut stat = GitDiffShortStat::default();
    for segment in line.split(',') {
        let number = segment
            .split_whitespace()
            .next()
            .and_then(|n| n.parse::<u32>().ok())
            .unwrap_or(0);
        if segment.contains("file") {
            stat.files = number;
        } else if segment.contains("insertion") {
            stat.insertions = number;
        } else if segment.contains("deletion") {
            stat.deletions = number;
        }
    }
    Some(stat)
}

/// Parse one `--name-status` line: `M\tpath`, `A\tpath`, or
/// `R<score>\told\tnew` (rename markers carry two paths).
pub fn parse_name_status_line(line: &str) -> Option<GitFileChange> {
    let mut parts = line.split('\t');
    let code = parts.next()?.trim();
    if code.is_empty() {
        return None;
    }
    let status_char = code.chars().next()?;
    let status = GitFileStatus::from_char(status_char);
    let similarity = code
        .get(status_char.len_utf8()..)
        .filter(|s| !s.is_empty())
        .and_then(|s| s.parse::<u8>().ok());

    let first = parts.next()?;
    match status {
        GitFileStatus::Renamed | GitFileStatus::Copied => {
            let second = parts.next()?;
            Some(GitFileChange {
                status,
                path: PathBuf::from(second),
                original_path: Some(PathBuf::from(first)),
                similarity,
            })
        }
        _ => Some(GitFileChange {
            status,
            path: PathBuf::from(first),
            original_path: None,
            similarity: None,
        }),
    }
}

/// Parse a whole `--name-status` listing.
pub fn parse_name_status(raw: &str) -> Vec<GitFileChange> {
    raw.lines().filter_map(parse_name_status_line).collect()
}
