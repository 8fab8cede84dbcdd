use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::model::blame::{GitAuthor, GitBlame, GitBlameLine};
use crate::model::commit::{GitCommit, GitCommitType};
use crate::parse::parse_epoch;

/// Parse `git blame --porcelain` output.
///
/// The format interleaves header blocks and content lines: a header
/// `<sha> <orig-line> <final-line> [<group-size>]` introduces each
/// line, commit metadata follows only the first time a sha appears,
/// and the content line itself is prefixed with a TAB. Metadata for
/// repeated shas must therefore be coalesced from the first block.
pub fn parse_blame(repo_path: &Path, raw: &str) -> Option<GitBlame> {
    if raw.trim().is_empty() {
        return None;
    }

    let mut commits: HashMap<String, GitCommit> = HashMap::new();
    let mut lines: Vec<GitBlameLine> = Vec::new();
    let mut current: Option<(String, u32, u32)> = None;

    for line in raw.lines() {
        if line.starts_with('\t') {
            if let Some((sha, original_line, final_line)) = current.take() {
                lines.push(GitBlameLine {
                    line: final_line,
                    original_line,
                    sha,
                });
            }
            continue;
        }

        if let Some(header) = parse_header(line) {
            let (sha, original_line, final_line) = header;
            commits.entry(sha.clone()).or_insert_with(|| {
                GitCommit::new(GitCommitType::Blame, repo_path.to_path_buf(), sha.clone())
            });
            current = Some((sha, original_line, final_line));
            continue;
        }

        // Metadata for the sha of the pending header block.
        let Some((sha, _, _)) = &current else { continue };
        let Some(commit) = commits.get_mut(sha) else { continue };
        let (key, value) = line.split_once(' ').unwrap_or((line, ""));
        match key {
            "author" => commit.author = value.to_string(),
            "author-mail" => {
                commit.email = Some(value.trim_matches(['<', '>']).to_string());
            }
            "author-time" => commit.author_date = parse_epoch(value),
            "committer-time" => commit.committer_date = parse_epoch(value),
            "summary" => commit.message = value.to_string(),
            "previous" => {
                if let Some((prev_sha, prev_file)) = value.split_once(' ') {
                    commit.previous_sha = Some(prev_sha.to_string());
                    commit.previous_file_name = Some(PathBuf::from(prev_file));
                }
            }
            "filename" => commit.file_name = Some(PathBuf::from(value)),
            // author-tz, committer, committer-mail, committer-tz, boundary
            _ => {}
        }
    }

    if lines.is_empty() {
        return None;
    }

    let mut authors: HashMap<String, GitAuthor> = HashMap::new();
    for line in &lines {
        if let Some(commit) = commits.get(&line.sha) {
            let author = authors
                .entry(commit.author.clone())
                .or_insert_with(|| GitAuthor {
                    name: commit.author.clone(),
                    line_count: 0,
                });
            author.line_count += 1;
        }
    }

    Some(GitBlame {
        repo_path: repo_path.to_path_buf(),
        lines,
        commits,
        authors,
    })
}

/// `<40-hex> <orig> <final> [<n>]`; anything else is metadata.
fn parse_header(line: &str) -> Option<(String, u32, u32)> {
    let mut parts = line.split(' ');
    let sha = parts.next()?;
    if sha.len() != 40 || !sha.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let original_line = parts.next()?.parse().ok()?;
    let final_line = parts.next()?.parse().ok()?;
    Some((sha.to_string(), original_line, final_line))
}
