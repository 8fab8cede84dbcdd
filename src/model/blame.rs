use std::collections::HashMap;
use std::path::PathBuf;

use serde::Serialize;

use crate::model::commit::GitCommit;

/// One blamed line. Line numbers are 1-based and contiguous over the
/// blamed range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GitBlameLine {
    /// Line number in the blamed (current) content.
    pub line: u32,
    /// Line number in the commit that introduced it.
    pub original_line: u32,
    pub sha: String,
}

/// Aggregated per-author totals over a blame result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GitAuthor {
    pub name: String,
    pub line_count: u32,
}

/// Per-line attribution for a file (or a slice of one).
///
/// Invariant: every line's sha has an entry in `commits`, and the sum
/// of all authors' `line_count` equals `lines.len()`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GitBlame {
    pub repo_path: PathBuf,
    pub lines: Vec<GitBlameLine>,
    pub commits: HashMap<String, GitCommit>,
    pub authors: HashMap<String, GitAuthor>,
}

impl GitBlame {
    /// Slice the blame down to an inclusive 1-based line range,
    /// recomputing the commit map and author totals for the slice.
    pub fn for_range(&self, start: u32, end: u32) -> GitBlame {
        let lines: Vec<GitBlameLine> = self
            .lines
            .iter()
            .filter(|l| l.line >= start && l.line <= end)
            .cloned()
            .collect();

        let mut commits = HashMap::new();
        let mut authors: HashMap<String, GitAuthor> = HashMap::new();
        for line in &lines {
            if let Some(commit) = self.commits.get(&line.sha) {
                commits
                    .entry(line.sha.clone())
                    .or_insert_with(|| commit.clone());
                let author = authors.entry(commit.author.clone()).or_insert_with(|| GitAuthor {
                    name: commit.author.clone(),
                    line_count: 0,
                });
                author.line_count += 1;
            }
        }

        GitBlame {
            repo_path: self.repo_path.clone(),
            lines,
            commits,
            authors,
        }
    }

    /// The blame record and commit for a single 1-based line.
    pub fn for_line(&self, line: u32) -> Option<(&GitBlameLine, &GitCommit)> {
        let record = self.lines.iter().find(|l| l.line == line)?;
        let commit = self.commits.get(&record.sha)?;
        Some((record, commit))
    }
}
