use serde::Serialize;

/// 1-based inclusive line range on one side of a hunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GitDiffRange {
    pub start: u32,
    pub end: u32,
}

impl GitDiffRange {
    /// Build from a hunk header `start,count` pair. A zero count marks
    /// a pure insertion/deletion point; the range collapses onto start.
    pub fn from_start_count(start: u32, count: u32) -> Self {
        let end = if count == 0 { start } else { start + count - 1 };
        Self { start, end }
    }

    pub fn count(&self) -> u32 {
        self.end - self.start + 1
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum GitDiffLineKind {
    Added,
    Removed,
    Context,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GitDiffLine {
    pub kind: GitDiffLineKind,
    pub content: String,
}

/// A contiguous block of changes with before/after positions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GitDiffHunk {
    pub current: GitDiffRange,
    pub previous: GitDiffRange,
    pub lines: Vec<GitDiffLine>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GitDiff {
    pub hunks: Vec<GitDiffHunk>,
}

impl GitDiff {
    pub fn is_empty(&self) -> bool {
        self.hunks.is_empty()
    }

    /// The hunk covering a 1-based line of the current content.
    pub fn hunk_for_line(&self, line: u32) -> Option<&GitDiffHunk> {
        self.hunks
            .iter()
            .find(|h| line >= h.current.start && line <= h.current.end)
    }
}

/// Parsed `--shortstat` summary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct GitDiffShortStat {
    pub files: u32,
    pub insertions: u32,
    pub deletions: u32,
}
