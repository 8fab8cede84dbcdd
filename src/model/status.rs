use std::path::PathBuf;

use serde::Serialize;

/// One working-tree file, normalized across porcelain v1 and v2.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GitStatusFile {
    pub path: PathBuf,
    /// Staged (index) status letter, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index_status: Option<char>,
    /// Working-tree status letter, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub working_status: Option<char>,
    /// Rename source.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_path: Option<PathBuf>,
}

impl GitStatusFile {
    pub fn is_staged(&self) -> bool {
        self.index_status.is_some_and(|c| c != '?' && c != '!')
    }

    pub fn is_untracked(&self) -> bool {
        self.index_status == Some('?') || self.working_status == Some('?')
    }

    pub fn is_conflicted(&self) -> bool {
        self.index_status == Some('U') || self.working_status == Some('U')
    }
}

/// Repository status snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GitStatus {
    pub repo_path: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upstream: Option<String>,
    pub ahead: u32,
    pub behind: u32,
    pub files: Vec<GitStatusFile>,
}

impl GitStatus {
    pub fn new(repo_path: PathBuf) -> Self {
        Self {
            repo_path,
            branch: None,
            upstream: None,
            ahead: 0,
            behind: 0,
            files: Vec::new(),
        }
    }

    pub fn file(&self, path: &std::path::Path) -> Option<&GitStatusFile> {
        self.files.iter().find(|f| f.path == path)
    }
}
