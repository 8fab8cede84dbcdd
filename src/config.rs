use std::path::Path;

use serde::{Deserialize, Serialize};
use snafu::ResultExt;

use crate::error::config_error::{ParseSnafu, ReadFileSnafu};
use crate::error::ConfigError;

/// Sort order for branch and tag listings. The current branch always
/// sorts first regardless of this setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RefSort {
    Name,
    Date,
}

/// Flat configuration consumed verbatim by the retrieval layer,
/// assembled from defaults + an optional TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoupeConfig {
    /// Master switch for all per-document memoization.
    pub caching_enabled: bool,
    /// Default page size for history logs.
    pub max_list_items: usize,
    /// Default page size for commit searches.
    pub max_search_items: usize,
    /// Percentage passed to git's rename detection (`-M<n>%`).
    pub similarity_threshold: u8,
    /// How many directory levels below a workspace folder to scan for
    /// repositories.
    pub repository_search_depth: usize,
    /// Whether file history follows renames by default.
    pub file_history_follows_renames: bool,
    /// Pass `-w` to blame.
    pub blame_ignore_whitespace: bool,
    /// Extra arguments appended to every blame invocation.
    pub blame_custom_arguments: Vec<String>,
    pub branch_sort: RefSort,
    pub tag_sort: RefSort,
    /// Glob patterns excluded from repository discovery, merged with
    /// the editor's file/search excludes by the host.
    pub exclude_globs: Vec<String>,
}

impl Default for LoupeConfig {
    fn default() -> Self {
        Self {
            caching_enabled: true,
            max_list_items: 200,
            max_search_items: 200,
            similarity_threshold: 50,
            repository_search_depth: 1,
            file_history_follows_renames: true,
            blame_ignore_whitespace: false,
            blame_custom_arguments: Vec::new(),
            branch_sort: RefSort::Name,
            tag_sort: RefSort::Date,
            exclude_globs: vec!["**/node_modules".to_string(), "**/target".to_string()],
        }
    }
}

impl LoupeConfig {
    /// Load config from a TOML file, merging over defaults. A missing
    /// file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path).context(ReadFileSnafu {
            path: path.display().to_string(),
        })?;
        toml::from_str(&contents).context(ParseSnafu)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = LoupeConfig::default();
        assert!(config.caching_enabled);
        assert_eq!(config.max_list_items, 200);
        assert_eq!(config.max_search_items, 200);
        assert_eq!(config.similarity_threshold, 50);
        assert_eq!(config.repository_search_depth, 1);
        assert!(config.file_history_follows_renames);
        assert!(!config.blame_ignore_whitespace);
    }

    #[test]
    fn partial_toml_merges_over_defaults() {
        let config: LoupeConfig =
            toml::from_str("max_list_items = 50\nblame_ignore_whitespace = true\n").unwrap();
        assert_eq!(config.max_list_items, 50);
        assert!(config.blame_ignore_whitespace);
        // untouched keys keep their defaults
        assert!(config.caching_enabled);
        assert_eq!(config.similarity_threshold, 50);
    }

    #[test]
    fn unknown_keys_are_ignored() {
        let config: LoupeConfig = toml::from_str("does_not_exist = 1\n").unwrap();
        assert!(config.caching_enabled);
    }
}
