pub mod blame;
pub mod diff;
pub mod log;
pub mod refs;
pub mod repos;

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use snafu::ResultExt;

use crate::config::LoupeConfig;
use crate::error::loupe_error::{ConfigSnafu, NotARepositorySnafu};
use crate::error::Result;
use crate::service::GitService;

#[derive(Parser)]
#[command(name = "git-loupe", version, about = "Inspect git history: blame, logs, diffs, refs")]
pub struct Cli {
    /// Path to a config file (defaults to ~/.git-loupe.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Per-line attribution for a file
    Blame {
        file: PathBuf,

        /// Only this 1-based line
        #[arg(long)]
        line: Option<u32>,

        /// Blame at this revision instead of the working tree
        #[arg(long)]
        rev: Option<String>,
    },

    /// Commit history for a repository or a single file
    Log {
        /// Scope history to this file
        #[arg(long)]
        file: Option<PathBuf>,

        /// Ref to log from (default: HEAD)
        #[arg(long)]
        reference: Option<String>,

        #[arg(long)]
        limit: Option<usize>,

        /// Oldest first
        #[arg(long)]
        reverse: bool,

        /// Merge commits only
        #[arg(long)]
        merges: bool,

        /// Filter by author (repeatable)
        #[arg(long)]
        author: Vec<String>,

        /// Repository to operate in (default: cwd)
        path: Option<PathBuf>,
    },

    /// Search history with operators (message:, author:, commit:, file:, change:)
    Search {
        query: String,

        /// AND message patterns instead of OR
        #[arg(long)]
        match_all: bool,

        /// Case-sensitive matching
        #[arg(long)]
        match_case: bool,

        path: Option<PathBuf>,
    },

    /// Hunks changed in a file between revisions
    Diff {
        file: PathBuf,

        /// Older side of the comparison
        ref1: Option<String>,

        /// Newer side of the comparison
        ref2: Option<String>,
    },

    /// Working-tree status
    Status {
        /// Report just this file
        #[arg(long)]
        file: Option<PathBuf>,

        path: Option<PathBuf>,
    },

    /// Branch listing (current first)
    Branches { path: Option<PathBuf> },

    /// Tag listing
    Tags { path: Option<PathBuf> },

    /// Stash entries
    Stash { path: Option<PathBuf> },

    /// Commit counts per author
    Contributors {
        #[arg(long)]
        reference: Option<String>,

        path: Option<PathBuf>,
    },

    /// Recent ref movements
    Reflog {
        #[arg(long)]
        limit: Option<usize>,

        path: Option<PathBuf>,
    },

    /// Discover repositories under a folder
    Repos {
        folder: Option<PathBuf>,

        #[arg(long)]
        depth: Option<usize>,
    },
}

/// Build the service from the config file (missing file = defaults).
pub fn service(config_path: Option<&Path>) -> Result<GitService> {
    let default_path = std::env::var("HOME")
        .map(|home| PathBuf::from(home).join(".git-loupe.toml"))
        .unwrap_or_else(|_| PathBuf::from(".git-loupe.toml"));
    let path = config_path.unwrap_or(&default_path);
    let config = LoupeConfig::load(path).context(ConfigSnafu)?;
    Ok(GitService::new(config))
}

/// Resolve the repository for an explicit path or the cwd.
pub async fn repo_for(
    service: &GitService,
    path: Option<&Path>,
) -> Result<std::sync::Arc<crate::repo::Repository>> {
    let base = match path {
        Some(path) => path.to_path_buf(),
        None => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    };
    match service.repository_for(&base).await {
        Some(repo) => Ok(repo),
        None => NotARepositorySnafu { path: base }.fail(),
    }
}

/// Resolve the repository root for an explicit path or the cwd.
pub async fn repo_root(service: &GitService, path: Option<&Path>) -> Result<PathBuf> {
    Ok(repo_for(service, path).await?.path().to_path_buf())
}

pub(crate) fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    let out = serde_json::to_string_pretty(value).context(crate::error::loupe_error::JsonSnafu)?;
    println!("{out}");
    Ok(())
}
