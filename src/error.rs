use snafu::Snafu;
use std::path::PathBuf;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub), module(loupe_error))]
pub enum LoupeError {
    #[snafu(display("git error: {source}"))]
    Git {
        source: GitError,
        #[snafu(implicit)]
        location: snafu::Location,
    },

    #[snafu(display("config error: {source}"))]
    Config {
        source: ConfigError,
        #[snafu(implicit)]
        location: snafu::Location,
    },

    #[snafu(display("not a git repository: {}", path.display()))]
    NotARepository {
        path: PathBuf,
        #[snafu(implicit)]
        location: snafu::Location,
    },

    #[snafu(display("IO error: {source}"))]
    Io {
        source: std::io::Error,
        #[snafu(implicit)]
        location: snafu::Location,
    },

    #[snafu(display("JSON error: {source}"))]
    Json {
        source: serde_json::Error,
        #[snafu(implicit)]
        location: snafu::Location,
    },
}

/// Errors from the git subprocess layer and the operations built on it.
///
/// Every field is an owned value so the whole enum is `Clone`; cached
/// in-flight retrievals hand the same error to every coalesced caller.
#[derive(Debug, Clone, Snafu)]
#[snafu(visibility(pub), module(git_error))]
pub enum GitError {
    #[snafu(display("failed to spawn git: {message}"))]
    GitNotFound {
        message: String,
        #[snafu(implicit)]
        location: snafu::Location,
    },

    #[snafu(display("git {command} exited with {}: {stderr}", exit_code.map(|c| c.to_string()).unwrap_or_else(|| "signal".to_string())))]
    ExecutionFailed {
        command: String,
        exit_code: Option<i32>,
        stderr: String,
        #[snafu(implicit)]
        location: snafu::Location,
    },

    #[snafu(display("{operation} requires git {required} or newer (found {found})"))]
    VersionRequirement {
        operation: String,
        required: String,
        found: String,
        #[snafu(implicit)]
        location: snafu::Location,
    },

    #[snafu(display("patch does not apply cleanly: {stderr}"))]
    PatchApplyConflict {
        stderr: String,
        #[snafu(implicit)]
        location: snafu::Location,
    },
}

impl GitError {
    fn stderr(&self) -> Option<&str> {
        match self {
            GitError::ExecutionFailed { stderr, .. } => Some(stderr),
            _ => None,
        }
    }

    /// The path is not inside a git working tree. An expected outcome,
    /// surfaced as `None` by path-resolution operations.
    pub fn is_not_a_repository(&self) -> bool {
        self.stderr()
            .is_some_and(|s| s.contains("not a git repository"))
    }

    /// The file exists but is outside version control.
    pub fn is_not_tracked(&self) -> bool {
        self.stderr().is_some_and(|s| {
            s.contains("no such path")
                || s.contains("does not exist in")
                || s.contains("exists on disk, but not in")
                || s.contains("is outside repository")
        })
    }

    /// The revision could not be resolved.
    pub fn is_bad_revision(&self) -> bool {
        self.stderr().is_some_and(|s| {
            s.contains("unknown revision") || s.contains("bad revision") || s.contains("bad object")
        })
    }

    /// `git apply` rejected the patch; retrying with a three-way merge
    /// may still succeed.
    pub fn is_patch_conflict(&self) -> bool {
        matches!(self, GitError::PatchApplyConflict { .. })
            || self.stderr().is_some_and(|s| {
                s.contains("patch does not apply")
                    || s.contains("already exists in working directory")
            })
    }
}

#[derive(Debug, Snafu)]
#[snafu(visibility(pub), module(config_error))]
pub enum ConfigError {
    #[snafu(display("failed to read config file {path}: {source}"))]
    ReadFile {
        path: String,
        source: std::io::Error,
        #[snafu(implicit)]
        location: snafu::Location,
    },

    #[snafu(display("failed to parse config: {source}"))]
    Parse {
        source: toml::de::Error,
        #[snafu(implicit)]
        location: snafu::Location,
    },
}

pub type Result<T, E = LoupeError> = std::result::Result<T, E>;
