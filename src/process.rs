use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio::sync::OnceCell;

use crate::error::git_error::{ExecutionFailedSnafu, GitNotFoundSnafu, VersionRequirementSnafu};
use crate::error::GitError;
use crate::version::GitVersion;

/// Runs the external `git` executable and hands back its raw output.
///
/// This layer does not retry and does not dedupe: identical in-flight
/// requests are coalesced one level up, in the document cache. Each
/// invocation gets a correlation id so overlapping calls can be told
/// apart in the logs.
pub struct GitRunner {
    git_path: PathBuf,
    version: OnceCell<Option<GitVersion>>,
    correlation: AtomicU64,
}

impl Default for GitRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl GitRunner {
    pub fn new() -> Self {
        Self::with_git_path(PathBuf::from("git"))
    }

    pub fn with_git_path(git_path: PathBuf) -> Self {
        Self {
            git_path,
            version: OnceCell::new(),
            correlation: AtomicU64::new(0),
        }
    }

    /// Run git in `repo_path` and return stdout decoded as lossy UTF-8.
    pub async fn run(&self, repo_path: &Path, args: &[&str]) -> Result<String, GitError> {
        let bytes = self.run_bytes(repo_path, args, None).await?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Run git with `input` piped to stdin, returning stdout as text.
    pub async fn run_with_stdin(
        &self,
        repo_path: &Path,
        args: &[&str],
        input: &str,
    ) -> Result<String, GitError> {
        let bytes = self.run_bytes(repo_path, args, Some(input.as_bytes())).await?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Run git and return stdout as a raw buffer (binary capture mode).
    pub async fn run_bytes(
        &self,
        repo_path: &Path,
        args: &[&str],
        stdin: Option<&[u8]>,
    ) -> Result<Vec<u8>, GitError> {
        let id = self.correlation.fetch_add(1, Ordering::Relaxed);
        let command = args.first().copied().unwrap_or("git");
        let started = Instant::now();

        let mut cmd = Command::new(&self.git_path);
        cmd.args(args)
            .current_dir(repo_path)
            .stdin(if stdin.is_some() { Stdio::piped() } else { Stdio::null() })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let mut child = cmd.spawn().map_err(|e| {
            GitNotFoundSnafu {
                message: e.to_string(),
            }
            .build()
        })?;

        if let Some(input) = stdin {
            if let Some(mut pipe) = child.stdin.take() {
                // A closed pipe just means git stopped reading early.
                let _ = pipe.write_all(input).await;
            }
        }

        let output = child.wait_with_output().await.map_err(|e| {
            GitNotFoundSnafu {
                message: e.to_string(),
            }
            .build()
        })?;

        tracing::debug!(
            id,
            command,
            cwd = %repo_path.display(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            exit = output.status.code(),
            "git"
        );

        if output.status.success() {
            Ok(output.stdout)
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            Err(ExecutionFailedSnafu {
                command: command.to_string(),
                exit_code: output.status.code(),
                stderr,
            }
            .build())
        }
    }

    /// The installed git version, probed once and memoized. `None` when
    /// the probe itself failed; callers treat that as "unknown" and take
    /// the conservative path.
    pub async fn version(&self) -> Option<GitVersion> {
        *self
            .version
            .get_or_init(|| async {
                match self.run(Path::new("."), &["--version"]).await {
                    Ok(out) => GitVersion::parse(&out),
                    Err(e) => {
                        tracing::warn!("git version probe failed: {e}");
                        None
                    }
                }
            })
            .await
    }

    /// Fail eagerly, with a descriptive error, when the installed git is
    /// older than an operation requires.
    pub async fn ensure_version(
        &self,
        required: GitVersion,
        operation: &str,
    ) -> Result<(), GitError> {
        match self.version().await {
            Some(found) if found < required => VersionRequirementSnafu {
                operation: operation.to_string(),
                required: required.to_string(),
                found: found.to_string(),
            }
            .fail(),
            _ => Ok(()),
        }
    }
}
