use std::path::{Path, PathBuf};

use snafu::ResultExt;

use crate::cli::{print_json, repo_root};
use crate::error::loupe_error::GitSnafu;
use crate::error::Result;
use crate::service::GitService;

pub async fn run(
    service: &GitService,
    file: &Path,
    ref1: Option<String>,
    ref2: Option<String>,
) -> Result<()> {
    let diff = service
        .diff_for_file(file, ref1.as_deref(), ref2.as_deref())
        .await
        .context(GitSnafu)?;
    match diff {
        Some(diff) => print_json(&*diff),
        None => {
            println!("null");
            Ok(())
        }
    }
}

pub async fn run_status(
    service: &GitService,
    file: Option<PathBuf>,
    path: Option<PathBuf>,
) -> Result<()> {
    if let Some(file) = file {
        let status = service.status_for_file(&file).await.context(GitSnafu)?;
        return print_json(&status);
    }
    let repo = repo_root(service, path.as_deref()).await?;
    match service.status_for_repo(&repo).await.context(GitSnafu)? {
        Some(status) => print_json(&status),
        None => {
            println!("null");
            Ok(())
        }
    }
}
