use std::path::Path;

use snafu::ResultExt;

use crate::cli::{print_json, repo_for, repo_root};
use crate::error::loupe_error::GitSnafu;
use crate::error::Result;
use crate::service::GitService;

pub async fn run_branches(service: &GitService, path: Option<&Path>) -> Result<()> {
    let repo = repo_for(service, path).await?;
    let branches = service.branches(&repo).await.context(GitSnafu)?;
    print_json(&*branches)
}

pub async fn run_tags(service: &GitService, path: Option<&Path>) -> Result<()> {
    let repo = repo_for(service, path).await?;
    let tags = service.tags(&repo).await.context(GitSnafu)?;
    print_json(&*tags)
}

pub async fn run_stash(service: &GitService, path: Option<&Path>) -> Result<()> {
    let root = repo_root(service, path).await?;
    let stashes = service.stash_list(&root).await.context(GitSnafu)?;
    print_json(&stashes.unwrap_or_default())
}

pub async fn run_contributors(
    service: &GitService,
    reference: Option<String>,
    path: Option<&Path>,
) -> Result<()> {
    let root = repo_root(service, path).await?;
    let contributors = service
        .contributors(&root, reference.as_deref())
        .await
        .context(GitSnafu)?;
    print_json(&contributors.unwrap_or_default())
}

pub async fn run_reflog(
    service: &GitService,
    limit: Option<usize>,
    path: Option<&Path>,
) -> Result<()> {
    let root = repo_root(service, path).await?;
    match service.reflog(&root, limit).await.context(GitSnafu)? {
        Some(reflog) => print_json(&reflog),
        None => {
            println!("null");
            Ok(())
        }
    }
}
