use std::path::{Path, PathBuf};

use snafu::ResultExt;

use crate::cli::{print_json, repo_root};
use crate::error::loupe_error::GitSnafu;
use crate::error::Result;
use crate::service::search::SearchQuery;
use crate::service::{FileLogOptions, GitService, LogOptions};

#[allow(clippy::too_many_arguments)]
pub async fn run(
    service: &GitService,
    file: Option<PathBuf>,
    reference: Option<String>,
    limit: Option<usize>,
    reverse: bool,
    merges: bool,
    authors: Vec<String>,
    path: Option<PathBuf>,
) -> Result<()> {
    if let Some(file) = file {
        let options = FileLogOptions {
            reference,
            limit,
            range: None,
            renames: None,
            reverse,
        };
        let log = service
            .log_for_file(&file, &options)
            .await
            .context(GitSnafu)?;
        return match log {
            Some(log) => print_json(&*log),
            None => {
                println!("null");
                Ok(())
            }
        };
    }

    let repo = repo_root(service, path.as_deref()).await?;
    let options = LogOptions {
        reference,
        limit,
        authors,
        merges_only: merges,
        reverse,
    };
    match service.log(&repo, &options).await.context(GitSnafu)? {
        Some(log) => print_json(&log),
        None => {
            println!("null");
            Ok(())
        }
    }
}

pub async fn run_search(
    service: &GitService,
    query: String,
    match_all: bool,
    match_case: bool,
    path: Option<&Path>,
) -> Result<()> {
    let repo = repo_root(service, path).await?;
    let search = SearchQuery {
        query,
        match_all,
        match_case,
    };
    match service
        .log_for_search(&repo, &search)
        .await
        .context(GitSnafu)?
    {
        Some(log) => print_json(&log),
        None => {
            println!("null");
            Ok(())
        }
    }
}
