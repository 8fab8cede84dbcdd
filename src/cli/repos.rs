use std::path::PathBuf;

use crate::cli::print_json;
use crate::error::Result;
use crate::service::GitService;

pub async fn run(
    service: &GitService,
    folder: Option<PathBuf>,
    depth: Option<usize>,
) -> Result<()> {
    let folder = match folder {
        Some(folder) => folder,
        None => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    };
    let depth = depth.unwrap_or(service.config().repository_search_depth);
    let found = service
        .registry()
        .register_folder(&folder, depth, &service.config().exclude_globs)
        .await;
    let roots: Vec<String> = found
        .iter()
        .map(|r| r.path().display().to_string())
        .collect();
    print_json(&roots)
}
