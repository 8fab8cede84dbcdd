use std::path::Path;

use snafu::ResultExt;

use crate::cli::print_json;
use crate::error::loupe_error::GitSnafu;
use crate::error::Result;
use crate::service::GitService;

pub async fn run(
    service: &GitService,
    file: &Path,
    line: Option<u32>,
    rev: Option<String>,
) -> Result<()> {
    if let Some(line) = line {
        let hit = service
            .blame_for_line(file, line, rev.as_deref())
            .await
            .context(GitSnafu)?;
        return match hit {
            Some((record, commit)) => print_json(&(record, commit)),
            None => {
                println!("null");
                Ok(())
            }
        };
    }

    let blame = service
        .blame_for_file(file, rev.as_deref())
        .await
        .context(GitSnafu)?;
    match blame {
        Some(blame) => print_json(&*blame),
        None => {
            println!("null");
            Ok(())
        }
    }
}
