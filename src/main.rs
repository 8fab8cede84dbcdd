use clap::Parser;
use loupe::cli::{self, Cli, Commands};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let service = match cli::service(cli.config.as_deref()) {
        Ok(service) => service,
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Commands::Blame { file, line, rev } => {
            cli::blame::run(&service, &file, line, rev).await
        }
        Commands::Log {
            file,
            reference,
            limit,
            reverse,
            merges,
            author,
            path,
        } => cli::log::run(&service, file, reference, limit, reverse, merges, author, path).await,
        Commands::Search {
            query,
            match_all,
            match_case,
            path,
        } => cli::log::run_search(&service, query, match_all, match_case, path.as_deref()).await,
        Commands::Diff { file, ref1, ref2 } => cli::diff::run(&service, &file, ref1, ref2).await,
        Commands::Status { file, path } => cli::diff::run_status(&service, file, path).await,
        Commands::Branches { path } => cli::refs::run_branches(&service, path.as_deref()).await,
        Commands::Tags { path } => cli::refs::run_tags(&service, path.as_deref()).await,
        Commands::Stash { path } => cli::refs::run_stash(&service, path.as_deref()).await,
        Commands::Contributors { reference, path } => {
            cli::refs::run_contributors(&service, reference, path.as_deref()).await
        }
        Commands::Reflog { limit, path } => {
            cli::refs::run_reflog(&service, limit, path.as_deref()).await
        }
        Commands::Repos { folder, depth } => cli::repos::run(&service, folder, depth).await,
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
