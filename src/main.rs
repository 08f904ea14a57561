use anyhow::Context;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

mod archive;
mod backup;
mod config;
mod errors;
mod github;
mod mirror;
mod model;
mod template;
#[cfg(test)]
mod testing;

use backup::Backup;
use config::{Args, Config};
use github::Github;
use mirror::GitMirror;

async fn run(config: Config) -> anyhow::Result<()> {
    let root = backup::project_root();
    let dest = backup::prepare_destination(
        config.backup_dir.as_deref(),
        &config.organization,
        &root,
        chrono::Local::now().naive_local(),
    )
    .context("could not prepare backup directory")?;
    debug!(?config, dest = %dest.display(), "Resolved configuration");

    let github = Github::new(&config.token, &config.api_url)?;
    let backup = Backup::new(github, GitMirror::new(config.git))?;
    let summary = backup
        .run(&config.organization, &dest)
        .await
        .with_context(|| format!("backup of '{}' failed", config.organization))?;

    info!(
        "Backed up {} repositories ({} issues, {} pull requests, {} comments) to {}",
        summary.repositories,
        summary.archived.issues,
        summary.archived.pull_requests,
        summary.archived.comments,
        dest.display()
    );
    Ok(())
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
    dotenv::dotenv().ok();

    let mut raw = std::env::args();
    let command = raw.next().unwrap_or_else(|| env!("CARGO_PKG_NAME").to_owned());
    let args = match Args::parse(&command, raw.collect()) {
        Ok(args) => args,
        Err(early_exit) => match early_exit.status {
            Ok(()) => {
                println!("{}", early_exit.output);
                std::process::exit(0);
            }
            Err(()) => {
                eprintln!(
                    "{}\nRun {} --help for more information.",
                    early_exit.output, command
                );
                std::process::exit(1);
            }
        },
    };
    let result = Config::from_args(args, std::env::var("GITHUB_TOKEN").ok())
        .map_err(anyhow::Error::from);
    let result = match result {
        Ok(config) => run(config).await,
        Err(e) => Err(e),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        for cause in e.chain().skip(1) {
            eprintln!("Caused by: {}", cause);
        }
        std::process::exit(1);
    }
}
