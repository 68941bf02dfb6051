use std::process::ExitCode;

use anyhow::Context as _;
use clap::Parser as _;

/// Exit status when the run finished but at least one download failed.
const EXIT_PARTIAL_FAILURE: u8 = 2;

#[tokio::main]
async fn main() -> ExitCode {
    match try_main().await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(EXIT_PARTIAL_FAILURE),
        Err(err) => {
            eprintln!("{err:#}");
            ExitCode::FAILURE
        }
    }
}

/// Returns whether every requested download succeeded or was already present.
async fn try_main() -> anyhow::Result<bool> {
    sdsharvest::logging::init().context("init logging")?;

    let cli = sdsharvest::cli::Cli::parse();
    tracing::debug!(?cli, "parsed cli");

    match cli.command {
        sdsharvest::cli::Command::Run(args) => {
            let summary = sdsharvest::commands::run(args).await.context("run")?;
            Ok(!summary.has_failures())
        }
        sdsharvest::cli::Command::Corpus(args) => {
            sdsharvest::commands::corpus(args).await.context("corpus")?;
            Ok(true)
        }
        sdsharvest::cli::Command::Links(args) => {
            sdsharvest::commands::links(args).context("links")?;
            Ok(true)
        }
        sdsharvest::cli::Command::Fetch(args) => {
            let summary = sdsharvest::commands::fetch(args).await.context("fetch")?;
            Ok(!summary.has_failures())
        }
    }
}
