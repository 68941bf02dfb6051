//! Log setup for the binary. Everything goes to stderr: stdout carries the
//! candidate listing and the run summary, which are meant to be piped.

use std::io::IsTerminal as _;

use anyhow::Context as _;
use tracing_subscriber::EnvFilter;

/// Harvest progress at `info`; the HTTP stack only when it has something to
/// complain about.
const DEFAULT_DIRECTIVES: &str = "info,hyper_util=warn,reqwest=warn,rustls=warn";

pub fn init() -> anyhow::Result<()> {
    let from_env = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let filter = filter_for(from_env.as_deref())?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(std::io::stderr().is_terminal())
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|err| anyhow::anyhow!("initialize tracing subscriber: {err}"))?;

    Ok(())
}

/// `RUST_LOG` when it is set and parses, the harvest defaults otherwise.
fn filter_for(from_env: Option<&str>) -> anyhow::Result<EnvFilter> {
    let requested = from_env
        .map(str::trim)
        .filter(|directives| !directives.is_empty())
        .and_then(|directives| EnvFilter::try_new(directives).ok());
    match requested {
        Some(filter) => Ok(filter),
        None => EnvFilter::try_new(DEFAULT_DIRECTIVES).context("build default log filter"),
    }
}
