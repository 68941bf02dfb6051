use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(author, version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Aggregate the listing, extract document links and download them.
    Run(RunArgs),
    /// Aggregate the listing only and write the corpus to a file.
    Corpus(CorpusArgs),
    /// Print the download candidates found in a saved corpus.
    Links(LinksArgs),
    /// Download the given document URLs.
    Fetch(FetchArgs),
}

/// Settings shared by every command that talks to the listing API.
#[derive(Debug, Clone, Default, Args)]
pub struct SiteArgs {
    /// YAML file with site settings (flags take precedence).
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Origin used to qualify links that have no host.
    #[arg(long)]
    pub base_origin: Option<String>,

    /// Listing API endpoint.
    #[arg(long)]
    pub endpoint: Option<String>,

    /// Output directory for downloaded documents.
    #[arg(long)]
    pub out: Option<PathBuf>,

    /// Scratch file for the aggregated corpus (default: `<domain label>.html`).
    #[arg(long, conflicts_with = "no_scratch")]
    pub scratch_file: Option<PathBuf>,

    /// Do not write the aggregated corpus to disk.
    #[arg(long)]
    pub no_scratch: bool,

    /// User-Agent header sent with every request.
    #[arg(long)]
    pub user_agent: Option<String>,

    /// Per-download timeout.
    #[arg(long)]
    pub download_timeout_secs: Option<u64>,

    /// Per-request timeout against the listing API (default: none).
    #[arg(long)]
    pub api_timeout_secs: Option<u64>,
}

#[derive(Debug, Args)]
pub struct RunArgs {
    #[command(flatten)]
    pub site: SiteArgs,
}

#[derive(Debug, Args)]
pub struct CorpusArgs {
    #[command(flatten)]
    pub site: SiteArgs,

    /// Output file path for the corpus.
    #[arg(long = "corpus-out")]
    pub corpus_out: PathBuf,
}

#[derive(Debug, Args)]
pub struct LinksArgs {
    /// Corpus file (written by `corpus` or by `run`'s scratch file).
    #[arg(long)]
    pub corpus: PathBuf,

    /// Origin used to qualify links that have no host.
    #[arg(long, default_value = crate::config::DEFAULT_BASE_ORIGIN)]
    pub base_origin: String,
}

#[derive(Debug, Args)]
pub struct FetchArgs {
    /// Output directory for downloaded documents.
    #[arg(long, default_value = "PDFs")]
    pub out: PathBuf,

    /// User-Agent header sent with every request.
    #[arg(long, default_value = crate::config::DEFAULT_USER_AGENT)]
    pub user_agent: String,

    /// Per-download timeout.
    #[arg(long, default_value_t = 900)]
    pub download_timeout_secs: u64,

    /// Document URLs to download.
    #[arg(required = true)]
    pub urls: Vec<String>,
}
