use std::io::Write as _;
use std::time::Duration;

use anyhow::Context as _;
use url::Url;

use crate::cli::{CorpusArgs, FetchArgs, LinksArgs, RunArgs};
use crate::config::SiteConfig;
use crate::fetch::FetchOptions;
use crate::model::FetchTarget;
use crate::pipeline::{Pipeline, RunSummary};

pub async fn run(args: RunArgs) -> anyhow::Result<RunSummary> {
    let config = SiteConfig::load(&args.site).context("load site config")?;
    let pipeline = Pipeline::new(config)?;
    let summary = pipeline.run().await?;
    println!("{summary}");
    Ok(summary)
}

pub async fn corpus(args: CorpusArgs) -> anyhow::Result<()> {
    let config = SiteConfig::load(&args.site).context("load site config")?;
    let pipeline = Pipeline::new(config)?;
    let corpus = pipeline.aggregate().await?;
    crate::corpus::write_scratch(&args.corpus_out, corpus.text())?;
    tracing::info!(
        out = %args.corpus_out.display(),
        chunks = corpus.chunk_count(),
        failures = corpus.failures().len(),
        "wrote corpus"
    );
    Ok(())
}

pub fn links(args: LinksArgs) -> anyhow::Result<()> {
    let text = std::fs::read_to_string(&args.corpus)
        .with_context(|| format!("read corpus: {}", args.corpus.display()))?;
    let base_origin = Url::parse(&args.base_origin).context("parse --base-origin")?;

    let links = crate::links::extract_document_link_candidates(&text);
    let candidates = crate::pipeline::collect_candidates(links, &base_origin);
    tracing::debug!(
        found = candidates.found,
        duplicates = candidates.duplicates,
        invalid = candidates.invalid.len(),
        "collected candidates"
    );

    let mut stdout = std::io::stdout().lock();
    for target in &candidates.targets {
        writeln!(stdout, "{}", target.url).context("write candidate")?;
    }
    stdout.flush().context("flush stdout")?;
    Ok(())
}

pub async fn fetch(args: FetchArgs) -> anyhow::Result<RunSummary> {
    if args.download_timeout_secs == 0 {
        anyhow::bail!("--download-timeout-secs must be positive");
    }
    let targets = args
        .urls
        .iter()
        .map(|raw| FetchTarget::parse_document(raw).with_context(|| format!("parse url: {raw}")))
        .collect::<anyhow::Result<Vec<_>>>()?;

    let client = crate::http::build_client(&args.user_agent)?;
    let options = FetchOptions {
        timeout: Duration::from_secs(args.download_timeout_secs),
        accepted_content_types: SiteConfig::default().accepted_content_types,
    };
    let summary = crate::pipeline::fetch_urls(&client, &targets, &args.out, &options).await?;
    println!("{summary}");
    Ok(summary)
}
