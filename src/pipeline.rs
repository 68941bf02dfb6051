//! Drives one harvest: prepare the output directory, aggregate the listing,
//! extract and de-duplicate candidates, then fetch them one at a time.

use std::collections::HashSet;
use std::fmt;
use std::path::Path;

use anyhow::Context as _;
use url::Url;

use crate::config::SiteConfig;
use crate::corpus::{Aggregator, Corpus, ListingForms};
use crate::fetch::FetchOptions;
use crate::links::FragmentIdPattern;
use crate::model::{DocumentLink, DownloadOutcome, DownloadResult, FetchTarget};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    PrepareOutput,
    Aggregate,
    ExtractAndDedupe,
    FetchEach,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::PrepareOutput => "prepare_output",
            Stage::Aggregate => "aggregate",
            Stage::ExtractAndDedupe => "extract_and_dedupe",
            Stage::FetchEach => "fetch_each",
        };
        f.write_str(name)
    }
}

/// Download candidates left after resolution and de-duplication, in corpus order.
#[derive(Debug, Default)]
pub struct Candidates {
    pub targets: Vec<FetchTarget>,
    pub found: usize,
    pub duplicates: usize,
    pub invalid: Vec<String>,
}

/// Turns raw corpus links into fetch targets.
///
/// Links are de-duplicated by exact text first. Links without a host are
/// resolved against `base_origin`; anything that does not then parse as an
/// `http(s)` URL with a host is dropped into [`Candidates::invalid`]. Two raw
/// links resolving to the same URL are fetched once.
pub fn collect_candidates(links: Vec<DocumentLink>, base_origin: &Url) -> Candidates {
    let mut candidates = Candidates {
        found: links.len(),
        ..Candidates::default()
    };
    let mut seen_raw = HashSet::new();
    let mut seen_resolved = HashSet::new();

    for link in links {
        if !seen_raw.insert(link.raw.clone()) {
            candidates.duplicates += 1;
            continue;
        }

        let Some(url) = resolve_link(&link, base_origin) else {
            candidates.invalid.push(link.raw);
            continue;
        };
        if !seen_resolved.insert(url.as_str().to_owned()) {
            candidates.duplicates += 1;
            continue;
        }
        candidates.targets.push(FetchTarget::document(url, link.raw));
    }

    candidates
}

/// Qualifies a link that has no host with `base_origin` and checks that the
/// result is a fetchable URL.
pub fn resolve_link(link: &DocumentLink, base_origin: &Url) -> Option<Url> {
    let url = if link.has_host {
        Url::parse(&link.raw).ok()?
    } else {
        base_origin.join(&link.raw).ok()?
    };

    if url.scheme() != "http" && url.scheme() != "https" {
        return None;
    }
    url.host_str().filter(|host| !host.is_empty())?;
    Some(url)
}

/// Tally of one run, logged at the end and printed by the CLI.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub chunks: usize,
    pub chunk_failures: usize,
    pub links_found: usize,
    pub duplicates: usize,
    pub invalid: usize,
    pub downloaded: usize,
    pub already_present: usize,
    pub failed: usize,
    pub bytes: u64,
}

impl RunSummary {
    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }

    pub fn record(&mut self, result: &DownloadResult) {
        match &result.outcome {
            DownloadOutcome::Downloaded { bytes } => {
                self.downloaded += 1;
                self.bytes += bytes;
            }
            DownloadOutcome::AlreadyExists => self.already_present += 1,
            DownloadOutcome::Failed(_) => self.failed += 1,
        }
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "downloaded={} already_present={} failed={} bytes={} links={} duplicates={} invalid={} chunks={} chunk_failures={}",
            self.downloaded,
            self.already_present,
            self.failed,
            self.bytes,
            self.links_found,
            self.duplicates,
            self.invalid,
            self.chunks,
            self.chunk_failures,
        )
    }
}

pub struct Pipeline {
    config: SiteConfig,
    client: reqwest::Client,
}

impl Pipeline {
    pub fn new(config: SiteConfig) -> anyhow::Result<Self> {
        config.validate().context("validate site config")?;
        let client = crate::http::build_client(&config.user_agent)?;
        Ok(Self { config, client })
    }

    /// Runs every stage in order. Only setup problems (an unusable output
    /// directory or scratch file) are returned as errors; individual request
    /// and download failures are counted in the summary.
    pub async fn run(&self) -> anyhow::Result<RunSummary> {
        let mut summary = RunSummary::default();

        tracing::info!(stage = %Stage::PrepareOutput, out = %self.config.output_dir.display(), "harvest");
        prepare_output_dir(&self.config.output_dir)?;
        let scratch_path = self.config.scratch_path();
        if let Some(path) = &scratch_path {
            crate::corpus::remove_scratch(path)?;
        }

        tracing::info!(stage = %Stage::Aggregate, endpoint = %self.config.endpoint, "harvest");
        let corpus = self.aggregate().await?;
        summary.chunks = corpus.chunk_count();
        summary.chunk_failures = corpus.failures().len();
        if let Some(path) = &scratch_path {
            crate::corpus::write_scratch(path, corpus.text())?;
            tracing::debug!(path = %path.display(), "wrote scratch corpus");
        }

        tracing::info!(stage = %Stage::ExtractAndDedupe, "harvest");
        let links = crate::links::extract_document_link_candidates(corpus.text());
        let candidates = collect_candidates(links, &self.config.base_origin_url()?);
        for raw in &candidates.invalid {
            tracing::debug!(link = %raw, "dropping invalid link");
        }
        summary.links_found = candidates.found;
        summary.duplicates = candidates.duplicates;
        summary.invalid = candidates.invalid.len();
        tracing::info!(
            found = candidates.found,
            unique = candidates.targets.len(),
            "extracted document links"
        );

        tracing::info!(stage = %Stage::FetchEach, count = candidates.targets.len(), "harvest");
        let options = FetchOptions::from_config(&self.config);
        for target in &candidates.targets {
            let result =
                crate::fetch::fetch(&self.client, target, &self.config.output_dir, &options).await;
            log_download(&result);
            summary.record(&result);
        }

        tracing::info!(%summary, "harvest finished");
        Ok(summary)
    }

    /// The aggregation stage on its own. Failed requests are logged here and
    /// left as empty chunks in the corpus.
    pub async fn aggregate(&self) -> anyhow::Result<Corpus> {
        let pattern = FragmentIdPattern::new(&self.config.fragment_href_prefix)
            .context("build fragment id pattern")?;
        let forms = ListingForms {
            primary_type: self.config.primary_form_type.clone(),
            fragment_type: self.config.fragment_form_type.clone(),
        };
        let corpus = Aggregator::new(&self.client, self.config.endpoint_url()?, forms, pattern)
            .with_timeout(self.config.api_timeout())
            .build_corpus()
            .await;

        for failure in corpus.failures() {
            tracing::warn!(
                request = %failure.target,
                kind = %failure.error.kind(),
                error = %failure.error,
                "listing request failed"
            );
        }
        tracing::info!(
            chunks = corpus.chunk_count(),
            bytes = corpus.text().len(),
            "aggregated corpus"
        );
        Ok(corpus)
    }
}

/// Downloads `targets` in order into `out_dir`, creating it if needed.
/// Targets with the same URL are fetched once.
pub async fn fetch_urls(
    client: &reqwest::Client,
    targets: &[FetchTarget],
    out_dir: &Path,
    options: &FetchOptions,
) -> anyhow::Result<RunSummary> {
    prepare_output_dir(out_dir)?;

    let mut summary = RunSummary::default();
    let mut seen = HashSet::new();
    for target in targets {
        if !seen.insert(target.url.as_str()) {
            summary.duplicates += 1;
            continue;
        }
        let result = crate::fetch::fetch(client, target, out_dir, options).await;
        log_download(&result);
        summary.record(&result);
    }
    Ok(summary)
}

pub fn prepare_output_dir(dir: &Path) -> anyhow::Result<()> {
    let mut builder = std::fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt as _;
        builder.mode(0o755);
    }
    builder
        .create(dir)
        .with_context(|| format!("create output dir: {}", dir.display()))
}

fn log_download(result: &DownloadResult) {
    match &result.outcome {
        DownloadOutcome::Downloaded { bytes } => tracing::info!(
            url = %result.url,
            path = %result.path.display(),
            bytes,
            "downloaded"
        ),
        DownloadOutcome::AlreadyExists => tracing::info!(
            url = %result.url,
            path = %result.path.display(),
            "already exists; skipping"
        ),
        DownloadOutcome::Failed(err) => tracing::warn!(
            url = %result.url,
            kind = %err.kind(),
            error = %err,
            "download failed"
        ),
    }
}
