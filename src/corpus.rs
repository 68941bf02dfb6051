//! Builds the text corpus for one run: the primary listing payload followed by
//! every fragment it links to.

use std::io::Write as _;
use std::path::Path;
use std::time::Duration;

use anyhow::Context as _;
use url::Url;

use crate::error::AggregateError;
use crate::links::FragmentIdPattern;
use crate::model::{FetchTarget, TargetKind};

/// Concatenated response bodies, one chunk per request, each followed by `\n`.
///
/// Chunks are only ever appended while aggregating; readers get the finished
/// text through [`Corpus::text`].
#[derive(Debug, Default)]
pub struct Corpus {
    text: String,
    chunks: usize,
    failures: Vec<ChunkFailure>,
}

/// A request whose body could not be obtained. It contributed an empty chunk.
#[derive(Debug)]
pub struct ChunkFailure {
    pub target: FetchTarget,
    pub error: AggregateError,
}

impl Corpus {
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks
    }

    pub fn failures(&self) -> &[ChunkFailure] {
        &self.failures
    }

    fn push_chunk(&mut self, body: &str) {
        self.text.push_str(body);
        self.text.push('\n');
        self.chunks += 1;
    }

    fn push_failure(&mut self, target: FetchTarget, error: AggregateError) {
        self.push_chunk("");
        self.failures.push(ChunkFailure { target, error });
    }
}

/// Form values sent to the listing endpoint.
#[derive(Debug, Clone)]
pub struct ListingForms {
    /// `t` for the primary request.
    pub primary_type: String,
    /// `t` for fragment requests; the id goes into `i`.
    pub fragment_type: String,
}

pub struct Aggregator<'a> {
    client: &'a reqwest::Client,
    endpoint: Url,
    forms: ListingForms,
    pattern: FragmentIdPattern,
    timeout: Option<Duration>,
}

impl<'a> Aggregator<'a> {
    pub fn new(
        client: &'a reqwest::Client,
        endpoint: Url,
        forms: ListingForms,
        pattern: FragmentIdPattern,
    ) -> Self {
        Self {
            client,
            endpoint,
            forms,
            pattern,
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Fetches the primary payload, then one fragment per identifier found in
    /// it, in order. Failed requests leave an empty chunk and are recorded in
    /// [`Corpus::failures`]; aggregation itself never fails.
    pub async fn build_corpus(&self) -> Corpus {
        let mut corpus = Corpus::default();

        let primary = FetchTarget::primary(self.endpoint.clone());
        let primary_body = match self.fetch_chunk(&primary).await {
            Ok(body) => body,
            Err(error) => {
                corpus.push_failure(primary, error);
                return corpus;
            }
        };
        corpus.push_chunk(&primary_body);

        let fragment_ids = self.pattern.extract(&primary_body);
        tracing::debug!(count = fragment_ids.len(), "found fragment ids");

        for id in fragment_ids {
            let target = FetchTarget::fragment(self.endpoint.clone(), id);
            match self.fetch_chunk(&target).await {
                Ok(body) => corpus.push_chunk(&body),
                Err(error) => corpus.push_failure(target, error),
            }
        }

        corpus
    }

    async fn fetch_chunk(&self, target: &FetchTarget) -> Result<String, AggregateError> {
        let form: Vec<(&str, &str)> = match &target.kind {
            TargetKind::Fragment { id } => {
                vec![("t", self.forms.fragment_type.as_str()), ("i", id.as_str())]
            }
            TargetKind::Primary | TargetKind::Document { .. } => {
                vec![("t", self.forms.primary_type.as_str())]
            }
        };

        let mut request = self.client.post(target.url.clone()).form(&form);
        if let Some(timeout) = self.timeout {
            request = request.timeout(timeout);
        }

        let response = request.send().await.map_err(AggregateError::Transport)?;
        let status = response.status();
        if !status.is_success() {
            return Err(AggregateError::Status(status));
        }
        response.text().await.map_err(AggregateError::Body)
    }
}

/// Replaces `path` with the corpus text. The file is assembled next to its
/// destination and renamed into place.
pub fn write_scratch(path: &Path, text: &str) -> anyhow::Result<()> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(parent)
        .with_context(|| format!("create scratch parent dir: {}", parent.display()))?;

    let mut tmp = tempfile::NamedTempFile::new_in(parent)
        .with_context(|| format!("create temp file in: {}", parent.display()))?;
    tmp.write_all(text.as_bytes()).context("write scratch corpus")?;
    tmp.persist(path)
        .map_err(|err| err.error)
        .with_context(|| format!("persist scratch corpus: {}", path.display()))?;
    Ok(())
}

/// Removes a scratch file left by a previous run. A missing file is fine.
pub fn remove_scratch(path: &Path) -> anyhow::Result<()> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(err) => {
            Err(err).with_context(|| format!("remove scratch corpus: {}", path.display()))
        }
    }
}
