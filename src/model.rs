use std::fmt;
use std::path::PathBuf;

use url::Url;

use crate::error::FetchError;

/// What a request against the upstream is for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetKind {
    /// The listing payload that seeds the corpus.
    Primary,
    /// A follow-up listing fragment, keyed by an identifier found in the primary payload.
    Fragment { id: String },
    /// A binary document to download. `link` is the text as it appeared in
    /// the corpus; the local file name is derived from it, not from `url`.
    Document { link: String },
}

/// A single URL about to be requested. Created and consumed within one stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTarget {
    pub url: Url,
    pub kind: TargetKind,
}

impl FetchTarget {
    pub fn primary(url: Url) -> Self {
        Self {
            url,
            kind: TargetKind::Primary,
        }
    }

    pub fn fragment(url: Url, id: impl Into<String>) -> Self {
        Self {
            url,
            kind: TargetKind::Fragment { id: id.into() },
        }
    }

    pub fn document(url: Url, link: impl Into<String>) -> Self {
        Self {
            url,
            kind: TargetKind::Document { link: link.into() },
        }
    }

    /// A document target for a link that is already an absolute URL.
    pub fn parse_document(link: &str) -> Result<Self, url::ParseError> {
        Ok(Self::document(Url::parse(link)?, link))
    }

    /// The text a local file name is built from. Parsing percent-encodes
    /// spaces and non-ASCII characters, so documents keep their link text.
    pub fn file_name_source(&self) -> &str {
        match &self.kind {
            TargetKind::Document { link } => link,
            TargetKind::Primary | TargetKind::Fragment { .. } => self.url.as_str(),
        }
    }
}

impl fmt::Display for FetchTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            TargetKind::Primary => write!(f, "primary {}", self.url),
            TargetKind::Fragment { id } => write!(f, "fragment {id} at {}", self.url),
            TargetKind::Document { .. } => write!(f, "document {}", self.url),
        }
    }
}

/// A link candidate as matched in the corpus, before resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentLink {
    pub raw: String,
    pub has_host: bool,
}

impl DocumentLink {
    pub fn new(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let has_host = Url::parse(&raw)
            .ok()
            .is_some_and(|url| url.host_str().is_some_and(|host| !host.is_empty()));
        Self { raw, has_host }
    }
}

#[derive(Debug)]
pub enum DownloadOutcome {
    Downloaded { bytes: u64 },
    AlreadyExists,
    Failed(FetchError),
}

/// Result of one fetch attempt. Only reported, never persisted.
#[derive(Debug)]
pub struct DownloadResult {
    pub url: Url,
    pub path: PathBuf,
    pub outcome: DownloadOutcome,
}
