use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context as _;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::cli::SiteArgs;

pub const DEFAULT_BASE_ORIGIN: &str = "https://itwperformancepolymers.com";
pub const DEFAULT_ENDPOINT: &str = "https://itwperformancepolymers.com/api/datasheets_table.php?m=get";
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/139.0.0.0 Safari/537.36";

/// Everything that describes one vendor's listing and where its documents go.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    /// Origin prepended to links that carry no host.
    pub base_origin: String,
    /// Listing API that answers form-encoded POSTs with markup.
    pub endpoint: String,
    /// `t` value of the primary listing request.
    pub primary_form_type: String,
    /// `t` value of each fragment request; the fragment id goes into `i`.
    pub fragment_form_type: String,
    /// `href` prefix that marks a fragment link in the primary payload.
    pub fragment_href_prefix: String,
    pub output_dir: PathBuf,
    /// Where the aggregated corpus is kept for inspection. `None` derives
    /// `<label>.html` from the base origin.
    pub scratch_file: Option<PathBuf>,
    /// Skip writing the scratch corpus altogether.
    pub keep_scratch: bool,
    pub user_agent: String,
    pub download_timeout_secs: u64,
    /// Per-request timeout against the listing API. Unbounded when unset.
    pub api_timeout_secs: Option<u64>,
    /// Substrings, any of which must appear in a download's `Content-Type`.
    pub accepted_content_types: Vec<String>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            base_origin: DEFAULT_BASE_ORIGIN.to_owned(),
            endpoint: DEFAULT_ENDPOINT.to_owned(),
            primary_form_type: "sds".to_owned(),
            fragment_form_type: "other".to_owned(),
            fragment_href_prefix: crate::links::DEFAULT_FRAGMENT_HREF_PREFIX.to_owned(),
            output_dir: PathBuf::from("PDFs"),
            scratch_file: None,
            keep_scratch: true,
            user_agent: DEFAULT_USER_AGENT.to_owned(),
            download_timeout_secs: 15 * 60,
            api_timeout_secs: None,
            accepted_content_types: vec![
                "binary/octet-stream".to_owned(),
                "application/pdf".to_owned(),
            ],
        }
    }
}

impl SiteConfig {
    /// Defaults, then the YAML file named by `--config`, then explicit flags.
    pub fn load(args: &SiteArgs) -> anyhow::Result<Self> {
        let mut config = match &args.config {
            Some(path) => Self::from_yaml_file(path)?,
            None => Self::default(),
        };
        config.apply_args(args);
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml_file(path: &Path) -> anyhow::Result<Self> {
        let yaml = std::fs::read_to_string(path)
            .with_context(|| format!("read config: {}", path.display()))?;
        serde_yaml::from_str(&yaml).with_context(|| format!("parse config: {}", path.display()))
    }

    fn apply_args(&mut self, args: &SiteArgs) {
        if let Some(base_origin) = &args.base_origin {
            self.base_origin = base_origin.clone();
        }
        if let Some(endpoint) = &args.endpoint {
            self.endpoint = endpoint.clone();
        }
        if let Some(out) = &args.out {
            self.output_dir = out.clone();
        }
        if let Some(scratch_file) = &args.scratch_file {
            self.scratch_file = Some(scratch_file.clone());
        }
        if args.no_scratch {
            self.keep_scratch = false;
        }
        if let Some(user_agent) = &args.user_agent {
            self.user_agent = user_agent.clone();
        }
        if let Some(secs) = args.download_timeout_secs {
            self.download_timeout_secs = secs;
        }
        if let Some(secs) = args.api_timeout_secs {
            self.api_timeout_secs = Some(secs);
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        parse_http_url(&self.base_origin).context("base_origin")?;
        parse_http_url(&self.endpoint).context("endpoint")?;
        if self.fragment_href_prefix.is_empty() {
            anyhow::bail!("fragment_href_prefix must not be empty");
        }
        if self.accepted_content_types.is_empty() {
            anyhow::bail!("accepted_content_types must not be empty");
        }
        if self.download_timeout_secs == 0 {
            anyhow::bail!("download_timeout_secs must be positive");
        }
        Ok(())
    }

    pub fn base_origin_url(&self) -> anyhow::Result<Url> {
        parse_http_url(&self.base_origin).context("base_origin")
    }

    pub fn endpoint_url(&self) -> anyhow::Result<Url> {
        parse_http_url(&self.endpoint).context("endpoint")
    }

    pub fn download_timeout(&self) -> Duration {
        Duration::from_secs(self.download_timeout_secs)
    }

    pub fn api_timeout(&self) -> Option<Duration> {
        self.api_timeout_secs.map(Duration::from_secs)
    }

    /// The scratch corpus path, or `None` when scratch output is disabled.
    pub fn scratch_path(&self) -> Option<PathBuf> {
        if !self.keep_scratch {
            return None;
        }
        if let Some(path) = &self.scratch_file {
            return Some(path.clone());
        }
        let label = registrable_label(&self.base_origin).unwrap_or_else(|| "corpus".to_owned());
        Some(PathBuf::from(format!("{label}.html")))
    }
}

fn parse_http_url(input: &str) -> anyhow::Result<Url> {
    let url = Url::parse(input).with_context(|| format!("parse url: {input}"))?;
    if url.scheme() != "http" && url.scheme() != "https" {
        anyhow::bail!("url must be http/https: {url}");
    }
    if url.host_str().is_none() {
        anyhow::bail!("url must have host: {url}");
    }
    Ok(url)
}

/// Second-to-last label of the host (`sub.example.com` -> `example`), or the
/// whole host when it has a single label.
///
/// This is not a public-suffix lookup: `shop.example.co.uk` yields `co`.
pub fn registrable_label(origin: &str) -> Option<String> {
    let url = Url::parse(origin).ok()?;
    let host = url.host_str()?;
    let labels = host.split('.').collect::<Vec<_>>();
    if labels.len() >= 2 {
        return Some(labels[labels.len() - 2].to_owned());
    }
    Some(host.to_owned())
}
