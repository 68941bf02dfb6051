//! Validated, idempotent document downloads.

use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::StatusCode;
use reqwest::header::CONTENT_TYPE;
use url::Url;

use crate::error::FetchError;
use crate::model::{DownloadOutcome, DownloadResult, FetchTarget};

#[derive(Debug, Clone)]
pub struct FetchOptions {
    pub timeout: Duration,
    /// A response is accepted when its `Content-Type` contains any of these.
    pub accepted_content_types: Vec<String>,
}

impl FetchOptions {
    pub fn from_config(config: &crate::config::SiteConfig) -> Self {
        Self {
            timeout: config.download_timeout(),
            accepted_content_types: config.accepted_content_types.clone(),
        }
    }

    fn accepts(&self, content_type: &str) -> bool {
        let content_type = content_type.to_ascii_lowercase();
        self.accepted_content_types
            .iter()
            .any(|accepted| content_type.contains(&accepted.to_ascii_lowercase()))
    }
}

/// Where a document linked as `link` lands inside `out_dir`.
pub fn destination_path(link: &str, out_dir: &Path) -> PathBuf {
    out_dir.join(crate::sanitize::sanitize(link))
}

/// Downloads `target` into `out_dir` unless its destination file already
/// exists. The destination is named after [`FetchTarget::file_name_source`].
///
/// The whole body is buffered and checked before anything is created on
/// disk, and the destination only appears once fully written. Every failure
/// is reported through [`DownloadOutcome::Failed`].
pub async fn fetch(
    client: &reqwest::Client,
    target: &FetchTarget,
    out_dir: &Path,
    options: &FetchOptions,
) -> DownloadResult {
    let url = &target.url;
    let path = destination_path(target.file_name_source(), out_dir);

    let outcome = if path.is_file() {
        DownloadOutcome::AlreadyExists
    } else {
        download(client, url, &path, options)
            .await
            .unwrap_or_else(DownloadOutcome::Failed)
    };

    DownloadResult {
        url: url.clone(),
        path,
        outcome,
    }
}

async fn download(
    client: &reqwest::Client,
    url: &Url,
    path: &Path,
    options: &FetchOptions,
) -> Result<DownloadOutcome, FetchError> {
    let response = client
        .get(url.clone())
        .timeout(options.timeout)
        .send()
        .await
        .map_err(FetchError::Transport)?;

    let status = response.status();
    if status != StatusCode::OK {
        return Err(FetchError::Status(status));
    }

    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);
    match content_type.as_deref() {
        Some(value) if options.accepts(value) => {}
        _ => return Err(FetchError::ContentType(content_type)),
    }

    let body = response.bytes().await.map_err(FetchError::Transport)?;
    if body.is_empty() {
        return Err(FetchError::EmptyBody);
    }
    tracing::debug!(%url, bytes = body.len(), "buffered document");

    write_new_file(path, &body)
}

/// Writes `data` to a temp file beside `path` and links it into place only if
/// `path` does not exist yet.
fn write_new_file(path: &Path, data: &[u8]) -> Result<DownloadOutcome, FetchError> {
    let io_err = |source| FetchError::Io {
        path: path.to_path_buf(),
        source,
    };

    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(io_err)?;
    tmp.write_all(data).map_err(io_err)?;
    tmp.flush().map_err(io_err)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt as _;
        tmp.as_file()
            .set_permissions(std::fs::Permissions::from_mode(0o644))
            .map_err(io_err)?;
    }

    match tmp.persist_noclobber(path) {
        Ok(_) => Ok(DownloadOutcome::Downloaded {
            bytes: data.len() as u64,
        }),
        Err(err) if err.error.kind() == std::io::ErrorKind::AlreadyExists => {
            Ok(DownloadOutcome::AlreadyExists)
        }
        Err(err) => Err(io_err(err.error)),
    }
}
