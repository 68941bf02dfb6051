use std::path::PathBuf;

use reqwest::StatusCode;

/// Coarse failure classes a run reports on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// DNS, connect, timeout or a broken body stream.
    Transport,
    /// The server answered, but not with what was asked for.
    Protocol,
    /// Creating or writing a local file failed.
    Filesystem,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ErrorKind::Transport => "transport",
            ErrorKind::Protocol => "protocol",
            ErrorKind::Filesystem => "filesystem",
        };
        f.write_str(name)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("unexpected status {0}")]
    Status(StatusCode),

    #[error("unexpected content type {}", .0.as_deref().unwrap_or("<none>"))]
    ContentType(Option<String>),

    #[error("response body is empty")]
    EmptyBody,

    #[error("write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl FetchError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            FetchError::Transport(_) => ErrorKind::Transport,
            FetchError::Status(_) | FetchError::ContentType(_) | FetchError::EmptyBody => {
                ErrorKind::Protocol
            }
            FetchError::Io { .. } => ErrorKind::Filesystem,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AggregateError {
    #[error("request failed: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("unexpected status {0}")]
    Status(StatusCode),

    #[error("read response body: {0}")]
    Body(#[source] reqwest::Error),
}

impl AggregateError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AggregateError::Transport(_) | AggregateError::Body(_) => ErrorKind::Transport,
            AggregateError::Status(_) => ErrorKind::Protocol,
        }
    }
}
