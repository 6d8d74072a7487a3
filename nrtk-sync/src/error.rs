//! Error types for nrtk-sync.

use std::path::PathBuf;

use thiserror::Error;

use nrtk_core::ValidationError;
use nrtk_renderer::RenderError;

/// Transport-level failure: nothing usable came back from the content API.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Connection, DNS, TLS or timeout failure.
    #[error("failed to fetch {url}: {message}")]
    Transport { url: String, message: String },

    /// The response body could not be read to the end.
    #[error("failed to read response body from {url}: {source}")]
    Body {
        url: String,
        #[source]
        source: std::io::Error,
    },

    /// The response body is not UTF-8, so it cannot be JSON.
    #[error("response body from {url} is not valid UTF-8: {source}")]
    Encoding {
        url: String,
        #[source]
        source: std::string::FromUtf8Error,
    },
}

/// All errors that can abort a sync cycle.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("render error: {0}")]
    Render(#[from] RenderError),

    /// An I/O error, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Convenience constructor for [`SyncError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> SyncError {
    SyncError::Io {
        path: path.into(),
        source,
    }
}
