//! Error types for nrtk-core.

use thiserror::Error;

/// Reasons a fetched payload is rejected before it can drive a sync.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// The transport answered with something other than HTTP 200.
    #[error("bad API response code: {status}")]
    Http { status: u16 },

    /// The body is not JSON.
    #[error("bad API response, JSON expected ({source}) in {excerpt}...")]
    Format {
        excerpt: String,
        #[source]
        source: serde_json::Error,
    },

    /// A required field is missing or has the wrong shape.
    #[error("{reason} in {excerpt}...")]
    Schema { reason: String, excerpt: String },
}
