//! Error types shared across the crate.
//!
//! Most fallible paths use `anyhow` with context, like the rest of the file
//! and network plumbing here. The typed variants below exist for the retry
//! executor, which must tell transient upstream failures apart from
//! everything else without parsing message text.

use thiserror::Error;

pub type Error = anyhow::Error;
pub type Result<T> = std::result::Result<T, Error>;

/// Failures surfaced by the HTTP collaborators (bank, weather, Telegram).
#[derive(Debug, Error)]
pub enum ApiError {
    /// The upstream service answered 503 or an equivalent maintenance status.
    #[error("service unavailable (HTTP {status})")]
    Unavailable { status: u16 },

    /// The request did not complete within the configured per-call timeout.
    #[error("request timed out after {seconds}s")]
    Timeout { seconds: u64 },

    /// The response body was not the advertised JSON payload. The bank's
    /// gateway serves an HTML maintenance page during nightly maintenance.
    #[error("unexpected content type '{content_type}'")]
    BadContentType { content_type: String },

    /// Any other non-success HTTP status.
    #[error("unexpected HTTP status {status}")]
    Status { status: u16 },
}

impl ApiError {
    /// True for failures that are worth retrying with backoff.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ApiError::Unavailable { .. } | ApiError::Timeout { .. } | ApiError::BadContentType { .. }
        )
    }
}

/// Attached by the retry executor when every attempt failed transiently.
/// The last upstream failure remains available through the error chain.
#[derive(Debug, Error)]
#[error("giving up after {attempts} attempts")]
pub struct RetriesExhausted {
    pub attempts: u32,
}
