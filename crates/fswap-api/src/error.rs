//! Vendor API error types.

use thiserror::Error;

/// Result type for vendor API operations.
pub type ApiResult<T> = Result<T, ApiError>;

/// Errors that can occur while talking to the vendor.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Task submission failed ({status}): {message}")]
    SubmissionFailed { status: u16, message: String },

    #[error("Task query failed ({status}): {message}")]
    QueryFailed { status: u16, message: String },

    #[error("Malformed vendor response: {0}")]
    MalformedResponse(String),

    #[error("Download failed ({status}): {message}")]
    DownloadFailed { status: u16, message: String },

    #[error("Downloaded {actual} bytes but expected {expected}")]
    IntegrityMismatch { expected: u64, actual: u64 },

    #[error("Result URL has expired")]
    UrlExpired,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ApiError {
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedResponse(msg.into())
    }

    /// Whether retrying the same request could succeed.
    ///
    /// An expired URL is not retryable: the task must be resubmitted to get
    /// a fresh one.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::SubmissionFailed { status, .. }
            | Self::QueryFailed { status, .. }
            | Self::DownloadFailed { status, .. } => *status >= 500 || *status == 429,
            Self::Http(e) => e.is_timeout() || e.is_connect(),
            Self::IntegrityMismatch { .. } => true,
            Self::UrlExpired
            | Self::MalformedResponse(_)
            | Self::Io(_) => false,
        }
    }
}
