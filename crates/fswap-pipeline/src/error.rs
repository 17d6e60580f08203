//! Pipeline error types.

use thiserror::Error;

use fswap_api::ApiError;
use fswap_models::Stage;

pub type PipelineResult<T> = Result<T, PipelineError>;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Validation failed: {0}")]
    ValidationFailed(String),

    #[error("Remote task failed: {0}")]
    RemoteTaskFailed(String),

    #[error("Remote task canceled: {0}")]
    RemoteTaskCanceled(String),

    #[error("Gave up polling: {0}")]
    PollTimedOut(String),

    #[error("Media error: {0}")]
    Media(#[from] fswap_media::MediaError),

    #[error("Storage error: {0}")]
    Storage(#[from] fswap_storage::StorageError),

    #[error("API error: {0}")]
    Api(#[from] ApiError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl PipelineError {
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    pub fn validation_failed(msg: impl Into<String>) -> Self {
        Self::ValidationFailed(msg.into())
    }

    /// Which pipeline stage this error belongs to.
    pub fn stage(&self) -> Stage {
        match self {
            Self::ConfigError(_) | Self::ValidationFailed(_) | Self::Media(_) => Stage::Validation,
            Self::Storage(_) => Stage::Upload,
            Self::RemoteTaskFailed(_) | Self::RemoteTaskCanceled(_) => Stage::RemoteTask,
            Self::PollTimedOut(_) => Stage::Polling,
            Self::Api(e) => match e {
                ApiError::SubmissionFailed { .. } => Stage::Submission,
                ApiError::DownloadFailed { .. }
                | ApiError::IntegrityMismatch { .. }
                | ApiError::UrlExpired => Stage::Download,
                _ => Stage::Polling,
            },
            Self::Io(_) => Stage::Download,
        }
    }

    /// Whether resubmitting or retrying the same inputs can succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::ConfigError(_) | Self::ValidationFailed(_) | Self::Media(_) => false,
            // Failed tasks are not billed, so resubmission is safe
            Self::RemoteTaskFailed(_) => true,
            Self::RemoteTaskCanceled(_) => false,
            Self::PollTimedOut(_) => true,
            Self::Storage(_) => true,
            Self::Api(e) => e.is_retryable() || matches!(e, ApiError::UrlExpired),
            Self::Io(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_mapping() {
        assert_eq!(
            PipelineError::validation_failed("bad input").stage(),
            Stage::Validation
        );
        assert_eq!(
            PipelineError::RemoteTaskFailed("no face".into()).stage(),
            Stage::RemoteTask
        );
        assert_eq!(
            PipelineError::PollTimedOut("600s".into()).stage(),
            Stage::Polling
        );
        assert_eq!(
            PipelineError::Api(ApiError::UrlExpired).stage(),
            Stage::Download
        );
        assert_eq!(
            PipelineError::Api(ApiError::SubmissionFailed {
                status: 401,
                message: "bad key".into()
            })
            .stage(),
            Stage::Submission
        );
    }

    #[test]
    fn test_retryability() {
        assert!(!PipelineError::validation_failed("bad").is_retryable());
        assert!(PipelineError::RemoteTaskFailed("no face".into()).is_retryable());
        // Expired URLs require a resubmission, which is a retry of the run
        assert!(PipelineError::Api(ApiError::UrlExpired).is_retryable());
    }
}
