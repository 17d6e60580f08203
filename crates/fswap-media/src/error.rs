//! Error types for media operations.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for media operations.
pub type MediaResult<T> = Result<T, MediaError>;

/// Errors that can occur while probing or validating media.
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("FFprobe not found in PATH")]
    FfprobeNotFound,

    #[error("FFmpeg not found in PATH")]
    FfmpegNotFound,

    #[error("FFprobe command failed: {message}")]
    FfprobeFailed {
        message: String,
        stderr: Option<String>,
    },

    #[error("FFmpeg command failed: {message}")]
    FfmpegFailed {
        message: String,
        stderr: Option<String>,
    },

    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Invalid image file: {0}")]
    InvalidImage(String),

    #[error("Invalid video file: {0}")]
    InvalidVideo(String),

    #[error("Face detection failed: {0}")]
    DetectionFailed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),
}

impl MediaError {
    /// Create an FFprobe failure error.
    pub fn ffprobe_failed(message: impl Into<String>, stderr: Option<String>) -> Self {
        Self::FfprobeFailed {
            message: message.into(),
            stderr,
        }
    }

    /// Create an FFmpeg failure error.
    pub fn ffmpeg_failed(message: impl Into<String>, stderr: Option<String>) -> Self {
        Self::FfmpegFailed {
            message: message.into(),
            stderr,
        }
    }

    /// Create a face detection failure error.
    pub fn detection_failed(message: impl Into<String>) -> Self {
        Self::DetectionFailed(message.into())
    }
}
