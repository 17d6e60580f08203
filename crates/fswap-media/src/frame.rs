//! First-frame extraction.
//!
//! Video face checks reuse the image detector by pulling the first frame out
//! to a temporary JPEG.

use std::path::Path;
use std::process::Stdio;
use tempfile::NamedTempFile;
use tokio::process::Command;
use tracing::debug;

use crate::error::{MediaError, MediaResult};

/// Extract the first frame of a video to a temporary JPEG file.
///
/// The returned handle deletes the frame when dropped.
pub async fn extract_first_frame(video_path: impl AsRef<Path>) -> MediaResult<NamedTempFile> {
    let video_path = video_path.as_ref();

    if !video_path.exists() {
        return Err(MediaError::FileNotFound(video_path.to_path_buf()));
    }

    which::which("ffmpeg").map_err(|_| MediaError::FfmpegNotFound)?;

    let frame = tempfile::Builder::new()
        .prefix("fswap-frame-")
        .suffix(".jpg")
        .tempfile()?;

    let output = Command::new("ffmpeg")
        .arg("-y")
        .arg("-i")
        .arg(video_path)
        .args(["-frames:v", "1", "-q:v", "2", "-loglevel", "error"])
        .arg(frame.path())
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await?;

    if !output.status.success() {
        return Err(MediaError::ffmpeg_failed(
            format!("first-frame extraction failed for {}", video_path.display()),
            Some(String::from_utf8_lossy(&output.stderr).to_string()),
        ));
    }

    // ffmpeg can exit zero without writing anything for streams it rejects
    if frame.as_file().metadata()?.len() == 0 {
        return Err(MediaError::InvalidVideo(
            "first frame could not be decoded".to_string(),
        ));
    }

    debug!(
        video = %video_path.display(),
        frame = %frame.path().display(),
        "Extracted first frame"
    );

    Ok(frame)
}
