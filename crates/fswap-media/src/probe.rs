//! Media metadata probing.
//!
//! Videos go through `ffprobe -print_format json`; images are decoded just
//! far enough to read their header dimensions.

use serde::Deserialize;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;

use crate::error::{MediaError, MediaResult};
use fswap_models::{MediaFile, MediaKind};

/// FFprobe JSON output format.
#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    format: FfprobeFormat,
    streams: Vec<FfprobeStream>,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    codec_type: String,
    width: Option<u32>,
    height: Option<u32>,
}

/// Probe a local media file and build its immutable metadata record.
///
/// Face counts are not filled in here; the validator adds them when a
/// detector is configured.
pub async fn probe_media(path: impl AsRef<Path>, kind: MediaKind) -> MediaResult<MediaFile> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(MediaError::FileNotFound(path.to_path_buf()));
    }

    let extension = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    let size_bytes = tokio::fs::metadata(path).await?.len();

    let (width, height, duration) = match kind {
        MediaKind::Image => {
            let (w, h) = probe_image_dimensions(path).await?;
            (w, h, None)
        }
        MediaKind::Video => {
            let (w, h, d) = probe_video_stream(path).await?;
            (w, h, Some(d))
        }
    };

    Ok(MediaFile {
        path: path.to_path_buf(),
        kind,
        extension,
        size_bytes,
        width,
        height,
        duration,
        face_count: None,
    })
}

/// Read image dimensions from the file header without a full decode.
async fn probe_image_dimensions(path: &Path) -> MediaResult<(u32, u32)> {
    let path = path.to_path_buf();
    tokio::task::spawn_blocking(move || {
        image::image_dimensions(&path)
            .map_err(|e| MediaError::InvalidImage(format!("{}: {}", path.display(), e)))
    })
    .await
    .map_err(|e| MediaError::InvalidImage(format!("probe task panicked: {}", e)))?
}

/// Extract width, height and duration of the first video stream via ffprobe.
async fn probe_video_stream(path: &Path) -> MediaResult<(u32, u32, f64)> {
    which::which("ffprobe").map_err(|_| MediaError::FfprobeNotFound)?;

    let output = Command::new("ffprobe")
        .args([
            "-v",
            "quiet",
            "-print_format",
            "json",
            "-show_format",
            "-show_streams",
        ])
        .arg(path)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await?;

    if !output.status.success() {
        return Err(MediaError::ffprobe_failed(
            format!("ffprobe exited nonzero for {}", path.display()),
            Some(String::from_utf8_lossy(&output.stderr).to_string()),
        ));
    }

    let probe: FfprobeOutput = serde_json::from_slice(&output.stdout)?;

    let stream = probe
        .streams
        .iter()
        .find(|s| s.codec_type == "video")
        .ok_or_else(|| MediaError::InvalidVideo("no video stream found".to_string()))?;

    let duration = probe
        .format
        .duration
        .as_deref()
        .and_then(parse_duration)
        .ok_or_else(|| MediaError::InvalidVideo("could not determine duration".to_string()))?;

    Ok((
        stream.width.unwrap_or(0),
        stream.height.unwrap_or(0),
        duration,
    ))
}

fn parse_duration(s: &str) -> Option<f64> {
    let d: f64 = s.parse().ok()?;
    if d.is_finite() && d >= 0.0 {
        Some(d)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_duration() {
        assert!((parse_duration("12.480000").unwrap() - 12.48).abs() < 1e-9);
        assert_eq!(parse_duration("N/A"), None);
        assert_eq!(parse_duration("-1.0"), None);
    }

    #[test]
    fn test_ffprobe_json_shape() {
        // Matches the subset of ffprobe output this module reads
        let raw = r#"{
            "format": {"duration": "5.000000"},
            "streams": [
                {"codec_type": "audio"},
                {"codec_type": "video", "width": 1280, "height": 720}
            ]
        }"#;
        let parsed: FfprobeOutput = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.streams.len(), 2);
        let video = parsed
            .streams
            .iter()
            .find(|s| s.codec_type == "video")
            .unwrap();
        assert_eq!(video.width, Some(1280));
        assert_eq!(parsed.format.duration.as_deref(), Some("5.000000"));
    }

    #[tokio::test]
    async fn test_probe_missing_file() {
        let err = probe_media("/nonexistent/input.mp4", MediaKind::Video)
            .await
            .unwrap_err();
        assert!(matches!(err, MediaError::FileNotFound(_)));
    }

    #[tokio::test]
    async fn test_probe_image_dimensions() {
        // 2x3 PNG written through the image crate itself
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tiny.png");
        let img = image::RgbImage::new(2, 3);
        img.save(&path).unwrap();

        let file = probe_media(&path, MediaKind::Image).await.unwrap();
        assert_eq!((file.width, file.height), (2, 3));
        assert_eq!(file.extension, "png");
        assert!(file.duration.is_none());
        assert!(file.size_bytes > 0);
    }
}
