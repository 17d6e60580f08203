//! Local media file metadata.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Kind of input media accepted by the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    /// The person image whose face is swapped in.
    Image,
    /// The reference video driving the swap.
    Video,
}

impl MediaKind {
    /// Returns the kind name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Image => "image",
            MediaKind::Video => "video",
        }
    }

    /// File extensions the vendor accepts for this kind (lowercase, no dot).
    pub fn allowed_extensions(&self) -> &'static [&'static str] {
        match self {
            MediaKind::Image => &["jpg", "jpeg", "png", "bmp", "webp"],
            MediaKind::Video => &["mp4", "avi", "mov"],
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Probed metadata for a local media file.
///
/// Produced by `fswap-media` probing; immutable once built. The validator
/// and cost estimation read from it, nothing writes to it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaFile {
    /// Local filesystem path
    pub path: PathBuf,
    /// Image or video
    pub kind: MediaKind,
    /// Lowercase extension without the dot
    pub extension: String,
    /// File size in bytes
    pub size_bytes: u64,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Duration in seconds; `None` for images
    pub duration: Option<f64>,
    /// Faces found in the image (or first video frame) when detection ran
    pub face_count: Option<usize>,
}

impl MediaFile {
    /// Aspect ratio as longer side over shorter side (always >= 1.0).
    ///
    /// Returns 0.0 when either dimension is unknown so that bound checks
    /// against a minimum ratio of 1.0 fail loudly rather than divide by zero.
    pub fn aspect_ratio(&self) -> f64 {
        let (w, h) = (self.width as f64, self.height as f64);
        if w <= 0.0 || h <= 0.0 {
            return 0.0;
        }
        if w >= h {
            w / h
        } else {
            h / w
        }
    }
}

/// Format a byte count for human-readable output (e.g. "1.50 MB").
pub fn format_file_size(size_bytes: u64) -> String {
    let mut size = size_bytes as f64;
    for unit in ["B", "KB", "MB", "GB"] {
        if size < 1024.0 {
            return format!("{:.2} {}", size, unit);
        }
        size /= 1024.0;
    }
    format!("{:.2} TB", size)
}
