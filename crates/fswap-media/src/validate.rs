//! Bounded-range validation against vendor input limits.

use std::path::Path;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::MediaError;
use crate::faces::FaceCounter;
use crate::frame::extract_first_frame;
use crate::probe::probe_media;
use fswap_models::media::format_file_size;
use fswap_models::{MediaFile, MediaKind, Rule, ValidationResult};

/// Per-kind validation bounds. Defaults are the vendor's published limits.
#[derive(Debug, Clone)]
pub struct MediaLimits {
    /// Maximum image file size in bytes
    pub image_max_file_size: u64,
    /// Minimum image dimension in pixels
    pub image_min_dimension: u32,
    /// Maximum image dimension in pixels
    pub image_max_dimension: u32,
    /// Maximum video file size in bytes
    pub video_max_file_size: u64,
    /// Minimum video dimension in pixels
    pub video_min_dimension: u32,
    /// Maximum video dimension in pixels
    pub video_max_dimension: u32,
    /// Minimum video duration in seconds (inclusive)
    pub video_min_duration: f64,
    /// Maximum video duration in seconds (inclusive)
    pub video_max_duration: f64,
    /// Maximum longer-over-shorter side ratio
    pub max_aspect_ratio: f64,
    /// Exact face count required when detection is enabled
    pub required_face_count: usize,
}

impl Default for MediaLimits {
    fn default() -> Self {
        Self {
            image_max_file_size: 5 * 1024 * 1024,
            image_min_dimension: 200,
            image_max_dimension: 4096,
            video_max_file_size: 200 * 1024 * 1024,
            video_min_dimension: 200,
            video_max_dimension: 2048,
            video_min_duration: 2.0,
            video_max_duration: 30.0,
            max_aspect_ratio: 3.0,
            required_face_count: 1,
        }
    }
}

impl MediaLimits {
    fn max_file_size(&self, kind: MediaKind) -> u64 {
        match kind {
            MediaKind::Image => self.image_max_file_size,
            MediaKind::Video => self.video_max_file_size,
        }
    }

    fn dimension_range(&self, kind: MediaKind) -> (u32, u32) {
        match kind {
            MediaKind::Image => (self.image_min_dimension, self.image_max_dimension),
            MediaKind::Video => (self.video_min_dimension, self.video_max_dimension),
        }
    }
}

/// Validates local media files before any network call is made.
///
/// Short-circuits on the first violation by default; strict mode collects
/// every failing check instead.
pub struct Validator {
    limits: MediaLimits,
    face_counter: Option<Arc<dyn FaceCounter>>,
    strict: bool,
}

impl Validator {
    pub fn new(limits: MediaLimits) -> Self {
        Self {
            limits,
            face_counter: None,
            strict: false,
        }
    }

    /// Attach a face detector. Without one, face checks are skipped.
    pub fn with_face_counter(mut self, counter: Arc<dyn FaceCounter>) -> Self {
        self.face_counter = Some(counter);
        self
    }

    /// Collect all violations instead of stopping at the first.
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Probe a file and validate it, returning the metadata when probing
    /// succeeded alongside the verdict.
    pub async fn inspect(
        &self,
        path: &Path,
        kind: MediaKind,
    ) -> (Option<MediaFile>, ValidationResult) {
        if !path.exists() {
            return (
                None,
                ValidationResult::rejected(
                    Rule::Missing,
                    format!("file not found: {}", path.display()),
                ),
            );
        }

        let mut file = match probe_media(path, kind).await {
            Ok(file) => file,
            Err(MediaError::FileNotFound(p)) => {
                return (
                    None,
                    ValidationResult::rejected(
                        Rule::Missing,
                        format!("file not found: {}", p.display()),
                    ),
                );
            }
            Err(e) => {
                return (
                    None,
                    ValidationResult::rejected(
                        Rule::Unreadable,
                        format!("failed to read {}: {}", kind, e),
                    ),
                );
            }
        };

        let mut result = self.validate_metadata(&file);

        // Face detection is the expensive check; only run it on files that
        // already pass the metadata checks.
        if result.is_valid() {
            self.apply_face_check(&mut file, &mut result).await;
        }

        if result.is_valid() {
            debug!(path = %path.display(), kind = %kind, "Validation passed");
        } else {
            debug!(
                path = %path.display(),
                kind = %kind,
                reason = %result.summary(),
                "Validation failed"
            );
        }

        (Some(file), result)
    }

    /// Validate a file, discarding the probed metadata.
    pub async fn validate(&self, path: &Path, kind: MediaKind) -> ValidationResult {
        self.inspect(path, kind).await.1
    }

    /// Pure checks over already-probed metadata.
    pub fn validate_metadata(&self, file: &MediaFile) -> ValidationResult {
        let mut result = ValidationResult::ok();
        let kind = file.kind;

        let allowed = kind.allowed_extensions();
        if !allowed.contains(&file.extension.as_str()) {
            result.push(
                Rule::Extension,
                format!(
                    "invalid {} format: {}; allowed: {}",
                    kind,
                    if file.extension.is_empty() {
                        "(none)"
                    } else {
                        &file.extension
                    },
                    allowed.join(", ")
                ),
            );
            if !self.strict {
                return result;
            }
        }

        let max_size = self.limits.max_file_size(kind);
        if file.size_bytes > max_size {
            result.push(
                Rule::FileSize,
                format!(
                    "file size {} exceeds maximum {}",
                    format_file_size(file.size_bytes),
                    format_file_size(max_size)
                ),
            );
            if !self.strict {
                return result;
            }
        }

        let (min_dim, max_dim) = self.limits.dimension_range(kind);
        if file.width < min_dim || file.height < min_dim {
            result.push(
                Rule::Dimensions,
                format!(
                    "dimensions {}x{} below minimum dimension {}",
                    file.width, file.height, min_dim
                ),
            );
            if !self.strict {
                return result;
            }
        } else if file.width > max_dim || file.height > max_dim {
            result.push(
                Rule::Dimensions,
                format!(
                    "dimensions {}x{} exceed maximum dimension {}",
                    file.width, file.height, max_dim
                ),
            );
            if !self.strict {
                return result;
            }
        }

        let ratio = file.aspect_ratio();
        if ratio > self.limits.max_aspect_ratio {
            result.push(
                Rule::AspectRatio,
                format!(
                    "aspect ratio {:.2} exceeds maximum {:.1}",
                    ratio, self.limits.max_aspect_ratio
                ),
            );
            if !self.strict {
                return result;
            }
        }

        if kind == MediaKind::Video {
            match file.duration {
                Some(d) if d < self.limits.video_min_duration => {
                    result.push(
                        Rule::Duration,
                        format!(
                            "duration {:.1}s below minimum {:.0}s",
                            d, self.limits.video_min_duration
                        ),
                    );
                }
                Some(d) if d > self.limits.video_max_duration => {
                    result.push(
                        Rule::Duration,
                        format!(
                            "duration {:.1}s exceeds maximum {:.0}s",
                            d, self.limits.video_max_duration
                        ),
                    );
                }
                Some(_) => {}
                None => {
                    result.push(Rule::Unreadable, "video duration unknown".to_string());
                }
            }
            if !self.strict && !result.is_valid() {
                return result;
            }
        }

        result
    }

    /// Run the configured face detector and record its verdict.
    ///
    /// Detector failures are logged and skipped rather than failing the file,
    /// so a broken detector install never blocks otherwise valid inputs.
    async fn apply_face_check(&self, file: &mut MediaFile, result: &mut ValidationResult) {
        let Some(counter) = &self.face_counter else {
            return;
        };

        let count = match file.kind {
            MediaKind::Image => counter.count_faces(&file.path).await,
            MediaKind::Video => match extract_first_frame(&file.path).await {
                Ok(frame) => counter.count_faces(frame.path()).await,
                Err(e) => Err(e),
            },
        };

        match count {
            Ok(count) => {
                file.face_count = Some(count);
                let required = self.limits.required_face_count;
                if count == 0 {
                    result.push(
                        Rule::FaceCount,
                        format!("no face detected; exactly {} required", required),
                    );
                } else if count != required {
                    result.push(
                        Rule::FaceCount,
                        format!("{} faces detected; exactly {} required", count, required),
                    );
                }
            }
            Err(e) => {
                warn!(
                    path = %file.path.display(),
                    "Face detection unavailable, skipping check: {}", e
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::faces::testing::{BrokenFaceCounter, FixedFaceCounter};
    use std::path::PathBuf;

    fn image(width: u32, height: u32) -> MediaFile {
        MediaFile {
            path: PathBuf::from("/tmp/person.jpg"),
            kind: MediaKind::Image,
            extension: "jpg".into(),
            size_bytes: 1024,
            width,
            height,
            duration: None,
            face_count: None,
        }
    }

    fn video(width: u32, height: u32, duration: f64) -> MediaFile {
        MediaFile {
            path: PathBuf::from("/tmp/clip.mp4"),
            kind: MediaKind::Video,
            extension: "mp4".into(),
            size_bytes: 1024,
            width,
            height,
            duration: Some(duration),
            face_count: None,
        }
    }

    fn validator() -> Validator {
        Validator::new(MediaLimits::default())
    }

    #[test]
    fn test_valid_image_passes() {
        let result = validator().validate_metadata(&image(1024, 768));
        assert!(result.is_valid());
    }

    #[test]
    fn test_image_below_minimum_dimension() {
        let result = validator().validate_metadata(&image(100, 100));
        assert!(!result.is_valid());
        assert!(result.first_reason().unwrap().contains("minimum dimension 200"));
    }

    #[test]
    fn test_image_dimension_boundaries_inclusive() {
        assert!(validator().validate_metadata(&image(200, 200)).is_valid());
        assert!(validator().validate_metadata(&image(4096, 4096)).is_valid());
        assert!(!validator().validate_metadata(&image(4097, 2000)).is_valid());
    }

    #[test]
    fn test_video_dimension_ceiling_is_lower() {
        assert!(validator().validate_metadata(&video(2048, 2048, 10.0)).is_valid());
        let result = validator().validate_metadata(&video(4096, 2048, 10.0));
        assert!(result.first_reason().unwrap().contains("maximum dimension 2048"));
    }

    #[test]
    fn test_aspect_ratio_limit() {
        // 3:1 exactly is allowed, beyond is not, in either orientation
        assert!(validator().validate_metadata(&image(3000, 1000)).is_valid());
        let wide = validator().validate_metadata(&image(3100, 1000));
        assert!(wide.first_reason().unwrap().contains("aspect ratio"));
        let tall = validator().validate_metadata(&image(1000, 3100));
        assert!(!tall.is_valid());
    }

    #[test]
    fn test_video_duration_bounds() {
        let too_long = validator().validate_metadata(&video(720, 1280, 45.0));
        assert!(!too_long.is_valid());
        assert!(too_long.first_reason().unwrap().contains("maximum 30"));

        let too_short = validator().validate_metadata(&video(720, 1280, 1.5));
        assert!(too_short.first_reason().unwrap().contains("minimum 2"));

        // Boundaries are inclusive
        assert!(validator().validate_metadata(&video(720, 1280, 2.0)).is_valid());
        assert!(validator().validate_metadata(&video(720, 1280, 30.0)).is_valid());
    }

    #[test]
    fn test_extension_rejected() {
        let mut file = image(1024, 768);
        file.extension = "gif".into();
        let result = validator().validate_metadata(&file);
        assert!(result.first_reason().unwrap().contains("invalid image format"));
    }

    #[test]
    fn test_file_size_rejected() {
        let mut file = image(1024, 768);
        file.size_bytes = 6 * 1024 * 1024;
        let result = validator().validate_metadata(&file);
        assert!(result.first_reason().unwrap().contains("exceeds maximum 5.00 MB"));
    }

    #[test]
    fn test_short_circuit_stops_at_first_violation() {
        let mut file = video(100, 100, 45.0);
        file.extension = "mkv".into();
        let result = validator().validate_metadata(&file);
        assert_eq!(result.violations.len(), 1);
        assert_eq!(result.violations[0].rule, Rule::Extension);
    }

    #[test]
    fn test_strict_mode_collects_all_violations() {
        let mut file = video(100, 100, 45.0);
        file.extension = "mkv".into();
        let result = validator().strict(true).validate_metadata(&file);
        let rules: Vec<Rule> = result.violations.iter().map(|v| v.rule).collect();
        assert!(rules.contains(&Rule::Extension));
        assert!(rules.contains(&Rule::Dimensions));
        assert!(rules.contains(&Rule::Duration));
    }

    #[tokio::test]
    async fn test_missing_file_rejected() {
        let (file, result) = validator()
            .inspect(Path::new("/nonexistent/person.jpg"), MediaKind::Image)
            .await;
        assert!(file.is_none());
        assert_eq!(result.violations[0].rule, Rule::Missing);
    }

    #[tokio::test]
    async fn test_face_count_enforced() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("person.jpg");
        image::RgbImage::new(800, 600).save(&path).unwrap();

        let v = validator().with_face_counter(Arc::new(FixedFaceCounter(2)));
        let (file, result) = v.inspect(&path, MediaKind::Image).await;
        assert_eq!(file.unwrap().face_count, Some(2));
        assert!(result.first_reason().unwrap().contains("2 faces detected"));

        let v = validator().with_face_counter(Arc::new(FixedFaceCounter(0)));
        let result = v.validate(&path, MediaKind::Image).await;
        assert!(result.first_reason().unwrap().contains("no face detected"));

        let v = validator().with_face_counter(Arc::new(FixedFaceCounter(1)));
        assert!(v.validate(&path, MediaKind::Image).await.is_valid());
    }

    #[tokio::test]
    async fn test_broken_detector_does_not_fail_validation() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("person.jpg");
        image::RgbImage::new(800, 600).save(&path).unwrap();

        let v = validator().with_face_counter(Arc::new(BrokenFaceCounter));
        let (file, result) = v.inspect(&path, MediaKind::Image).await;
        assert!(result.is_valid());
        assert_eq!(file.unwrap().face_count, None);
    }
}
