//! Pipeline configuration.

use std::path::PathBuf;
use std::time::Duration;

use fswap_api::ApiConfig;
use fswap_media::MediaLimits;
use fswap_models::ProcessingMode;

use crate::error::{PipelineError, PipelineResult};

/// Seconds of output covered by the vendor's free tier.
pub const FREE_QUOTA_SECONDS: f64 = 50.0;

/// Everything the pipeline needs, pulled from the environment.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Vendor API settings
    pub api: ApiConfig,
    /// Validation bounds
    pub limits: MediaLimits,
    /// Processing mode sent with each task
    pub mode: ProcessingMode,
    /// Where results land when no explicit output path is given
    pub output_dir: PathBuf,
    /// External face detector command, if installed
    pub face_detector: Option<String>,
    /// Seconds of output not billed
    pub free_quota_seconds: f64,
    /// Collect all validation violations instead of stopping at the first
    pub strict_validation: bool,
}

impl AppConfig {
    /// Create config from environment variables.
    pub fn from_env() -> PipelineResult<Self> {
        let mut api = ApiConfig::from_env()
            .map_err(|e| PipelineError::config_error(e.to_string()))?;

        if let Some(secs) = parse_env_secs("SWAP_POLL_INTERVAL_SECS") {
            api.poll_interval = Duration::from_secs(secs);
        }
        if let Some(secs) = parse_env_secs("SWAP_MAX_WAIT_SECS") {
            api.max_wait = Duration::from_secs(secs);
        }

        let mode = match std::env::var("SWAP_MODE") {
            Ok(raw) => raw
                .parse()
                .map_err(|e| PipelineError::config_error(format!("SWAP_MODE: {}", e)))?,
            Err(_) => ProcessingMode::Standard,
        };

        let config = Self {
            api,
            limits: MediaLimits::default(),
            mode,
            output_dir: std::env::var("SWAP_OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("output")),
            face_detector: std::env::var("SWAP_FACE_DETECTOR").ok().filter(|s| !s.is_empty()),
            free_quota_seconds: std::env::var("SWAP_FREE_QUOTA_SECONDS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(FREE_QUOTA_SECONDS),
            strict_validation: std::env::var("SWAP_STRICT_VALIDATION")
                .map(|s| s == "1" || s.eq_ignore_ascii_case("true"))
                .unwrap_or(false),
        };

        config.validate()?;
        Ok(config)
    }

    /// Sanity-check the assembled configuration.
    pub fn validate(&self) -> PipelineResult<()> {
        if self.api.api_key.trim().is_empty() {
            return Err(PipelineError::config_error("API key is empty"));
        }
        if self.api.poll_interval.is_zero() {
            return Err(PipelineError::config_error("poll interval must be positive"));
        }
        if self.api.max_wait < self.api.poll_interval {
            return Err(PipelineError::config_error(
                "max wait must be at least one poll interval",
            ));
        }
        Ok(())
    }

    /// Human-readable settings dump with the API key redacted.
    pub fn summary(&self) -> String {
        format!(
            "base_url={} model={} mode={} poll_interval={}s max_wait={}s output_dir={} \
             face_detector={} api_key={}",
            self.api.base_url,
            self.api.model,
            self.mode,
            self.api.poll_interval.as_secs(),
            self.api.max_wait.as_secs(),
            self.output_dir.display(),
            self.face_detector.as_deref().unwrap_or("(none)"),
            redact(&self.api.api_key),
        )
    }

    /// Estimated cost in RMB for a video of the given duration.
    ///
    /// The free quota is monthly account-level headroom, reported separately;
    /// it is never subtracted from a per-run estimate.
    pub fn estimate_cost(&self, duration_secs: f64) -> f64 {
        self.mode.estimate_cost(duration_secs)
    }
}

fn parse_env_secs(name: &str) -> Option<u64> {
    std::env::var(name).ok().and_then(|s| s.parse().ok())
}

fn redact(key: &str) -> String {
    if key.len() <= 6 {
        "***".to_string()
    } else {
        format!("{}***", &key[..6])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> AppConfig {
        AppConfig {
            api: ApiConfig::new("sk-test-key-12345"),
            limits: MediaLimits::default(),
            mode: ProcessingMode::Standard,
            output_dir: PathBuf::from("output"),
            face_detector: None,
            free_quota_seconds: FREE_QUOTA_SECONDS,
            strict_validation: false,
        }
    }

    #[test]
    fn test_validate_rejects_bad_timing() {
        let mut config = test_config();
        config.api.max_wait = Duration::from_secs(5);
        config.api.poll_interval = Duration::from_secs(15);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_accepts_defaults() {
        assert!(test_config().validate().is_ok());
    }

    #[test]
    fn test_summary_redacts_api_key() {
        let summary = test_config().summary();
        assert!(!summary.contains("sk-test-key-12345"));
        assert!(summary.contains("sk-tes***"));
    }

    #[test]
    fn test_estimate_cost_charges_full_duration() {
        let config = test_config();
        // A maximum-length valid video is 30s; 30 * 0.6 RMB/s
        assert!((config.estimate_cost(30.0) - 18.0).abs() < 1e-9);
        assert!((config.estimate_cost(10.0) - 6.0).abs() < 1e-9);
    }

    #[test]
    fn test_estimate_cost_differs_by_mode() {
        let mut config = test_config();
        let standard = config.estimate_cost(30.0);
        config.mode = ProcessingMode::Professional;
        let professional = config.estimate_cost(30.0);
        assert!((standard - 18.0).abs() < 1e-9);
        assert!((professional - 27.0).abs() < 1e-9);
    }
}
