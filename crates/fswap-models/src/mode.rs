//! Processing mode tiers and pricing.
//!
//! The vendor offers two quality tiers billed per second of output video.
//! Prices are the published Beijing-region rates in RMB.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Vendor processing mode (quality/cost tier).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ProcessingMode {
    /// Standard quality, cheaper per second.
    #[default]
    #[serde(rename = "wan-std")]
    Standard,
    /// Professional quality, higher per-second rate.
    #[serde(rename = "wan-pro")]
    Professional,
}

impl ProcessingMode {
    /// All available modes.
    pub const ALL: &'static [ProcessingMode] =
        &[ProcessingMode::Standard, ProcessingMode::Professional];

    /// Wire name sent to the vendor API.
    pub fn as_str(&self) -> &'static str {
        match self {
            ProcessingMode::Standard => "wan-std",
            ProcessingMode::Professional => "wan-pro",
        }
    }

    /// Returns a human-readable description.
    pub fn description(&self) -> &'static str {
        match self {
            ProcessingMode::Standard => "Standard quality",
            ProcessingMode::Professional => "Professional quality",
        }
    }

    /// Billing rate in RMB per second of output video.
    pub fn price_per_second(&self) -> f64 {
        match self {
            ProcessingMode::Standard => 0.6,
            ProcessingMode::Professional => 0.9,
        }
    }

    /// Estimated cost for processing a video of the given duration.
    pub fn estimate_cost(&self, duration_secs: f64) -> f64 {
        duration_secs.max(0.0) * self.price_per_second()
    }
}

impl fmt::Display for ProcessingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ProcessingMode {
    type Err = ProcessingModeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "wan-std" | "std" | "standard" => Ok(ProcessingMode::Standard),
            "wan-pro" | "pro" | "professional" => Ok(ProcessingMode::Professional),
            _ => Err(ProcessingModeParseError(s.to_string())),
        }
    }
}

#[derive(Debug, Error)]
#[error("Unknown processing mode: {0} (expected wan-std or wan-pro)")]
pub struct ProcessingModeParseError(String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_parse() {
        assert_eq!(
            "wan-std".parse::<ProcessingMode>().unwrap(),
            ProcessingMode::Standard
        );
        assert_eq!(
            "PRO".parse::<ProcessingMode>().unwrap(),
            ProcessingMode::Professional
        );
        assert!("wan-ultra".parse::<ProcessingMode>().is_err());
    }

    #[test]
    fn test_mode_display_matches_wire_name() {
        assert_eq!(ProcessingMode::Standard.to_string(), "wan-std");
        assert_eq!(ProcessingMode::Professional.to_string(), "wan-pro");
    }

    #[test]
    fn test_cost_estimate() {
        assert!((ProcessingMode::Standard.estimate_cost(10.0) - 6.0).abs() < 1e-9);
        assert!((ProcessingMode::Professional.estimate_cost(10.0) - 9.0).abs() < 1e-9);
        // Negative durations never produce negative cost
        assert_eq!(ProcessingMode::Standard.estimate_cost(-5.0), 0.0);
    }

    #[test]
    fn test_mode_serde_wire_names() {
        let json = serde_json::to_string(&ProcessingMode::Professional).unwrap();
        assert_eq!(json, "\"wan-pro\"");
        let mode: ProcessingMode = serde_json::from_str("\"wan-std\"").unwrap();
        assert_eq!(mode, ProcessingMode::Standard);
    }
}
