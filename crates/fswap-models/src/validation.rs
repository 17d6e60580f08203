//! Validation verdicts.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The rule a media file violated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rule {
    /// File does not exist
    Missing,
    /// File could not be decoded or probed
    Unreadable,
    /// Extension not in the allowed set for the media kind
    Extension,
    /// File larger than the configured maximum
    FileSize,
    /// Pixel dimension outside the allowed range
    Dimensions,
    /// Longer-over-shorter side ratio above the allowed maximum
    AspectRatio,
    /// Video duration outside the allowed range
    Duration,
    /// Face count is not exactly the required count
    FaceCount,
}

impl Rule {
    pub fn as_str(&self) -> &'static str {
        match self {
            Rule::Missing => "missing",
            Rule::Unreadable => "unreadable",
            Rule::Extension => "extension",
            Rule::FileSize => "file_size",
            Rule::Dimensions => "dimensions",
            Rule::AspectRatio => "aspect_ratio",
            Rule::Duration => "duration",
            Rule::FaceCount => "face_count",
        }
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single violated rule with its human-readable reason.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Violation {
    pub rule: Rule,
    pub message: String,
}

impl Violation {
    pub fn new(rule: Rule, message: impl Into<String>) -> Self {
        Self {
            rule,
            message: message.into(),
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.rule, self.message)
    }
}

/// Outcome of validating one media file.
///
/// In short-circuit mode this carries at most one violation; in strict mode
/// it carries every failing check.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValidationResult {
    pub violations: Vec<Violation>,
}

impl ValidationResult {
    /// A passing result.
    pub fn ok() -> Self {
        Self::default()
    }

    /// A result carrying a single violation.
    pub fn rejected(rule: Rule, message: impl Into<String>) -> Self {
        Self {
            violations: vec![Violation::new(rule, message)],
        }
    }

    pub fn is_valid(&self) -> bool {
        self.violations.is_empty()
    }

    /// Record another failing check.
    pub fn push(&mut self, rule: Rule, message: impl Into<String>) {
        self.violations.push(Violation::new(rule, message));
    }

    /// The first failing check's reason, if any.
    pub fn first_reason(&self) -> Option<&str> {
        self.violations.first().map(|v| v.message.as_str())
    }

    /// All reasons joined for display.
    pub fn summary(&self) -> String {
        self.violations
            .iter()
            .map(|v| v.message.as_str())
            .collect::<Vec<_>>()
            .join("; ")
    }
}
