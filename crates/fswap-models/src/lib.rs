//! Shared data models for the fswap face-swap client.
//!
//! This crate provides Serde-serializable types for:
//! - Local media files and their probed metadata
//! - Validation verdicts
//! - The remote task state machine
//! - Processing modes and per-second pricing
//! - Per-run and per-batch processing results

pub mod media;
pub mod mode;
pub mod result;
pub mod task;
pub mod validation;

// Re-export common types
pub use media::{MediaFile, MediaKind};
pub use mode::{ProcessingMode, ProcessingModeParseError};
pub use result::{BatchReport, ProcessingResult, Stage, StageError};
pub use task::{Task, TaskStatus};
pub use validation::{Rule, ValidationResult, Violation};
