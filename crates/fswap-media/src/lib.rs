//! Media probing and validation.
//!
//! This crate provides:
//! - FFprobe-backed video metadata extraction
//! - Image dimension probing via the `image` crate
//! - First-frame extraction for video face checks
//! - The `FaceCounter` seam for external face detectors
//! - Bounded-range validation against vendor input limits

pub mod error;
pub mod faces;
pub mod frame;
pub mod probe;
pub mod validate;

pub use error::{MediaError, MediaResult};
pub use faces::{CommandFaceCounter, FaceCounter};
pub use frame::extract_first_frame;
pub use probe::probe_media;
pub use validate::{MediaLimits, Validator};
