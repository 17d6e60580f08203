//! End-to-end face-swap orchestration.
//!
//! This crate wires validation, upload, task submission, polling and
//! download into one sequential pipeline:
//! - `AppConfig` pulls everything from the environment
//! - `Orchestrator` runs single pairs and sequential batches
//! - Transient upload and download failures are retried with backoff

pub mod config;
pub mod error;
pub mod orchestrator;
pub mod retry;

pub use config::AppConfig;
pub use error::{PipelineError, PipelineResult};
pub use orchestrator::{InputPair, Orchestrator};
pub use retry::{retry_async, RetryConfig};
