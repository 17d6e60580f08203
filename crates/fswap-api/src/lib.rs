//! Async face-swap vendor API client.
//!
//! This crate provides:
//! - Task submission against the vendor's async synthesis endpoint
//! - Task status queries and fixed-interval polling to a terminal state
//! - Streaming download of finished results with integrity checking

pub mod client;
pub mod download;
pub mod error;
pub mod poll;
pub mod types;

pub use client::{ApiConfig, SwapClient};
pub use download::download_result;
pub use error::{ApiError, ApiResult};
pub use poll::wait_for_task;
pub use types::TaskSnapshot;
