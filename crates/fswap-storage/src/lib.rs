//! S3-compatible object store client.
//!
//! This crate provides:
//! - Upload of local media files under date-scoped keys
//! - Presigned GET URL generation for the vendor to fetch inputs
//! - Listing and age-based cleanup of uploaded inputs

pub mod client;
pub mod error;
pub mod keys;

pub use client::{ObjectInfo, ObjectStore, ObjectStoreConfig, UploadResult};
pub use error::{StorageError, StorageResult};
pub use keys::upload_key;
