//! Object key layout.
//!
//! Inputs land under `swap/{yyyymmdd}/{uuid}_{filename}` so uploads never
//! collide and age-based cleanup can scan a single prefix.

use chrono::Utc;
use std::path::Path;
use uuid::Uuid;

/// Prefix every upload lives under.
pub const UPLOAD_PREFIX: &str = "swap/";

/// Build a unique object key for a local file.
pub fn upload_key(path: &Path) -> String {
    let filename = path
        .file_name()
        .map(|n| sanitize(&n.to_string_lossy()))
        .unwrap_or_else(|| "upload".to_string());

    format!(
        "{}{}/{}_{}",
        UPLOAD_PREFIX,
        Utc::now().format("%Y%m%d"),
        Uuid::new_v4(),
        filename
    )
}

/// Keep keys to a safe character set.
fn sanitize(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();

    if cleaned.is_empty() {
        "upload".to_string()
    } else {
        cleaned
    }
}
