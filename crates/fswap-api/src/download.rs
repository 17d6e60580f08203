//! Streaming result download.

use std::path::Path;

use reqwest::Client;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use crate::error::{ApiError, ApiResult};

/// Download a finished result to `output_path`, streaming chunk by chunk.
///
/// Result URLs are time-limited; a 403 on a link that previously worked means
/// it expired and the task must be resubmitted for a fresh one. When the
/// server advertises a Content-Length, the written byte count must match it
/// or the partial file is removed.
pub async fn download_result(url: &str, output_path: impl AsRef<Path>) -> ApiResult<u64> {
    let output_path = output_path.as_ref();
    debug!(url = %url, output = %output_path.display(), "Downloading result");

    let response = Client::new().get(url).send().await?;
    let status = response.status();

    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        if status.as_u16() == 403 && body.to_lowercase().contains("expire") {
            return Err(ApiError::UrlExpired);
        }
        return Err(ApiError::DownloadFailed {
            status: status.as_u16(),
            message: body.chars().take(200).collect(),
        });
    }

    let expected = response.content_length();

    if let Some(parent) = output_path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }

    let mut file = tokio::fs::File::create(output_path).await?;
    let mut written: u64 = 0;
    let mut response = response;

    while let Some(chunk) = response.chunk().await? {
        file.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }
    file.flush().await?;

    if let Err(e) = check_integrity(expected, written) {
        let _ = tokio::fs::remove_file(output_path).await;
        return Err(e);
    }

    info!(
        output = %output_path.display(),
        bytes = written,
        "Result downloaded"
    );
    Ok(written)
}

/// Compare bytes written against the advertised Content-Length, if any.
fn check_integrity(expected: Option<u64>, actual: u64) -> ApiResult<()> {
    match expected {
        Some(expected) if expected != actual => {
            Err(ApiError::IntegrityMismatch { expected, actual })
        }
        _ => Ok(()),
    }
}
