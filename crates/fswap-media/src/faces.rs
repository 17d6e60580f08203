//! Face counting seam.
//!
//! Face detection is an external collaborator: the pipeline only needs a
//! count for one image. Implementations are pluggable so tests and
//! deployments without a detector binary still work.

use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

use crate::error::{MediaError, MediaResult};

/// Counts faces in a still image.
#[async_trait]
pub trait FaceCounter: Send + Sync {
    async fn count_faces(&self, image_path: &Path) -> MediaResult<usize>;
}

/// Face counter that shells out to an external detector command.
///
/// The command is invoked as `<program> <image_path>` and is expected to
/// print one line per detected face (the `facedetect` tool's convention).
pub struct CommandFaceCounter {
    program: String,
}

impl CommandFaceCounter {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

#[async_trait]
impl FaceCounter for CommandFaceCounter {
    async fn count_faces(&self, image_path: &Path) -> MediaResult<usize> {
        which::which(&self.program)
            .map_err(|_| MediaError::detection_failed(format!("{} not found in PATH", self.program)))?;

        let output = Command::new(&self.program)
            .arg(image_path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await?;

        // facedetect exits 1 when no face is found; only treat >1 as failure
        let code = output.status.code().unwrap_or(-1);
        if code > 1 {
            return Err(MediaError::detection_failed(format!(
                "{} exited with status {}: {}",
                self.program,
                code,
                String::from_utf8_lossy(&output.stderr)
            )));
        }

        let count = String::from_utf8_lossy(&output.stdout)
            .lines()
            .filter(|l| !l.trim().is_empty())
            .count();

        debug!(image = %image_path.display(), faces = count, "Counted faces");
        Ok(count)
    }
}
