//! Per-run and per-batch processing outcomes.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Pipeline stage that produced a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Validation,
    Upload,
    Submission,
    RemoteTask,
    Polling,
    Download,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Validation => "validation",
            Stage::Upload => "upload",
            Stage::Submission => "submission",
            Stage::RemoteTask => "remote_task",
            Stage::Polling => "polling",
            Stage::Download => "download",
        }
    }

    /// Operator guidance for a failure at this stage.
    pub fn hint(&self) -> &'static str {
        match self {
            Stage::Validation => "fix the input file and run again",
            Stage::Upload => "transient; retry the run",
            Stage::Submission => "check credentials and request, then resubmit",
            Stage::RemoteTask => "failed tasks are not billed; safe to resubmit",
            Stage::Polling => "the remote task may still be running; query it later or resubmit",
            Stage::Download => "retry; if the result URL expired, resubmit the task",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A stage-tagged failure reason.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageError {
    pub stage: Stage,
    pub message: String,
    /// Whether resubmitting or retrying the same inputs can succeed
    pub retryable: bool,
}

impl StageError {
    pub fn new(stage: Stage, message: impl Into<String>, retryable: bool) -> Self {
        Self {
            stage,
            message: message.into(),
            retryable,
        }
    }
}

impl fmt::Display for StageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.stage, self.message)
    }
}

/// Outcome of one end-to-end face-swap run. Immutable once built.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessingResult {
    pub success: bool,
    pub image_path: PathBuf,
    pub video_path: PathBuf,
    /// Vendor task id, present once submission succeeded
    pub task_id: Option<String>,
    /// Where the result video was written
    pub output_path: Option<PathBuf>,
    /// Wall-clock seconds for the whole run
    pub elapsed_secs: f64,
    /// Estimated cost in RMB, from billed seconds when available
    pub estimated_cost: Option<f64>,
    pub error: Option<StageError>,
}

impl ProcessingResult {
    /// Build a successful outcome.
    pub fn succeeded(
        image_path: PathBuf,
        video_path: PathBuf,
        task_id: String,
        output_path: PathBuf,
        elapsed_secs: f64,
        estimated_cost: Option<f64>,
    ) -> Self {
        Self {
            success: true,
            image_path,
            video_path,
            task_id: Some(task_id),
            output_path: Some(output_path),
            elapsed_secs,
            estimated_cost,
            error: None,
        }
    }

    /// Build a failed outcome tagged with the stage that broke.
    pub fn failed(
        image_path: PathBuf,
        video_path: PathBuf,
        task_id: Option<String>,
        elapsed_secs: f64,
        error: StageError,
    ) -> Self {
        Self {
            success: false,
            image_path,
            video_path,
            task_id,
            output_path: None,
            elapsed_secs,
            estimated_cost: None,
            error: Some(error),
        }
    }
}

/// Aggregated outcomes of a sequential batch run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchReport {
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
    pub results: Vec<ProcessingResult>,
}

impl BatchReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one pair's outcome.
    pub fn record(&mut self, result: ProcessingResult) {
        self.total += 1;
        if result.success {
            self.successful += 1;
        } else {
            self.failed += 1;
        }
        self.results.push(result);
    }
}
