//! Remote task state machine.
//!
//! A `Task` tracks one remote face-swap job from submission to a terminal
//! state. The vendor reports `PENDING`, `RUNNING`, `SUCCEEDED`, `FAILED` and
//! occasionally `CANCELED`; `TIMED_OUT` is client-only and means we stopped
//! polling without a terminal server answer (the remote job may still finish).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Status of a remote face-swap task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    /// Accepted by the vendor, waiting for a slot.
    #[default]
    Pending,
    /// Actively processing.
    Running,
    /// Finished with a result URL.
    Succeeded,
    /// Vendor-reported failure. Failed tasks are not billed, so the same
    /// inputs may be resubmitted.
    Failed,
    /// Vendor-side cancellation.
    Canceled,
    /// Client gave up waiting; not a server verdict.
    TimedOut,
    /// Anything the vendor sends that we do not recognize.
    #[serde(other)]
    Unknown,
}

impl TaskStatus {
    /// Get string representation of the status (wire casing).
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "PENDING",
            TaskStatus::Running => "RUNNING",
            TaskStatus::Succeeded => "SUCCEEDED",
            TaskStatus::Failed => "FAILED",
            TaskStatus::Canceled => "CANCELED",
            TaskStatus::TimedOut => "TIMED_OUT",
            TaskStatus::Unknown => "UNKNOWN",
        }
    }

    /// Check if this is a terminal state (no more transitions expected).
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TaskStatus::Succeeded | TaskStatus::Failed | TaskStatus::Canceled | TaskStatus::TimedOut
        )
    }

    /// Check if this status was reported by the server, as opposed to the
    /// client-local `TimedOut`.
    pub fn is_server_reported(&self) -> bool {
        !matches!(self, TaskStatus::TimedOut)
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One remote face-swap task, created at submission and updated only by
/// polling responses. Never mutated after reaching a terminal state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    /// Opaque vendor task identifier
    pub id: String,
    /// Current status
    pub status: TaskStatus,
    /// Result video URL, set on success
    pub result_url: Option<String>,
    /// Vendor error message, set on failure
    pub error_message: Option<String>,
    /// Seconds of output video the vendor billed for
    pub billed_seconds: Option<f64>,
    /// When the task was submitted
    pub submitted_at: DateTime<Utc>,
    /// When the status last changed
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// Create a freshly submitted task in `Pending`.
    pub fn new(id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            status: TaskStatus::Pending,
            result_url: None,
            error_message: None,
            billed_seconds: None,
            submitted_at: now,
            updated_at: now,
        }
    }

    /// Check if the task is in a terminal state.
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Record a non-terminal status from a poll. No-op once terminal.
    pub fn observe(&mut self, status: TaskStatus) {
        if self.is_terminal() {
            return;
        }
        self.status = status;
        self.updated_at = Utc::now();
    }

    /// Mark the task succeeded with its result URL.
    pub fn succeed(&mut self, result_url: impl Into<String>, billed_seconds: Option<f64>) {
        if self.is_terminal() {
            return;
        }
        self.status = TaskStatus::Succeeded;
        self.result_url = Some(result_url.into());
        self.billed_seconds = billed_seconds;
        self.updated_at = Utc::now();
    }

    /// Mark the task failed with the vendor's error message.
    pub fn fail(&mut self, message: impl Into<String>) {
        if self.is_terminal() {
            return;
        }
        self.status = TaskStatus::Failed;
        self.error_message = Some(message.into());
        self.updated_at = Utc::now();
    }

    /// Mark the task timed out locally. The remote job may still complete;
    /// this only records that we stopped polling.
    pub fn time_out(&mut self, waited_secs: u64) {
        if self.is_terminal() {
            return;
        }
        self.status = TaskStatus::TimedOut;
        self.error_message = Some(format!(
            "No terminal status after {}s; the remote task may still be running",
            waited_secs
        ));
        self.updated_at = Utc::now();
    }
}
