//! Vendor wire types.

use serde::{Deserialize, Serialize};

use crate::error::{ApiError, ApiResult};
use fswap_models::TaskStatus;

/// Task creation request body.
#[derive(Debug, Serialize)]
pub(crate) struct CreateTaskRequest {
    pub model: String,
    pub input: CreateTaskInput,
    pub parameters: CreateTaskParameters,
}

#[derive(Debug, Serialize)]
pub(crate) struct CreateTaskInput {
    pub image_url: String,
    pub video_url: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct CreateTaskParameters {
    pub mode: String,
    pub check_image: bool,
}

/// Envelope shared by creation and query responses.
#[derive(Debug, Deserialize)]
pub(crate) struct TaskResponse {
    pub output: Option<TaskOutput>,
    pub usage: Option<TaskUsage>,
    pub code: Option<String>,
    pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TaskOutput {
    pub task_id: Option<String>,
    pub task_status: Option<TaskStatus>,
    pub results: Option<TaskResults>,
    pub code: Option<String>,
    pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TaskResults {
    pub video_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TaskUsage {
    pub video_duration: Option<f64>,
}

impl TaskResponse {
    /// Format the vendor's code/message pair for error reporting.
    pub fn error_detail(&self) -> String {
        match (&self.code, &self.message) {
            (Some(code), Some(msg)) => format!("{}: {}", code, msg),
            (Some(code), None) => code.clone(),
            (None, Some(msg)) => msg.clone(),
            (None, None) => "no error detail provided".to_string(),
        }
    }
}

/// One observed view of a remote task.
#[derive(Debug, Clone)]
pub struct TaskSnapshot {
    /// Server-reported status
    pub status: TaskStatus,
    /// Result URL, present once the task succeeded
    pub result_url: Option<String>,
    /// Vendor failure detail, present once the task failed
    pub error: Option<String>,
    /// Seconds of processing the vendor billed for
    pub billed_seconds: Option<f64>,
}

impl TaskSnapshot {
    pub(crate) fn from_response(resp: TaskResponse) -> ApiResult<Self> {
        let output = resp
            .output
            .ok_or_else(|| ApiError::malformed("response has no output object"))?;

        let status = output
            .task_status
            .ok_or_else(|| ApiError::malformed("output has no task_status"))?;

        let error = match (&output.code, &output.message) {
            (None, None) => None,
            (code, msg) => Some(format!(
                "{}: {}",
                code.as_deref().unwrap_or("UnknownError"),
                msg.as_deref().unwrap_or("no message")
            )),
        };

        Ok(Self {
            status,
            result_url: output.results.and_then(|r| r.video_url),
            error,
            billed_seconds: resp.usage.and_then(|u| u.video_duration),
        })
    }
}
