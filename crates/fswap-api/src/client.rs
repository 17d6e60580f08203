//! Vendor API client.

use std::time::Duration;

use reqwest::Client;
use tracing::{debug, info};

use crate::error::{ApiError, ApiResult};
use crate::types::{
    CreateTaskInput, CreateTaskParameters, CreateTaskRequest, TaskResponse, TaskSnapshot,
};
use fswap_models::ProcessingMode;

const DEFAULT_BASE_URL: &str = "https://dashscope.aliyuncs.com/api/v1";
const DEFAULT_MODEL: &str = "wan2.2-animate-mix";

/// Configuration for the vendor API client.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Bearer token
    pub api_key: String,
    /// API base URL, no trailing slash
    pub base_url: String,
    /// Synthesis model name
    pub model: String,
    /// Delay between status polls
    pub poll_interval: Duration,
    /// Total polling budget before a task is given up on
    pub max_wait: Duration,
}

impl ApiConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            poll_interval: Duration::from_secs(15),
            max_wait: Duration::from_secs(600),
        }
    }

    /// Create config from environment variables.
    pub fn from_env() -> ApiResult<Self> {
        let api_key = std::env::var("SWAP_API_KEY")
            .map_err(|_| ApiError::malformed("SWAP_API_KEY not set"))?;

        let mut config = Self::new(api_key);
        if let Ok(url) = std::env::var("SWAP_API_BASE_URL") {
            config.base_url = url.trim_end_matches('/').to_string();
        }
        if let Ok(model) = std::env::var("SWAP_MODEL") {
            config.model = model;
        }
        Ok(config)
    }
}

/// Client for the vendor's async synthesis endpoints.
#[derive(Clone)]
pub struct SwapClient {
    config: ApiConfig,
    client: Client,
}

impl SwapClient {
    pub fn new(config: ApiConfig) -> Self {
        Self {
            config,
            client: Client::new(),
        }
    }

    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    /// Submit a swap task and return its id. The task starts out PENDING.
    pub async fn create_task(
        &self,
        image_url: &str,
        video_url: &str,
        mode: ProcessingMode,
    ) -> ApiResult<String> {
        let url = format!(
            "{}/services/aigc/image2video/video-synthesis",
            self.config.base_url
        );

        let request = CreateTaskRequest {
            model: self.config.model.clone(),
            input: CreateTaskInput {
                image_url: image_url.to_string(),
                video_url: video_url.to_string(),
            },
            parameters: CreateTaskParameters {
                mode: mode.as_str().to_string(),
                check_image: true,
            },
        };

        debug!(model = %self.config.model, mode = %mode, "Submitting swap task");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .header("X-DashScope-Async", "enable")
            .header("X-DashScope-OssResourceResolve", "enable")
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::SubmissionFailed {
                status: status.as_u16(),
                message: error_body(response).await,
            });
        }

        let body: TaskResponse = response
            .json()
            .await
            .map_err(|e| ApiError::malformed(format!("unparseable submission response: {}", e)))?;

        let task_id = body
            .output
            .and_then(|o| o.task_id)
            .ok_or_else(|| ApiError::malformed("submission response has no task_id"))?;

        info!(task_id = %task_id, "Swap task submitted");
        Ok(task_id)
    }

    /// Query the current state of a task.
    pub async fn query_task(&self, task_id: &str) -> ApiResult<TaskSnapshot> {
        let url = format!("{}/tasks/{}", self.config.base_url, task_id);

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.config.api_key)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::QueryFailed {
                status: status.as_u16(),
                message: error_body(response).await,
            });
        }

        let body: TaskResponse = response
            .json()
            .await
            .map_err(|e| ApiError::malformed(format!("unparseable query response: {}", e)))?;

        let snapshot = TaskSnapshot::from_response(body)?;
        debug!(task_id = %task_id, status = %snapshot.status, "Queried task");
        Ok(snapshot)
    }
}

/// Extract the vendor's code/message detail from an error response, falling
/// back to the raw body when it is not JSON (e.g. HTML from a proxy).
async fn error_body(response: reqwest::Response) -> String {
    let raw = response.text().await.unwrap_or_default();
    match serde_json::from_str::<TaskResponse>(&raw) {
        Ok(parsed) if parsed.code.is_some() || parsed.message.is_some() => parsed.error_detail(),
        _ => raw.chars().take(200).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fswap_models::TaskStatus;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_client(server: &MockServer) -> SwapClient {
        let mut config = ApiConfig::new("sk-test");
        config.base_url = server.uri();
        SwapClient::new(config)
    }

    #[tokio::test]
    async fn test_create_task() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/services/aigc/image2video/video-synthesis"))
            .and(header("Authorization", "Bearer sk-test"))
            .and(header("X-DashScope-Async", "enable"))
            .and(body_partial_json(serde_json::json!({
                "model": "wan2.2-animate-mix",
                "parameters": {"mode": "wan-std"}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "output": {"task_id": "task-123", "task_status": "PENDING"},
                "request_id": "r-1"
            })))
            .mount(&server)
            .await;

        let id = test_client(&server)
            .create_task("https://s/img", "https://s/vid", ProcessingMode::Standard)
            .await
            .unwrap();
        assert_eq!(id, "task-123");
    }

    #[tokio::test]
    async fn test_create_task_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "code": "InvalidParameter",
                "message": "image_url is not accessible"
            })))
            .mount(&server)
            .await;

        let err = test_client(&server)
            .create_task("https://s/img", "https://s/vid", ProcessingMode::Professional)
            .await
            .unwrap_err();
        match err {
            ApiError::SubmissionFailed { status, message } => {
                assert_eq!(status, 400);
                assert!(message.contains("InvalidParameter"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_create_task_non_json_error_body() {
        // Proxies answer with HTML; that is still a submission failure,
        // never a malformed-response error
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(502).set_body_string("<html>Bad Gateway</html>"))
            .mount(&server)
            .await;

        let err = test_client(&server)
            .create_task("https://s/img", "https://s/vid", ProcessingMode::Standard)
            .await
            .unwrap_err();
        match err {
            ApiError::SubmissionFailed { status, message } => {
                assert_eq!(status, 502);
                assert!(message.contains("Bad Gateway"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_query_task_running() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/tasks/task-123"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "output": {"task_id": "task-123", "task_status": "RUNNING"}
            })))
            .mount(&server)
            .await;

        let snap = test_client(&server).query_task("task-123").await.unwrap();
        assert_eq!(snap.status, TaskStatus::Running);
        assert!(snap.result_url.is_none());
    }

    #[tokio::test]
    async fn test_query_task_malformed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let err = test_client(&server).query_task("task-123").await.unwrap_err();
        assert!(matches!(err, ApiError::MalformedResponse(_)));
    }

    #[tokio::test]
    async fn test_query_task_server_error_is_retryable() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500).set_body_json(serde_json::json!({
                "code": "InternalError", "message": "try again"
            })))
            .mount(&server)
            .await;

        let err = test_client(&server).query_task("task-123").await.unwrap_err();
        assert!(err.is_retryable());
    }
}
