//! Fixed-interval polling to a terminal task state.

use std::time::Instant;

use tracing::{debug, info, warn};

use crate::client::SwapClient;
use crate::error::ApiResult;
use fswap_models::{Task, TaskStatus};

/// Poll a submitted task until it reaches a terminal state or the client's
/// polling budget runs out.
///
/// Polls are spaced a full `poll_interval` apart regardless of how long each
/// query takes, and the elapsed-time check happens after the sleep, so a task
/// still gets its final poll at the budget boundary. A budget of 600s at a
/// 15s interval yields at most 40 polls before `TIMED_OUT`.
pub async fn wait_for_task(client: &SwapClient, task_id: &str) -> ApiResult<Task> {
    let interval = client.config().poll_interval;
    let max_wait = client.config().max_wait;
    let started = Instant::now();

    let mut task = Task::new(task_id);

    loop {
        let snapshot = client.query_task(task_id).await?;

        match snapshot.status {
            TaskStatus::Succeeded => match snapshot.result_url {
                Some(url) => task.succeed(url, snapshot.billed_seconds),
                None => task.fail("task succeeded but response carried no result URL"),
            },
            TaskStatus::Failed => {
                task.fail(
                    snapshot
                        .error
                        .unwrap_or_else(|| "task failed with no error detail".to_string()),
                );
            }
            TaskStatus::Canceled => {
                task.observe(TaskStatus::Canceled);
                task.error_message = snapshot.error;
            }
            TaskStatus::Pending | TaskStatus::Running => {
                task.observe(snapshot.status);
            }
            // Unrecognized statuses are treated as failures rather than
            // polled forever
            other => {
                warn!(task_id = %task_id, status = %other, "Unrecognized task status");
                task.fail(format!("vendor reported unrecognized status {}", other));
            }
        }

        if task.is_terminal() {
            info!(
                task_id = %task_id,
                status = %task.status,
                elapsed_secs = started.elapsed().as_secs(),
                "Task reached terminal state"
            );
            return Ok(task);
        }

        debug!(
            task_id = %task_id,
            status = %task.status,
            elapsed_secs = started.elapsed().as_secs(),
            "Task still in progress"
        );

        tokio::time::sleep(interval).await;

        if started.elapsed() >= max_wait {
            task.time_out(started.elapsed().as_secs());
            warn!(task_id = %task_id, "Gave up polling task");
            return Ok(task);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::ApiConfig;
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fast_client(server: &MockServer) -> SwapClient {
        let mut config = ApiConfig::new("sk-test");
        config.base_url = server.uri();
        config.poll_interval = Duration::from_millis(10);
        config.max_wait = Duration::from_secs(5);
        SwapClient::new(config)
    }

    fn status_body(status: &str) -> serde_json::Value {
        serde_json::json!({"output": {"task_id": "t-1", "task_status": status}})
    }

    #[tokio::test]
    async fn test_wait_until_succeeded() {
        let server = MockServer::start().await;

        // Two in-progress polls, then success
        Mock::given(method("GET"))
            .and(path("/tasks/t-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(status_body("PENDING")))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/tasks/t-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(status_body("RUNNING")))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/tasks/t-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "output": {
                    "task_id": "t-1",
                    "task_status": "SUCCEEDED",
                    "results": {"video_url": "https://cdn/out.mp4"}
                },
                "usage": {"video_duration": 8.0}
            })))
            .mount(&server)
            .await;

        let task = wait_for_task(&fast_client(&server), "t-1").await.unwrap();
        assert_eq!(task.status, TaskStatus::Succeeded);
        assert_eq!(task.result_url.as_deref(), Some("https://cdn/out.mp4"));
        assert_eq!(task.billed_seconds, Some(8.0));
    }

    #[tokio::test]
    async fn test_failed_task_carries_vendor_detail() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "output": {
                    "task_id": "t-1",
                    "task_status": "FAILED",
                    "code": "InvalidParameter.NoFace",
                    "message": "no face detected"
                }
            })))
            .mount(&server)
            .await;

        let task = wait_for_task(&fast_client(&server), "t-1").await.unwrap();
        assert_eq!(task.status, TaskStatus::Failed);
        assert!(task.error_message.unwrap().contains("no face detected"));
        assert!(task.result_url.is_none());
    }

    #[tokio::test]
    async fn test_succeeded_without_url_is_a_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(status_body("SUCCEEDED")))
            .mount(&server)
            .await;

        let task = wait_for_task(&fast_client(&server), "t-1").await.unwrap();
        assert_eq!(task.status, TaskStatus::Failed);
        assert!(task.error_message.unwrap().contains("no result URL"));
    }

    #[tokio::test]
    async fn test_times_out_when_budget_exhausted() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(status_body("RUNNING")))
            .mount(&server)
            .await;

        let mut config = ApiConfig::new("sk-test");
        config.base_url = server.uri();
        config.poll_interval = Duration::from_millis(10);
        config.max_wait = Duration::from_millis(35);
        let client = SwapClient::new(config);

        let started = Instant::now();
        let task = wait_for_task(&client, "t-1").await.unwrap();
        assert_eq!(task.status, TaskStatus::TimedOut);
        // The budget must be spent before giving up
        assert!(started.elapsed() >= Duration::from_millis(35));
    }

    #[tokio::test]
    async fn test_poll_spacing_never_below_interval() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(status_body("RUNNING")))
            .mount(&server)
            .await;

        let interval = Duration::from_millis(20);
        let mut config = ApiConfig::new("sk-test");
        config.base_url = server.uri();
        config.poll_interval = interval;
        config.max_wait = Duration::from_millis(90);
        let client = SwapClient::new(config);

        let started = Instant::now();
        wait_for_task(&client, "t-1").await.unwrap();
        let elapsed = started.elapsed();

        let polls = server.received_requests().await.unwrap().len();
        assert!(polls >= 2, "expected repeated polls, got {}", polls);
        // n polls have n-1 gaps between them, each at least one interval wide
        assert!(
            elapsed >= interval * (polls as u32 - 1),
            "{} polls in {:?} means some gap was shorter than {:?}",
            polls,
            elapsed,
            interval
        );
    }

    #[tokio::test]
    async fn test_unrecognized_status_fails_instead_of_spinning() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(status_body("SUSPENDED")))
            .mount(&server)
            .await;

        let task = wait_for_task(&fast_client(&server), "t-1").await.unwrap();
        assert_eq!(task.status, TaskStatus::Failed);
        assert!(task.error_message.unwrap().contains("unrecognized status"));
    }
}
