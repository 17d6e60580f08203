//! Sequential face-swap orchestration.
//!
//! One run is: validate both inputs locally, upload them, submit the vendor
//! task, poll it to a terminal state, then download the result. A failure at
//! any stage stops the run and is reported tagged with that stage.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use fswap_api::{download_result, wait_for_task, ApiError, SwapClient};
use fswap_media::{probe_media, CommandFaceCounter, Validator};
use fswap_models::{
    BatchReport, MediaKind, ProcessingResult, StageError, TaskStatus,
};
use fswap_storage::ObjectStore;

use crate::config::AppConfig;
use crate::error::{PipelineError, PipelineResult};
use crate::retry::{retry_async, RetryConfig};

/// One image/video pair to process.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputPair {
    pub image: PathBuf,
    pub video: PathBuf,
}

/// State accumulated across stages of one run, kept so failures can still
/// report how far the run got.
#[derive(Default)]
struct RunContext {
    task_id: Option<String>,
    video_duration: Option<f64>,
    billed_seconds: Option<f64>,
}

/// Drives single runs and sequential batches.
pub struct Orchestrator {
    config: AppConfig,
    validator: Validator,
    store: ObjectStore,
    client: SwapClient,
}

impl Orchestrator {
    pub fn new(config: AppConfig, store: ObjectStore) -> Self {
        let mut validator =
            Validator::new(config.limits.clone()).strict(config.strict_validation);
        if let Some(program) = &config.face_detector {
            validator = validator.with_face_counter(Arc::new(CommandFaceCounter::new(program)));
        }
        let client = SwapClient::new(config.api.clone());

        Self {
            config,
            validator,
            store,
            client,
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Run one face-swap end to end. Never panics or returns an error; the
    /// outcome, good or bad, is in the `ProcessingResult`.
    pub async fn process(
        &self,
        image: &Path,
        video: &Path,
        output_dir: Option<&Path>,
        filename: Option<&str>,
        skip_validation: bool,
    ) -> ProcessingResult {
        let started = Instant::now();
        let mut ctx = RunContext::default();

        info!(
            image = %image.display(),
            video = %video.display(),
            mode = %self.config.mode,
            "Starting face-swap run"
        );

        match self
            .run(image, video, output_dir, filename, skip_validation, &mut ctx)
            .await
        {
            Ok(output) => {
                let cost = ctx
                    .billed_seconds
                    .or(ctx.video_duration)
                    .map(|secs| self.config.estimate_cost(secs));
                ProcessingResult::succeeded(
                    image.to_path_buf(),
                    video.to_path_buf(),
                    ctx.task_id.unwrap_or_default(),
                    output,
                    started.elapsed().as_secs_f64(),
                    cost,
                )
            }
            Err(e) => {
                warn!(error = %e, stage = %e.stage(), "Face-swap run failed");
                ProcessingResult::failed(
                    image.to_path_buf(),
                    video.to_path_buf(),
                    ctx.task_id,
                    started.elapsed().as_secs_f64(),
                    StageError::new(e.stage(), e.to_string(), e.is_retryable()),
                )
            }
        }
    }

    async fn run(
        &self,
        image: &Path,
        video: &Path,
        output_dir: Option<&Path>,
        filename: Option<&str>,
        skip_validation: bool,
        ctx: &mut RunContext,
    ) -> PipelineResult<PathBuf> {
        if skip_validation {
            warn!("Validation skipped; the vendor may still reject the inputs");
            // Duration is still wanted for the cost estimate
            if let Ok(file) = probe_media(video, MediaKind::Video).await {
                ctx.video_duration = file.duration;
            }
        } else {
            let (_, image_verdict) = self.validator.inspect(image, MediaKind::Image).await;
            if !image_verdict.is_valid() {
                return Err(PipelineError::validation_failed(format!(
                    "{}: {}",
                    image.display(),
                    image_verdict.summary()
                )));
            }

            let (video_file, video_verdict) = self.validator.inspect(video, MediaKind::Video).await;
            if !video_verdict.is_valid() {
                return Err(PipelineError::validation_failed(format!(
                    "{}: {}",
                    video.display(),
                    video_verdict.summary()
                )));
            }
            ctx.video_duration = video_file.and_then(|f| f.duration);
        }

        let image_upload = retry_async(
            &RetryConfig::new("upload_image"),
            |_| true,
            || self.store.upload_media(image),
        )
        .await?;
        let video_upload = retry_async(
            &RetryConfig::new("upload_video"),
            |_| true,
            || self.store.upload_media(video),
        )
        .await?;
        info!(
            image_key = %image_upload.key,
            video_key = %video_upload.key,
            "Inputs uploaded"
        );

        let task_id = self
            .client
            .create_task(&image_upload.url, &video_upload.url, self.config.mode)
            .await?;
        ctx.task_id = Some(task_id.clone());

        let task = wait_for_task(&self.client, &task_id).await?;
        ctx.billed_seconds = task.billed_seconds;

        let result_url = match task.status {
            TaskStatus::Succeeded => task.result_url.ok_or_else(|| {
                PipelineError::RemoteTaskFailed("task succeeded without a result URL".to_string())
            })?,
            TaskStatus::Failed => {
                return Err(PipelineError::RemoteTaskFailed(
                    task.error_message
                        .unwrap_or_else(|| "no error detail".to_string()),
                ));
            }
            TaskStatus::Canceled => {
                return Err(PipelineError::RemoteTaskCanceled(
                    task.error_message
                        .unwrap_or_else(|| "canceled by the vendor".to_string()),
                ));
            }
            TaskStatus::TimedOut => {
                return Err(PipelineError::PollTimedOut(
                    task.error_message
                        .unwrap_or_else(|| "no terminal status".to_string()),
                ));
            }
            other => {
                return Err(PipelineError::RemoteTaskFailed(format!(
                    "unexpected terminal status {}",
                    other
                )));
            }
        };

        let dir = output_dir.unwrap_or(&self.config.output_dir);
        let output = match filename {
            Some(name) => dir.join(name),
            None => dir.join(default_output_name(Utc::now())),
        };

        retry_async(
            &RetryConfig::new("download_result"),
            |e: &ApiError| e.is_retryable(),
            || download_result(&result_url, &output),
        )
        .await?;

        Ok(output)
    }

    /// Process pairs one after another. A failing pair is recorded and the
    /// batch moves on to the next.
    pub async fn process_batch(
        &self,
        pairs: &[InputPair],
        output_dir: Option<&Path>,
        skip_validation: bool,
    ) -> BatchReport {
        let mut report = BatchReport::new();

        for (index, pair) in pairs.iter().enumerate() {
            info!("Processing pair {}/{}", index + 1, pairs.len());
            let result = self
                .process(&pair.image, &pair.video, output_dir, None, skip_validation)
                .await;
            if let Some(error) = &result.error {
                warn!(
                    pair = index + 1,
                    error = %error,
                    "Pair failed; continuing with the rest of the batch"
                );
            }
            report.record(result);
        }

        info!(
            total = report.total,
            successful = report.successful,
            failed = report.failed,
            "Batch finished"
        );
        report
    }

    /// Remove uploaded inputs older than `min_age` from the store.
    pub async fn cleanup_uploads(&self, min_age: Duration) -> PipelineResult<u32> {
        Ok(self.store.cleanup_older_than(min_age).await?)
    }
}

fn default_output_name(now: DateTime<Utc>) -> String {
    format!("result_{}.mp4", now.format("%Y%m%d_%H%M%S"))
}
