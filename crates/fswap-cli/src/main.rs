//! Face-swap command-line client.
//!
//! Set SWAP_API_KEY plus the SWAP_STORE_* variables (see `fswap config`).

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use fswap_media::{probe_media, CommandFaceCounter, MediaLimits, Validator};
use fswap_models::{media::format_file_size, MediaKind, ProcessingMode};
use fswap_pipeline::{AppConfig, InputPair, Orchestrator};
use fswap_storage::ObjectStore;

#[derive(Parser)]
#[command(name = "fswap", about = "Remote face-swap client")]
struct Cli {
    /// Log at debug level
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate an image/video pair without submitting anything
    Validate {
        /// Face reference image
        image: PathBuf,
        /// Template video
        video: PathBuf,
        /// Report every violation instead of stopping at the first
        #[arg(long)]
        strict: bool,
    },
    /// Run one face-swap end to end
    Run {
        /// Face reference image
        image: PathBuf,
        /// Template video
        video: PathBuf,
        /// Processing mode (wan-std or wan-pro); default from SWAP_MODE
        #[arg(long)]
        mode: Option<ProcessingMode>,
        /// Directory the result is written to
        #[arg(long)]
        output_dir: Option<PathBuf>,
        /// Result filename (default: result_<timestamp>.mp4)
        #[arg(long)]
        filename: Option<String>,
        /// Submit without local validation
        #[arg(long)]
        skip_validation: bool,
    },
    /// Process a JSON manifest of image/video pairs sequentially
    Batch {
        /// Manifest file: [{"image": "...", "video": "..."}, ...]
        manifest: PathBuf,
        /// Processing mode (wan-std or wan-pro); default from SWAP_MODE
        #[arg(long)]
        mode: Option<ProcessingMode>,
        /// Directory the results are written to
        #[arg(long)]
        output_dir: Option<PathBuf>,
        /// Submit without local validation
        #[arg(long)]
        skip_validation: bool,
    },
    /// Estimate the processing cost of a video
    Cost {
        /// Template video
        video: PathBuf,
        /// Processing mode (wan-std or wan-pro)
        #[arg(long, default_value = "wan-std")]
        mode: ProcessingMode,
    },
    /// Print the effective configuration with secrets redacted
    Config,
    /// Delete uploaded inputs older than the given age
    Cleanup {
        /// Minimum age in hours
        #[arg(long, default_value = "24")]
        older_than_hours: u64,
    },
}

fn init_tracing(verbose: bool) {
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let default_level = if verbose { "fswap=debug" } else { "fswap=info" };
    let env_filter = EnvFilter::from_default_env()
        .add_directive(default_level.parse().unwrap())
        .add_directive("aws_config=warn".parse().unwrap())
        .add_directive("hyper=warn".parse().unwrap());

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }
}

fn orchestrator_from_env(mode: Option<ProcessingMode>) -> anyhow::Result<Orchestrator> {
    let mut config = AppConfig::from_env().context("Failed to load configuration")?;
    if let Some(mode) = mode {
        config.mode = mode;
    }
    let store = ObjectStore::from_env()
        .context("Failed to configure object store. Set the SWAP_STORE_* variables")?;
    Ok(Orchestrator::new(config, store))
}

fn local_validator(strict: bool) -> Validator {
    let mut validator = Validator::new(MediaLimits::default()).strict(strict);
    if let Ok(program) = std::env::var("SWAP_FACE_DETECTOR") {
        if !program.is_empty() {
            validator = validator.with_face_counter(Arc::new(CommandFaceCounter::new(program)));
        }
    }
    validator
}

async fn validate_one(validator: &Validator, path: &PathBuf, kind: MediaKind) -> bool {
    let (file, verdict) = validator.inspect(path, kind).await;

    println!("{} ({})", path.display(), kind);
    if let Some(file) = file {
        println!("  size: {}", format_file_size(file.size_bytes));
        println!("  dimensions: {}x{}", file.width, file.height);
        if let Some(duration) = file.duration {
            println!("  duration: {:.1}s", duration);
        }
        if let Some(faces) = file.face_count {
            println!("  faces: {}", faces);
        }
    }

    if verdict.is_valid() {
        println!("  OK");
        true
    } else {
        for violation in &verdict.violations {
            println!("  FAIL: {}", violation.message);
        }
        false
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Validate {
            image,
            video,
            strict,
        } => {
            let validator = local_validator(strict);
            let image_ok = validate_one(&validator, &image, MediaKind::Image).await;
            let video_ok = validate_one(&validator, &video, MediaKind::Video).await;
            if !(image_ok && video_ok) {
                std::process::exit(1);
            }
        }
        Commands::Run {
            image,
            video,
            mode,
            output_dir,
            filename,
            skip_validation,
        } => {
            let orchestrator = orchestrator_from_env(mode)?;
            let result = orchestrator
                .process(
                    &image,
                    &video,
                    output_dir.as_deref(),
                    filename.as_deref(),
                    skip_validation,
                )
                .await;

            println!("{}", serde_json::to_string_pretty(&result)?);
            if !result.success {
                if let Some(error) = &result.error {
                    warn!("Run failed at {}: {}", error.stage, error.stage.hint());
                }
                std::process::exit(1);
            }
        }
        Commands::Batch {
            manifest,
            mode,
            output_dir,
            skip_validation,
        } => {
            let raw = tokio::fs::read_to_string(&manifest)
                .await
                .with_context(|| format!("Failed to read {}", manifest.display()))?;
            let pairs: Vec<InputPair> =
                serde_json::from_str(&raw).context("Manifest is not a JSON array of pairs")?;
            if pairs.is_empty() {
                anyhow::bail!("Manifest contains no pairs");
            }

            let orchestrator = orchestrator_from_env(mode)?;
            let report = orchestrator
                .process_batch(&pairs, output_dir.as_deref(), skip_validation)
                .await;

            println!("{}", serde_json::to_string_pretty(&report)?);
            if report.failed > 0 {
                std::process::exit(1);
            }
        }
        Commands::Cost { video, mode } => {
            let file = probe_media(&video, MediaKind::Video)
                .await
                .with_context(|| format!("Failed to probe {}", video.display()))?;
            let duration = file.duration.context("Video has no readable duration")?;

            let free_quota = AppConfig::from_env()
                .map(|c| c.free_quota_seconds)
                .unwrap_or(fswap_pipeline::config::FREE_QUOTA_SECONDS);
            let cost = mode.estimate_cost(duration);

            println!("duration: {:.1}s", duration);
            println!("mode: {} ({})", mode, mode.description());
            println!("estimated cost: {:.2} RMB", cost);
            println!("free quota: {:.0}s of output covered per month", free_quota);
        }
        Commands::Config => {
            let config = AppConfig::from_env().context("Configuration is incomplete")?;
            println!("{}", config.summary());
            match ObjectStore::from_env() {
                Ok(_) => println!("object store: configured"),
                Err(e) => {
                    println!("object store: {}", e);
                    std::process::exit(1);
                }
            }
        }
        Commands::Cleanup { older_than_hours } => {
            let orchestrator = orchestrator_from_env(None)?;
            let deleted = orchestrator
                .cleanup_uploads(Duration::from_secs(older_than_hours * 3600))
                .await
                .context("Cleanup failed")?;
            info!("Deleted {} uploaded objects", deleted);
            println!("deleted: {}", deleted);
        }
    }

    Ok(())
}
