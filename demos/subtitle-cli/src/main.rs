//! `subtitle-cli` -- submit one video to the subtitle service and wait for it.
//!
//! # Environment variables
//!
//! | Variable                        | Required | Default                 | Description                     |
//! |---------------------------------|----------|-------------------------|---------------------------------|
//! | `SUBTITLE_VIDEO_URL`            | yes      | --                      | Video to subtitle               |
//! | `SUBTITLE_SOURCE_LANG`          | no       | `auto`                  | Spoken language                 |
//! | `SUBTITLE_TARGET_LANG`          | no       | `pt`                    | Subtitle language               |
//! | `SUBTITLE_OUTPUT_DIR`           | no       | `.`                     | Where the `.srt` file is saved  |
//! | `SUBTITLE_API_BASE`             | no       | `http://localhost:8000` | Service base URL                |
//! | `SUBTITLE_POLL_INTERVAL_MS`     | no       | `2000`                  | Delay between status checks     |
//! | `SUBTITLE_REQUEST_TIMEOUT_SECS` | no       | `30`                    | Per-request HTTP timeout        |

use std::path::PathBuf;

use subtitle_jobs::{ClientConfig, HttpTransport, JobController, JobEvent, JobId, JobRequest};
use tokio::sync::mpsc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "subtitle_cli=info,subtitle_jobs=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let video_url = std::env::var("SUBTITLE_VIDEO_URL").unwrap_or_else(|_| {
        tracing::error!("SUBTITLE_VIDEO_URL environment variable is required");
        std::process::exit(1);
    });
    let request = JobRequest::new(
        video_url,
        env_or("SUBTITLE_SOURCE_LANG", "auto"),
        env_or("SUBTITLE_TARGET_LANG", "pt"),
    );
    request.validate()?;
    let output_dir = PathBuf::from(env_or("SUBTITLE_OUTPUT_DIR", "."));

    let config = ClientConfig::from_env()?;
    let transport = HttpTransport::from_config(&config)?;

    let banner = transport.health().await?;
    tracing::info!(api_base = %config.api_base, %banner, "Subtitle service reachable");

    let (tx, mut events) = mpsc::unbounded_channel();
    let controller = JobController::new(transport, tx).with_poll_interval(config.poll_interval);
    controller.submit(request)?;

    let mut job_id: Option<JobId> = None;
    loop {
        let event = tokio::select! {
            event = events.recv() => event,
            _ = tokio::signal::ctrl_c() => {
                controller.cancel();
                tracing::warn!("Interrupted; job cancelled");
                std::process::exit(130);
            }
        };
        let Some(event) = event else { break };

        match event {
            JobEvent::Submitted { job_id: id } => {
                println!("Job created: {id}");
                job_id = Some(id);
            }
            JobEvent::Progress { percent, message } => {
                println!("[{percent:3}%] {message}");
            }
            JobEvent::Completed { download_ref } => {
                let bytes = controller.transport().download(&download_ref).await?;
                let name = match &job_id {
                    Some(id) => format!("subtitles_{id}.srt"),
                    None => "subtitles.srt".to_string(),
                };
                let path = output_dir.join(name);
                tokio::fs::write(&path, &bytes).await?;
                println!("Saved {} ({} bytes)", path.display(), bytes.len());
                break;
            }
            JobEvent::Failed { reason } => {
                eprintln!("Processing failed: {reason}");
                std::process::exit(1);
            }
        }
    }

    Ok(())
}
