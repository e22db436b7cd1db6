//! Subtitle Jobs: client-side lifecycle control for remote subtitle generation
//!
//! This crate submits a long-running subtitle job (download a video,
//! transcribe it, translate the subtitles) to a remote service and tracks it to
//! completion without the caller ever blocking.
//!
//! # Overview
//!
//! - [`JobController`] owns at most one active job: submission, the polling
//!   loop, transition detection, termination and cancellation
//! - [`JobTransport`] is the network boundary; [`HttpTransport`] speaks the
//!   service's JSON API
//! - [`Observer`] receives [`JobEvent`]s in emission order
//! - [`JobRequest`] / [`JobId`] / [`JobStatus`] describe jobs
//! - [`JobError`] categorizes every failure
//!
//! # Lifecycle
//!
//! ```text
//!   submit() ──→ Submitted ──→ Progress* ──→ Completed | Failed
//!                  (every 2 s: fetch_status())
//! ```
//!
//! ```ignore
//! use subtitle_jobs::{HttpTransport, JobController, JobRequest};
//! use tokio::sync::mpsc;
//!
//! let (tx, mut events) = mpsc::unbounded_channel();
//! let controller = JobController::new(HttpTransport::new("http://localhost:8000"), tx);
//! controller.submit(JobRequest::new("https://example.com/v.mp4", "auto", "pt"))?;
//! while let Some(event) = events.recv().await {
//!     println!("{event:?}");
//!     if event.is_terminal() {
//!         break;
//!     }
//! }
//! ```

pub mod config;
pub mod controller;
pub mod error;
pub mod event;
pub mod http;
pub mod job;
pub mod state;
pub mod transport;

pub use config::ClientConfig;
pub use controller::{DEFAULT_POLL_INTERVAL, JobController};
pub use error::{JobError, JobResult};
pub use event::{JobEvent, Observer};
pub use http::HttpTransport;
pub use job::{JobId, JobRequest, JobState, JobStatus};
pub use state::{ControllerState, Outcome};
pub use transport::JobTransport;
