//! Job request and remote status types.
//!
//! The remote job state machine, as reported by the subtitle service:
//!
//! ```text
//!   submit() ──→ Queued ──→ Running ──→ Completed(download_ref)
//!                  │           │
//!                  └───────────┴──→ Failed
//! ```
//!
//! **Invariants:**
//! - A `download_ref` exists if and only if the job is `Completed`.
//! - `progress` is relayed verbatim. It is not assumed to be monotonic.
//! - `Completed` and `Failed` are terminal.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{JobError, JobResult};

/// Opaque identifier assigned by the transport on submission.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobId(pub String);

impl JobId {
    /// Create a new job ID.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the raw identifier.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for JobId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for JobId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// A subtitle generation request.
///
/// Immutable once handed to the controller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobRequest {
    /// URL of the video to subtitle.
    pub source_url: String,
    /// Spoken language of the video, or `auto`.
    pub source_lang: String,
    /// Language the subtitles are translated into.
    pub target_lang: String,
}

impl JobRequest {
    /// Create a new request.
    pub fn new(
        source_url: impl Into<String>,
        source_lang: impl Into<String>,
        target_lang: impl Into<String>,
    ) -> Self {
        Self {
            source_url: source_url.into(),
            source_lang: source_lang.into(),
            target_lang: target_lang.into(),
        }
    }

    /// Check that every field is non-empty.
    ///
    /// The controller never calls this; callers that collect the fields from
    /// user input should.
    pub fn validate(&self) -> JobResult<()> {
        let fields = [
            ("source_url", &self.source_url),
            ("source_lang", &self.source_lang),
            ("target_lang", &self.target_lang),
        ];
        match fields.iter().find(|(_, v)| v.trim().is_empty()) {
            Some((name, _)) => Err(JobError::Configuration(format!("{name} must not be empty"))),
            None => Ok(()),
        }
    }
}

/// Remote state of a job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobState {
    /// Waiting for a worker.
    Queued,
    /// Being processed.
    Running,
    /// Finished; the subtitle file can be fetched from `download_ref`.
    Completed {
        /// Path or URL of the produced subtitle file.
        download_ref: String,
    },
    /// The service gave up on the job.
    Failed,
}

impl JobState {
    /// Check if this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobState::Completed { .. } | JobState::Failed)
    }

    /// Check if the job is still pending (queued or running).
    pub fn is_pending(&self) -> bool {
        matches!(self, JobState::Queued | JobState::Running)
    }
}

impl std::fmt::Display for JobState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobState::Queued => write!(f, "Queued"),
            JobState::Running => write!(f, "Running"),
            JobState::Completed { .. } => write!(f, "Completed"),
            JobState::Failed => write!(f, "Failed"),
        }
    }
}

/// One observation of a remote job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobStatus {
    /// Remote state.
    pub state: JobState,
    /// Percentage reported by the service, relayed as-is.
    pub progress: u32,
    /// Human-readable status line reported by the service.
    pub message: String,
    /// When the service last updated this job, if it says.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl JobStatus {
    /// Create a status snapshot.
    pub fn new(state: JobState, progress: u32, message: impl Into<String>) -> Self {
        Self {
            state,
            progress,
            message: message.into(),
            updated_at: None,
        }
    }

    /// Set the service-side update time.
    pub fn with_updated_at(mut self, updated_at: DateTime<Utc>) -> Self {
        self.updated_at = Some(updated_at);
        self
    }

    /// The download reference, present only for completed jobs.
    pub fn download_ref(&self) -> Option<&str> {
        match &self.state {
            JobState::Completed { download_ref } => Some(download_ref),
            _ => None,
        }
    }
}
