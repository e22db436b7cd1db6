//! Job error types.
//!
//! | Category | Variants | Effect on the active job |
//! |----------|----------|--------------------------|
//! | **Transport** | `Submit`, `Fetch` | Job ends as failed |
//! | **Remote** | `RemoteReported` | Job ends as failed |
//! | **Caller** | `AlreadyRunning`, `Configuration` | Returned from `submit`; active job untouched |
//! | **Service** | `Unavailable` | Raised by health checks; no job effect |
//! | **Download** | `Download` | Raised after completion; no job effect |

use thiserror::Error;

/// Errors surfaced by transports and the job controller.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum JobError {
    /// The job could not be created (network failure or the service refused).
    #[error("Job submission failed: {0}")]
    Submit(String),

    /// A single status check failed, including malformed payloads.
    #[error("Status check failed: {0}")]
    Fetch(String),

    /// The service marked the job as failed.
    #[error("Job failed: {0}")]
    RemoteReported(String),

    /// A submission was attempted while another job is active.
    #[error("A job is already running")]
    AlreadyRunning,

    /// The service did not answer its health check.
    #[error("Service unavailable: {0}")]
    Unavailable(String),

    /// The produced subtitle file could not be retrieved.
    #[error("Download failed: {0}")]
    Download(String),

    /// Invalid configuration or runtime environment.
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl JobError {
    /// Returns `true` if a later attempt could plausibly succeed.
    ///
    /// The controller never retries on its own; this is for callers deciding
    /// whether to offer a resubmission.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Submit(_) | Self::Fetch(_) | Self::Unavailable(_) | Self::Download(_)
        )
    }
}

/// Result type for job operations.
pub type JobResult<T> = Result<T, JobError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_errors() {
        assert!(JobError::Submit("connection refused".into()).is_transient());
        assert!(JobError::Fetch("timeout".into()).is_transient());
        assert!(!JobError::RemoteReported("transcription failed".into()).is_transient());
        assert!(JobError::Unavailable("connection refused".into()).is_transient());
        assert!(!JobError::AlreadyRunning.is_transient());
    }

    #[test]
    fn test_error_display() {
        let err = JobError::AlreadyRunning;
        assert_eq!(err.to_string(), "A job is already running");

        let err = JobError::RemoteReported("transcription failed".into());
        assert_eq!(err.to_string(), "Job failed: transcription failed");
    }
}
