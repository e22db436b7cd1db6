//! Controller state machine.
//!
//! ```text
//!   Idle ──submit()──→ Submitting ──ok──→ Polling ──→ Terminal(Completed)
//!    ↑                    │                  │
//!    │                    └──err──┬──────────┴──→ Terminal(Failed)
//!    │                            │
//!    └──────── cancel() ──────────┘   (from any non-Idle state)
//! ```
//!
//! A `Terminal` controller accepts a fresh `submit()`.

use crate::job::JobId;

/// How a job ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The service produced a subtitle file.
    Completed {
        /// Where to fetch it.
        download_ref: String,
    },
    /// The job ended without output.
    Failed {
        /// Human-readable summary.
        reason: String,
    },
}

/// Lifecycle state of a [`JobController`](crate::JobController).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ControllerState {
    /// No job.
    #[default]
    Idle,
    /// Waiting for the transport to create the job.
    Submitting,
    /// Job exists; status is being polled.
    Polling {
        /// Identifier returned on submission.
        job_id: JobId,
        /// Latest reported percentage, `None` before the first poll.
        last_progress: Option<u32>,
    },
    /// The last job ended.
    Terminal(Outcome),
}

impl ControllerState {
    /// Check if a job is currently submitting or being polled.
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            ControllerState::Submitting | ControllerState::Polling { .. }
        )
    }

    /// The active job's identifier, if it has one yet.
    pub fn job_id(&self) -> Option<&JobId> {
        match self {
            ControllerState::Polling { job_id, .. } => Some(job_id),
            _ => None,
        }
    }
}

impl std::fmt::Display for ControllerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ControllerState::Idle => write!(f, "Idle"),
            ControllerState::Submitting => write!(f, "Submitting"),
            ControllerState::Polling { job_id, .. } => write!(f, "Polling({job_id})"),
            ControllerState::Terminal(Outcome::Completed { .. }) => write!(f, "Completed"),
            ControllerState::Terminal(Outcome::Failed { reason }) => write!(f, "Failed: {reason}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_active_states() {
        assert!(!ControllerState::Idle.is_active());
        assert!(ControllerState::Submitting.is_active());
        assert!(
            ControllerState::Polling {
                job_id: "abc".into(),
                last_progress: None
            }
            .is_active()
        );
        assert!(
            !ControllerState::Terminal(Outcome::Failed {
                reason: "x".into()
            })
            .is_active()
        );
    }

    #[test]
    fn test_job_id_only_while_polling() {
        assert_eq!(ControllerState::Submitting.job_id(), None);
        let polling = ControllerState::Polling {
            job_id: "abc".into(),
            last_progress: Some(10),
        };
        assert_eq!(polling.job_id(), Some(&JobId::new("abc")));
    }

    #[test]
    fn test_state_display() {
        assert_eq!(ControllerState::default().to_string(), "Idle");
        assert_eq!(
            ControllerState::Terminal(Outcome::Failed {
                reason: "unknown error".into()
            })
            .to_string(),
            "Failed: unknown error"
        );
    }
}
