//! Lifecycle events and the observer that receives them.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::job::JobId;

/// Something that happened to the active job.
///
/// Per job, observers see `Submitted`, any number of `Progress`, and then at
/// most one of `Completed` or `Failed`. Cancellation emits nothing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum JobEvent {
    /// The transport accepted the job.
    Submitted {
        /// Identifier assigned by the transport.
        job_id: JobId,
    },
    /// One poll observation. Emitted for every poll, changed or not.
    Progress {
        /// Percentage as reported by the service.
        percent: u32,
        /// Status line as reported by the service.
        message: String,
    },
    /// The job finished and its output is available.
    Completed {
        /// Where to fetch the subtitle file.
        download_ref: String,
    },
    /// The job ended without output.
    Failed {
        /// Human-readable summary suitable for display.
        reason: String,
    },
}

impl JobEvent {
    /// Check if this event ends the job.
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobEvent::Completed { .. } | JobEvent::Failed { .. })
    }
}

/// Consumer of [`JobEvent`]s.
///
/// Called from the controller's background task while the controller's lock
/// is held. Implementations must return quickly and must not call back into
/// the controller.
pub trait Observer: Send + Sync + 'static {
    /// Receive one event.
    fn on_event(&self, event: JobEvent);
}

impl Observer for mpsc::UnboundedSender<JobEvent> {
    fn on_event(&self, event: JobEvent) {
        if self.send(event).is_err() {
            tracing::debug!("Job event receiver dropped");
        }
    }
}

impl<O: Observer + ?Sized> Observer for Arc<O> {
    fn on_event(&self, event: JobEvent) {
        (**self).on_event(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_events() {
        assert!(!JobEvent::Submitted { job_id: "abc".into() }.is_terminal());
        assert!(
            !JobEvent::Progress {
                percent: 10,
                message: "downloading".into()
            }
            .is_terminal()
        );
        assert!(
            JobEvent::Completed {
                download_ref: "/files/abc.srt".into()
            }
            .is_terminal()
        );
        assert!(
            JobEvent::Failed {
                reason: "unknown error".into()
            }
            .is_terminal()
        );
    }

    #[test]
    fn test_channel_observer_forwards_in_order() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        tx.on_event(JobEvent::Submitted { job_id: "abc".into() });
        tx.on_event(JobEvent::Progress {
            percent: 10,
            message: "downloading".into(),
        });

        assert_eq!(rx.try_recv().unwrap(), JobEvent::Submitted { job_id: "abc".into() });
        assert!(matches!(rx.try_recv().unwrap(), JobEvent::Progress { percent: 10, .. }));
    }

    #[test]
    fn test_channel_observer_tolerates_closed_receiver() {
        let (tx, rx) = mpsc::unbounded_channel();
        drop(rx);
        tx.on_event(JobEvent::Failed {
            reason: "status check failed".into(),
        });
    }

    #[test]
    fn test_event_serialization_tag() {
        let json = serde_json::to_value(JobEvent::Completed {
            download_ref: "/download/abc".into(),
        })
        .unwrap();
        assert_eq!(json["type"], "completed");
        assert_eq!(json["download_ref"], "/download/abc");
    }
}
