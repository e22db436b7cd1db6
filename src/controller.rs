//! Job controller: drives one remote job from submission to a terminal state.
//!
//! `submit()` returns immediately. The job runs on a background Tokio task
//! that submits through the [`JobTransport`], then sleeps a fixed interval and
//! fetches the status, relaying every observation to the [`Observer`] until
//! the job completes or fails.
//!
//! Each job gets a generation number and a [`CancellationToken`]. The token
//! interrupts a pending sleep or in-flight request; the generation is checked
//! under the controller lock before anything is emitted, so a result that
//! arrives for a cancelled or replaced job is dropped.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio_util::sync::CancellationToken;

use crate::error::{JobError, JobResult};
use crate::event::{JobEvent, Observer};
use crate::job::{JobId, JobRequest, JobState, JobStatus};
use crate::state::{ControllerState, Outcome};
use crate::transport::JobTransport;

/// Delay before each status check.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(2000);

/// Failure reason used when a status check itself fails.
pub const STATUS_CHECK_FAILED: &str = "status check failed";

/// Failure reason used when the service reports a failure without a message.
pub const UNKNOWN_ERROR: &str = "unknown error";

struct Shared {
    state: ControllerState,
    generation: u64,
    cancel: Option<CancellationToken>,
}

fn lock(shared: &Mutex<Shared>) -> MutexGuard<'_, Shared> {
    shared.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Owns the lifecycle of at most one active job.
///
/// A second `submit()` while a job is submitting or polling is rejected with
/// [`JobError::AlreadyRunning`]; the active job is not affected. Once the job
/// is terminal (or cancelled) the controller accepts a new submission.
///
/// Dropping the controller cancels the active job.
pub struct JobController<T: JobTransport, O: Observer> {
    transport: Arc<T>,
    observer: Arc<O>,
    poll_interval: Duration,
    shared: Arc<Mutex<Shared>>,
}

impl<T: JobTransport, O: Observer> JobController<T, O> {
    /// Create an idle controller polling every [`DEFAULT_POLL_INTERVAL`].
    pub fn new(transport: T, observer: O) -> Self {
        Self {
            transport: Arc::new(transport),
            observer: Arc::new(observer),
            poll_interval: DEFAULT_POLL_INTERVAL,
            shared: Arc::new(Mutex::new(Shared {
                state: ControllerState::Idle,
                generation: 0,
                cancel: None,
            })),
        }
    }

    /// Set the delay before each status check.
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// The delay before each status check.
    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// The transport this controller submits through.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Snapshot of the current lifecycle state.
    pub fn state(&self) -> ControllerState {
        lock(&self.shared).state.clone()
    }

    /// Check if a job is submitting or being polled.
    pub fn is_active(&self) -> bool {
        lock(&self.shared).state.is_active()
    }

    /// Identifier of the job being polled, if any.
    pub fn current_job(&self) -> Option<JobId> {
        lock(&self.shared).state.job_id().cloned()
    }

    /// Start a job for `request` and return without waiting for it.
    ///
    /// Must be called from within a Tokio runtime. Progress and the outcome
    /// are reported to the observer; the only errors returned here are
    /// [`JobError::AlreadyRunning`] and [`JobError::Configuration`] when no
    /// runtime is available.
    pub fn submit(&self, request: JobRequest) -> JobResult<()> {
        let runtime = Handle::try_current().map_err(|_| {
            JobError::Configuration("submit must be called within a Tokio runtime".into())
        })?;

        let (generation, cancel) = {
            let mut shared = lock(&self.shared);
            if shared.state.is_active() {
                return Err(JobError::AlreadyRunning);
            }
            shared.generation += 1;
            let cancel = CancellationToken::new();
            shared.cancel = Some(cancel.clone());
            shared.state = ControllerState::Submitting;
            (shared.generation, cancel)
        };

        tracing::debug!(
            generation,
            source_url = %request.source_url,
            target_lang = %request.target_lang,
            "Submitting subtitle job",
        );

        let task = JobTask {
            transport: Arc::clone(&self.transport),
            observer: Arc::clone(&self.observer),
            shared: Arc::clone(&self.shared),
            poll_interval: self.poll_interval,
            generation,
            cancel,
        };
        runtime.spawn(task.run(request));
        Ok(())
    }

    /// Stop the active job, if any, and return to `Idle`.
    ///
    /// Idempotent and silent: no event is emitted, and no event for the
    /// cancelled job is emitted after this returns.
    pub fn cancel(&self) {
        let mut shared = lock(&self.shared);
        if let Some(cancel) = shared.cancel.take() {
            cancel.cancel();
        }
        if shared.state == ControllerState::Idle {
            return;
        }
        match shared.state.job_id() {
            Some(job_id) => tracing::info!(job_id = %job_id, "Subtitle job cancelled"),
            None => tracing::debug!(state = %shared.state, "Controller reset"),
        }
        shared.generation += 1;
        shared.state = ControllerState::Idle;
    }
}

impl<T: JobTransport, O: Observer> Drop for JobController<T, O> {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// What one poll means for the job.
enum Step {
    Continue {
        progress: u32,
        message: String,
    },
    Complete {
        progress: u32,
        message: String,
        download_ref: String,
    },
    Fail(JobError),
}

impl Step {
    fn classify(fetched: JobResult<JobStatus>) -> Self {
        let status = match fetched {
            Ok(status) => status,
            Err(err) => return Step::Fail(err),
        };
        match status.state {
            JobState::Queued | JobState::Running => Step::Continue {
                progress: status.progress,
                message: status.message,
            },
            JobState::Completed { download_ref } => Step::Complete {
                progress: status.progress,
                message: status.message,
                download_ref,
            },
            JobState::Failed if status.message.trim().is_empty() => {
                Step::Fail(JobError::RemoteReported(UNKNOWN_ERROR.into()))
            }
            JobState::Failed => Step::Fail(JobError::RemoteReported(status.message)),
        }
    }
}

/// Reason shown for a job that failed while polling.
fn poll_failure_reason(err: &JobError) -> String {
    match err {
        JobError::RemoteReported(message) => message.clone(),
        _ => STATUS_CHECK_FAILED.to_string(),
    }
}

/// Background task for one job generation.
struct JobTask<T: JobTransport, O: Observer> {
    transport: Arc<T>,
    observer: Arc<O>,
    shared: Arc<Mutex<Shared>>,
    poll_interval: Duration,
    generation: u64,
    cancel: CancellationToken,
}

impl<T: JobTransport, O: Observer> JobTask<T, O> {
    async fn run(self, request: JobRequest) {
        let submitted = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return,
            result = self.transport.submit(&request) => result,
        };

        let job_id = match submitted {
            Ok(job_id) => job_id,
            Err(err) => {
                tracing::warn!(error = %err, "Subtitle job submission failed");
                self.with_current(|shared, observer| {
                    let reason = err.to_string();
                    observer.on_event(JobEvent::Failed {
                        reason: reason.clone(),
                    });
                    shared.state = ControllerState::Terminal(Outcome::Failed { reason });
                    shared.cancel = None;
                });
                return;
            }
        };

        let live = self.with_current(|shared, observer| {
            shared.state = ControllerState::Polling {
                job_id: job_id.clone(),
                last_progress: None,
            };
            observer.on_event(JobEvent::Submitted {
                job_id: job_id.clone(),
            });
        });
        if live.is_none() {
            return;
        }
        tracing::info!(job_id = %job_id, "Subtitle job submitted");

        self.poll(&job_id).await;
    }

    async fn poll(&self, job_id: &JobId) {
        let mut attempt: u32 = 0;
        loop {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return,
                _ = tokio::time::sleep(self.poll_interval) => {}
            }

            attempt += 1;
            let fetched = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return,
                result = self.transport.fetch_status(job_id) => result,
            };

            let step = Step::classify(fetched);
            let keep_polling = self
                .with_current(|shared, observer| Self::apply(shared, observer, job_id, attempt, step))
                .unwrap_or(false);
            if !keep_polling {
                return;
            }
        }
    }

    /// Record one poll result and emit its events. Returns whether to poll again.
    fn apply(shared: &mut Shared, observer: &O, job_id: &JobId, attempt: u32, step: Step) -> bool {
        match step {
            Step::Continue { progress, message } => {
                tracing::debug!(job_id = %job_id, attempt, progress, message = %message, "Subtitle job progress");
                shared.state = ControllerState::Polling {
                    job_id: job_id.clone(),
                    last_progress: Some(progress),
                };
                observer.on_event(JobEvent::Progress {
                    percent: progress,
                    message,
                });
                true
            }
            Step::Complete {
                progress,
                message,
                download_ref,
            } => {
                tracing::info!(job_id = %job_id, attempt, download_ref = %download_ref, "Subtitle job completed");
                observer.on_event(JobEvent::Progress {
                    percent: progress,
                    message,
                });
                observer.on_event(JobEvent::Completed {
                    download_ref: download_ref.clone(),
                });
                shared.state = ControllerState::Terminal(Outcome::Completed { download_ref });
                shared.cancel = None;
                false
            }
            Step::Fail(err) => {
                tracing::warn!(job_id = %job_id, attempt, error = %err, "Subtitle job failed");
                let reason = poll_failure_reason(&err);
                observer.on_event(JobEvent::Failed {
                    reason: reason.clone(),
                });
                shared.state = ControllerState::Terminal(Outcome::Failed { reason });
                shared.cancel = None;
                false
            }
        }
    }

    /// Run `f` under the controller lock if this task's job is still current.
    fn with_current<R>(&self, f: impl FnOnce(&mut Shared, &O) -> R) -> Option<R> {
        let mut shared = lock(&self.shared);
        if shared.generation != self.generation {
            tracing::debug!(
                generation = self.generation,
                current = shared.generation,
                "Discarding result for stale job",
            );
            return None;
        }
        Some(f(&mut shared, &self.observer))
    }
}
