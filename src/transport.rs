//! Transport trait: the network boundary of the job lifecycle.
//!
//! ```text
//!   submit() ──→ fetch_status() ──→ fetch_status() ──→ ... ──→ terminal
//!   (async)         (async)            (async)
//! ```
//!
//! ## Method table
//!
//! | Method | Kind | Fails with | Returns |
//! |--------|------|------------|---------|
//! | `submit()` | async | `JobError::Submit` | `JobResult<JobId>` |
//! | `fetch_status()` | async | `JobError::Fetch` | `JobResult<JobStatus>` |

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::JobResult;
use crate::job::{JobId, JobRequest, JobStatus};

/// Network boundary used by [`JobController`](crate::JobController).
///
/// # Contract
///
/// - `submit()` creates exactly one remote job and returns its identifier.
/// - `fetch_status()` returns one snapshot. A payload missing required
///   fields MUST be reported as `JobError::Fetch`, not defaulted.
/// - Timeouts are the implementation's concern. The controller treats any
///   error as terminal for the job and never retries.
#[async_trait]
pub trait JobTransport: Send + Sync + 'static {
    /// Create a remote job for `request`.
    async fn submit(&self, request: &JobRequest) -> JobResult<JobId>;

    /// Fetch the current status of `job_id`.
    async fn fetch_status(&self, job_id: &JobId) -> JobResult<JobStatus>;
}

#[async_trait]
impl<T: JobTransport + ?Sized> JobTransport for Arc<T> {
    async fn submit(&self, request: &JobRequest) -> JobResult<JobId> {
        (**self).submit(request).await
    }

    async fn fetch_status(&self, job_id: &JobId) -> JobResult<JobStatus> {
        (**self).fetch_status(job_id).await
    }
}
