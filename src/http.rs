//! HTTP transport for the subtitle service.
//!
//! Speaks the service's JSON API using [`reqwest`]:
//!
//! | Operation | Request | Response |
//! |-----------|---------|----------|
//! | submit | `POST /generate-subtitles` `{video_url, source_lang, target_lang}` | `{job_id}` |
//! | status | `GET /status/{job_id}` | `{status, progress, message, download_url?, timestamp?}` |
//! | download | `GET {download_url}` | subtitle file bytes |
//! | health | `GET /` | `{message}` |

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::ClientConfig;
use crate::error::{JobError, JobResult};
use crate::job::{JobId, JobRequest, JobState, JobStatus};
use crate::transport::JobTransport;

/// Errors from the HTTP layer, before they are mapped onto [`JobError`].
#[derive(Debug, thiserror::Error)]
enum HttpError {
    /// The request itself failed (network, DNS, TLS, timeout, body decoding).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The service returned a non-2xx status code.
    #[error("service error ({status}): {body}")]
    Api { status: u16, body: String },
}

/// Body of `POST /generate-subtitles`.
#[derive(Debug, Serialize)]
struct SubmitBody<'a> {
    video_url: &'a str,
    source_lang: &'a str,
    target_lang: &'a str,
}

/// Response of `POST /generate-subtitles`.
#[derive(Debug, Deserialize)]
struct SubmitResponse {
    job_id: String,
    #[serde(default)]
    message: Option<String>,
}

/// Response of `GET /`.
#[derive(Debug, Deserialize)]
struct HealthResponse {
    message: String,
}

/// Raw payload of `GET /status/{job_id}`.
///
/// `status` is always required. `progress` and `message` are required too,
/// except on failure reports, which may omit them. The service sends
/// `download_url: null` until completion.
#[derive(Debug, Clone, Deserialize)]
pub struct StatusPayload {
    /// One of `queued`, `pending`, `processing`, `running`, `completed`,
    /// `error`, `failed`.
    pub status: String,
    /// Percentage, `0..=100` by convention.
    #[serde(default)]
    pub progress: Option<u32>,
    /// Status line.
    #[serde(default)]
    pub message: Option<String>,
    /// Where the subtitle file can be fetched once completed.
    #[serde(default)]
    pub download_url: Option<String>,
    /// Last update, in fractional seconds since the Unix epoch.
    #[serde(default)]
    pub timestamp: Option<f64>,
}

impl TryFrom<StatusPayload> for JobStatus {
    type Error = JobError;

    fn try_from(payload: StatusPayload) -> JobResult<Self> {
        let failed = matches!(payload.status.as_str(), "error" | "failed");
        let state = match payload.status.as_str() {
            "queued" | "pending" => JobState::Queued,
            "processing" | "running" => JobState::Running,
            "completed" => match payload.download_url {
                Some(download_ref) if !download_ref.is_empty() => {
                    JobState::Completed { download_ref }
                }
                _ => {
                    return Err(JobError::Fetch(
                        "completed status without download_url".into(),
                    ));
                }
            },
            "error" | "failed" => JobState::Failed,
            other => return Err(JobError::Fetch(format!("unknown job status {other:?}"))),
        };

        let (progress, message) = match (payload.progress, payload.message) {
            (Some(progress), Some(message)) => (progress, message),
            (progress, message) if failed => (progress.unwrap_or(0), message.unwrap_or_default()),
            (None, _) => return Err(JobError::Fetch("missing field `progress`".into())),
            (_, None) => return Err(JobError::Fetch("missing field `message`".into())),
        };

        let mut status = JobStatus::new(state, progress, message);
        if let Some(updated_at) = payload.timestamp.and_then(epoch_seconds) {
            status = status.with_updated_at(updated_at);
        }
        Ok(status)
    }
}

#[allow(clippy::cast_possible_truncation)]
fn epoch_seconds(seconds: f64) -> Option<DateTime<Utc>> {
    if !seconds.is_finite() {
        return None;
    }
    DateTime::from_timestamp_millis((seconds * 1000.0).round() as i64)
}

/// [`JobTransport`] over the subtitle service's HTTP API.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    api_base: String,
}

impl HttpTransport {
    /// Create a transport for `api_base`, e.g. `http://localhost:8000`.
    pub fn new(api_base: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), api_base)
    }

    /// Create a transport reusing an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, api_base: impl Into<String>) -> Self {
        let api_base = api_base.into().trim_end_matches('/').to_string();
        Self { client, api_base }
    }

    /// Create a transport whose requests time out after `config.request_timeout`.
    pub fn from_config(config: &ClientConfig) -> JobResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| JobError::Configuration(format!("HTTP client: {e}")))?;
        Ok(Self::with_client(client, config.api_base.clone()))
    }

    /// Base URL requests are sent to.
    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    /// Check that the service is up and return its banner message.
    pub async fn health(&self) -> JobResult<String> {
        let url = self.endpoint(&[]).map_err(JobError::Configuration)?;
        let check = async {
            let response = self.client.get(url).send().await?;
            Self::parse_response::<HealthResponse>(response).await
        };
        let health = check
            .await
            .map_err(|e| JobError::Unavailable(e.to_string()))?;
        Ok(health.message)
    }

    /// Resolve a `download_ref` reported by the service to an absolute URL.
    ///
    /// Absolute references are returned unchanged; paths are joined to the
    /// API base.
    pub fn download_url(&self, download_ref: &str) -> String {
        if download_ref.starts_with("http://") || download_ref.starts_with("https://") {
            return download_ref.to_string();
        }
        let path = download_ref.trim_start_matches('/');
        format!("{}/{}", self.api_base, path)
    }

    /// Fetch the subtitle file behind `download_ref`.
    pub async fn download(&self, download_ref: &str) -> JobResult<Vec<u8>> {
        let url = self.download_url(download_ref);
        let fetch = async {
            let response = self.client.get(&url).send().await?;
            let response = Self::ensure_success(response).await?;
            Ok::<_, HttpError>(response.bytes().await?.to_vec())
        };
        let bytes = fetch
            .await
            .map_err(|e| JobError::Download(e.to_string()))?;
        tracing::info!(url = %url, bytes = bytes.len(), "Subtitle file downloaded");
        Ok(bytes)
    }

    // ---- private helpers ----

    /// Join `segments` onto the API base, percent-encoding each one so an
    /// opaque job id cannot change the route.
    fn endpoint(&self, segments: &[&str]) -> Result<reqwest::Url, String> {
        let mut url = reqwest::Url::parse(&self.api_base)
            .map_err(|e| format!("invalid API base {:?}: {e}", self.api_base))?;
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|()| format!("API base {:?} cannot carry a path", self.api_base))?;
            path.pop_if_empty();
            if segments.is_empty() {
                path.push("");
            }
            for segment in segments {
                path.push(segment);
            }
        }
        Ok(url)
    }

    /// Return the response unchanged on a 2xx status, or an
    /// [`HttpError::Api`] carrying the status and body text.
    async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, HttpError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(HttpError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    /// Parse a successful JSON response body into the expected type.
    async fn parse_response<R: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<R, HttpError> {
        let response = Self::ensure_success(response).await?;
        Ok(response.json::<R>().await?)
    }
}

#[async_trait]
impl JobTransport for HttpTransport {
    async fn submit(&self, request: &JobRequest) -> JobResult<JobId> {
        let body = SubmitBody {
            video_url: &request.source_url,
            source_lang: &request.source_lang,
            target_lang: &request.target_lang,
        };

        let url = self
            .endpoint(&["generate-subtitles"])
            .map_err(JobError::Submit)?;
        let submit = async {
            let response = self
                .client
                .post(url)
                .json(&body)
                .send()
                .await?;
            Self::parse_response::<SubmitResponse>(response).await
        };
        let accepted = submit
            .await
            .map_err(|e| JobError::Submit(e.to_string()))?;

        if accepted.job_id.is_empty() {
            return Err(JobError::Submit("service returned an empty job_id".into()));
        }
        tracing::debug!(
            job_id = %accepted.job_id,
            message = accepted.message.as_deref().unwrap_or(""),
            "Service accepted subtitle job",
        );
        Ok(JobId::new(accepted.job_id))
    }

    async fn fetch_status(&self, job_id: &JobId) -> JobResult<JobStatus> {
        let url = self
            .endpoint(&["status", job_id.as_str()])
            .map_err(JobError::Fetch)?;
        let fetch = async {
            let response = self
                .client
                .get(url)
                .send()
                .await?;
            Self::parse_response::<StatusPayload>(response).await
        };
        let payload = fetch.await.map_err(|e| JobError::Fetch(e.to_string()))?;
        JobStatus::try_from(payload)
    }
}
