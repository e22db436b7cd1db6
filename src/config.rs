//! Client configuration loaded from environment variables.

use std::time::Duration;

use crate::controller::DEFAULT_POLL_INTERVAL;
use crate::error::{JobError, JobResult};

/// Default base URL of the subtitle service.
pub const DEFAULT_API_BASE: &str = "http://localhost:8000";

/// Default per-request timeout for the HTTP transport.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Settings for [`HttpTransport`](crate::HttpTransport) and the controller cadence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL of the subtitle service, without a trailing slash.
    pub api_base: String,
    /// Delay before each status check.
    pub poll_interval: Duration,
    /// Timeout applied to every HTTP request.
    pub request_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

impl ClientConfig {
    /// Create a configuration for `api_base` with default timings.
    pub fn new(api_base: impl Into<String>) -> Self {
        Self {
            api_base: normalize_base(api_base.into()),
            ..Self::default()
        }
    }

    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                         | Default                 |
    /// |---------------------------------|-------------------------|
    /// | `SUBTITLE_API_BASE`             | `http://localhost:8000` |
    /// | `SUBTITLE_POLL_INTERVAL_MS`     | `2000`                  |
    /// | `SUBTITLE_REQUEST_TIMEOUT_SECS` | `30`                    |
    pub fn from_env() -> JobResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> JobResult<Self> {
        let defaults = Self::default();

        let api_base = lookup("SUBTITLE_API_BASE")
            .map(normalize_base)
            .unwrap_or(defaults.api_base);

        let poll_interval = match lookup("SUBTITLE_POLL_INTERVAL_MS") {
            Some(raw) => Duration::from_millis(parse_u64("SUBTITLE_POLL_INTERVAL_MS", &raw)?),
            None => defaults.poll_interval,
        };

        let request_timeout = match lookup("SUBTITLE_REQUEST_TIMEOUT_SECS") {
            Some(raw) => Duration::from_secs(parse_u64("SUBTITLE_REQUEST_TIMEOUT_SECS", &raw)?),
            None => defaults.request_timeout,
        };

        Ok(Self {
            api_base,
            poll_interval,
            request_timeout,
        })
    }
}

fn normalize_base(raw: String) -> String {
    raw.trim().trim_end_matches('/').to_string()
}

fn parse_u64(key: &str, raw: &str) -> JobResult<u64> {
    raw.trim()
        .parse()
        .map_err(|_| JobError::Configuration(format!("{key} must be a valid u64, got {raw:?}")))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ClientConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, ClientConfig::default());
        assert_eq!(config.api_base, "http://localhost:8000");
        assert_eq!(config.poll_interval, Duration::from_millis(2000));
    }

    #[test]
    fn test_overrides() {
        let config = ClientConfig::from_lookup(lookup(&[
            ("SUBTITLE_API_BASE", "http://127.0.0.1:9000/"),
            ("SUBTITLE_POLL_INTERVAL_MS", "500"),
            ("SUBTITLE_REQUEST_TIMEOUT_SECS", " 5 "),
        ]))
        .unwrap();
        assert_eq!(config.api_base, "http://127.0.0.1:9000");
        assert_eq!(config.poll_interval, Duration::from_millis(500));
        assert_eq!(config.request_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_invalid_number() {
        let err = ClientConfig::from_lookup(lookup(&[("SUBTITLE_POLL_INTERVAL_MS", "soon")]))
            .unwrap_err();
        assert!(matches!(err, JobError::Configuration(_)));
        assert!(err.to_string().contains("SUBTITLE_POLL_INTERVAL_MS"));
    }
}
