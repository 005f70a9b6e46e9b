use std::time::{Duration, SystemTime};

use masstock_core::Violation;

#[derive(Debug, Clone, thiserror::Error)]
pub enum ClientError {
    /// The API answered with a non-success status and an error body.
    #[error("{status} {code}: {message}")]
    Api {
        status: u16,
        code: String,
        message: String,
        violations: Vec<Violation>,
        retry_after: Option<Duration>,
    },
    #[error("request timed out")]
    Timeout,
    #[error("network error: {0}")]
    Network(String),
    #[error("unexpected response body: {0}")]
    Decode(String),
    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}

impl ClientError {
    /// Worth trying again later: network trouble, timeouts, 408/429/5xx.
    pub fn is_transient(&self) -> bool {
        match self {
            ClientError::Timeout | ClientError::Network(_) => true,
            ClientError::Api { status, .. } => *status >= 500 || matches!(status, 408 | 429),
            ClientError::Decode(_) | ClientError::InvalidUrl(_) => false,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ClientError::Api { status: 404, .. })
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            ClientError::Api { retry_after, .. } => *retry_after,
            _ => None,
        }
    }
}

pub(crate) fn map_reqwest_error(e: reqwest::Error) -> ClientError {
    if e.is_timeout() {
        return ClientError::Timeout;
    }
    if e.is_connect() || e.is_request() || e.is_body() {
        return ClientError::Network(e.to_string());
    }
    if e.is_decode() {
        return ClientError::Decode(e.to_string());
    }
    ClientError::Network(e.to_string())
}

/// `Retry-After` as delta seconds or HTTP-date.
pub(crate) fn parse_retry_after(value: &str, now: SystemTime) -> Option<Duration> {
    let value = value.trim();
    if let Ok(secs) = value.parse::<u64>() {
        return Some(Duration::from_secs(secs));
    }
    httpdate::parse_http_date(value)
        .ok()?
        .duration_since(now)
        .ok()
}
