use std::path::PathBuf;
use std::time::Duration;

use reqwest::StatusCode;

/// Problems that keep the form from being submitted.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FormError {
    #[error("Please fill in all required fields")]
    MissingFields { title: bool, description: bool },
    #[error("A submission is already in progress")]
    Busy,
    #[error("Image previews are still loading")]
    PreviewsPending,
}

/// The backend could not serve a request. Never fatal: callers fall back locally.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("request timed out after {}s", .0.as_secs())]
    Timeout(Duration),
    #[error("backend unreachable: {0}")]
    Network(#[source] reqwest::Error),
    #[error("backend returned {0}")]
    Status(StatusCode),
    #[error("invalid response from backend: {0}")]
    Decode(#[source] reqwest::Error),
    #[error("failed to read {}: {source}", path.display())]
    Upload {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ApiError {
    /// Sort a reqwest failure into the taxonomy above.
    pub fn from_reqwest(err: reqwest::Error, timeout: Duration) -> Self {
        if err.is_timeout() {
            ApiError::Timeout(timeout)
        } else if let Some(status) = err.status() {
            ApiError::Status(status)
        } else if err.is_decode() {
            ApiError::Decode(err)
        } else {
            ApiError::Network(err)
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
