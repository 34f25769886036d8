//! Error types for the Bitbucket client

use thiserror::Error;

const UNAUTHORIZED_HINT: &str = "Check your email and API token.";
const FORBIDDEN_HINT: &str = "Ensure your API token has the required scopes: \
                              read:repository:bitbucket, read:pullrequest:bitbucket";

/// Errors that can occur while talking to the Bitbucket API
#[derive(Error, Debug)]
pub enum ApiError {
    /// 401/403. Never retried.
    #[error("Access denied (HTTP {status}) for {url}. {hint}")]
    Auth {
        status: u16,
        url: String,
        hint: &'static str,
    },

    /// Non-retryable HTTP failure
    #[error("API request failed with HTTP {status}: {url}")]
    Http { status: u16, url: String },

    /// Transient failures persisted past the retry budget
    #[error("API request failed with HTTP {status} after {attempts} attempts: {url}")]
    RetriesExhausted {
        status: u16,
        attempts: u32,
        url: String,
    },

    /// Connection-level fault. Never retried.
    #[error("Network error: {0}")]
    Network(String),

    /// Response body did not have the expected shape
    #[error("Invalid response from {url}: {reason}")]
    Decode { url: String, reason: String },
}

impl ApiError {
    pub(crate) fn auth(status: u16, url: &str) -> Self {
        let hint = if status == 401 {
            UNAUTHORIZED_HINT
        } else {
            FORBIDDEN_HINT
        };
        ApiError::Auth {
            status,
            url: url.to_string(),
            hint,
        }
    }

    /// HTTP status carried by the error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Auth { status, .. }
            | ApiError::Http { status, .. }
            | ApiError::RetriesExhausted { status, .. } => Some(*status),
            ApiError::Network(_) | ApiError::Decode { .. } => None,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        ApiError::Network(err.to_string())
    }
}
