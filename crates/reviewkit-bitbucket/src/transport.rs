use std::time::Duration;

use async_trait::async_trait;
use tracing::trace;

use crate::ApiError;

/// Per-request timeout for API calls
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Status and body of one HTTP response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Issues read-only requests against the remote API.
///
/// Implementations return `Ok` for every HTTP response, whatever the status;
/// `Err` is reserved for connection-level faults.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, url: &str) -> Result<HttpResponse, ApiError>;
}

/// Basic-auth credentials (account email + API token)
#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub token: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            token: token.into(),
        }
    }
}

/// [`Transport`] backed by `reqwest`
pub struct ReqwestTransport {
    client: reqwest::Client,
    credentials: Option<Credentials>,
}

impl ReqwestTransport {
    pub fn new(credentials: Option<Credentials>) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("reviewkit/", env!("CARGO_PKG_VERSION")))
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            client,
            credentials,
        })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn get(&self, url: &str) -> Result<HttpResponse, ApiError> {
        let mut request = self.client.get(url);
        if let Some(ref creds) = self.credentials {
            request = request.basic_auth(&creds.username, Some(&creds.token));
        }

        let response = request.send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;

        trace!(url, status, body_len = body.len(), "GET");
        Ok(HttpResponse { status, body })
    }
}
