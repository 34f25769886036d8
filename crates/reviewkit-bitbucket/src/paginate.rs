use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::{ApiError, RetryPolicy, Sleeper, Transport};

/// One page of a cursor-paginated listing
#[derive(Debug, Deserialize)]
struct Page {
    #[serde(default)]
    values: Vec<Value>,
    #[serde(default)]
    next: Option<String>,
}

/// Follows `next` cursors and retries transient failures
#[derive(Clone)]
pub struct Paginator {
    transport: Arc<dyn Transport>,
    sleeper: Arc<dyn Sleeper>,
    policy: RetryPolicy,
}

impl Paginator {
    pub fn new(transport: Arc<dyn Transport>, sleeper: Arc<dyn Sleeper>) -> Self {
        Self {
            transport,
            sleeper,
            policy: RetryPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub fn sleeper(&self) -> &Arc<dyn Sleeper> {
        &self.sleeper
    }

    /// GET `url` and decode the JSON body.
    ///
    /// 429/500/502/503/504 responses are retried up to the policy's budget with
    /// exponential backoff; 401/403, other non-2xx statuses and network faults
    /// fail immediately.
    pub async fn get_json(&self, url: &str) -> Result<Value, ApiError> {
        let mut retries = 0;

        loop {
            let response = self.transport.get(url).await?;

            if response.is_success() {
                return serde_json::from_str(&response.body).map_err(|e| ApiError::Decode {
                    url: url.to_string(),
                    reason: e.to_string(),
                });
            }

            match response.status {
                401 | 403 => return Err(ApiError::auth(response.status, url)),
                status if RetryPolicy::is_transient(status) => {
                    if retries >= self.policy.max_retries {
                        return Err(ApiError::RetriesExhausted {
                            status,
                            attempts: retries + 1,
                            url: url.to_string(),
                        });
                    }
                    retries += 1;
                    let delay = self.policy.backoff(retries);
                    warn!(
                        url,
                        status,
                        retry = retries,
                        delay_ms = delay.as_millis(),
                        "Transient API failure, retrying"
                    );
                    self.sleeper.sleep(delay).await;
                }
                status => {
                    return Err(ApiError::Http {
                        status,
                        url: url.to_string(),
                    })
                }
            }
        }
    }

    /// Collect `values` from every page, in page order, starting at `start_url`
    pub async fn fetch_all(&self, start_url: &str) -> Result<Vec<Value>, ApiError> {
        let mut results = Vec::new();
        let mut next = Some(start_url.to_string());
        let mut page_number = 0;

        while let Some(url) = next.take() {
            page_number += 1;
            let body = self.get_json(&url).await?;
            let page: Page = serde_json::from_value(body).map_err(|e| ApiError::Decode {
                url: url.clone(),
                reason: e.to_string(),
            })?;

            debug!(
                url = %url,
                page = page_number,
                values = page.values.len(),
                total = results.len() + page.values.len(),
                "Fetched page"
            );

            results.extend(page.values);
            next = page.next.filter(|n| !n.is_empty());
        }

        Ok(results)
    }
}
