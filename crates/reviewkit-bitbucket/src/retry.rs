use std::time::Duration;

/// Bounded exponential backoff for idempotent reads
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt (0 = run once)
    pub max_retries: u32,
    /// Delay before the first retry; doubles for each following retry
    pub backoff_base: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            backoff_base: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32, backoff_base: Duration) -> Self {
        Self {
            max_retries,
            backoff_base,
        }
    }

    /// Delay before retry number `retry` (1-based)
    pub fn backoff(&self, retry: u32) -> Duration {
        let factor = 2u32.saturating_pow(retry.saturating_sub(1));
        self.backoff_base.saturating_mul(factor)
    }

    /// Rate limiting and the server-side failures worth repeating
    pub fn is_transient(status: u16) -> bool {
        matches!(status, 429 | 500 | 502 | 503 | 504)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_retries, 3);
        assert_eq!(policy.backoff_base, Duration::from_secs(1));
    }

    #[test]
    fn test_backoff_doubles() {
        let policy = RetryPolicy::new(5, Duration::from_millis(100));
        assert_eq!(policy.backoff(1), Duration::from_millis(100));
        assert_eq!(policy.backoff(2), Duration::from_millis(200));
        assert_eq!(policy.backoff(3), Duration::from_millis(400));
    }

    #[test]
    fn test_backoff_saturates() {
        let policy = RetryPolicy::new(100, Duration::from_secs(1));
        assert!(policy.backoff(64) >= policy.backoff(10));
    }

    #[test]
    fn test_transient_statuses() {
        for status in [429, 500, 502, 503, 504] {
            assert!(RetryPolicy::is_transient(status), "{status}");
        }
        for status in [200, 400, 401, 403, 404, 501, 505] {
            assert!(!RetryPolicy::is_transient(status), "{status}");
        }
    }
}
