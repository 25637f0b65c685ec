//! Retry classification and backoff delays.

use awsrpc_core::ApiError;
use rand::Rng;
use std::fmt::Debug;
use std::time::Duration;

/// Decides whether a service error is transient.
pub trait RetryPolicy: Debug + Send + Sync + 'static {
    /// Return true when the call should be attempted again.
    fn is_retryable(&self, err: &ApiError) -> bool;
}

/// Computes the delay before the next attempt.
pub trait BackoffPolicy: Debug + Send + Sync + 'static {
    /// Delay to wait after `retry_count` retries have already been performed.
    fn delay(&self, retry_count: u32) -> Duration;
}

const RETRYABLE_STATUS: &[u16] = &[429, 500, 502, 503, 504];

const RETRYABLE_CODES: &[&str] = &[
    "Throttling",
    "ThrottlingException",
    "ThrottledException",
    "RequestThrottled",
    "RequestThrottledException",
    "TooManyRequestsException",
    "RequestLimitExceeded",
    "ProvisionedThroughputExceededException",
    "BandwidthLimitExceeded",
    "SlowDown",
    "RequestTimeout",
    "RequestTimeoutException",
    "InternalError",
    "InternalFailure",
    "ServiceUnavailable",
];

/// Retries throttling codes and the 429, 500, 502, 503 and 504 statuses.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultRetryPolicy;

impl RetryPolicy for DefaultRetryPolicy {
    fn is_retryable(&self, err: &ApiError) -> bool {
        RETRYABLE_STATUS.contains(&err.status) || RETRYABLE_CODES.contains(&err.code.as_str())
    }
}

/// Never retries.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoRetryPolicy;

impl RetryPolicy for NoRetryPolicy {
    fn is_retryable(&self, _: &ApiError) -> bool {
        false
    }
}

/// Exponential backoff with jitter.
///
/// The delay after `n` retries is `(base + rand[0, base)) * 2^min(n, max_exponent)`.
#[derive(Debug, Clone, Copy)]
pub struct ExponentialBackoff {
    base: Duration,
    max_exponent: u32,
}

impl Default for ExponentialBackoff {
    fn default() -> Self {
        Self {
            base: Duration::from_millis(30),
            max_exponent: 8,
        }
    }
}

impl ExponentialBackoff {
    /// Create a backoff with the given base delay.
    pub fn new(base: Duration) -> Self {
        Self {
            base,
            ..Default::default()
        }
    }

    /// Cap the exponent so delays stop growing after `max_exponent` retries.
    pub fn with_max_exponent(mut self, max_exponent: u32) -> Self {
        self.max_exponent = max_exponent;
        self
    }
}

impl BackoffPolicy for ExponentialBackoff {
    fn delay(&self, retry_count: u32) -> Duration {
        let base_ms = u64::try_from(self.base.as_millis()).unwrap_or(u64::MAX);
        if base_ms == 0 {
            return Duration::ZERO;
        }

        let factor = 2u64.saturating_pow(retry_count.min(self.max_exponent));
        let jitter = rand::thread_rng().gen_range(0..base_ms);
        Duration::from_millis(base_ms.saturating_add(jitter).saturating_mul(factor))
    }
}
