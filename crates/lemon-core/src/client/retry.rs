//! Timeout and exponential backoff around a single transport call.

use std::time::Duration;

use tokio::time::{sleep, timeout};
use tracing::{debug, warn};

use crate::config::ClientConfig;
use crate::error::NetworkError;
use crate::traits::{HttpRequest, HttpResponse, Transport};

/// How a logical request is attempted.
///
/// Every attempt gets its own `timeout` window. Only transport failures
/// (including timeouts) are retried; any HTTP response, whatever its status,
/// ends the loop. Up to `retries` extra attempts are made after the first,
/// waiting `base_delay * 2^n` before retry `n`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub timeout: Duration,
    pub retries: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &ClientConfig) -> Self {
        Self {
            timeout: config.timeout,
            retries: config.retry_attempts,
            base_delay: config.retry_base_delay,
        }
    }

    /// Backoff to wait after failed attempt number `attempt` (zero-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(2u32.saturating_pow(attempt))
    }

    /// Send `request`, retrying transport failures.
    ///
    /// A timed-out attempt's future is dropped and counts as a failed
    /// attempt.
    pub async fn send(
        &self,
        transport: &dyn Transport,
        request: &HttpRequest,
    ) -> Result<HttpResponse, NetworkError> {
        let mut attempt = 0;
        loop {
            let result = match timeout(self.timeout, transport.send(request.clone())).await {
                Ok(result) => result,
                Err(_) => Err(NetworkError::Timeout {
                    duration_ms: u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX),
                }),
            };

            match result {
                Ok(response) => {
                    debug!(attempt, status = %response.status, "Response received");
                    return Ok(response);
                }
                Err(e) if attempt < self.retries => {
                    let delay = self.delay_for(attempt);
                    warn!(
                        attempt,
                        error = %e,
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        "Request attempt failed, backing off"
                    );
                    sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => {
                    warn!(attempt, error = %e, "Request failed, retries exhausted");
                    return Err(e);
                }
            }
        }
    }
}
