use crate::utils::error::{Result, SyncError};
use reqwest::header::{HeaderValue, RETRY_AFTER};
use reqwest::{RequestBuilder, Response, StatusCode};
use std::time::Duration;

/// Bounded retry for HTTP 429 responses. Nothing else is retried.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    /// Wait used when the server sends no usable `Retry-After`, multiplied by the attempt number.
    pub fallback_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            fallback_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(60),
        }
    }
}

impl RetryPolicy {
    pub fn no_wait(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            fallback_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
        }
    }

    fn delay_for(&self, attempt: u32, retry_after: Option<&HeaderValue>) -> Duration {
        let delay = parse_retry_after(retry_after)
            .unwrap_or_else(|| self.fallback_delay.saturating_mul(attempt));
        delay.min(self.max_delay)
    }
}

fn parse_retry_after(value: Option<&HeaderValue>) -> Option<Duration> {
    let secs = value?.to_str().ok()?.trim().parse::<u64>().ok()?;
    Some(Duration::from_secs(secs))
}

pub async fn send_with_retry(
    service: &'static str,
    request: RequestBuilder,
    policy: &RetryPolicy,
) -> Result<Response> {
    let attempts = policy.max_attempts.max(1);

    for attempt in 1..=attempts {
        let Some(cloned) = request.try_clone() else {
            return Ok(request.send().await?);
        };

        let response = cloned.send().await?;
        if response.status() != StatusCode::TOO_MANY_REQUESTS {
            return Ok(response);
        }

        if attempt < attempts {
            let delay = policy.delay_for(attempt, response.headers().get(RETRY_AFTER));
            tracing::warn!(
                "⏳ {} rate limited, retry {}/{} in {:?}",
                service,
                attempt,
                attempts - 1,
                delay
            );
            tokio::time::sleep(delay).await;
        }
    }

    Err(SyncError::RateLimited {
        service,
        attempts,
    })
}

/// Turns a non-success response into `SyncError::ApiError`, keeping the body for diagnostics.
pub async fn ensure_success(service: &'static str, response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let message = response.text().await.unwrap_or_default();
    Err(SyncError::ApiError {
        service,
        status: status.as_u16(),
        message,
    })
}
