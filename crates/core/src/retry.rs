use std::{future::Future, time::Duration};

/// Capped retry with linear backoff (`backoff * attempt` between tries).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff: Duration,
}

impl RetryPolicy {
    pub const fn new(max_attempts: u32, backoff: Duration) -> Self {
        Self {
            max_attempts,
            backoff,
        }
    }

    /// One attempt, no waiting.
    pub const fn once() -> Self {
        Self::new(1, Duration::ZERO)
    }

    fn delay_after(&self, attempt: u32) -> Duration {
        self.backoff.saturating_mul(attempt)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_secs(1))
    }
}

/// Runs `attempt` until it succeeds, returns an error `is_retryable` rejects,
/// or `policy.max_attempts` runs are used up. The last error is returned.
///
/// The closure receives the 1-based attempt number.
pub async fn with_retries<T, E, F, Fut, R>(
    policy: RetryPolicy,
    is_retryable: R,
    mut attempt: F,
) -> Result<T, E>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    R: Fn(&E) -> bool,
    E: std::fmt::Display,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut current = 1;
    loop {
        match attempt(current).await {
            Ok(value) => return Ok(value),
            Err(e) if current < max_attempts && is_retryable(&e) => {
                let delay = policy.delay_after(current);
                tracing::warn!(
                    attempt = current,
                    max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    "Attempt failed, retrying: {e}"
                );
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                current += 1;
            }
            Err(e) => return Err(e),
        }
    }
}
