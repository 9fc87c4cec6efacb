use std::future::Future;
use std::time::Duration;

use rand::Rng;
use tracing::{info, warn};

/// Splits failures into transient ones worth another attempt and permanent ones.
pub trait IsRetryable {
    fn is_retryable(&self) -> bool;
}

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Retries after the first attempt; `0` disables retrying.
    pub max_retries: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub backoff_multiplier: f64,
    pub jitter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            backoff_multiplier: 2.0,
            jitter: true,
        }
    }
}

impl RetryPolicy {
    pub fn immediate(max_retries: u32) -> Self {
        Self {
            max_retries,
            initial_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            backoff_multiplier: 1.0,
            jitter: false,
        }
    }

    pub async fn run<F, Fut, T, E>(&self, mut operation: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: IsRetryable + std::fmt::Display,
    {
        let mut attempt = 0;
        let mut delay = self.initial_delay;
        loop {
            match operation().await {
                Ok(value) => {
                    if attempt > 0 {
                        info!(attempts = attempt + 1, "request succeeded after retry");
                    }
                    return Ok(value);
                }
                Err(err) if err.is_retryable() && attempt < self.max_retries => {
                    attempt += 1;
                    let wait = self.wait_for(delay);
                    warn!(
                        error = %err,
                        attempt,
                        max_retries = self.max_retries,
                        delay_ms = wait.as_millis() as u64,
                        "transient request failure, retrying"
                    );
                    tokio::time::sleep(wait).await;
                    delay = self.next_delay(delay);
                }
                Err(err) => return Err(err),
            }
        }
    }
}

impl RetryPolicy {
    /// Sleep before the next attempt, never longer than `max_delay`.
    fn wait_for(&self, delay: Duration) -> Duration {
        let wait = if self.jitter { add_jitter(delay) } else { delay };
        wait.min(self.max_delay)
    }

    fn next_delay(&self, delay: Duration) -> Duration {
        scale(delay, self.backoff_multiplier).min(self.max_delay)
    }
}

/// Uniform jitter in `[delay, 2 * delay]`.
fn add_jitter(delay: Duration) -> Duration {
    let factor: f64 = rand::thread_rng().gen_range(0.0..=1.0);
    scale(delay, 1.0 + factor)
}

/// Saturates instead of panicking when the product does not fit a `Duration`.
fn scale(delay: Duration, factor: f64) -> Duration {
    Duration::try_from_secs_f64(delay.as_secs_f64() * factor).unwrap_or(Duration::MAX)
}
