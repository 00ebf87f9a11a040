use async_trait::async_trait;
use std::fmt;
use std::future::Future;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub struct BackoffPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub max_jitter: Duration,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(10),
            max_jitter: Duration::from_secs(1),
        }
    }
}

impl BackoffPolicy {
    /// Delay after the failed attempt `attempt` (0-based). `jitter` is a fraction in `[0, 1)`.
    pub fn delay_for(&self, attempt: u32, jitter: f64) -> Duration {
        let exponential = self.base_delay.saturating_mul(2u32.saturating_pow(attempt));
        let jitter = self.max_jitter.mul_f64(jitter.clamp(0.0, 1.0));

        exponential.saturating_add(jitter).min(self.max_delay)
    }
}

#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

#[derive(Debug)]
pub enum RetryError<E> {
    /// Every attempt failed with a retryable error; `last` is the final one.
    Exhausted { attempts: u32, last: E },
    Fatal(E),
}

impl<E: fmt::Display> fmt::Display for RetryError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RetryError::Exhausted { attempts, last } => {
                write!(f, "gave up after {} attempts: {}", attempts, last)
            }
            RetryError::Fatal(err) => write!(f, "{}", err),
        }
    }
}

/// Case-insensitive match on the error text providers use for throttling.
pub fn is_rate_limit_message(message: &str) -> bool {
    let message = message.to_lowercase();
    ["429", "too many requests", "resource exhausted", "resource_exhausted"]
        .iter()
        .any(|needle| message.contains(needle))
}

/// Runs `call` until it succeeds, fails with an error `is_retryable` rejects,
/// or `policy.max_attempts` attempts have been made.
pub async fn call_with_backoff<T, E, F, Fut, P>(
    policy: &BackoffPolicy,
    sleeper: &dyn Sleeper,
    is_retryable: P,
    mut call: F,
) -> Result<T, RetryError<E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    P: Fn(&E) -> bool,
    E: fmt::Display,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 0;

    loop {
        let err = match call().await {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };

        if !is_retryable(&err) {
            return Err(RetryError::Fatal(err));
        }

        attempt += 1;
        if attempt >= max_attempts {
            tracing::warn!(attempts = attempt, error = %err, "retries exhausted");
            return Err(RetryError::Exhausted { attempts: attempt, last: err });
        }

        let delay = policy.delay_for(attempt - 1, rand::random::<f64>());
        tracing::warn!(
            attempt,
            max_attempts,
            delay_ms = delay.as_millis() as u64,
            error = %err,
            "rate limited, retrying"
        );
        sleeper.sleep(delay).await;
    }
}
