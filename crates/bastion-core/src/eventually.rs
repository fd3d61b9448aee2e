//! Bounded polling for read-after-write.
//!
//! The read side lags the write side. Callers that must observe their own
//! write poll the read side with [`await_until`] until the expected state
//! appears or the policy's timeout elapses.

use std::future::Future;
use std::time::Duration;

use thiserror::Error;
use tokio::time::Instant;
use tracing::trace;

/// Timeout and backoff for [`await_until`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    /// Total time allowed for all attempts.
    pub timeout: Duration,
    /// Delay after the first failed attempt.
    pub initial_interval: Duration,
    /// Upper bound for the doubling delay.
    pub max_interval: Duration,
}

impl PollPolicy {
    /// Fixed-interval polling.
    #[must_use]
    pub fn fixed(timeout: Duration, interval: Duration) -> Self {
        Self {
            timeout,
            initial_interval: interval,
            max_interval: interval,
        }
    }
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            initial_interval: Duration::from_millis(10),
            max_interval: Duration::from_millis(500),
        }
    }
}

/// Returned when the probe never succeeded within the policy's timeout.
#[derive(Debug, Error)]
#[error("condition not met after {attempts} attempt(s) within {timeout:?}")]
pub struct AwaitError<E> {
    /// Number of probe invocations.
    pub attempts: u32,
    /// The policy timeout that elapsed.
    pub timeout: Duration,
    /// The last error reported by the probe, if it completed at least once.
    pub last_error: Option<E>,
}

/// Repeatedly runs `probe` until it returns `Ok`, backing off between
/// attempts. Each attempt is bounded by the remaining time, so polling stops
/// promptly once the timeout elapses.
///
/// # Errors
///
/// Returns [`AwaitError`] carrying the last probe error if the timeout
/// elapses first.
pub async fn await_until<T, E, F, Fut>(policy: PollPolicy, mut probe: F) -> Result<T, AwaitError<E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let deadline = Instant::now() + policy.timeout;
    let mut interval = policy.initial_interval;
    let mut attempts = 0_u32;
    let mut last_error = None;

    loop {
        attempts += 1;
        match tokio::time::timeout_at(deadline, probe()).await {
            Ok(Ok(value)) => return Ok(value),
            Ok(Err(err)) => last_error = Some(err),
            Err(_) => break,
        }

        let now = Instant::now();
        if now >= deadline {
            break;
        }
        trace!(attempts, ?interval, "condition not met, backing off");
        tokio::time::sleep_until((now + interval).min(deadline)).await;
        interval = (interval * 2).min(policy.max_interval);
    }

    Err(AwaitError {
        attempts,
        timeout: policy.timeout,
        last_error,
    })
}
