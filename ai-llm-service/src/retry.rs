//! Bounded retry with linear backoff.
//!
//! The loop itself knows nothing about HTTP: each attempt reports back an
//! [`Attempt`] produced by the caller's classification of whatever happened,
//! and the loop only decides whether to sleep and go again. Backoff is
//! strictly linear (the caller scales the delay by the attempt number); no
//! jitter, no circuit breaker.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

use crate::error_handler::{AiLlmError, Result};

/// Outcome of a single attempt, as judged by the caller's classifier.
#[derive(Debug)]
pub enum Attempt<T> {
    /// The operation succeeded; stop retrying.
    Done(T),
    /// A permanent failure; surface immediately without further attempts.
    FailFast(AiLlmError),
    /// A transient failure; sleep `delay` and try again (budget permitting).
    RetryAfter {
        /// How long to wait before the next attempt.
        delay: Duration,
        /// The error that caused this attempt to fail.
        error: AiLlmError,
    },
}

/// Runs `op` up to `max_attempts` times (1-based attempt numbers).
///
/// Sleeps between attempts as instructed by [`Attempt::RetryAfter`]; the
/// sleep after the final attempt is skipped since nothing follows it.
///
/// # Errors
/// - The [`Attempt::FailFast`] error, verbatim.
/// - [`AiLlmError::RetriesExhausted`] when every attempt asked for a retry.
pub async fn run_with_retry<T, F, Fut>(max_attempts: u32, mut op: F) -> Result<T>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Attempt<T>>,
{
    let mut last: Option<AiLlmError> = None;

    for attempt in 1..=max_attempts {
        match op(attempt).await {
            Attempt::Done(v) => return Ok(v),
            Attempt::FailFast(e) => return Err(e),
            Attempt::RetryAfter { delay, error } => {
                warn!(
                    attempt,
                    max_attempts,
                    delay_secs = delay.as_secs(),
                    "attempt failed: {error}"
                );
                last = Some(error);
                if attempt < max_attempts {
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    Err(AiLlmError::RetriesExhausted {
        attempts: max_attempts,
        last: last
            .map(|e| e.to_string())
            .unwrap_or_else(|| "no attempts were made".to_string()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use tokio::time::Instant;

    #[tokio::test(start_paused = true)]
    async fn fail_fast_stops_after_one_attempt() {
        let calls = RefCell::new(0u32);
        let res: Result<()> = run_with_retry(3, |_attempt| {
            *calls.borrow_mut() += 1;
            async { Attempt::FailFast(AiLlmError::PayloadTooLarge) }
        })
        .await;

        assert!(matches!(res, Err(AiLlmError::PayloadTooLarge)));
        assert_eq!(*calls.borrow(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn retries_use_strictly_increasing_waits() {
        let started = Instant::now();
        let calls = RefCell::new(0u32);

        let res: Result<()> = run_with_retry(3, |attempt| {
            *calls.borrow_mut() += 1;
            async move {
                Attempt::RetryAfter {
                    delay: Duration::from_secs(u64::from(attempt) * 30),
                    error: AiLlmError::RateLimited,
                }
            }
        })
        .await;

        assert!(matches!(
            res,
            Err(AiLlmError::RetriesExhausted { attempts: 3, .. })
        ));
        assert_eq!(*calls.borrow(), 3);
        // Two sleeps happen: 30s after attempt 1, 60s after attempt 2; the
        // sleep after the final attempt is skipped.
        assert_eq!(started.elapsed(), Duration::from_secs(90));
    }

    #[tokio::test(start_paused = true)]
    async fn success_after_transient_failures() {
        let calls = RefCell::new(0u32);
        let res = run_with_retry(3, |attempt| {
            *calls.borrow_mut() += 1;
            async move {
                if attempt < 3 {
                    Attempt::RetryAfter {
                        delay: Duration::from_secs(u64::from(attempt) * 10),
                        error: AiLlmError::HttpStatus {
                            status: 503,
                            url: "http://x".into(),
                            snippet: String::new(),
                        },
                    }
                } else {
                    Attempt::Done("reply".to_string())
                }
            }
        })
        .await;

        assert_eq!(res.unwrap(), "reply");
        assert_eq!(*calls.borrow(), 3);
    }
}
