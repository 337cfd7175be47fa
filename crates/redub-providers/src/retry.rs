//! Async retry executor.
//!
//! The timing math lives in `redub_core::retry`; this module drives it
//! with tokio sleeps and real randomness.

use std::future::Future;

use rand::Rng;
use tracing::warn;

use redub_core::{DubError, RetryPolicy};

/// Run `op` up to `policy.max_attempts` times, sleeping between attempts.
/// Only errors marked retryable are retried; a rate-limit's suggested
/// delay takes precedence over the computed backoff.
pub async fn with_retry<T, F, Fut>(
    policy: &RetryPolicy,
    service: &'static str,
    mut op: F,
) -> Result<T, DubError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, DubError>>,
{
    let mut attempt = 0u32;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                let out_of_attempts = attempt + 1 >= policy.max_attempts.max(1);
                if !err.is_retryable() || out_of_attempts {
                    return Err(err);
                }
                let delay = err.suggested_delay().unwrap_or_else(|| {
                    policy.backoff_delay(attempt, rand::thread_rng().gen::<f64>())
                });
                warn!(
                    service,
                    attempt = attempt + 1,
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "retrying after transient failure"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}
