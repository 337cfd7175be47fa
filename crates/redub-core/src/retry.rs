//! Retry timing math.
//!
//! The policy and delay computation live here so they stay pure and
//! testable; the async executor that drives them is in redub-providers.

use std::time::Duration;

/// Backoff parameters for calls to external services.
#[derive(Clone, Copy, Debug)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
    /// Symmetric jitter as a fraction of the computed delay.
    pub jitter_factor: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            base_delay_ms: 500,
            max_delay_ms: 10_000,
            jitter_factor: 0.2,
        }
    }
}

impl RetryPolicy {
    /// Delay before retry number `attempt` (0-based: the delay after the
    /// first failure is `backoff_delay(0, ..)`). `random` must be uniform
    /// in `[0, 1)` and spreads the delay across
    /// `[delay * (1 - jitter), delay * (1 + jitter)]`.
    pub fn backoff_delay(&self, attempt: u32, random: f64) -> Duration {
        let exp = self.base_delay_ms.saturating_mul(1u64 << attempt.min(32));
        let capped = exp.min(self.max_delay_ms) as f64;
        let jitter = capped * self.jitter_factor * (2.0 * random - 1.0);
        Duration::from_millis((capped + jitter).max(0.0) as u64)
    }
}

/// Parse a `Retry-After` header value: integer seconds, or an HTTP date.
pub fn parse_retry_after(value: &str) -> Option<Duration> {
    let value = value.trim();
    if let Ok(secs) = value.parse::<u64>() {
        return Some(Duration::from_secs(secs));
    }
    let when = chrono::DateTime::parse_from_rfc2822(value).ok()?;
    let delta = when.signed_duration_since(chrono::Utc::now());
    delta.to_std().ok()
}
