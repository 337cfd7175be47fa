//! Shared HTTP response classification.

use redub_core::retry::parse_retry_after;
use redub_core::DubError;

/// Map a transport-level failure to a retryable upstream error.
pub fn transport_error(service: &'static str, err: reqwest::Error) -> DubError {
    DubError::Upstream {
        service,
        message: err.to_string(),
    }
}

/// Turn a non-success response into the matching `DubError`, reading the
/// body for context and the `Retry-After` header on rate limits.
pub async fn ensure_success(
    service: &'static str,
    response: reqwest::Response,
) -> Result<reqwest::Response, DubError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    if status.as_u16() == 429 {
        let retry_after = response
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(parse_retry_after);
        return Err(DubError::RateLimited {
            service,
            retry_after,
        });
    }
    let body = response.text().await.unwrap_or_default();
    Err(DubError::from_status(service, status.as_u16(), body))
}
