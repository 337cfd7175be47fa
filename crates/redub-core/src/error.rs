use std::time::Duration;

/// Typed error hierarchy for the dubbing pipeline.
/// Classifies errors as input faults (don't retry, caller's problem),
/// upstream refusals (don't retry), transient upstream failures (retry),
/// or processing failures (abort the job and clean up).
#[derive(Clone, Debug, thiserror::Error)]
pub enum DubError {
    // Input faults: caller sent something unusable
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("unsupported language: {0}")]
    UnsupportedLanguage(String),

    // Upstream said no; retrying will not help
    #[error("{0}")]
    Unavailable(String),

    // Transient upstream failures, retryable
    #[error("rate limited by {service}")]
    RateLimited {
        service: &'static str,
        retry_after: Option<Duration>,
    },
    #[error("{service} error: {message}")]
    Upstream {
        service: &'static str,
        message: String,
    },

    // Local failures: abort and clean up
    #[error("processing failed: {0}")]
    Processing(String),
    #[error("io error: {0}")]
    Io(String),
}

impl DubError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::RateLimited { .. } | Self::Upstream { .. })
    }

    pub fn suggested_delay(&self) -> Option<Duration> {
        if let Self::RateLimited { retry_after, .. } = self {
            *retry_after
        } else {
            None
        }
    }

    /// Short classification string surfaced in error responses and logs.
    pub fn category(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) | Self::UnsupportedLanguage(_) => "input",
            Self::Unavailable(_) => "upstream_unavailable",
            Self::RateLimited { .. } | Self::Upstream { .. } => "transient",
            Self::Processing(_) | Self::Io(_) => "processing",
        }
    }

    /// HTTP status for the request surface: input-class faults are the
    /// caller's (400), everything else is ours (500).
    pub fn http_status(&self) -> u16 {
        match self.category() {
            "input" | "upstream_unavailable" => 400,
            _ => 500,
        }
    }

    /// Classify an HTTP response status from an external service.
    pub fn from_status(service: &'static str, status: u16, body: String) -> Self {
        match status {
            404 => Self::Unavailable(format!("{service}: not found")),
            400..=499 if status == 429 => Self::RateLimited {
                service,
                retry_after: None,
            },
            400..=499 => Self::Unavailable(format!("{service} rejected the request: {body}")),
            _ => Self::Upstream {
                service,
                message: format!("status {status}: {body}"),
            },
        }
    }
}

impl From<std::io::Error> for DubError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_classification() {
        assert!(DubError::RateLimited {
            service: "translator",
            retry_after: None
        }
        .is_retryable());
        assert!(DubError::Upstream {
            service: "speech",
            message: "status 502".into()
        }
        .is_retryable());
        assert!(!DubError::InvalidInput("bad url".into()).is_retryable());
        assert!(!DubError::Unavailable("captions disabled".into()).is_retryable());
        assert!(!DubError::Processing("mix failed".into()).is_retryable());
    }

    #[test]
    fn categories() {
        assert_eq!(DubError::InvalidInput("x".into()).category(), "input");
        assert_eq!(
            DubError::UnsupportedLanguage("xx-XX".into()).category(),
            "input"
        );
        assert_eq!(
            DubError::Unavailable("gone".into()).category(),
            "upstream_unavailable"
        );
        assert_eq!(
            DubError::Upstream {
                service: "s",
                message: "m".into()
            }
            .category(),
            "transient"
        );
        assert_eq!(DubError::Io("disk".into()).category(), "processing");
    }

    #[test]
    fn http_status_mapping() {
        assert_eq!(DubError::InvalidInput("x".into()).http_status(), 400);
        assert_eq!(DubError::Unavailable("x".into()).http_status(), 400);
        assert_eq!(DubError::Processing("x".into()).http_status(), 500);
        assert_eq!(
            DubError::RateLimited {
                service: "s",
                retry_after: None
            }
            .http_status(),
            500
        );
    }

    #[test]
    fn suggested_delay_only_for_rate_limit() {
        let rl = DubError::RateLimited {
            service: "translator",
            retry_after: Some(Duration::from_secs(3)),
        };
        assert_eq!(rl.suggested_delay(), Some(Duration::from_secs(3)));
        assert_eq!(DubError::Processing("x".into()).suggested_delay(), None);
    }

    #[test]
    fn from_status_mapping() {
        assert!(matches!(
            DubError::from_status("captions", 404, String::new()),
            DubError::Unavailable(_)
        ));
        assert!(DubError::from_status("translator", 429, String::new()).is_retryable());
        assert!(DubError::from_status("speech", 500, "oops".into()).is_retryable());
        assert!(matches!(
            DubError::from_status("speech", 403, "denied".into()),
            DubError::Unavailable(_)
        ));
    }

    #[test]
    fn io_error_converts() {
        let e: DubError = std::io::Error::new(std::io::ErrorKind::NotFound, "gone").into();
        assert_eq!(e.category(), "processing");
        assert!(e.to_string().contains("gone"));
    }
}
