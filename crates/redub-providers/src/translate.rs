//! Text translation client.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use redub_core::{DubError, RetryPolicy};

use crate::http::{ensure_success, transport_error};
use crate::retry::with_retry;

/// Largest text the translation service accepts in one request. Callers
/// pre-chunk to this budget; the client rejects oversize input outright.
pub const TRANSLATE_MAX_CHARS: usize = 5000;

#[async_trait]
pub trait Translator: Send + Sync {
    async fn translate(&self, text: &str, source: &str, target: &str)
        -> Result<String, DubError>;
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TranslateResponse {
    translated_text: String,
}

/// LibreTranslate-style HTTP translator.
pub struct HttpTranslator {
    client: reqwest::Client,
    base_url: String,
    policy: RetryPolicy,
}

impl HttpTranslator {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            policy: RetryPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    async fn request(&self, text: &str, source: &str, target: &str) -> Result<String, DubError> {
        let url = format!("{}/translate", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(&json!({ "q": text, "source": source, "target": target }))
            .send()
            .await
            .map_err(|e| transport_error("translator", e))?;
        let parsed: TranslateResponse = ensure_success("translator", response)
            .await?
            .json()
            .await
            .map_err(|e| transport_error("translator", e))?;
        Ok(parsed.translated_text)
    }
}

#[async_trait]
impl Translator for HttpTranslator {
    async fn translate(
        &self,
        text: &str,
        source: &str,
        target: &str,
    ) -> Result<String, DubError> {
        let chars = text.chars().count();
        if chars > TRANSLATE_MAX_CHARS {
            return Err(DubError::InvalidInput(format!(
                "translation request of {chars} chars exceeds the {TRANSLATE_MAX_CHARS} limit"
            )));
        }
        let out = with_retry(&self.policy, "translator", || {
            self.request(text, source, target)
        })
        .await?;
        debug!(chars, target, "translated chunk");
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fast_policy() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 3,
            base_delay_ms: 1,
            max_delay_ms: 5,
            jitter_factor: 0.0,
        }
    }

    #[tokio::test]
    async fn translates_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/translate"))
            .and(body_json(json!({ "q": "hello", "source": "en", "target": "es" })))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "translatedText": "hola" })),
            )
            .mount(&server)
            .await;

        let t = HttpTranslator::new(reqwest::Client::new(), server.uri())
            .with_policy(fast_policy());
        assert_eq!(t.translate("hello", "en", "es").await.unwrap(), "hola");
    }

    #[tokio::test]
    async fn oversize_input_rejected_without_a_request() {
        let server = MockServer::start().await;
        let t = HttpTranslator::new(reqwest::Client::new(), server.uri())
            .with_policy(fast_policy());
        let big = "x".repeat(TRANSLATE_MAX_CHARS + 1);
        let err = t.translate(&big, "en", "es").await.unwrap_err();
        assert_eq!(err.category(), "input");
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn retries_then_succeeds() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/translate"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/translate"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "translatedText": "hola" })),
            )
            .mount(&server)
            .await;

        let t = HttpTranslator::new(reqwest::Client::new(), server.uri())
            .with_policy(fast_policy());
        assert_eq!(t.translate("hello", "en", "es").await.unwrap(), "hola");
    }

    #[tokio::test]
    async fn gives_up_after_exhausting_attempts() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/translate"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let t = HttpTranslator::new(reqwest::Client::new(), server.uri())
            .with_policy(fast_policy());
        let err = t.translate("hello", "en", "es").await.unwrap_err();
        assert!(err.is_retryable());
        assert_eq!(server.received_requests().await.unwrap().len(), 3);
    }
}
