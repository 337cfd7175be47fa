//! Speech synthesis client.

use async_trait::async_trait;
use bytes::Bytes;
use secrecy::{ExposeSecret, SecretString};
use serde_json::json;
use tracing::debug;

use redub_core::{DubError, RetryPolicy};

use crate::http::{ensure_success, transport_error};
use crate::retry::with_retry;

/// Largest text the synthesis service accepts in one request.
pub const SYNTH_MAX_CHARS: usize = 3000;

/// Returns one WAV-encoded clip per call.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    async fn synthesize(&self, text: &str, voice_id: &str) -> Result<Bytes, DubError>;
}

pub struct HttpSynthesizer {
    client: reqwest::Client,
    base_url: String,
    api_key: SecretString,
    policy: RetryPolicy,
}

impl HttpSynthesizer {
    pub fn new(
        client: reqwest::Client,
        base_url: impl Into<String>,
        api_key: SecretString,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            api_key,
            policy: RetryPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    async fn request(&self, text: &str, voice_id: &str) -> Result<Bytes, DubError> {
        let url = format!("{}/v1/speech/stream", self.base_url);
        let response = self
            .client
            .post(&url)
            .header("api-key", self.api_key.expose_secret())
            .json(&json!({ "text": text, "voiceId": voice_id }))
            .send()
            .await
            .map_err(|e| transport_error("speech", e))?;
        let audio = ensure_success("speech", response)
            .await?
            .bytes()
            .await
            .map_err(|e| transport_error("speech", e))?;
        if audio.is_empty() {
            return Err(DubError::Upstream {
                service: "speech",
                message: "empty audio response".into(),
            });
        }
        Ok(audio)
    }
}

#[async_trait]
impl SpeechSynthesizer for HttpSynthesizer {
    async fn synthesize(&self, text: &str, voice_id: &str) -> Result<Bytes, DubError> {
        let chars = text.chars().count();
        if chars > SYNTH_MAX_CHARS {
            return Err(DubError::InvalidInput(format!(
                "synthesis request of {chars} chars exceeds the {SYNTH_MAX_CHARS} limit"
            )));
        }
        let audio =
            with_retry(&self.policy, "speech", || self.request(text, voice_id)).await?;
        debug!(chars, voice_id, bytes = audio.len(), "synthesized clip");
        Ok(audio)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fast_policy() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 3,
            base_delay_ms: 1,
            max_delay_ms: 5,
            jitter_factor: 0.0,
        }
    }

    fn synth(uri: String) -> HttpSynthesizer {
        HttpSynthesizer::new(reqwest::Client::new(), uri, SecretString::from("test-key"))
            .with_policy(fast_policy())
    }

    #[tokio::test]
    async fn synthesizes_audio() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/speech/stream"))
            .and(header("api-key", "test-key"))
            .and(body_json(json!({ "text": "hola", "voiceId": "es-ES-alvaro" })))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"RIFFwav".to_vec()))
            .mount(&server)
            .await;

        let audio = synth(server.uri())
            .synthesize("hola", "es-ES-alvaro")
            .await
            .unwrap();
        assert_eq!(&audio[..4], b"RIFF");
    }

    #[tokio::test]
    async fn oversize_text_rejected() {
        let server = MockServer::start().await;
        let big = "x".repeat(SYNTH_MAX_CHARS + 1);
        let err = synth(server.uri())
            .synthesize(&big, "v")
            .await
            .unwrap_err();
        assert_eq!(err.category(), "input");
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn empty_body_is_transient() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/speech/stream"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let err = synth(server.uri()).synthesize("hola", "v").await.unwrap_err();
        assert!(err.is_retryable());
        // Retried to exhaustion since the body stayed empty.
        assert_eq!(server.received_requests().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn rate_limit_gives_up_eventually() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/speech/stream"))
            .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "0"))
            .mount(&server)
            .await;

        let err = synth(server.uri()).synthesize("hola", "v").await.unwrap_err();
        assert!(matches!(err, DubError::RateLimited { .. }));
        assert_eq!(server.received_requests().await.unwrap().len(), 3);
    }
}
