//! Publishing finished audio.
//!
//! The cloud store is preferred; when it is down the engine falls back to
//! [`LocalAudioStore`], which copies the file into the directory the
//! server serves at `/audio/{filename}`.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::Deserialize;
use tracing::info;

use redub_core::{DubError, RetryPolicy};

use crate::http::{ensure_success, transport_error};
use crate::retry::with_retry;

/// Makes a finished audio file reachable by URL.
#[async_trait]
pub trait AudioStore: Send + Sync {
    async fn upload(&self, path: &Path, public_id: &str) -> Result<String, DubError>;
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UploadResponse {
    secure_url: String,
}

/// Cloud object storage over HTTP.
pub struct HttpAudioStore {
    client: reqwest::Client,
    base_url: String,
    policy: RetryPolicy,
}

impl HttpAudioStore {
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

    async fn put(&self, bytes: Vec<u8>, public_id: &str) -> Result<String, DubError> {
        let url = format!("{}/upload/{public_id}", self.base_url);
        let response = self
            .client
            .post(&url)
            .body(bytes)
            .send()
            .await
            .map_err(|e| transport_error("storage", e))?;
        let parsed: UploadResponse = ensure_success("storage", response)
            .await?
            .json()
            .await
            .map_err(|e| transport_error("storage", e))?;
        Ok(parsed.secure_url)
    }
}

#[async_trait]
impl AudioStore for HttpAudioStore {
    async fn upload(&self, path: &Path, public_id: &str) -> Result<String, DubError> {
        let bytes = tokio::fs::read(path).await?;
        let url = with_retry(&self.policy, "storage", || {
            self.put(bytes.clone(), public_id)
        })
        .await?;
        info!(public_id, url, "uploaded audio");
        Ok(url)
    }
}

/// Serves the file from this process instead of a cloud bucket.
pub struct LocalAudioStore {
    audio_dir: PathBuf,
    public_base_url: String,
}

impl LocalAudioStore {
    pub fn new(audio_dir: impl Into<PathBuf>, public_base_url: impl Into<String>) -> Self {
        Self {
            audio_dir: audio_dir.into(),
            public_base_url: public_base_url.into(),
        }
    }
}

#[async_trait]
impl AudioStore for LocalAudioStore {
    async fn upload(&self, path: &Path, public_id: &str) -> Result<String, DubError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("wav");
        let filename = format!("{public_id}.{ext}");
        tokio::fs::create_dir_all(&self.audio_dir).await?;
        tokio::fs::copy(path, self.audio_dir.join(&filename)).await?;
        info!(filename, "serving audio locally");
        Ok(format!("{}/audio/{filename}", self.public_base_url))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path as url_path};
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
    async fn http_upload_returns_secure_url() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(url_path("/upload/dub_abc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(
                json!({ "secureUrl": "https://cdn.example.com/dub_abc.wav" }),
            ))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("out.wav");
        std::fs::write(&file, b"RIFF").unwrap();

        let store = HttpAudioStore::new(reqwest::Client::new(), server.uri())
            .with_policy(fast_policy());
        let url = store.upload(&file, "dub_abc").await.unwrap();
        assert_eq!(url, "https://cdn.example.com/dub_abc.wav");
    }

    #[tokio::test]
    async fn http_upload_surfaces_retryable_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("out.wav");
        std::fs::write(&file, b"RIFF").unwrap();

        let store = HttpAudioStore::new(reqwest::Client::new(), server.uri())
            .with_policy(fast_policy());
        let err = store.upload(&file, "dub_abc").await.unwrap_err();
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn local_store_copies_and_builds_url() {
        let src_dir = tempfile::tempdir().unwrap();
        let audio_dir = tempfile::tempdir().unwrap();
        let file = src_dir.path().join("final.wav");
        std::fs::write(&file, b"RIFF").unwrap();

        let store = LocalAudioStore::new(audio_dir.path(), "http://localhost:5000");
        let url = store.upload(&file, "dub_xyz").await.unwrap();
        assert_eq!(url, "http://localhost:5000/audio/dub_xyz.wav");
        assert!(audio_dir.path().join("dub_xyz.wav").exists());
    }

    #[tokio::test]
    async fn local_store_missing_source_fails() {
        let audio_dir = tempfile::tempdir().unwrap();
        let store = LocalAudioStore::new(audio_dir.path(), "http://localhost:5000");
        let err = store
            .upload(Path::new("/nonexistent/final.wav"), "dub_xyz")
            .await
            .unwrap_err();
        assert_eq!(err.category(), "processing");
    }
}
