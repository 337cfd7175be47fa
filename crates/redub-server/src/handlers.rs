//! Request handlers.
//!
//! Failures always surface as structured `{error, category}` JSON with
//! the status from `DubError::http_status`, never a bare panic trace.

use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::json;
use tracing::error;

use redub_core::DubError;
use redub_engine::DubRequest;

use crate::server::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslateRequest {
    #[serde(default)]
    pub video_url: String,
    #[serde(default)]
    pub voice_id: String,
    #[serde(default = "default_language")]
    pub target_language: String,
}

fn default_language() -> String {
    "hi-IN".to_string()
}

fn error_response(err: &DubError) -> Response {
    let status =
        StatusCode::from_u16(err.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (
        status,
        Json(json!({ "error": err.to_string(), "category": err.category() })),
    )
        .into_response()
}

/// `POST /translate`: run a dub job to completion and return where the
/// results can be fetched.
pub async fn translate(
    State(state): State<AppState>,
    Json(request): Json<TranslateRequest>,
) -> Response {
    if request.video_url.trim().is_empty() {
        return error_response(&DubError::InvalidInput("videoUrl is required".to_string()));
    }
    if request.voice_id.trim().is_empty() {
        return error_response(&DubError::InvalidInput("voiceId is required".to_string()));
    }

    let outcome = state
        .service
        .dub(DubRequest {
            video_url: request.video_url,
            voice_id: request.voice_id,
            target_language: request.target_language,
        })
        .await;

    match outcome {
        Ok(outcome) => {
            let mut body = json!({ "success": true, "audioUrl": outcome.audio_url });
            if let Some(filename) = outcome.video_filename {
                body["videoUrl"] = json!(format!("/audio/{filename}"));
            }
            Json(body).into_response()
        }
        Err(err) => {
            error!(error = %err, category = err.category(), "dub job failed");
            error_response(&err)
        }
    }
}

fn content_type_for(filename: &str) -> &'static str {
    match filename.rsplit('.').next() {
        Some("wav") => "audio/wav",
        Some("mp3") => "audio/mpeg",
        Some("mp4") => "video/mp4",
        _ => "application/octet-stream",
    }
}

/// `GET /audio/{filename}`: serve a published file from the audio
/// directory. The filename must be a bare name; anything that could walk
/// out of the directory is rejected.
pub async fn serve_audio(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Response {
    if filename.contains('/') || filename.contains('\\') || filename.contains("..") {
        return error_response(&DubError::InvalidInput("invalid filename".to_string()));
    }
    let path = state.audio_dir.join(&filename);
    match tokio::fs::read(&path).await {
        Ok(bytes) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, content_type_for(&filename))],
            bytes,
        )
            .into_response(),
        Err(_) => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "file not found", "category": "input" })),
        )
            .into_response(),
    }
}

/// `GET /health`.
pub async fn health(State(state): State<AppState>) -> Response {
    Json(json!({ "status": "ok", "activeJobs": state.service.active_jobs() })).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;

    use async_trait::async_trait;

    use redub_engine::DubOutcome;

    use crate::server::{start, DubService, ServerConfig, ServerHandle};

    struct StubService {
        result: Result<DubOutcome, DubError>,
    }

    #[async_trait]
    impl DubService for StubService {
        async fn dub(&self, _request: DubRequest) -> Result<DubOutcome, DubError> {
            self.result.clone()
        }

        fn active_jobs(&self) -> usize {
            2
        }

        fn in_flight_outputs(&self) -> HashSet<String> {
            HashSet::new()
        }
    }

    async fn serve(
        result: Result<DubOutcome, DubError>,
        audio_dir: &std::path::Path,
    ) -> ServerHandle {
        let config = ServerConfig {
            port: 0,
            audio_dir: audio_dir.to_path_buf(),
            ..Default::default()
        };
        start(config, Arc::new(StubService { result })).await.unwrap()
    }

    fn ok_outcome() -> Result<DubOutcome, DubError> {
        Ok(DubOutcome {
            audio_url: "http://localhost/audio/dub_ok.wav".to_string(),
            video_filename: Some("dub_ok.mp4".to_string()),
        })
    }

    #[tokio::test]
    async fn translate_success_body() {
        let dir = tempfile::tempdir().unwrap();
        let handle = serve(ok_outcome(), dir.path()).await;
        let client = reqwest::Client::new();
        let resp = client
            .post(format!("http://127.0.0.1:{}/translate", handle.port))
            .json(&serde_json::json!({
                "videoUrl": "https://youtu.be/dQw4w9WgXcQ",
                "voiceId": "es-ES-alvaro",
                "targetLanguage": "es-ES",
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
        let body: serde_json::Value = resp.json().await.unwrap();
        assert_eq!(body["success"], true);
        assert_eq!(body["audioUrl"], "http://localhost/audio/dub_ok.wav");
        assert_eq!(body["videoUrl"], "/audio/dub_ok.mp4");
    }

    #[tokio::test]
    async fn translate_missing_fields_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let handle = serve(ok_outcome(), dir.path()).await;
        let client = reqwest::Client::new();
        let resp = client
            .post(format!("http://127.0.0.1:{}/translate", handle.port))
            .json(&serde_json::json!({ "voiceId": "v" }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 400);
        let body: serde_json::Value = resp.json().await.unwrap();
        assert_eq!(body["category"], "input");
        assert!(body["error"].as_str().unwrap().contains("videoUrl"));
    }

    #[tokio::test]
    async fn upstream_refusal_maps_to_400() {
        let dir = tempfile::tempdir().unwrap();
        let handle = serve(
            Err(DubError::Unavailable("captions disabled".into())),
            dir.path(),
        )
        .await;
        let client = reqwest::Client::new();
        let resp = client
            .post(format!("http://127.0.0.1:{}/translate", handle.port))
            .json(&serde_json::json!({ "videoUrl": "https://youtu.be/x", "voiceId": "v" }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 400);
        let body: serde_json::Value = resp.json().await.unwrap();
        assert_eq!(body["category"], "upstream_unavailable");
    }

    #[tokio::test]
    async fn processing_failure_maps_to_500() {
        let dir = tempfile::tempdir().unwrap();
        let handle = serve(Err(DubError::Processing("mix failed".into())), dir.path()).await;
        let client = reqwest::Client::new();
        let resp = client
            .post(format!("http://127.0.0.1:{}/translate", handle.port))
            .json(&serde_json::json!({ "videoUrl": "https://youtu.be/x", "voiceId": "v" }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 500);
        let body: serde_json::Value = resp.json().await.unwrap();
        assert_eq!(body["category"], "processing");
    }

    #[tokio::test]
    async fn audio_route_serves_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("dub_x.wav"), b"RIFFdata").unwrap();
        let handle = serve(ok_outcome(), dir.path()).await;

        let resp = reqwest::get(format!("http://127.0.0.1:{}/audio/dub_x.wav", handle.port))
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
        assert_eq!(
            resp.headers()[reqwest::header::CONTENT_TYPE],
            "audio/wav"
        );
        assert_eq!(resp.bytes().await.unwrap().as_ref(), b"RIFFdata");
    }

    #[tokio::test]
    async fn audio_route_misses_with_404() {
        let dir = tempfile::tempdir().unwrap();
        let handle = serve(ok_outcome(), dir.path()).await;
        let resp = reqwest::get(format!("http://127.0.0.1:{}/audio/nope.wav", handle.port))
            .await
            .unwrap();
        assert_eq!(resp.status(), 404);
    }

    #[tokio::test]
    async fn audio_route_rejects_traversal() {
        let dir = tempfile::tempdir().unwrap();
        let handle = serve(ok_outcome(), dir.path()).await;
        let client = reqwest::Client::new();
        for name in ["..%2F..%2Fetc%2Fpasswd", "..%5Csecrets", "a%2Fb.wav"] {
            let resp = client
                .get(format!("http://127.0.0.1:{}/audio/{name}", handle.port))
                .send()
                .await
                .unwrap();
            assert_eq!(resp.status(), 400, "{name} was not rejected");
        }
    }

    #[tokio::test]
    async fn health_reports_active_jobs() {
        let dir = tempfile::tempdir().unwrap();
        let handle = serve(ok_outcome(), dir.path()).await;
        let resp = reqwest::get(format!("http://127.0.0.1:{}/health", handle.port))
            .await
            .unwrap();
        let body: serde_json::Value = resp.json().await.unwrap();
        assert_eq!(body["status"], "ok");
        assert_eq!(body["activeJobs"], 2);
    }
}
