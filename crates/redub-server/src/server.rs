use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use redub_core::DubError;
use redub_engine::{DubEngine, DubOutcome, DubRequest};

use crate::handlers;
use crate::sweep;

/// Server configuration.
#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub port: u16,
    /// Directory served at `/audio` and swept for stale files.
    pub audio_dir: PathBuf,
    pub sweep_interval_secs: u64,
    pub max_file_age_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 5000,
            audio_dir: PathBuf::from("audio_files"),
            sweep_interval_secs: 3600,
            max_file_age_secs: 3600,
        }
    }
}

/// What the HTTP layer needs from the engine. A seam so handler tests can
/// run against a stub instead of the full pipeline.
#[async_trait]
pub trait DubService: Send + Sync {
    async fn dub(&self, request: DubRequest) -> Result<DubOutcome, DubError>;
    fn active_jobs(&self) -> usize;
    fn in_flight_outputs(&self) -> HashSet<String>;
}

#[async_trait]
impl DubService for DubEngine {
    async fn dub(&self, request: DubRequest) -> Result<DubOutcome, DubError> {
        self.run(request).await
    }

    fn active_jobs(&self) -> usize {
        self.registry().active_count()
    }

    fn in_flight_outputs(&self) -> HashSet<String> {
        self.registry().in_flight_outputs()
    }
}

/// Shared application state passed to Axum handlers.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<dyn DubService>,
    pub audio_dir: PathBuf,
}

/// Build the Axum router with all routes.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/translate", post(handlers::translate))
        .route("/audio/{filename}", get(handlers::serve_audio))
        .route("/health", get(handlers::health))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Bind, spawn the sweeper, and serve. Returns a handle that keeps the
/// background tasks alive.
pub async fn start(
    config: ServerConfig,
    service: Arc<dyn DubService>,
) -> Result<ServerHandle, std::io::Error> {
    tokio::fs::create_dir_all(&config.audio_dir).await?;

    let sweep_handle = sweep::spawn(
        config.audio_dir.clone(),
        Duration::from_secs(config.sweep_interval_secs),
        Duration::from_secs(config.max_file_age_secs),
        Arc::clone(&service),
    );

    let state = AppState {
        service,
        audio_dir: config.audio_dir.clone(),
    };
    let router = build_router(state);

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    let local_addr = listener.local_addr()?;

    tracing::info!(port = local_addr.port(), "redub server started");

    let server_handle = tokio::spawn(async move {
        axum::serve(listener, router).await.ok();
    });

    Ok(ServerHandle {
        port: local_addr.port(),
        _server: server_handle,
        _sweep: sweep_handle,
    })
}

/// Handle returned by `start()`.
pub struct ServerHandle {
    pub port: u16,
    _server: tokio::task::JoinHandle<()>,
    _sweep: tokio::task::JoinHandle<()>,
}
