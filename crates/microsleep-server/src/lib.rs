//! Microsleep HTTP server.
//!
//! Exposes the classifier over HTTP:
//!
//! - `POST /predict-microsleep/` multipart upload, field `file`
//! - `GET /health` readiness

mod error;
mod handlers;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use microsleep_core::MicrosleepService;
use tokio::sync::Semaphore;
use tower_http::trace::TraceLayer;

pub use error::{ApiError, AppResult};
pub use handlers::predict::FILE_FIELD;

/// Default upload limit (10 MiB).
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<MicrosleepService>,
    pub permits: Arc<Semaphore>,
}

impl AppState {
    /// Wraps a service, allowing `max_concurrency` predictions at once.
    #[must_use]
    pub fn new(service: MicrosleepService, max_concurrency: usize) -> Self {
        Self {
            service: Arc::new(service),
            permits: Arc::new(Semaphore::new(max_concurrency.max(1))),
        }
    }
}

/// Listener and resource settings.
#[derive(Debug, Clone)]
pub struct ServerOptions {
    pub host: String,
    pub port: u16,
    pub max_concurrency: usize,
    pub max_upload_bytes: usize,
}

/// Create the router with all routes
pub fn create_router(state: AppState, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/health", get(handlers::health::check))
        .route("/predict-microsleep/", post(handlers::predict::predict))
        .route("/predict-microsleep", post(handlers::predict::predict))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Binds and serves until Ctrl-C.
///
/// # Errors
///
/// Returns an error if the address is invalid, binding fails, or the
/// server stops abnormally.
pub async fn serve(options: ServerOptions, service: MicrosleepService) -> Result<()> {
    let addr: SocketAddr = format!("{}:{}", options.host, options.port)
        .parse()
        .with_context(|| format!("Invalid listen address {}:{}", options.host, options.port))?;

    if let Some(reason) = service.not_ready_reason() {
        tracing::warn!("Serving without models: {reason}");
    }

    let state = AppState::new(service, options.max_concurrency);
    let app = create_router(state, options.max_upload_bytes);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    tracing::info!(
        max_concurrency = options.max_concurrency,
        "Server listening on http://{}",
        addr
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}
