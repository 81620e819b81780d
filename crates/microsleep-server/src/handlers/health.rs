//! Health check handler

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;

use crate::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
    version: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<String>,
}

/// Reports whether the models loaded. Answers 503 while not ready.
pub async fn check(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let reason = state.service.not_ready_reason().map(str::to_string);
    let (code, status) = if reason.is_none() {
        (StatusCode::OK, "ready")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "not_ready")
    };

    (
        code,
        Json(HealthResponse {
            status,
            version: env!("CARGO_PKG_VERSION"),
            reason,
        }),
    )
}
