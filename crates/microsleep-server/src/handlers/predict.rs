//! Microsleep prediction handler

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Multipart, State},
    http::StatusCode,
    Json,
};
use microsleep_core::{PredictError, PredictionResult};

use crate::error::{ApiError, AppResult};
use crate::AppState;

/// Multipart field carrying the image.
pub const FILE_FIELD: &str = "file";

/// Classifies the uploaded image.
///
/// The pipeline runs on the blocking pool, at most `max_concurrency` at a
/// time.
pub async fn predict(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> AppResult<Json<PredictionResult>> {
    if let Some(reason) = state.service.not_ready_reason() {
        return Err(PredictError::NotReady(reason.to_string()).into());
    }

    let bytes = read_file_field(&mut multipart).await?;

    let _permit = Arc::clone(&state.permits)
        .acquire_owned()
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    let service = Arc::clone(&state.service);
    let result = tokio::task::spawn_blocking(move || service.predict(&bytes))
        .await
        .map_err(|e| ApiError::Internal(format!("prediction task failed: {e}")))??;

    tracing::info!(
        label = result.label.as_str(),
        score = result.raw_score,
        ear = result.ear_value,
        "Prediction served"
    );
    Ok(Json(result))
}

async fn read_file_field(multipart: &mut Multipart) -> AppResult<Bytes> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() == Some(FILE_FIELD) {
            return Ok(field.bytes().await?);
        }
    }

    Err(ApiError::Upload {
        status: StatusCode::BAD_REQUEST,
        message: format!("missing multipart field '{FILE_FIELD}'"),
    })
}
