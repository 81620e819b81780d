//! Error handling

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use microsleep_core::PredictError;
use serde_json::json;

pub type AppResult<T> = Result<T, ApiError>;

#[derive(Debug)]
pub enum ApiError {
    /// Pipeline failure, mapped through its own taxonomy.
    Predict(PredictError),
    /// Malformed or oversized upload.
    Upload { status: StatusCode, message: String },
    /// Worker scheduling failure.
    Internal(String),
}

impl ApiError {
    fn parts(&self) -> (StatusCode, &'static str, String) {
        match self {
            Self::Predict(err) => (
                StatusCode::from_u16(err.status_code())
                    .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
                err.kind(),
                err.to_string(),
            ),
            Self::Upload { status, message } => {
                let kind = if *status == StatusCode::PAYLOAD_TOO_LARGE {
                    "payload_too_large"
                } else {
                    "bad_request"
                };
                (*status, kind, message.clone())
            }
            Self::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal",
                msg.clone(),
            ),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, kind, message) = self.parts();

        if status.is_server_error() {
            tracing::error!(kind, "Request failed: {}", message);
        } else {
            tracing::debug!(kind, "Request rejected: {}", message);
        }

        let body = Json(json!({
            "error": message,
            "kind": kind,
            "status": status.as_u16()
        }));

        (status, body).into_response()
    }
}

impl From<PredictError> for ApiError {
    fn from(err: PredictError) -> Self {
        Self::Predict(err)
    }
}

impl From<axum::extract::multipart::MultipartError> for ApiError {
    fn from(err: axum::extract::multipart::MultipartError) -> Self {
        Self::Upload {
            status: err.status(),
            message: err.body_text(),
        }
    }
}
