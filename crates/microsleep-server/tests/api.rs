//! HTTP API tests against fake models.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use microsleep_core::MicrosleepService;
use microsleep_server::{create_router, AppState, DEFAULT_MAX_UPLOAD_BYTES};
use microsleep_test_support::{
    fake_predictor, FakeInferenceEngine, FakeLandmarkDetector, LandmarkBuilder,
    SyntheticImageBuilder,
};
use serde_json::Value;
use tower::ServiceExt;

const BOUNDARY: &str = "microsleep-test-boundary";

fn multipart_body(field: &str, bytes: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"{field}\"; filename=\"frame.png\"\r\n\
             Content-Type: application/octet-stream\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn upload(uri: &str, field: &str, bytes: &[u8]) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(multipart_body(field, bytes)))
        .unwrap()
}

fn app(service: MicrosleepService) -> Router {
    create_router(AppState::new(service, 2), DEFAULT_MAX_UPLOAD_BYTES)
}

fn ready(score: f32) -> Router {
    app(MicrosleepService::Ready(fake_predictor(
        FakeInferenceEngine::image_first(score),
        FakeLandmarkDetector::when_bright(LandmarkBuilder::open_eyes()),
    )))
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&body).unwrap())
}

#[tokio::test]
async fn test_predict_normal() {
    let bright = SyntheticImageBuilder::uniform_gray(64, 64, 200);
    let (status, json) = send(ready(0.2), upload("/predict-microsleep/", "file", &bright)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["label"], "NORMAL");
    assert!((json["prediction"].as_f64().unwrap() - 0.2).abs() < 1e-6);
    assert!((json["ear_value"].as_f64().unwrap() - 0.3).abs() < 1e-5);
}

#[tokio::test]
async fn test_predict_microsleep_without_trailing_slash() {
    let bright = SyntheticImageBuilder::uniform_gray(64, 64, 200);
    let (status, json) = send(ready(0.8), upload("/predict-microsleep", "file", &bright)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["label"], "MICROSLEEP");
}

#[tokio::test]
async fn test_score_at_threshold_is_normal() {
    let bright = SyntheticImageBuilder::uniform_gray(64, 64, 200);
    let (_, json) = send(ready(0.5), upload("/predict-microsleep/", "file", &bright)).await;
    assert_eq!(json["label"], "NORMAL");
}

#[tokio::test]
async fn test_no_face_is_bad_request() {
    let dark = SyntheticImageBuilder::uniform_gray(64, 64, 20);
    let (status, json) = send(ready(0.2), upload("/predict-microsleep/", "file", &dark)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["kind"], "no_face_detected");
    assert_eq!(json["status"], 400);
}

#[tokio::test]
async fn test_garbage_is_invalid_image() {
    let (status, json) = send(
        ready(0.2),
        upload("/predict-microsleep/", "file", &SyntheticImageBuilder::corrupt()),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["kind"], "invalid_image");
}

#[tokio::test]
async fn test_missing_file_field() {
    let bright = SyntheticImageBuilder::uniform_gray(8, 8, 200);
    let (status, json) = send(ready(0.2), upload("/predict-microsleep/", "image", &bright)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["kind"], "bad_request");
}

#[tokio::test]
async fn test_not_ready_is_server_error() {
    let service = MicrosleepService::NotReady("scaler missing".to_string());
    let bright = SyntheticImageBuilder::uniform_gray(8, 8, 200);
    let (status, json) = send(app(service), upload("/predict-microsleep/", "file", &bright)).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["kind"], "not_ready");
    assert!(json["error"].as_str().unwrap().contains("scaler missing"));
}

#[tokio::test]
async fn test_engine_failure_is_internal() {
    let service = MicrosleepService::Ready(fake_predictor(
        FakeInferenceEngine::image_first(0.2).failing("tensor arena exhausted"),
        FakeLandmarkDetector::found(LandmarkBuilder::open_eyes()),
    ));
    let bright = SyntheticImageBuilder::uniform_gray(8, 8, 200);
    let (status, json) = send(app(service), upload("/predict-microsleep/", "file", &bright)).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["kind"], "internal");
}

#[tokio::test]
async fn test_oversized_upload_rejected() {
    let router = create_router(
        AppState::new(
            MicrosleepService::Ready(fake_predictor(
                FakeInferenceEngine::image_first(0.2),
                FakeLandmarkDetector::found(LandmarkBuilder::open_eyes()),
            )),
            1,
        ),
        64,
    );
    let big = SyntheticImageBuilder::checkerboard_jpeg(256, 256);
    let response = router
        .oneshot(upload("/predict-microsleep/", "file", &big))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn test_health_ready() {
    let request = Request::get("/health").body(Body::empty()).unwrap();
    let (status, json) = send(ready(0.2), request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ready");
    assert!(json.get("reason").is_none());
}

#[tokio::test]
async fn test_health_not_ready() {
    let service = MicrosleepService::NotReady("classifier missing".to_string());
    let request = Request::get("/health").body(Body::empty()).unwrap();
    let (status, json) = send(app(service), request).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(json["status"], "not_ready");
    assert_eq!(json["reason"], "classifier missing");
}
