//! HTTP APIテスト
//!
//! スタブの `TextExtractor` を差し込んでルーターを直接呼び出す

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use prescription_ai_common::{MatchOptions, Matcher, MedicineCatalog};
use prescription_ai_rust::ai_provider::AiProvider;
use prescription_ai_rust::error::{PrescriptionAiError, Result};
use prescription_ai_rust::ocr::{preprocess_image, TextExtractor};
use prescription_ai_rust::server::{router, AppState};
use serde_json::{json, Value};
use std::io::Cursor;
use std::sync::Arc;
use tower::ServiceExt;

const BOUNDARY: &str = "rx-test-boundary";

/// 画像をデコードしてから固定テキストを返す
struct StubOcr(&'static str);

impl TextExtractor for StubOcr {
    fn extract_text(&self, image_bytes: &[u8]) -> Result<String> {
        preprocess_image(image_bytes, 1.0)?;
        Ok(self.0.to_string())
    }
}

struct BrokenOcr;

impl TextExtractor for BrokenOcr {
    fn extract_text(&self, _image_bytes: &[u8]) -> Result<String> {
        Err(PrescriptionAiError::OcrExecution("tesseract: not found".into()))
    }
}

fn app(extractor: Arc<dyn TextExtractor>) -> Router {
    let catalog = MedicineCatalog::from_csv_str(
        "name,price(₹),manufacturer_name\nParacetamol,25.5,Acme Pharma\nAspirin,12,Bayer\nAmoxicillin,80,Cipla Ltd\n",
    )
    .unwrap();

    router(AppState {
        matcher: Arc::new(Matcher::new(Arc::new(catalog), MatchOptions::default())),
        extractor,
        ai_provider: AiProvider::Claude,
    })
}

fn png_bytes() -> Vec<u8> {
    let image = image::GrayImage::from_fn(8, 8, |x, _| image::Luma([if x < 4 { 20 } else { 230 }]));
    let mut out = Cursor::new(Vec::new());
    image.write_to(&mut out, image::ImageFormat::Png).unwrap();
    out.into_inner()
}

fn multipart_request(field: &str, content: &[u8]) -> Request<Body> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"{}\"; filename=\"rx.png\"\r\nContent-Type: image/png\r\n\r\n",
            field
        )
        .as_bytes(),
    );
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());

    Request::builder()
        .method("POST")
        .uri("/analyze-prescription")
        .header("content-type", format!("multipart/form-data; boundary={}", BOUNDARY))
        .body(Body::from(body))
        .unwrap()
}

fn json_request(uri: &str, value: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(value.to_string()))
        .unwrap()
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

#[tokio::test]
async fn test_home() {
    let request = Request::builder().uri("/").body(Body::empty()).unwrap();
    let (status, body) = send(app(Arc::new(StubOcr(""))), request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Doctor Prescription OCR API is running");
}

#[tokio::test]
async fn test_health_reports_catalog_size() {
    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let (status, body) = send(app(Arc::new(StubOcr(""))), request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["catalog_size"], 3);
}

#[tokio::test]
async fn test_analyze_prescription() {
    let app = app(Arc::new(StubOcr("  Paracetamol 500mg\nAspirin \n")));
    let (status, body) = send(app, multipart_request("file", &png_bytes())).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["extracted_text"], "Paracetamol 500mg\nAspirin");

    let matches = body["matches"].as_array().unwrap();
    assert!(!matches.is_empty());
    assert_eq!(matches[0]["input_line"], "Paracetamol 500mg");
    assert_eq!(matches[0]["matched_name"], "Paracetamol");
    assert_eq!(matches[0]["price"], 25.5);
    assert_eq!(matches[0]["manufacturer"], "Acme Pharma");
    assert!(matches.iter().all(|m| m["score"].as_f64().unwrap() >= 70.0));
}

#[tokio::test]
async fn test_empty_upload_is_bad_request() {
    let (status, body) = send(app(Arc::new(StubOcr("Aspirin"))), multipart_request("file", b"")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["detail"].as_str().unwrap().starts_with("Bad Request: "));
}

#[tokio::test]
async fn test_missing_field_is_bad_request() {
    let (status, body) = send(app(Arc::new(StubOcr("Aspirin"))), multipart_request("image", &png_bytes())).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["detail"].as_str().unwrap().starts_with("Bad Request: "));
}

#[tokio::test]
async fn test_undecodable_image_is_bad_request() {
    let (status, body) = send(app(Arc::new(StubOcr("Aspirin"))), multipart_request("file", b"GIF89a garbage")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["detail"].as_str().unwrap().starts_with("Bad Request: "));
}

#[tokio::test]
async fn test_recognizer_failure_is_generic_500() {
    let (status, body) = send(app(Arc::new(BrokenOcr)), multipart_request("file", &png_bytes())).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({ "detail": "Processing failed" }));
}

#[tokio::test]
async fn test_match_endpoint() {
    let request = json_request("/match", json!({ "text": "Asprin\nAmoxicilin", "limit": 1 }));
    let (status, body) = send(app(Arc::new(StubOcr(""))), request).await;

    assert_eq!(status, StatusCode::OK);
    let matches = body["matches"].as_array().unwrap();
    assert_eq!(matches.len(), 2);
    assert_eq!(matches[0]["matched_name"], "Aspirin");
    assert_eq!(matches[1]["matched_name"], "Amoxicillin");
}

#[tokio::test]
async fn test_match_short_text_is_empty() {
    let request = json_request("/match", json!({ "text": "ab" }));
    let (status, body) = send(app(Arc::new(StubOcr(""))), request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["matches"], json!([]));
}

#[tokio::test]
async fn test_match_rejects_out_of_range_threshold() {
    let request = json_request("/match", json!({ "text": "Aspirin", "threshold": 150.0 }));
    let (status, _) = send(app(Arc::new(StubOcr(""))), request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_medicine_info_empty_list() {
    let request = json_request("/medicine-info", json!({ "medicines": [] }));
    let (status, body) = send(app(Arc::new(StubOcr(""))), request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "info": null }));
}
