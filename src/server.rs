//! HTTP API
//!
//! - `GET /` 稼働確認
//! - `GET /health` カタログ件数つきヘルスチェック
//! - `POST /analyze-prescription` 画像アップロード → OCR → 照合
//! - `POST /match` テキストを直接照合
//! - `POST /medicine-info` 医薬品情報の問い合わせ
//!
//! 入力エラーは400と理由、それ以外は500と汎用メッセージを返す（詳細はログのみ）。

use crate::ai_provider::AiProvider;
use crate::analyzer::{self, PrescriptionAnalysis};
use crate::error::{ErrorKind, PrescriptionAiError, Result};
use crate::medicine_info;
use crate::ocr::TextExtractor;
use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use prescription_ai_common::{MatchResult, Matcher};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

/// アップロード上限
pub const MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

/// マルチパートの画像フィールド名
pub const UPLOAD_FIELD: &str = "file";

/// ハンドラ間で共有する状態
///
/// カタログは起動時に一度だけ読み込み、以後は読み取り専用
#[derive(Clone)]
pub struct AppState {
    pub matcher: Arc<Matcher>,
    pub extractor: Arc<dyn TextExtractor>,
    pub ai_provider: AiProvider,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthRes {
    pub status: String,
    pub catalog_size: usize,
}

#[derive(Debug, Deserialize)]
pub struct MatchReq {
    pub text: String,
    pub limit: Option<usize>,
    pub threshold: Option<f64>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MatchRes {
    pub matches: Vec<MatchResult>,
}

#[derive(Debug, Deserialize)]
pub struct MedicineInfoReq {
    #[serde(default)]
    pub medicines: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MedicineInfoRes {
    pub info: Option<String>,
}

impl IntoResponse for PrescriptionAiError {
    fn into_response(self) -> Response {
        match self.kind() {
            ErrorKind::Validation => (
                StatusCode::BAD_REQUEST,
                Json(json!({ "detail": format!("Bad Request: {}", self) })),
            )
                .into_response(),
            ErrorKind::Processing => {
                tracing::error!("An error occurred during prescription analysis: {}", self);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "detail": "Processing failed" })),
                )
                    .into_response()
            }
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(home))
        .route("/health", get(health))
        .route("/analyze-prescription", post(analyze_prescription))
        .route("/match", post(match_text))
        .route("/medicine-info", post(lookup_medicine_info))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// サーバーを起動して終了まで待つ
pub async fn serve(state: AppState, addr: &str) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("++ Starting prescription API on {}", addr);
    axum::serve(listener, router(state)).await?;
    Ok(())
}

/// ブロッキング処理（外部コマンド・照合）をワーカースレッドで実行
async fn run_blocking<T, F>(f: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| PrescriptionAiError::Internal(format!("worker task failed: {}", e)))?
}

async fn home() -> Json<serde_json::Value> {
    Json(json!({ "message": "Doctor Prescription OCR API is running" }))
}

async fn health(State(state): State<AppState>) -> Json<HealthRes> {
    Json(HealthRes {
        status: "ok".into(),
        catalog_size: state.matcher.catalog().len(),
    })
}

async fn analyze_prescription(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<PrescriptionAnalysis>> {
    let bytes = read_upload(&mut multipart).await?;
    tracing::info!(bytes = bytes.len(), "analyzing uploaded prescription");

    let analysis = run_blocking(move || {
        analyzer::analyze_prescription(state.extractor.as_ref(), &state.matcher, &bytes)
    })
    .await?;

    tracing::info!(
        lines = analysis.extracted_text.lines().count(),
        matches = analysis.matches.len(),
        "prescription analyzed"
    );
    Ok(Json(analysis))
}

/// `file` フィールドの中身を読む
async fn read_upload(multipart: &mut Multipart) -> Result<Vec<u8>> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| PrescriptionAiError::InvalidInput(e.to_string()))?
    {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }

        let bytes = field
            .bytes()
            .await
            .map_err(|e| PrescriptionAiError::InvalidInput(e.to_string()))?;

        if bytes.is_empty() {
            return Err(PrescriptionAiError::EmptyUpload);
        }
        return Ok(bytes.to_vec());
    }

    Err(PrescriptionAiError::InvalidInput(format!(
        "multipart field `{}` is required",
        UPLOAD_FIELD
    )))
}

async fn match_text(State(state): State<AppState>, Json(req): Json<MatchReq>) -> Result<Json<MatchRes>> {
    let limit = req.limit.unwrap_or(state.matcher.options().limit);
    let threshold = req.threshold.unwrap_or(state.matcher.options().threshold);

    if !(0.0..=100.0).contains(&threshold) {
        return Err(PrescriptionAiError::InvalidInput(format!(
            "threshold must be between 0 and 100: {}",
            threshold
        )));
    }

    let matches = run_blocking(move || Ok(state.matcher.find_matches_with(&req.text, limit, threshold))).await?;
    Ok(Json(MatchRes { matches }))
}

async fn lookup_medicine_info(
    State(state): State<AppState>,
    Json(req): Json<MedicineInfoReq>,
) -> Result<Json<MedicineInfoRes>> {
    let provider = state.ai_provider;
    let info = run_blocking(move || medicine_info::get_medicine_info(provider, req.medicines.as_slice())).await?;
    Ok(Json(MedicineInfoRes { info }))
}
