//! Axum route handlers for the Generation API.

use axum::{
    extract::{Multipart, Path, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::info;
use uuid::Uuid;

use crate::cache::{ArtifactKind, CacheStats};
use crate::errors::AppError;
use crate::generation::service::GenerationOutcome;
use crate::generation::styles::{Style, COLOR_FAMILIES};
use crate::resume::{normalize, FormFields, RawInput, ResumeRecord};
use crate::state::AppState;

const SAMPLE_CV: &str = include_str!("../../assets/sample_cv.json");
const ALLOWED_EXTENSIONS: &[&str] = &["json", "txt"];

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct GenerateJsonRequest {
    pub data: Value,
    pub style: Option<String>,
    #[serde(default = "default_compile")]
    pub compile: bool,
}

fn default_compile() -> bool {
    true
}

#[derive(Debug, Serialize)]
pub struct GenerateResponse {
    pub success: bool,
    #[serde(flatten)]
    pub outcome: GenerationOutcome,
    pub download_url: String,
}

impl From<GenerationOutcome> for GenerateResponse {
    fn from(outcome: GenerationOutcome) -> Self {
        Self {
            success: true,
            download_url: download_url(&outcome),
            outcome,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct StyleArtifact {
    pub style: &'static str,
    pub key: String,
    pub fallback: bool,
    pub download_url: String,
}

#[derive(Debug, Serialize)]
pub struct AllStylesResponse {
    pub success: bool,
    pub artifacts: Vec<StyleArtifact>,
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub success: bool,
    pub filename: String,
    pub data: ResumeRecord,
}

#[derive(Debug, Serialize)]
pub struct CacheStatsResponse {
    pub success: bool,
    pub stats: CacheStats,
}

/// An uploaded file part.
struct UploadedFile {
    file_name: String,
    bytes: Bytes,
}

struct MultipartPayload {
    fields: FormFields,
    file: Option<UploadedFile>,
}

fn download_url(outcome: &GenerationOutcome) -> String {
    if outcome.fallback {
        format!("/api/v1/jobs/{}/fallback", outcome.job_id)
    } else {
        format!("/api/v1/artifacts/{}", outcome.key)
    }
}

/// Splits a multipart body into plain fields and the (single) file part.
async fn read_multipart(mut multipart: Multipart) -> Result<MultipartPayload, AppError> {
    let mut fields = FormFields::new();
    let mut file = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Parse(format!("Invalid multipart body: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match field.file_name().map(str::to_string) {
            Some(file_name) => {
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::Parse(format!("Failed to read upload: {e}")))?;
                file = Some(UploadedFile { file_name, bytes });
            }
            None => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| AppError::Parse(format!("Failed to read field '{name}': {e}")))?;
                fields.push(&name, value);
            }
        }
    }

    Ok(MultipartPayload { fields, file })
}

/// Checks the extension and decodes the upload as UTF-8 text.
fn upload_text(file: &UploadedFile) -> Result<(String, String), AppError> {
    let file_name = sanitize_filename::sanitize(&file.file_name);
    let extension = std::path::Path::new(&file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default();
    if !ALLOWED_EXTENSIONS.contains(&extension.as_str()) {
        return Err(AppError::invalid(
            "Unsupported file format. Please use JSON or TXT files.",
        ));
    }

    let text = String::from_utf8(file.bytes.to_vec())
        .map_err(|_| AppError::Parse("Uploaded file is not valid UTF-8".to_string()))?;
    Ok((file_name, text))
}

fn require_file(payload: MultipartPayload) -> Result<UploadedFile, AppError> {
    payload
        .file
        .filter(|f| !f.file_name.is_empty())
        .ok_or_else(|| AppError::invalid("No file selected"))
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/v1/styles
pub async fn handle_list_styles() -> Json<Value> {
    let standard: Vec<Style> = Style::standard().collect();
    let all: Vec<Style> = Style::all().collect();
    let families: serde_json::Map<String, Value> = COLOR_FAMILIES
        .iter()
        .map(|(family, members)| (family.to_string(), json!(members)))
        .collect();

    Json(json!({
        "success": true,
        "standard": standard,
        "all": all,
        "families": families,
    }))
}

/// GET /api/v1/sample
pub async fn handle_sample() -> Result<Json<Value>, AppError> {
    let sample: Value = serde_json::from_str(SAMPLE_CV)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Bundled sample is invalid: {e}")))?;
    Ok(Json(json!({ "success": true, "data": sample })))
}

/// POST /api/v1/upload
///
/// Stores the uploaded JSON/TXT file and returns the normalized record.
pub async fn handle_upload(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<UploadResponse>, AppError> {
    let file = require_file(read_multipart(multipart).await?)?;
    let (file_name, text) = upload_text(&file)?;

    let record = normalize(RawInput::from_file(&file_name, &text))?;

    tokio::fs::create_dir_all(&state.config.upload_dir).await?;
    let stored = state
        .config
        .upload_dir
        .join(format!("{}_{file_name}", Uuid::new_v4()));
    tokio::fs::write(&stored, &file.bytes).await?;
    info!("Stored upload {}", stored.display());

    Ok(Json(UploadResponse {
        success: true,
        filename: file_name,
        data: record,
    }))
}

/// POST /api/v1/generate
///
/// Generates a PDF from the web form fields.
pub async fn handle_generate_form(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<GenerateResponse>, AppError> {
    let payload = read_multipart(multipart).await?;
    let style = match payload.fields.first("style") {
        "" => state.config.default_style.clone(),
        style => style.to_string(),
    };

    let outcome = state
        .service
        .generate(RawInput::Form(&payload.fields), &style, true)
        .await?;
    Ok(Json(outcome.into()))
}

/// POST /api/v1/generate/json
///
/// Body: `{ "data": {...}, "style": "red", "compile": true }`.
pub async fn handle_generate_json(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<GenerateResponse>, AppError> {
    let request: GenerateJsonRequest = serde_json::from_slice(&body)
        .map_err(|e| AppError::Parse(format!("Invalid request body: {e}")))?;
    let style = request
        .style
        .unwrap_or_else(|| state.config.default_style.clone());

    let outcome = state
        .service
        .generate(RawInput::Value(&request.data), &style, request.compile)
        .await?;
    Ok(Json(outcome.into()))
}

/// POST /api/v1/generate/all-styles
///
/// Generates the uploaded file once per standard theme.
pub async fn handle_generate_all_styles(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<AllStylesResponse>, AppError> {
    let file = require_file(read_multipart(multipart).await?)?;
    let (file_name, text) = upload_text(&file)?;
    let record = normalize(RawInput::from_file(&file_name, &text))?;

    let outcomes = state.service.generate_all_styles(&record).await;
    if outcomes.is_empty() {
        return Err(AppError::Compilation(
            "No style could be generated".to_string(),
        ));
    }

    let artifacts = outcomes
        .into_iter()
        .map(|(style, outcome)| StyleArtifact {
            style,
            download_url: download_url(&outcome),
            fallback: outcome.fallback,
            key: outcome.key,
        })
        .collect();

    Ok(Json(AllStylesResponse {
        success: true,
        artifacts,
    }))
}

async fn file_response(
    path: &std::path::Path,
    kind: ArtifactKind,
    download_name: &str,
) -> Result<Response, AppError> {
    let bytes = tokio::fs::read(path).await?;
    let disposition = format!("attachment; filename=\"{download_name}\"");
    Ok((
        [
            (header::CONTENT_TYPE, kind.content_type().to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    )
        .into_response())
}

/// GET /api/v1/artifacts/:key
pub async fn handle_get_artifact(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Response, AppError> {
    let artifact = state
        .service
        .cached_artifact(&key)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Artifact {key} not found")))?;

    let name = format!("resume_{key}.{}", artifact.kind.extension());
    file_response(&artifact.path, artifact.kind, &name).await
}

/// DELETE /api/v1/artifacts/:key
pub async fn handle_delete_artifact(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<Value>, AppError> {
    if !state.service.remove_artifact(&key).await? {
        return Err(AppError::NotFound(format!("Artifact {key} not found")));
    }
    Ok(Json(json!({ "success": true, "key": key })))
}

/// GET /api/v1/jobs/:job_id/fallback
pub async fn handle_get_fallback(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
) -> Result<Response, AppError> {
    let path = state
        .service
        .fallback_path(job_id)
        .ok_or_else(|| AppError::NotFound(format!("No fallback document for job {job_id}")))?;
    file_response(&path, ArtifactKind::Pdf, "resume_error.pdf").await
}

/// GET /api/v1/cache/stats
pub async fn handle_cache_stats(State(state): State<AppState>) -> Json<CacheStatsResponse> {
    Json(CacheStatsResponse {
        success: true,
        stats: state.service.cache_stats().await,
    })
}

/// DELETE /api/v1/cache
pub async fn handle_clear_cache(State(state): State<AppState>) -> Result<Json<Value>, AppError> {
    state.service.clear_cache().await?;
    Ok(Json(json!({ "success": true, "message": "Cache cleared" })))
}
