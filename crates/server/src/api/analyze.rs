//! POST /api/analyze: upload, text extraction, study pack.

use std::sync::Arc;

use axum::extract::multipart::MultipartError;
use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;
use tracing::{error, info};

use studybuddy_core::{QuestionCount, QuizQuestion, StudyPack};
use studybuddy_ingest::{extract_text, DocumentKind, ExtractionError};

use crate::state::AppState;

use super::{api_error, ApiError, ErrorResponse};

// ── Request/Response types ────────────────────────

#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeResponse {
    pub summary: String,
    pub key_points: Vec<String>,
    #[schema(value_type = Vec<Object>)]
    pub quiz_questions: Vec<QuizQuestion>,
    pub study_guide: Vec<String>,
    pub file_name: String,
}

impl AnalyzeResponse {
    fn new(pack: StudyPack, file_name: String) -> Self {
        Self {
            summary: pack.summary,
            key_points: pack.key_points,
            quiz_questions: pack.quiz_questions,
            study_guide: pack.study_guide,
            file_name,
        }
    }
}

/// The uploaded file as it arrived in the form.
struct Upload {
    file_name: String,
    bytes: axum::body::Bytes,
}

fn multipart_error(e: MultipartError) -> ApiError {
    api_error(e.status(), e.body_text())
}

fn extraction_error(e: ExtractionError) -> ApiError {
    let status = match e {
        ExtractionError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
        ExtractionError::UnsupportedFileType(_) => StatusCode::BAD_REQUEST,
        ExtractionError::MissingCapability(_)
        | ExtractionError::PdfError(_)
        | ExtractionError::DocxError(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    api_error(status, e.to_string())
}

// ── POST /api/analyze ─────────────────────────────

/// Generate a study pack from an uploaded document
///
/// Accepts multipart/form-data with a `file` field (pdf, docx or txt) and an
/// optional `n` field with the desired number of quiz questions (1-20, default 5).
#[utoipa::path(
    post,
    path = "/api/analyze",
    tag = "Study",
    request_body(content_type = "multipart/form-data", description = "Fields: file (required), n (optional)"),
    responses(
        (status = 200, description = "Study pack generated", body = AnalyzeResponse),
        (status = 400, description = "Missing, empty or unsupported file, or no extractable text", body = ErrorResponse),
        (status = 413, description = "Upload exceeds the size limit", body = ErrorResponse),
        (status = 500, description = "Extraction or LLM provider failure", body = ErrorResponse)
    )
)]
pub async fn analyze(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<AnalyzeResponse>, ApiError> {
    let mut upload: Option<Upload> = None;
    let mut n_field: Option<String> = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("file") if upload.is_none() => {
                // A part without a filename is a plain form value, not a file.
                let Some(file_name) = field.file_name().map(str::to_string) else {
                    continue;
                };
                let bytes = field.bytes().await.map_err(multipart_error)?;
                upload = Some(Upload { file_name, bytes });
            }
            Some("n") => {
                n_field = Some(field.text().await.map_err(multipart_error)?);
            }
            _ => {}
        }
    }

    let upload = upload.ok_or_else(|| {
        api_error(StatusCode::BAD_REQUEST, "No file provided (use form field 'file')")
    })?;
    if upload.file_name.is_empty() {
        return Err(api_error(StatusCode::BAD_REQUEST, "Empty filename"));
    }
    let kind = DocumentKind::from_file_name(&upload.file_name).map_err(|_| {
        api_error(StatusCode::BAD_REQUEST, "Unsupported file type (pdf/docx/txt)")
    })?;
    let question_count = QuestionCount::parse(n_field.as_deref());

    info!(
        "Analyzing '{}' ({}, {} bytes, {} questions)",
        upload.file_name,
        kind,
        upload.bytes.len(),
        question_count
    );

    let Upload { file_name, bytes } = upload;
    let extracted = tokio::task::spawn_blocking(move || extract_text(&bytes, kind, &file_name))
        .await
        .map_err(|e| api_error(StatusCode::INTERNAL_SERVER_ERROR, format!("Extraction task failed: {e}")))?
        .map_err(|e| {
            error!("Text extraction failed: {e}");
            extraction_error(e)
        })?;

    if extracted.is_blank() {
        return Err(api_error(StatusCode::BAD_REQUEST, "Could not extract text from file"));
    }

    info!(
        "Extracted {} chars from '{}'",
        extracted.char_count(),
        extracted.source_file_name
    );

    let pack = state
        .generator
        .generate(&extracted.content, question_count)
        .await
        .map_err(|e| {
            error!("Study pack generation failed for '{}': {e}", extracted.source_file_name);
            api_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        })?;

    Ok(Json(AnalyzeResponse::new(pack, extracted.source_file_name)))
}
