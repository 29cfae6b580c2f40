//! Endpoint modules.
//!
//! Shared error plumbing lives here in mod.rs.

mod analyze;
pub mod doc;
mod health;
mod landing;

use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

// ── Shared types ─────────────────────────────────────────────────

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}

/// Error half of every handler result: a status plus `{"error": ...}`.
pub type ApiError = (StatusCode, Json<ErrorResponse>);

pub(crate) fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
}

// ── Re-exports ───────────────────────────────────────────────────

pub use analyze::{analyze, AnalyzeResponse};
pub use health::{health, HealthResponse};
pub use landing::landing;
