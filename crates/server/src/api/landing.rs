use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Html;
use tracing::warn;

use crate::state::AppState;

use super::{api_error, ApiError};

/// GET /: the single-page front-end.
pub async fn landing(State(state): State<Arc<AppState>>) -> Result<Html<String>, ApiError> {
    let path = state.static_dir.join("index.html");
    tokio::fs::read_to_string(&path).await.map(Html).map_err(|e| {
        warn!("Landing page unavailable at {}: {e}", path.display());
        api_error(StatusCode::NOT_FOUND, "Landing page not found")
    })
}
