//! HTTP router construction.

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

use crate::api;
use crate::state::AppState;

/// Build the application router: landing page, health, docs, the analyze
/// endpoint, and static assets as the fallback.
pub fn build_router(state: Arc<AppState>) -> Router {
    let static_dir = state.static_dir.clone();

    let api_routes = Router::new()
        .route(
            "/api/analyze",
            post(api::analyze).layer(DefaultBodyLimit::max(state.max_upload_bytes)),
        )
        .layer(CorsLayer::permissive());

    Router::new()
        .route("/", get(api::landing))
        .route("/health", get(api::health))
        .merge(api_routes)
        .with_state(state)
        .merge(Scalar::with_url("/docs", api::doc::ApiDoc::openapi()))
        .fallback_service(ServeDir::new(static_dir))
}
