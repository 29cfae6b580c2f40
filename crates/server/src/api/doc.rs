//! OpenAPI documentation, served via Scalar UI at `/docs`.

use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "StudyBuddy API",
        version = "0.1.0",
        description = "Turns uploaded course material into a study pack: summary, key points, quiz and study plan.",
    ),
    tags(
        (name = "Health", description = "Server liveness"),
        (name = "Study", description = "Document upload and study pack generation"),
    ),
    paths(
        crate::api::health::health,
        crate::api::analyze::analyze,
    ),
    components(schemas(
        crate::api::ErrorResponse,
        crate::api::health::HealthResponse,
        crate::api::analyze::AnalyzeResponse,
    ))
)]
pub struct ApiDoc;
