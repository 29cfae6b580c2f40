//! HTTP surface for StudyBuddy: upload a document, get a study pack back.

pub mod api;
pub mod router;
pub mod state;

pub use router::build_router;
pub use state::AppState;
