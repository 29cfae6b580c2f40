use std::path::PathBuf;

use studybuddy_core::config::ServerConfig;
use studybuddy_llm::StudyPackGenerator;

/// Shared, read-only per-process state. Nothing here changes between requests.
pub struct AppState {
    pub generator: StudyPackGenerator,
    pub static_dir: PathBuf,
    pub max_upload_bytes: usize,
}

impl AppState {
    pub fn new(generator: StudyPackGenerator, server: &ServerConfig) -> Self {
        Self {
            generator,
            static_dir: server.static_dir.clone(),
            max_upload_bytes: server.max_upload_bytes,
        }
    }
}
