use std::sync::Arc;

use anyhow::Context;
use tracing::info;
use tracing_subscriber::EnvFilter;

use studybuddy_llm::StudyPackGenerator;
use studybuddy_server::{build_router, AppState};

fn load_config() -> studybuddy_core::Config {
    studybuddy_core::config::load_dotenv();
    studybuddy_core::Config::from_env()
}

async fn serve(config: &studybuddy_core::Config) -> anyhow::Result<()> {
    // No API key means nothing useful can be served; refuse to start.
    let generator = StudyPackGenerator::from_config(&config.llm)
        .context("cannot start without an LLM provider")?;
    info!("LLM provider ready (model: {})", generator.model());

    let state = Arc::new(AppState::new(generator, &config.server));
    let app = build_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("Server listening on http://localhost:{}", config.server.port);
    axum::serve(listener, app).await?;

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_level(true)
        .init();

    let config = load_config();
    config.log_summary();

    serve(&config).await
}
