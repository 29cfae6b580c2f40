pub mod openai;

use studybuddy_core::config::LlmConfig;

use crate::provider::{LlmError, LlmProvider};

/// Create the OpenAI provider from config. Fails when the API key is absent.
pub fn create_provider(llm_config: &LlmConfig) -> Result<Box<dyn LlmProvider>, LlmError> {
    let api_key = llm_config
        .require_api_key()
        .map_err(|e| LlmError::NotConfigured(e.to_string()))?;

    let provider = openai::OpenAiProvider::new(
        api_key.to_string(),
        llm_config.openai_model.clone(),
        llm_config.base_url().to_string(),
    );
    Ok(Box::new(provider))
}
