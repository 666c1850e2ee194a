pub mod ollama;
pub mod openai;

use std::sync::Arc;

use jarvis_core::config::{Config, PROVIDER_OLLAMA, PROVIDER_OPENAI};

use crate::provider::{LlmError, TextGenerator};

pub use ollama::OllamaGenerator;
pub use openai::OpenAiCompatGenerator;

/// Create the generation backend named by `generation_provider`.
/// Nothing is contacted until `load`.
pub fn create_generator(config: &Config) -> Result<Arc<dyn TextGenerator>, LlmError> {
    match config.generation_provider.as_str() {
        PROVIDER_OLLAMA => Ok(Arc::new(OllamaGenerator::new(
            config.ollama_url.clone(),
            config.model_name.clone(),
        ))),
        PROVIDER_OPENAI => Ok(Arc::new(OpenAiCompatGenerator::new(
            config.openai_api_key.clone(),
            config.model_name.clone(),
            config.openai_base_url.clone(),
        ))),
        other => Err(LlmError::NotConfigured(format!(
            "unknown LLM provider: '{}'",
            other
        ))),
    }
}
