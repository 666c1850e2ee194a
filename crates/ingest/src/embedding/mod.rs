pub mod batcher;
pub mod cache;
pub mod ollama;
pub mod openai;
pub mod traits;

use std::sync::Arc;

use jarvis_core::config::{Config, PROVIDER_OLLAMA, PROVIDER_OPENAI};

pub use batcher::EmbeddingBatcher;
pub use cache::EmbeddingCache;
pub use ollama::OllamaEmbedder;
pub use openai::OpenAiEmbedder;
pub use traits::{Embedder, EmbeddingError};

/// Connect the backend named by `embedding_provider`. The model is probed
/// once, so an unreachable or missing model fails here.
pub async fn create_embedder(config: &Config) -> Result<Arc<dyn Embedder>, EmbeddingError> {
    match config.embedding_provider.as_str() {
        PROVIDER_OLLAMA => {
            let embedder =
                OllamaEmbedder::connect(&config.ollama_url, &config.embeddings_model_name).await?;
            Ok(Arc::new(embedder))
        }
        PROVIDER_OPENAI => {
            let api_key = config.openai_api_key.clone().ok_or_else(|| {
                EmbeddingError::ModelInit("OPENAI_API_KEY is not set".to_string())
            })?;
            let embedder = OpenAiEmbedder::connect(
                api_key,
                config.embeddings_model_name.clone(),
                Some(config.openai_base_url.clone()),
            )
            .await?;
            Ok(Arc::new(embedder))
        }
        other => Err(EmbeddingError::ModelInit(format!(
            "unknown embedding provider '{other}'"
        ))),
    }
}
