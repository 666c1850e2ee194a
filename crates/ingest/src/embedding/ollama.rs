use std::time::Duration;

use async_trait::async_trait;
use jarvis_core::config::PROVIDER_OLLAMA;
use jarvis_store::ModelFingerprint;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::traits::{check_vectors, Embedder, EmbeddingError, PROBE_TEXT};

/// Embedder backed by a local Ollama instance.
pub struct OllamaEmbedder {
    client: Client,
    url: String,
    model: String,
    dimensions: usize,
}

impl OllamaEmbedder {
    /// Use when the vector width is already known.
    pub fn new(url: String, model: String, dimensions: usize) -> Self {
        Self {
            client: build_client(),
            url: url.trim_end_matches('/').to_string(),
            model,
            dimensions,
        }
    }

    /// Build from a model name alone: one probe request learns the width.
    /// Fails if Ollama is unreachable or the model is not pulled.
    pub async fn connect(url: &str, model: &str) -> Result<Self, EmbeddingError> {
        let mut embedder = Self::new(url.to_string(), model.to_string(), 0);
        let probe = embedder.request(&[PROBE_TEXT]).await.map_err(|e| {
            EmbeddingError::ModelInit(format!("ollama model '{model}' at {url}: {e}"))
        })?;
        embedder.dimensions = probe
            .first()
            .map(Vec::len)
            .filter(|d| *d > 0)
            .ok_or_else(|| EmbeddingError::ModelInit(format!("ollama model '{model}' returned no vector")))?;
        tracing::info!(model, dimensions = embedder.dimensions, "ollama embedder ready");
        Ok(embedder)
    }

    async fn request(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let request = OllamaEmbedRequest {
            model: &self.model,
            input: texts,
        };

        let response = self
            .client
            .post(format!("{}/api/embed", self.url))
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(EmbeddingError::Api(format!("{status}: {body}")));
        }

        let parsed: OllamaEmbedResponse = response.json().await?;
        Ok(parsed.embeddings)
    }
}

fn build_client() -> Client {
    Client::builder()
        .timeout(Duration::from_secs(120))
        .build()
        .unwrap_or_else(|_| Client::new())
}

#[derive(Serialize)]
struct OllamaEmbedRequest<'a> {
    model: &'a str,
    input: &'a [&'a str],
}

#[derive(Deserialize)]
struct OllamaEmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

#[async_trait]
impl Embedder for OllamaEmbedder {
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        tracing::debug!(model = %self.model, batch = texts.len(), "ollama embed");
        let embeddings = self.request(texts).await?;
        check_vectors(&embeddings, texts.len(), self.dimensions)?;
        Ok(embeddings)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn fingerprint(&self) -> ModelFingerprint {
        ModelFingerprint::new(PROVIDER_OLLAMA, &self.model, self.dimensions)
    }
}
