use async_trait::async_trait;
use jarvis_core::config::PROVIDER_OPENAI;
use jarvis_store::ModelFingerprint;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::traits::{check_vectors, Embedder, EmbeddingError, PROBE_TEXT};

/// OpenAI-compatible embedding backend.
pub struct OpenAiEmbedder {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
    dimensions: usize,
}

impl OpenAiEmbedder {
    pub fn new(
        api_key: String,
        model: String,
        base_url: Option<String>,
        dimensions: usize,
    ) -> Self {
        Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(120))
                .build()
                .unwrap_or_else(|_| Client::new()),
            api_key,
            model,
            base_url: base_url
                .unwrap_or_else(|| "https://api.openai.com".to_string())
                .trim_end_matches('/')
                .to_string(),
            dimensions,
        }
    }

    /// Build from a model name, probing once for the vector width.
    pub async fn connect(
        api_key: String,
        model: String,
        base_url: Option<String>,
    ) -> Result<Self, EmbeddingError> {
        let mut embedder = Self::new(api_key, model, base_url, 0);
        let probe = embedder.request(&[PROBE_TEXT]).await.map_err(|e| {
            EmbeddingError::ModelInit(format!(
                "model '{}' at {}: {e}",
                embedder.model, embedder.base_url
            ))
        })?;
        embedder.dimensions = probe.first().map(Vec::len).unwrap_or(0);
        if embedder.dimensions == 0 {
            return Err(EmbeddingError::ModelInit(format!(
                "model '{}' returned no vector",
                embedder.model
            )));
        }
        tracing::info!(
            model = %embedder.model,
            dimensions = embedder.dimensions,
            "openai embedder ready"
        );
        Ok(embedder)
    }

    async fn request(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let request = EmbedRequest {
            model: &self.model,
            input: texts,
        };

        let response = self
            .client
            .post(format!("{}/v1/embeddings", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(EmbeddingError::Api(format!("{status}: {body}")));
        }

        let resp: EmbedResponse = response.json().await?;
        Ok(into_ordered(resp))
    }
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a [&'a str],
}

#[derive(Deserialize)]
struct EmbedResponse {
    data: Vec<EmbedItem>,
}

#[derive(Deserialize)]
struct EmbedItem {
    embedding: Vec<f32>,
    index: usize,
}

/// The API may return items out of order; `index` is authoritative.
fn into_ordered(mut resp: EmbedResponse) -> Vec<Vec<f32>> {
    resp.data.sort_by_key(|item| item.index);
    resp.data.into_iter().map(|item| item.embedding).collect()
}

#[async_trait]
impl Embedder for OpenAiEmbedder {
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let embeddings = self.request(texts).await?;
        check_vectors(&embeddings, texts.len(), self.dimensions)?;
        Ok(embeddings)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn fingerprint(&self) -> ModelFingerprint {
        ModelFingerprint::new(PROVIDER_OPENAI, &self.model, self.dimensions)
    }
}
