use async_trait::async_trait;
use jarvis_store::ModelFingerprint;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error: {0}")]
    Api(String),

    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("expected {expected} embeddings, got {actual}")]
    CountMismatch { expected: usize, actual: usize },

    #[error("embedding model unavailable: {0}")]
    ModelInit(String),
}

/// Trait for embedding backends (Ollama, OpenAI-compatible, test fakes).
///
/// The same implementation and model must be used when building a store and
/// when querying it; [`Embedder::fingerprint`] is what the store records to
/// check that.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed a batch of texts, returning one vector per input text (in order).
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError>;

    /// Embed a single text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let mut vectors = self.embed_batch(&[text]).await?;
        match vectors.pop() {
            Some(v) if vectors.is_empty() => Ok(v),
            _ => Err(EmbeddingError::CountMismatch {
                expected: 1,
                actual: vectors.len() + 1,
            }),
        }
    }

    /// The dimensionality of the output vectors.
    fn dimensions(&self) -> usize;

    /// Identity of the model behind this embedder.
    fn fingerprint(&self) -> ModelFingerprint;
}

/// Check a backend response against the request and the expected width.
pub(crate) fn check_vectors(
    vectors: &[Vec<f32>],
    requested: usize,
    dimensions: usize,
) -> Result<(), EmbeddingError> {
    if vectors.len() != requested {
        return Err(EmbeddingError::CountMismatch {
            expected: requested,
            actual: vectors.len(),
        });
    }
    if let Some(bad) = vectors.iter().find(|v| v.len() != dimensions) {
        return Err(EmbeddingError::DimensionMismatch {
            expected: dimensions,
            actual: bad.len(),
        });
    }
    Ok(())
}

/// Text sent once at connect time to learn the vector width.
pub(crate) const PROBE_TEXT: &str = "dimension probe";
