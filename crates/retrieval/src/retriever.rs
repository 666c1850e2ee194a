use std::sync::Arc;

use jarvis_ingest::{Embedder, EmbeddingError};
use jarvis_store::{SearchHit, StoreError, VectorStore};
use thiserror::Error;
use tracing::debug;

use crate::formatter::format_citations;

/// Chunks retrieved per question when nothing else is configured.
pub const DEFAULT_TOP_K: usize = 3;

#[derive(Debug, Error)]
pub enum RetrievalError {
    #[error(transparent)]
    Embedding(#[from] EmbeddingError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Ranked hits plus their rendered prompt context and citation list.
#[derive(Debug, Clone, Default)]
pub struct Retrieval {
    pub hits: Vec<SearchHit>,
    pub context: String,
    pub citations: String,
}

impl Retrieval {
    fn from_hits(hits: Vec<SearchHit>) -> Self {
        let (context, citations) = format_citations(&hits);
        Self {
            hits,
            context,
            citations,
        }
    }

    /// True when nothing was retrieved, i.e. the store is empty.
    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }

    pub fn len(&self) -> usize {
        self.hits.len()
    }
}

/// Read-only query front end over one snapshot. Cheap to share behind `Arc`.
pub struct Retriever {
    embedder: Arc<dyn Embedder>,
    store: Arc<VectorStore>,
    top_k: usize,
}

impl Retriever {
    /// Fails when the store was built by a different embedding model than
    /// `embedder`. An unavailable (never ingested) store is accepted.
    pub fn new(
        embedder: Arc<dyn Embedder>,
        store: Arc<VectorStore>,
        top_k: usize,
    ) -> Result<Self, RetrievalError> {
        if let Some(stored) = store.fingerprint() {
            let current = embedder.fingerprint();
            if !stored.matches(&current) {
                return Err(StoreError::FingerprintMismatch {
                    stored: stored.to_string(),
                    current: current.to_string(),
                }
                .into());
            }
        }
        Ok(Self {
            embedder,
            store,
            top_k: top_k.max(1),
        })
    }

    pub fn store(&self) -> &VectorStore {
        &self.store
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    /// Embed `query` and return the `k` (default: configured top-k) closest
    /// chunks. An empty store yields an empty retrieval without calling
    /// the embedder.
    pub async fn retrieve(&self, query: &str, k: Option<usize>) -> Result<Retrieval, RetrievalError> {
        if !self.store.is_available() {
            return Ok(Retrieval::default());
        }
        let k = k.unwrap_or(self.top_k);
        let vector = self.embedder.embed(query).await?;
        let hits = self.store.search(&vector, k)?;
        debug!(
            k,
            hits = hits.len(),
            best = hits.first().map(|h| h.score).unwrap_or_default(),
            "retrieved context"
        );
        Ok(Retrieval::from_hits(hits))
    }
}
