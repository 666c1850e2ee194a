//! One question in, one cited answer out: retrieval feeding generation.

use std::sync::Arc;

use anyhow::{Context, Result};
use jarvis_core::Config;
use jarvis_ingest::{create_embedder, Embedder};
use jarvis_llm::{system_prompt, ModelHandler, SnapshotStream};
use jarvis_retrieval::{Retrieval, Retriever};
use jarvis_store::VectorStore;
use tracing::info;

/// Shown when the store has nothing to retrieve from.
pub const NO_DOCUMENTS: &str = "No documents found. Please ingest documents first.";

/// Retrieved context for a question plus the answer stream built from it.
pub struct Turn {
    pub retrieval: Retrieval,
    pub answer: SnapshotStream,
}

pub struct Assistant {
    retriever: Retriever,
    handler: ModelHandler,
    system_prompt: String,
}

/// Connect the embedding model and open the store it was built with.
pub async fn open_retriever(config: &Config) -> Result<Retriever> {
    let embedder: Arc<dyn Embedder> = create_embedder(config)
        .await
        .context("failed to initialize embedding model")?;
    let store = VectorStore::open(&config.vector_store_path)
        .with_context(|| format!("failed to open vector store {}", config.vector_store_path.display()))?;
    let retriever = Retriever::new(embedder, Arc::new(store), config.top_k)
        .context("vector store does not match the configured embedding model; re-run ingest")?;
    Ok(retriever)
}

impl Assistant {
    pub fn new(retriever: Retriever, handler: ModelHandler, system_prompt: impl Into<String>) -> Self {
        Self {
            retriever,
            handler,
            system_prompt: system_prompt.into(),
        }
    }

    /// Build from config. The generative model is not loaded yet.
    pub async fn connect(config: &Config) -> Result<Self> {
        let retriever = open_retriever(config).await?;
        let handler =
            ModelHandler::from_config(config).context("failed to configure generation model")?;
        Ok(Self::new(retriever, handler, system_prompt(config)))
    }

    pub fn has_documents(&self) -> bool {
        self.retriever.store().is_available()
    }

    pub fn indexed_chunks(&self) -> usize {
        self.retriever.store().len()
    }

    pub fn model(&self) -> &str {
        self.handler.model()
    }

    pub async fn start(&self) -> Result<()> {
        self.handler
            .initialize()
            .await
            .with_context(|| format!("failed to initialize model '{}'", self.handler.model()))
    }

    pub async fn reload(&self) -> Result<()> {
        info!(model = %self.handler.model(), "Reloading model");
        self.handler
            .reload()
            .await
            .with_context(|| format!("failed to reload model '{}'", self.handler.model()))
    }

    pub async fn shutdown(&self) {
        self.handler.cleanup().await;
    }

    /// Retrieve context for `question` and start answering it. `None` when
    /// the store is empty.
    pub async fn turn(&self, question: &str, k: Option<usize>) -> Result<Option<Turn>> {
        let retrieval = self
            .retriever
            .retrieve(question, k)
            .await
            .context("failed to retrieve context")?;
        if retrieval.is_empty() {
            return Ok(None);
        }
        let answer = self.handler.generate_response(
            &self.system_prompt,
            question,
            Some(&retrieval.context),
            Some(&retrieval.citations),
        );
        Ok(Some(Turn { retrieval, answer }))
    }
}
