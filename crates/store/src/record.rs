use jarvis_core::Metadata;
use serde::{Deserialize, Serialize};

/// One embedded chunk: the vector plus everything needed to cite and quote it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingRecord {
    pub vector: Vec<f32>,
    pub metadata: Metadata,
    pub chunk_text: String,
}

impl EmbeddingRecord {
    pub fn new(vector: Vec<f32>, metadata: Metadata, chunk_text: impl Into<String>) -> Self {
        Self {
            vector,
            metadata,
            chunk_text: chunk_text.into(),
        }
    }

    pub fn dimensions(&self) -> usize {
        self.vector.len()
    }
}
