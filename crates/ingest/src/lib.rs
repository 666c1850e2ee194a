//! Turns a directory of mixed-format files into an embedded vector store.
//!
//! The flow is loaders ([`document::LoaderRegistry`]) → chunker
//! ([`document::chunker`]) → embedder ([`embedding::Embedder`]) → snapshot
//! write, driven end to end by [`pipeline::IngestionPipeline`].

pub mod document;
pub mod embedding;
pub mod pipeline;

pub use document::chunker::{chunk_units, Chunk, ChunkConfig};
pub use document::{DocumentLoader, ExtractionError, LoaderRegistry};
pub use embedding::{create_embedder, Embedder, EmbeddingError};
pub use pipeline::{IngestError, IngestReport, IngestionPipeline, SkippedFile};
