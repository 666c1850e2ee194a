//! Query-time half of the pipeline: embed a question, pull the nearest
//! chunks and render them as prompt context plus numbered citations.

pub mod formatter;
pub mod retriever;

pub use formatter::{format_citation, format_citations};
pub use retriever::{RetrievalError, Retrieval, Retriever, DEFAULT_TOP_K};
