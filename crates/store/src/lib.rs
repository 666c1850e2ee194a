//! Persisted vector store: one immutable snapshot per corpus, searched by
//! cosine similarity.

pub mod error;
pub mod fingerprint;
pub mod record;
pub mod snapshot;
pub mod vector_store;

pub use error::StoreError;
pub use fingerprint::ModelFingerprint;
pub use record::EmbeddingRecord;
pub use snapshot::{snapshot_path, Snapshot, SnapshotHeader, SNAPSHOT_EXTENSION};
pub use vector_store::{SearchHit, VectorStore};
