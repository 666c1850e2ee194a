use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialize(String),

    #[error("corrupt snapshot {path}: {reason}")]
    Corrupt { path: String, reason: String },

    #[error("unsupported snapshot format version {0}")]
    UnsupportedVersion(u32),

    #[error("refusing to write an empty snapshot")]
    Empty,

    #[error("dimension mismatch at record {position}: expected {expected}, got {actual}")]
    DimensionMismatch {
        position: usize,
        expected: usize,
        actual: usize,
    },

    #[error("query dimension mismatch: store has {expected}, query has {actual}")]
    QueryDimension { expected: usize, actual: usize },

    #[error("embedding model mismatch: store was built with {stored}, current embedder is {current}")]
    FingerprintMismatch { stored: String, current: String },
}
