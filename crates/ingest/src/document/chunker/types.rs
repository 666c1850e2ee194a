//! Chunk configuration and output types.

use jarvis_core::{Config, Metadata};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ChunkConfigError {
    #[error("chunk_size must be positive")]
    ZeroSize,
    #[error("chunk_overlap ({overlap}) must be smaller than chunk_size ({size})")]
    OverlapTooLarge { size: usize, overlap: usize },
}

// ── Configuration ───────────────────────────────────────────────────────────

/// Window parameters, both measured in characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkConfig {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl ChunkConfig {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self, ChunkConfigError> {
        if chunk_size == 0 {
            return Err(ChunkConfigError::ZeroSize);
        }
        if chunk_overlap >= chunk_size {
            return Err(ChunkConfigError::OverlapTooLarge {
                size: chunk_size,
                overlap: chunk_overlap,
            });
        }
        Ok(Self {
            chunk_size,
            chunk_overlap,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, ChunkConfigError> {
        Self::new(config.chunk_size, config.chunk_overlap)
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn chunk_overlap(&self) -> usize {
        self.chunk_overlap
    }
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self {
            chunk_size: 512,
            chunk_overlap: 32,
        }
    }
}

// ── Chunk output ────────────────────────────────────────────────────────────

/// A bounded slice of one Document Unit.
#[derive(Debug, Clone, PartialEq)]
pub struct Chunk {
    /// 0-based position in the whole chunk sequence of a run.
    pub index: usize,
    pub text: String,
    /// Copy of the parent unit's metadata.
    pub metadata: Metadata,
    /// Character offset of `text` inside the parent unit.
    pub char_offset: usize,
}
