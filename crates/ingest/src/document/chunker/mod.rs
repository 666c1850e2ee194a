//! Fixed-size character chunking with overlap.
//!
//! Each Document Unit is cut into windows of at most `chunk_size` characters.
//! Cuts prefer paragraph, then line, then sentence, then word boundaries
//! (searched from the back of the window, never leaving a chunk less than
//! half full) and fall back to a hard cut. The next window starts exactly
//! `chunk_overlap` characters before the previous cut.

mod helpers;
mod types;

use jarvis_core::DocumentUnit;

pub use types::{Chunk, ChunkConfig, ChunkConfigError};

/// Chunk every unit in order. Indices run across the whole sequence.
pub fn chunk_units(units: &[DocumentUnit], config: &ChunkConfig) -> Vec<Chunk> {
    let mut chunks = Vec::new();
    for unit in units {
        for (char_offset, text) in
            helpers::split_text(&unit.text, config.chunk_size(), config.chunk_overlap())
        {
            chunks.push(Chunk {
                index: chunks.len(),
                text,
                metadata: unit.metadata.clone(),
                char_offset,
            });
        }
    }
    chunks
}

#[cfg(test)]
mod tests;
