use std::num::NonZeroUsize;

use lru::LruCache;

/// LRU cache mapping chunk text to its embedding vector.
///
/// Keys are the full text, so distinct chunks never share a slot.
pub struct EmbeddingCache {
    cache: LruCache<String, Vec<f32>>,
    hits: u64,
    misses: u64,
}

impl EmbeddingCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            cache: LruCache::new(NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN)),
            hits: 0,
            misses: 0,
        }
    }

    /// Look up a cached embedding by text.
    pub fn get(&mut self, text: &str) -> Option<Vec<f32>> {
        if let Some(vec) = self.cache.get(text) {
            self.hits += 1;
            Some(vec.clone())
        } else {
            self.misses += 1;
            None
        }
    }

    /// Store an embedding for a text.
    pub fn put(&mut self, text: &str, embedding: Vec<f32>) {
        self.cache.put(text.to_string(), embedding);
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }

    pub fn misses(&self) -> u64 {
        self.misses
    }

    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }
}
