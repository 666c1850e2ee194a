use std::sync::Arc;

use super::traits::{Embedder, EmbeddingError};

/// Collects (position, text) pairs and flushes when the batch is full.
/// Positions let the caller put vectors back in chunk order.
pub struct EmbeddingBatcher {
    buffer: Vec<(usize, String)>,
    batch_size: usize,
    embedder: Arc<dyn Embedder>,
}

impl EmbeddingBatcher {
    pub fn new(embedder: Arc<dyn Embedder>, batch_size: usize) -> Self {
        let batch_size = batch_size.max(1);
        Self {
            buffer: Vec::with_capacity(batch_size),
            batch_size,
            embedder,
        }
    }

    /// Add a text to the batch. Returns embeddings if the batch is full (auto-flush).
    pub async fn add(
        &mut self,
        position: usize,
        text: String,
    ) -> Result<Option<Vec<(usize, Vec<f32>)>>, EmbeddingError> {
        self.buffer.push((position, text));
        if self.buffer.len() >= self.batch_size {
            Ok(Some(self.flush().await?))
        } else {
            Ok(None)
        }
    }

    /// Force-flush remaining items.
    pub async fn flush(&mut self) -> Result<Vec<(usize, Vec<f32>)>, EmbeddingError> {
        if self.buffer.is_empty() {
            return Ok(Vec::new());
        }
        let batch: Vec<(usize, String)> = self.buffer.drain(..).collect();
        let texts: Vec<&str> = batch.iter().map(|(_, t)| t.as_str()).collect();
        let embeddings = self.embedder.embed_batch(&texts).await?;
        if embeddings.len() != batch.len() {
            return Err(EmbeddingError::CountMismatch {
                expected: batch.len(),
                actual: embeddings.len(),
            });
        }

        Ok(batch
            .into_iter()
            .zip(embeddings)
            .map(|((position, _), emb)| (position, emb))
            .collect())
    }

    /// Number of items currently buffered.
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use jarvis_store::ModelFingerprint;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FakeEmbedder {
        call_count: AtomicUsize,
        dims: usize,
        drop_last: bool,
    }

    impl FakeEmbedder {
        fn new(dims: usize) -> Self {
            Self {
                call_count: AtomicUsize::new(0),
                dims,
                drop_last: false,
            }
        }
    }

    #[async_trait]
    impl Embedder for FakeEmbedder {
        async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
            self.call_count.fetch_add(1, Ordering::SeqCst);
            let mut out: Vec<Vec<f32>> =
                texts.iter().map(|t| vec![t.len() as f32; self.dims]).collect();
            if self.drop_last {
                out.pop();
            }
            Ok(out)
        }

        fn dimensions(&self) -> usize {
            self.dims
        }

        fn fingerprint(&self) -> ModelFingerprint {
            ModelFingerprint::new("fake", "fake", self.dims)
        }
    }

    #[tokio::test]
    async fn flush_on_batch_size() {
        let embedder = Arc::new(FakeEmbedder::new(4));
        let mut batcher = EmbeddingBatcher::new(embedder.clone(), 3);

        assert!(batcher.add(0, "a".into()).await.unwrap().is_none());
        assert!(batcher.add(1, "bb".into()).await.unwrap().is_none());
        assert_eq!(batcher.pending(), 2);

        let embeddings = batcher.add(2, "ccc".into()).await.unwrap().unwrap();
        assert_eq!(embeddings.len(), 3);
        assert_eq!(embeddings[1], (1, vec![2.0; 4]));
        assert_eq!(batcher.pending(), 0);
        assert_eq!(embedder.call_count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn manual_flush() {
        let embedder = Arc::new(FakeEmbedder::new(4));
        let mut batcher = EmbeddingBatcher::new(embedder.clone(), 100);

        batcher.add(7, "a".into()).await.unwrap();
        batcher.add(9, "b".into()).await.unwrap();

        let result = batcher.flush().await.unwrap();
        let positions: Vec<usize> = result.iter().map(|(p, _)| *p).collect();
        assert_eq!(positions, vec![7, 9]);
        assert_eq!(batcher.pending(), 0);
    }

    #[tokio::test]
    async fn flush_empty_is_noop() {
        let embedder = Arc::new(FakeEmbedder::new(4));
        let mut batcher = EmbeddingBatcher::new(embedder.clone(), 10);

        assert!(batcher.flush().await.unwrap().is_empty());
        assert_eq!(embedder.call_count.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn short_response_is_an_error() {
        let embedder = Arc::new(FakeEmbedder {
            drop_last: true,
            ..FakeEmbedder::new(2)
        });
        let mut batcher = EmbeddingBatcher::new(embedder, 2);
        batcher.add(0, "a".into()).await.unwrap();
        let err = batcher.add(1, "b".into()).await.unwrap_err();
        assert!(matches!(err, EmbeddingError::CountMismatch { expected: 2, actual: 1 }));
    }
}
