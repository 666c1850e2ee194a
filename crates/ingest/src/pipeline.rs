//! Full-rebuild ingestion: source directory → loaders → chunker → embedder
//! → snapshot.
//!
//! Per-file load failures are logged and recorded in the report; everything
//! after loading (embedding, store write) aborts the run and leaves any
//! previous snapshot in place.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use jarvis_core::{Config, DocumentUnit};
use jarvis_store::{snapshot_path, EmbeddingRecord, StoreError, VectorStore};
use thiserror::Error;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::document::chunker::{chunk_units, Chunk, ChunkConfig, ChunkConfigError};
use crate::document::{ExtractionError, LoaderRegistry};
use crate::embedding::{Embedder, EmbeddingBatcher, EmbeddingCache, EmbeddingError};

const DEFAULT_BATCH_SIZE: usize = 32;
const DEFAULT_CACHE_CAPACITY: usize = 4096;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("source directory not found: {0}")]
    SourceDir(PathBuf),

    #[error("no loadable documents under {0}")]
    NoDocuments(PathBuf),

    #[error("documents loaded but produced no chunks")]
    NoChunks,

    #[error("invalid chunking config: {0}")]
    Config(#[from] ChunkConfigError),

    #[error("embedding failed: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("store write failed: {0}")]
    Store(#[from] StoreError),
}

/// A file that was discovered but could not be loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub reason: String,
}

/// Outcome of a successful run.
#[derive(Debug, Clone)]
pub struct IngestReport {
    pub files_discovered: usize,
    pub files_loaded: usize,
    pub skipped: Vec<SkippedFile>,
    pub units: usize,
    pub chunks: usize,
    /// Chunks whose vector came from the in-run cache.
    pub cache_hits: u64,
    pub snapshot_path: PathBuf,
}

pub struct IngestionPipeline {
    registry: Arc<LoaderRegistry>,
    chunk_config: ChunkConfig,
    embedder: Arc<dyn Embedder>,
    batch_size: usize,
    cache_capacity: usize,
}

impl IngestionPipeline {
    pub fn new(
        registry: LoaderRegistry,
        chunk_config: ChunkConfig,
        embedder: Arc<dyn Embedder>,
    ) -> Self {
        Self {
            registry: Arc::new(registry),
            chunk_config,
            embedder,
            batch_size: DEFAULT_BATCH_SIZE,
            cache_capacity: DEFAULT_CACHE_CAPACITY,
        }
    }

    /// Default registry, chunking and batch size taken from `config`.
    pub fn from_config(config: &Config, embedder: Arc<dyn Embedder>) -> Result<Self, IngestError> {
        let chunk_config = ChunkConfig::from_config(config)?;
        Ok(Self::new(LoaderRegistry::default(), chunk_config, embedder)
            .with_batch_size(config.embedding_batch_size))
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn with_cache_capacity(mut self, capacity: usize) -> Self {
        self.cache_capacity = capacity;
        self
    }

    pub fn registry(&self) -> &LoaderRegistry {
        &self.registry
    }

    /// Every file under `source_dir` with a registered extension, sorted by
    /// path. Unreadable directory entries are logged and skipped.
    pub fn discover(&self, source_dir: &Path) -> Result<Vec<PathBuf>, IngestError> {
        if !source_dir.is_dir() {
            return Err(IngestError::SourceDir(source_dir.to_path_buf()));
        }
        let mut files = Vec::new();
        for entry in WalkDir::new(source_dir).sort_by_file_name() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(error = %e, "skipping unreadable directory entry");
                    continue;
                }
            };
            if entry.file_type().is_file() && self.registry.supports(entry.path()) {
                files.push(entry.into_path());
            }
        }
        files.sort();
        Ok(files)
    }

    /// Load each file in order, isolating failures. Parsing runs on the
    /// blocking pool.
    pub async fn load_all(&self, files: &[PathBuf]) -> (Vec<DocumentUnit>, Vec<SkippedFile>) {
        let mut units = Vec::new();
        let mut skipped = Vec::new();
        for path in files {
            let registry = Arc::clone(&self.registry);
            let file = path.clone();
            let loaded = tokio::task::spawn_blocking(move || registry.load_single_document(&file))
                .await
                .unwrap_or_else(|e| Err(ExtractionError::Task(e.to_string())));
            match loaded {
                Ok(loaded) => units.extend(loaded),
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Error loading document, skipping");
                    skipped.push(SkippedFile {
                        path: path.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }
        (units, skipped)
    }

    /// Embed every chunk, reusing vectors for repeated texts. A text is sent
    /// to the backend at most once per run, even when its copies share a
    /// batch. Returns vectors in chunk order plus the number of reused vectors.
    pub async fn embed_chunks(&self, chunks: &[Chunk]) -> Result<(Vec<Vec<f32>>, u64), EmbeddingError> {
        let mut cache = EmbeddingCache::new(self.cache_capacity);
        let mut batcher = EmbeddingBatcher::new(self.embedder.clone(), self.batch_size);
        let mut vectors: Vec<Option<Vec<f32>>> = vec![None; chunks.len()];
        // text → position of the copy handed to the batcher
        let mut queued: HashMap<&str, usize> = HashMap::new();
        let mut copies: Vec<(usize, usize)> = Vec::new();

        for (position, chunk) in chunks.iter().enumerate() {
            if let Some(hit) = cache.get(&chunk.text) {
                vectors[position] = Some(hit);
                continue;
            }
            if let Some(&first) = queued.get(chunk.text.as_str()) {
                copies.push((position, first));
                continue;
            }
            queued.insert(chunk.text.as_str(), position);
            if let Some(done) = batcher.add(position, chunk.text.clone()).await? {
                debug!(done = position + 1, total = chunks.len(), "embedded batch");
                place(done, chunks, &mut vectors, &mut cache);
            }
        }
        let rest = batcher.flush().await?;
        place(rest, chunks, &mut vectors, &mut cache);

        for &(position, first) in &copies {
            vectors[position] = vectors[first].clone();
        }

        let hits = cache.hits() + copies.len() as u64;
        let vectors = vectors
            .into_iter()
            .enumerate()
            .map(|(position, v)| {
                v.ok_or(EmbeddingError::CountMismatch {
                    expected: chunks.len(),
                    actual: position,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok((vectors, hits))
    }

    /// Run a full rebuild of the store at `store_path` from `source_dir`.
    pub async fn run(&self, source_dir: &Path, store_path: &Path) -> Result<IngestReport, IngestError> {
        let started = Instant::now();
        info!(
            source = %source_dir.display(),
            store = %store_path.display(),
            "Loading documents"
        );

        let files = self.discover(source_dir)?;
        let (units, skipped) = self.load_all(&files).await;
        let files_loaded = files.len() - skipped.len();
        if units.is_empty() {
            return Err(IngestError::NoDocuments(source_dir.to_path_buf()));
        }
        info!(
            files = files.len(),
            loaded = files_loaded,
            skipped = skipped.len(),
            units = units.len(),
            "Loaded documents"
        );

        let chunks = chunk_units(&units, &self.chunk_config);
        if chunks.is_empty() {
            return Err(IngestError::NoChunks);
        }
        info!(
            chunks = chunks.len(),
            chunk_size = self.chunk_config.chunk_size(),
            chunk_overlap = self.chunk_config.chunk_overlap(),
            "Split into chunks"
        );

        let (vectors, cache_hits) = self.embed_chunks(&chunks).await?;
        info!(vectors = vectors.len(), cache_hits, "Generated embeddings");

        let records: Vec<EmbeddingRecord> = chunks
            .into_iter()
            .zip(vectors)
            .map(|(chunk, vector)| EmbeddingRecord::new(vector, chunk.metadata, chunk.text))
            .collect();
        let chunk_count = records.len();
        VectorStore::build(store_path, self.embedder.fingerprint(), records)?;

        let report = IngestReport {
            files_discovered: files.len(),
            files_loaded,
            skipped,
            units: units.len(),
            chunks: chunk_count,
            cache_hits,
            snapshot_path: snapshot_path(store_path),
        };
        info!(
            chunks = report.chunks,
            skipped = report.skipped.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Ingestion complete"
        );
        Ok(report)
    }
}

fn place(
    done: Vec<(usize, Vec<f32>)>,
    chunks: &[Chunk],
    vectors: &mut [Option<Vec<f32>>],
    cache: &mut EmbeddingCache,
) {
    for (position, vector) in done {
        cache.put(&chunks[position].text, vector.clone());
        vectors[position] = Some(vector);
    }
}
