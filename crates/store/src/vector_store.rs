use std::cmp::Ordering;
use std::path::Path;

use rayon::prelude::*;
use tracing::{info, warn};

use crate::error::StoreError;
use crate::fingerprint::ModelFingerprint;
use crate::record::EmbeddingRecord;
use crate::snapshot::{snapshot_path, validate_records, Snapshot};

/// One search result. Owns a copy of the record so callers can hold hits
/// past the lifetime of the store borrow.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    /// Insertion position in the snapshot.
    pub position: usize,
    /// Cosine similarity in [-1, 1]. Higher is closer.
    pub score: f32,
    pub record: EmbeddingRecord,
}

/// Read-only in-memory index over one snapshot.
///
/// A store opened on a path with no snapshot is "unavailable": it holds no
/// records and every search returns nothing. Callers use
/// [`VectorStore::is_available`] to tell the user to ingest first.
#[derive(Debug, Clone, Default)]
pub struct VectorStore {
    fingerprint: Option<ModelFingerprint>,
    records: Vec<EmbeddingRecord>,
}

impl VectorStore {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Load the snapshot at `<store_path>.snapshot`. A missing snapshot
    /// yields an empty store and a warning; a corrupt one is an error.
    pub fn open(store_path: &Path) -> Result<Self, StoreError> {
        match Snapshot::read(store_path)? {
            Some(snapshot) => {
                let (header, records) = snapshot.into_records();
                info!(
                    path = %snapshot_path(store_path).display(),
                    records = records.len(),
                    model = %header.fingerprint,
                    created_at = %header.created_at,
                    "vector store loaded"
                );
                Ok(Self {
                    fingerprint: Some(header.fingerprint),
                    records,
                })
            }
            None => {
                warn!(
                    path = %snapshot_path(store_path).display(),
                    "no vector store found, starting empty"
                );
                Ok(Self::empty())
            }
        }
    }

    /// Build an in-memory store without touching disk.
    pub fn from_records(
        fingerprint: ModelFingerprint,
        records: Vec<EmbeddingRecord>,
    ) -> Result<Self, StoreError> {
        validate_records(&fingerprint, &records)?;
        Ok(Self {
            fingerprint: Some(fingerprint),
            records,
        })
    }

    /// Persist `records` as the snapshot for `store_path`, replacing any
    /// previous snapshot, and return the store that was written.
    pub fn build(
        store_path: &Path,
        fingerprint: ModelFingerprint,
        records: Vec<EmbeddingRecord>,
    ) -> Result<Self, StoreError> {
        Snapshot::write(store_path, &fingerprint, &records)?;
        Ok(Self {
            fingerprint: Some(fingerprint),
            records,
        })
    }

    pub fn is_available(&self) -> bool {
        self.fingerprint.is_some() && !self.records.is_empty()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn fingerprint(&self) -> Option<&ModelFingerprint> {
        self.fingerprint.as_ref()
    }

    pub fn dimensions(&self) -> Option<usize> {
        self.fingerprint.as_ref().map(|fp| fp.dimensions)
    }

    pub fn records(&self) -> &[EmbeddingRecord] {
        &self.records
    }

    /// Return the `k` records most similar to `query`, best first.
    /// Equal scores keep insertion order.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<SearchHit>, StoreError> {
        let Some(dims) = self.dimensions() else {
            return Ok(Vec::new());
        };
        if k == 0 || self.records.is_empty() {
            return Ok(Vec::new());
        }
        if query.len() != dims {
            return Err(StoreError::QueryDimension {
                expected: dims,
                actual: query.len(),
            });
        }

        let query_norm = norm(query);
        let mut scored: Vec<(usize, f32)> = self
            .records
            .par_iter()
            .enumerate()
            .map(|(position, record)| (position, cosine(query, query_norm, &record.vector)))
            .collect();

        scored.sort_by(|a, b| match b.1.total_cmp(&a.1) {
            Ordering::Equal => a.0.cmp(&b.0),
            other => other,
        });

        Ok(scored
            .into_iter()
            .take(k)
            .map(|(position, score)| SearchHit {
                position,
                score,
                record: self.records[position].clone(),
            })
            .collect())
    }
}

fn norm(v: &[f32]) -> f32 {
    v.iter().map(|x| x * x).sum::<f32>().sqrt()
}

/// Zero-norm on either side scores 0 rather than NaN.
fn cosine(query: &[f32], query_norm: f32, candidate: &[f32]) -> f32 {
    let candidate_norm = norm(candidate);
    if query_norm == 0.0 || candidate_norm == 0.0 {
        return 0.0;
    }
    let dot: f32 = query.iter().zip(candidate).map(|(a, b)| a * b).sum();
    dot / (query_norm * candidate_norm)
}
