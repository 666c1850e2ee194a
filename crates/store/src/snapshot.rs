//! On-disk snapshot format.
//!
//! A snapshot is a single file `<store_path>.snapshot` holding a
//! zstd-compressed, field-named MessagePack document:
//!
//! ```text
//! { header, vectors: [[f32]], metadata: [Metadata], documents: [String] }
//! ```
//!
//! The three collections are aligned: position `i` in each describes the
//! same chunk. Writes go to a hidden `.tmp` sibling first and are renamed
//! into place, so readers never observe a half-written snapshot.

use std::ffi::OsString;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use jarvis_core::Metadata;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::StoreError;
use crate::fingerprint::ModelFingerprint;
use crate::record::EmbeddingRecord;

/// Extension appended to the configured store path.
pub const SNAPSHOT_EXTENSION: &str = "snapshot";

/// Current on-disk layout version.
pub const FORMAT_VERSION: u32 = 1;

const ZSTD_LEVEL: i32 = 3;

/// Resolve `<store_path>.snapshot`, keeping any dots already in the name.
pub fn snapshot_path(store_path: &Path) -> PathBuf {
    let mut name = OsString::from(store_path.as_os_str());
    name.push(".");
    name.push(SNAPSHOT_EXTENSION);
    PathBuf::from(name)
}

/// Self-describing header stored in front of the collections.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotHeader {
    pub format_version: u32,
    pub fingerprint: ModelFingerprint,
    pub created_at: DateTime<Utc>,
    pub record_count: usize,
}

#[derive(Serialize)]
struct SnapshotRef<'a> {
    header: &'a SnapshotHeader,
    vectors: Vec<&'a [f32]>,
    metadata: Vec<&'a Metadata>,
    documents: Vec<&'a str>,
}

/// A fully decoded snapshot.
#[derive(Debug, Clone, Deserialize)]
pub struct Snapshot {
    pub header: SnapshotHeader,
    pub vectors: Vec<Vec<f32>>,
    pub metadata: Vec<Metadata>,
    pub documents: Vec<String>,
}

impl Snapshot {
    /// Write `records` as the complete snapshot for `store_path`, replacing
    /// any previous one. Returns the header that was written.
    pub fn write(
        store_path: &Path,
        fingerprint: &ModelFingerprint,
        records: &[EmbeddingRecord],
    ) -> Result<SnapshotHeader, StoreError> {
        validate_records(fingerprint, records)?;

        let header = SnapshotHeader {
            format_version: FORMAT_VERSION,
            fingerprint: fingerprint.clone(),
            created_at: Utc::now(),
            record_count: records.len(),
        };
        let body = SnapshotRef {
            header: &header,
            vectors: records.iter().map(|r| r.vector.as_slice()).collect(),
            metadata: records.iter().map(|r| &r.metadata).collect(),
            documents: records.iter().map(|r| r.chunk_text.as_str()).collect(),
        };

        let encoded =
            rmp_serde::to_vec_named(&body).map_err(|e| StoreError::Serialize(e.to_string()))?;
        let compressed = zstd::encode_all(encoded.as_slice(), ZSTD_LEVEL)?;

        let final_path = snapshot_path(store_path);
        let tmp_path = temp_path_for(&final_path);
        if let Some(parent) = final_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let result = (|| -> Result<(), StoreError> {
            let mut file = fs::File::create(&tmp_path)?;
            file.write_all(&compressed)?;
            file.sync_all()?;
            fs::rename(&tmp_path, &final_path)?;
            Ok(())
        })();
        if result.is_err() {
            let _ = fs::remove_file(&tmp_path);
        }
        result?;

        info!(
            path = %final_path.display(),
            records = header.record_count,
            raw_bytes = encoded.len(),
            bytes = compressed.len(),
            "snapshot written"
        );
        Ok(header)
    }

    /// Read the snapshot for `store_path`. `Ok(None)` when no snapshot exists.
    pub fn read(store_path: &Path) -> Result<Option<Self>, StoreError> {
        let path = snapshot_path(store_path);
        if !path.exists() {
            return Ok(None);
        }

        let compressed = fs::read(&path)?;
        let corrupt = |reason: String| StoreError::Corrupt {
            path: path.display().to_string(),
            reason,
        };

        let encoded = zstd::decode_all(compressed.as_slice())
            .map_err(|e| corrupt(format!("zstd: {e}")))?;
        let snapshot: Snapshot = rmp_serde::from_slice(&encoded)
            .map_err(|e| corrupt(format!("msgpack: {e}")))?;

        if snapshot.header.format_version != FORMAT_VERSION {
            return Err(StoreError::UnsupportedVersion(snapshot.header.format_version));
        }

        let n = snapshot.header.record_count;
        if snapshot.vectors.len() != n || snapshot.metadata.len() != n || snapshot.documents.len() != n
        {
            return Err(corrupt(format!(
                "collections not aligned: header says {n}, got {} vectors, {} metadata, {} documents",
                snapshot.vectors.len(),
                snapshot.metadata.len(),
                snapshot.documents.len()
            )));
        }

        let dims = snapshot.header.fingerprint.dimensions;
        if let Some((position, v)) = snapshot
            .vectors
            .iter()
            .enumerate()
            .find(|(_, v)| v.len() != dims)
        {
            return Err(StoreError::DimensionMismatch {
                position,
                expected: dims,
                actual: v.len(),
            });
        }

        Ok(Some(snapshot))
    }

    /// Re-zip the aligned collections into records.
    pub fn into_records(self) -> (SnapshotHeader, Vec<EmbeddingRecord>) {
        let records = self
            .vectors
            .into_iter()
            .zip(self.metadata)
            .zip(self.documents)
            .map(|((vector, metadata), chunk_text)| EmbeddingRecord {
                vector,
                metadata,
                chunk_text,
            })
            .collect();
        (self.header, records)
    }
}

/// Reject empty input and vectors whose length disagrees with the fingerprint.
pub(crate) fn validate_records(
    fingerprint: &ModelFingerprint,
    records: &[EmbeddingRecord],
) -> Result<(), StoreError> {
    if records.is_empty() {
        return Err(StoreError::Empty);
    }
    for (position, record) in records.iter().enumerate() {
        if record.vector.len() != fingerprint.dimensions {
            return Err(StoreError::DimensionMismatch {
                position,
                expected: fingerprint.dimensions,
                actual: record.vector.len(),
            });
        }
    }
    Ok(())
}

fn temp_path_for(final_path: &Path) -> PathBuf {
    let name = final_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| SNAPSHOT_EXTENSION.to_string());
    final_path.with_file_name(format!(".{name}.tmp"))
}
