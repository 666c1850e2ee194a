/// Integration tests for the vector store covering persistence, reopening,
/// tie ordering, and the empty-store fallback.

use std::path::PathBuf;

use jarvis_core::{DocumentUnit, FieldValue, PAGE_KEY, SOURCE_KEY};
use jarvis_store::{snapshot_path, EmbeddingRecord, ModelFingerprint, StoreError, VectorStore};

// ============================================================================
// Test Helpers
// ============================================================================

fn store_path(dir: &tempfile::TempDir) -> PathBuf {
    dir.path().join("db").join("vectors")
}

fn make_record(source: &str, page: usize, text: &str, vector: Vec<f32>) -> EmbeddingRecord {
    let unit = DocumentUnit::new(text, source).with_meta(PAGE_KEY, page);
    EmbeddingRecord::new(vector, unit.metadata, text)
}

fn fingerprint(dims: usize) -> ModelFingerprint {
    ModelFingerprint::new("test", "hash-embed", dims)
}

// ============================================================================
// Persistence
// ============================================================================

#[test]
fn build_then_open_returns_same_records() {
    let dir = tempfile::tempdir().unwrap();
    let path = store_path(&dir);
    let records = vec![
        make_record("a.pdf", 1, "alpha", vec![1.0, 0.0, 0.0]),
        make_record("a.pdf", 2, "beta", vec![0.0, 1.0, 0.0]),
        make_record("b.txt", 1, "gamma", vec![0.0, 0.0, 1.0]),
    ];

    let built = VectorStore::build(&path, fingerprint(3), records.clone()).unwrap();
    assert_eq!(built.len(), 3);
    assert!(snapshot_path(&path).exists());

    let opened = VectorStore::open(&path).unwrap();
    assert!(opened.is_available());
    assert_eq!(opened.records(), records.as_slice());
    assert_eq!(opened.fingerprint(), Some(&fingerprint(3)));

    let hits = opened.search(&[0.0, 1.0, 0.0], 1).unwrap();
    assert_eq!(hits[0].record.chunk_text, "beta");
    assert_eq!(
        hits[0].record.metadata.get(SOURCE_KEY),
        Some(&FieldValue::from("a.pdf"))
    );
    assert_eq!(hits[0].record.metadata.get(PAGE_KEY), Some(&FieldValue::Integer(2)));
}

#[test]
fn open_missing_store_is_empty_not_error() {
    let dir = tempfile::tempdir().unwrap();
    let store = VectorStore::open(&store_path(&dir)).unwrap();
    assert!(!store.is_available());
    assert!(store.is_empty());
    assert!(store.search(&[1.0], 5).unwrap().is_empty());
}

#[test]
fn rebuild_replaces_previous_corpus() {
    let dir = tempfile::tempdir().unwrap();
    let path = store_path(&dir);

    VectorStore::build(
        &path,
        fingerprint(2),
        vec![make_record("old.txt", 1, "old", vec![1.0, 0.0])],
    )
    .unwrap();
    VectorStore::build(
        &path,
        fingerprint(2),
        vec![
            make_record("new.txt", 1, "new one", vec![1.0, 0.0]),
            make_record("new.txt", 1, "new two", vec![0.0, 1.0]),
        ],
    )
    .unwrap();

    let store = VectorStore::open(&path).unwrap();
    let texts: Vec<_> = store.records().iter().map(|r| r.chunk_text.as_str()).collect();
    assert_eq!(texts, vec!["new one", "new two"]);
}

#[test]
fn build_rejects_mixed_dimensions_and_leaves_old_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    let path = store_path(&dir);
    VectorStore::build(
        &path,
        fingerprint(2),
        vec![make_record("keep.txt", 1, "keep", vec![1.0, 0.0])],
    )
    .unwrap();

    let err = VectorStore::build(
        &path,
        fingerprint(2),
        vec![
            make_record("x.txt", 1, "ok", vec![1.0, 0.0]),
            make_record("x.txt", 1, "bad", vec![1.0, 0.0, 0.0]),
        ],
    )
    .unwrap_err();
    assert!(matches!(err, StoreError::DimensionMismatch { position: 1, .. }));

    let store = VectorStore::open(&path).unwrap();
    assert_eq!(store.records()[0].chunk_text, "keep");
}

// ============================================================================
// Search ordering
// ============================================================================

#[test]
fn equal_scores_keep_insertion_order() {
    let records = (0..5)
        .map(|i| make_record("same.txt", 1, &format!("chunk {i}"), vec![1.0, 1.0]))
        .collect();
    let store = VectorStore::from_records(fingerprint(2), records).unwrap();

    let hits = store.search(&[2.0, 2.0], 3).unwrap();
    let positions: Vec<_> = hits.iter().map(|h| h.position).collect();
    assert_eq!(positions, vec![0, 1, 2]);
}

#[test]
fn scores_are_non_increasing() {
    let records = vec![
        make_record("s.txt", 1, "a", vec![0.1, 0.9]),
        make_record("s.txt", 1, "b", vec![0.9, 0.1]),
        make_record("s.txt", 1, "c", vec![0.5, 0.5]),
        make_record("s.txt", 1, "d", vec![-1.0, 0.0]),
    ];
    let store = VectorStore::from_records(fingerprint(2), records).unwrap();

    let hits = store.search(&[1.0, 0.0], 4).unwrap();
    assert!(hits.windows(2).all(|w| w[0].score >= w[1].score));
    assert_eq!(hits.last().unwrap().record.chunk_text, "d");
}
