//! Tests for the chunking engine.

use jarvis_core::{DocumentUnit, FieldValue, PAGE_KEY};

use super::helpers::{char_boundaries, find_cut, split_text};
use super::{chunk_units, ChunkConfig, ChunkConfigError};

fn unit(text: &str) -> DocumentUnit {
    DocumentUnit::new(text, "test.txt")
}

fn config(size: usize, overlap: usize) -> ChunkConfig {
    ChunkConfig::new(size, overlap).unwrap()
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Every chunk fits and neighbours from the same unit share exactly
/// `overlap` characters at the seam.
fn assert_window_invariants(text: &str, size: usize, overlap: usize) {
    let pieces = split_text(text, size, overlap);
    let chars: Vec<char> = text.chars().collect();
    for (offset, piece) in &pieces {
        assert!(char_len(piece) <= size, "chunk of {} chars > {size}", char_len(piece));
        let expected: String = chars[*offset..*offset + char_len(piece)].iter().collect();
        assert_eq!(piece, &expected);
    }
    for pair in pieces.windows(2) {
        let (a_off, a) = &pair[0];
        let (b_off, b) = &pair[1];
        assert_eq!(*b_off, a_off + char_len(a) - overlap);
        let a_tail: String = a.chars().skip(char_len(a) - overlap).collect();
        let b_head: String = b.chars().take(overlap).collect();
        assert_eq!(a_tail, b_head);
    }
    if let Some((off, last)) = pieces.last() {
        assert_eq!(off + char_len(last), chars.len());
    }
}

// ── Config ──────────────────────────────────────────────────────────

#[test]
fn config_validation() {
    assert_eq!(ChunkConfig::new(0, 0), Err(ChunkConfigError::ZeroSize));
    assert_eq!(
        ChunkConfig::new(32, 32),
        Err(ChunkConfigError::OverlapTooLarge { size: 32, overlap: 32 })
    );
    assert!(ChunkConfig::new(10, 0).is_ok());
    let default = ChunkConfig::default();
    assert_eq!((default.chunk_size(), default.chunk_overlap()), (512, 32));
}

// ── Basic behaviour ─────────────────────────────────────────────────

#[test]
fn short_text_is_one_chunk() {
    let chunks = chunk_units(&[unit("A short note.")], &ChunkConfig::default());
    assert_eq!(chunks.len(), 1);
    assert_eq!(chunks[0].text, "A short note.");
    assert_eq!(chunks[0].char_offset, 0);
}

#[test]
fn text_exactly_chunk_size_is_one_chunk() {
    let text = "x".repeat(100);
    assert_eq!(split_text(&text, 100, 10).len(), 1);
    assert_eq!(split_text(&format!("{text}y"), 100, 10).len(), 2);
}

#[test]
fn empty_and_whitespace_units_produce_nothing() {
    let chunks = chunk_units(&[unit(""), unit("   \n\t  ")], &ChunkConfig::default());
    assert!(chunks.is_empty());
}

#[test]
fn lorem_ipsum_two_chunks() {
    let text = "lorem ipsum ".repeat(82);
    let text = text.trim();
    assert_eq!(char_len(text), 983);

    let chunks = chunk_units(&[unit(text)], &config(512, 32));
    assert_eq!(chunks.len(), 2);
    let first_end = chunks[0].char_offset + char_len(&chunks[0].text);
    assert_eq!(chunks[1].char_offset, first_end - 32);
    assert!(chunks[0].text.ends_with(' '));
    assert_window_invariants(text, 512, 32);
}

// ── Separator preference ────────────────────────────────────────────

#[test]
fn prefers_paragraph_break() {
    let text = format!("{}\n\n{}", "a".repeat(60), "b ".repeat(40));
    let pieces = split_text(&text, 100, 5);
    assert_eq!(pieces[0].1, format!("{}\n\n", "a".repeat(60)));
    assert_window_invariants(&text, 100, 5);
}

#[test]
fn falls_back_to_sentence_then_word() {
    let offsets_text = "One sentence here. Another one follows and it keeps going on";
    let offsets = char_boundaries(offsets_text);
    let cut = find_cut(offsets_text, &offsets, 0, 40, 10).unwrap();
    assert_eq!(&offsets_text[..cut], "One sentence here. ");

    let words = "alpha beta gamma delta epsilon";
    let offsets = char_boundaries(words);
    let cut = find_cut(words, &offsets, 0, 20, 5).unwrap();
    assert_eq!(&words[..cut], "alpha beta gamma ");
}

#[test]
fn early_separator_is_ignored_for_half_full_rule() {
    // The only break is far too early; hard cut at the window instead.
    let text = format!("ab\n\n{}", "z".repeat(200));
    let pieces = split_text(&text, 100, 10);
    assert_eq!(char_len(&pieces[0].1), 100);
    assert_window_invariants(&text, 100, 10);
}

#[test]
fn hard_cut_without_separators() {
    let text = "x".repeat(250);
    let pieces = split_text(&text, 100, 20);
    let offsets: Vec<usize> = pieces.iter().map(|(o, _)| *o).collect();
    assert_eq!(offsets, vec![0, 80, 160]);
    assert_window_invariants(&text, 100, 20);
}

// ── Invariants ──────────────────────────────────────────────────────

#[test]
fn invariants_hold_on_mixed_prose() {
    let paragraph = "The quick brown fox jumps over the lazy dog. It was not amused!\n\
                     Was the dog asleep? Nobody knows.\n\n";
    let text = paragraph.repeat(30);
    for (size, overlap) in [(512, 32), (100, 0), (64, 16), (37, 36), (1, 0)] {
        assert_window_invariants(&text, size, overlap);
    }
}

#[test]
fn multibyte_text_is_measured_in_chars() {
    let text = "żółć gęślą jaźń 東京 ".repeat(40);
    assert_window_invariants(&text, 50, 7);
    for (_, piece) in split_text(&text, 50, 7) {
        assert!(char_len(&piece) <= 50);
    }
}

#[test]
fn zero_overlap_chunks_tile_the_text() {
    let text = "word ".repeat(100);
    let pieces = split_text(&text, 64, 0);
    let joined: String = pieces.iter().map(|(_, p)| p.as_str()).collect();
    assert_eq!(joined, text);
}

// ── Metadata and ordering ───────────────────────────────────────────

#[test]
fn metadata_is_cloned_and_indices_are_global() {
    let a = DocumentUnit::new("x".repeat(150), "a.pdf").with_meta(PAGE_KEY, 1usize);
    let b = DocumentUnit::new("y".repeat(150), "a.pdf").with_meta(PAGE_KEY, 2usize);
    let chunks = chunk_units(&[a, b], &config(100, 10));

    assert_eq!(chunks.len(), 4);
    let indices: Vec<usize> = chunks.iter().map(|c| c.index).collect();
    assert_eq!(indices, vec![0, 1, 2, 3]);
    assert_eq!(chunks[1].metadata.get(PAGE_KEY), Some(&FieldValue::Integer(1)));
    assert_eq!(chunks[2].metadata.get(PAGE_KEY), Some(&FieldValue::Integer(2)));
    assert_eq!(chunks[2].char_offset, 0);
}

#[test]
fn chunking_is_deterministic() {
    let units = vec![unit(&"Sentence one. Sentence two.\n".repeat(50))];
    let cfg = config(120, 12);
    assert_eq!(chunk_units(&units, &cfg), chunk_units(&units, &cfg));
}
