//! Cut-point search over a character window.

/// Separator tiers, coarsest first. Within a tier the latest match wins.
pub(crate) const SEPARATOR_TIERS: &[&[&str]] = &[&["\n\n"], &["\n"], &[". ", "! ", "? "], &[" "]];

/// Byte offset of every char boundary in `text`, including `text.len()`.
/// `offsets[i]` is where char `i` starts.
pub(crate) fn char_boundaries(text: &str) -> Vec<usize> {
    text.char_indices()
        .map(|(byte, _)| byte)
        .chain(std::iter::once(text.len()))
        .collect()
}

/// Latest char position in `[min_end, window_end]`
/// that sits right after a separator, trying tiers in order.
/// `None` means no tier matched and the caller should hard-cut.
pub(crate) fn find_cut(
    text: &str,
    offsets: &[usize],
    start: usize,
    window_end: usize,
    min_end: usize,
) -> Option<usize> {
    let window_start_byte = offsets[start];
    let window = &text[window_start_byte..offsets[window_end]];

    for tier in SEPARATOR_TIERS {
        let best = tier
            .iter()
            .filter_map(|sep| window.rfind(sep).map(|pos| pos + sep.len()))
            .max();
        let Some(cut_byte) = best else { continue };
        let Ok(cut) = offsets.binary_search(&(window_start_byte + cut_byte)) else {
            continue;
        };
        if cut >= min_end {
            return Some(cut);
        }
    }
    None
}

/// Split one unit's text into `(char_offset, slice)` windows of at most
/// `size` chars where neighbours share exactly `overlap` chars.
pub(crate) fn split_text(text: &str, size: usize, overlap: usize) -> Vec<(usize, String)> {
    if text.trim().is_empty() {
        return Vec::new();
    }

    let offsets = char_boundaries(text);
    let total = offsets.len() - 1;
    let min_advance = (overlap + 1).max(size / 2);

    let mut pieces = Vec::new();
    let mut start = 0;
    loop {
        if total - start <= size {
            pieces.push((start, text[offsets[start]..].to_string()));
            break;
        }
        let window_end = start + size;
        let end = find_cut(text, &offsets, start, window_end, start + min_advance)
            .unwrap_or(window_end);
        pieces.push((start, text[offsets[start]..offsets[end]].to_string()));
        start = end - overlap;
    }
    pieces
}
