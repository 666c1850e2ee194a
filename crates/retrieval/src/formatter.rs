use jarvis_core::{Metadata, PAGE_KEY, SOURCE_KEY, URL_KEY};
use jarvis_store::SearchHit;

/// `[n] Source: <source> (URL: <url>) - Page: <page>`, omitting absent parts.
pub fn format_citation(number: usize, metadata: &Metadata) -> String {
    let mut citation = format!("[{number}] ");
    if let Some(source) = metadata.get(SOURCE_KEY) {
        citation.push_str(&format!("Source: {source}"));
    }
    if let Some(url) = metadata.get(URL_KEY) {
        citation.push_str(&format!(" (URL: {url})"));
    }
    if let Some(page) = metadata.get(PAGE_KEY) {
        citation.push_str(&format!(" - Page: {page}"));
    }
    citation
}

/// Render hits (already in rank order) as `(context, citations)`.
/// Context blocks are separated by a blank line, citations by a newline.
pub fn format_citations(hits: &[SearchHit]) -> (String, String) {
    let context = hits
        .iter()
        .map(|hit| hit.record.chunk_text.as_str())
        .collect::<Vec<_>>()
        .join("\n\n");
    let citations = hits
        .iter()
        .enumerate()
        .map(|(i, hit)| format_citation(i + 1, &hit.record.metadata))
        .collect::<Vec<_>>()
        .join("\n");
    (context, citations)
}
