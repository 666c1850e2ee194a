use jarvis_core::{DocumentUnit, PAGE_KEY};

use super::{DocumentLoader, ExtractionError};

/// Text layer of a PDF, one unit per non-empty page. Scanned PDFs without a
/// text layer yield no units.
#[derive(Debug, Clone, Default)]
pub struct PdfLoader;

impl DocumentLoader for PdfLoader {
    fn name(&self) -> &'static str {
        "pdf"
    }

    fn load_bytes(&self, bytes: &[u8], source: &str) -> Result<Vec<DocumentUnit>, ExtractionError> {
        // pdf-extract panics on some malformed inputs; keep that per-file.
        let pages = std::panic::catch_unwind(|| pdf_extract::extract_text_from_mem_by_pages(bytes))
            .map_err(|_| ExtractionError::Pdf("parser panicked".into()))?
            .map_err(|e| ExtractionError::Pdf(e.to_string()))?;

        let pages = number_pages(pages);
        if pages.is_empty() {
            tracing::warn!(source, "PDF has no extractable text layer");
        }
        Ok(pages
            .into_iter()
            .map(|(page, text)| DocumentUnit::new(text, source).with_meta(PAGE_KEY, page))
            .collect())
    }
}

/// (1-based page, text) for every page with visible text. Blank pages still
/// count towards the numbering.
fn number_pages(pages: Vec<String>) -> Vec<(usize, String)> {
    pages
        .into_iter()
        .enumerate()
        .filter(|(_, page)| !page.trim().is_empty())
        .map(|(i, page)| (i + 1, page.trim().to_string()))
        .collect()
}
