use jarvis_core::DocumentUnit;

use super::txt::decode_utf8;
use super::{DocumentLoader, ExtractionError};

pub const TITLE_KEY: &str = "title";

/// Markdown kept as source text; the first heading becomes `title`.
#[derive(Debug, Clone, Default)]
pub struct MarkdownLoader;

impl DocumentLoader for MarkdownLoader {
    fn name(&self) -> &'static str {
        "markdown"
    }

    fn load_bytes(&self, bytes: &[u8], source: &str) -> Result<Vec<DocumentUnit>, ExtractionError> {
        let text = decode_utf8(bytes, false)?;
        let title = first_heading(&text);
        let mut unit = DocumentUnit::new(text, source);
        if let Some(title) = title {
            unit = unit.with_meta(TITLE_KEY, title);
        }
        Ok(vec![unit])
    }
}

fn first_heading(text: &str) -> Option<String> {
    text.lines()
        .map(str::trim_start)
        .filter(|line| line.starts_with('#'))
        .map(|line| line.trim_start_matches('#').trim().to_string())
        .find(|heading| !heading.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use jarvis_core::FieldValue;

    #[test]
    fn first_heading_is_title() {
        let content = b"Intro line\n\n# Title\n\nSome text.\n\n## Section 1\n\nMore text.";
        let units = MarkdownLoader.load_bytes(content, "a.md").unwrap();
        assert_eq!(units.len(), 1);
        assert_eq!(units[0].metadata.get(TITLE_KEY), Some(&FieldValue::from("Title")));
    }

    #[test]
    fn preserves_full_content() {
        let content = b"# Hello\n\nParagraph one.\n\n## World\n\nParagraph two.";
        let units = MarkdownLoader.load_bytes(content, "a.md").unwrap();
        assert!(units[0].text.contains("Paragraph one."));
        assert!(units[0].text.contains("## World"));
    }

    #[test]
    fn no_headings_no_title() {
        let units = MarkdownLoader
            .load_bytes(b"Just plain text without any headings.", "a.md")
            .unwrap();
        assert!(!units[0].metadata.contains_key(TITLE_KEY));
    }

    #[test]
    fn empty_heading_is_skipped() {
        assert_eq!(first_heading("#\n## Real"), Some("Real".to_string()));
    }
}
