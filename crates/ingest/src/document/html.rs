use jarvis_core::DocumentUnit;
use scraper::{Html, Node};

use super::md::TITLE_KEY;
use super::txt::decode_utf8;
use super::{DocumentLoader, ExtractionError};

const SKIPPED: &[&str] = &["script", "style", "noscript", "template", "head"];

const BLOCKS: &[&str] = &[
    "p", "div", "section", "article", "main", "header", "footer", "aside", "nav", "h1", "h2",
    "h3", "h4", "h5", "h6", "li", "ul", "ol", "dl", "dt", "dd", "tr", "table", "blockquote",
    "pre", "br", "hr", "figure", "figcaption", "body", "html",
];

/// Visible text of an HTML page; `<title>` becomes `title`.
#[derive(Debug, Clone, Default)]
pub struct HtmlLoader;

impl DocumentLoader for HtmlLoader {
    fn name(&self) -> &'static str {
        "html"
    }

    fn load_bytes(&self, bytes: &[u8], source: &str) -> Result<Vec<DocumentUnit>, ExtractionError> {
        let raw = decode_utf8(bytes, false)?;
        let page = html_to_text(&raw);
        let mut unit = DocumentUnit::new(page.text, source);
        if let Some(title) = page.title {
            unit = unit.with_meta(TITLE_KEY, title);
        }
        Ok(vec![unit])
    }
}

pub(crate) struct HtmlText {
    pub title: Option<String>,
    pub text: String,
}

/// Walk the DOM collecting text nodes outside script/style, starting a new
/// line whenever the enclosing block element changes.
pub(crate) fn html_to_text(raw: &str) -> HtmlText {
    let document = Html::parse_document(raw);
    let mut title = None;
    let mut lines: Vec<String> = Vec::new();
    let mut current_block = None;

    for node in document.tree.root().descendants() {
        let Node::Text(text) = node.value() else {
            continue;
        };

        let mut block = None;
        let mut skipped = false;
        let mut in_title = false;
        for ancestor in node.ancestors() {
            if let Node::Element(element) = ancestor.value() {
                let name = element.name();
                if name == "title" {
                    in_title = true;
                }
                if SKIPPED.contains(&name) {
                    skipped = true;
                }
                if block.is_none() && BLOCKS.contains(&name) {
                    block = Some(ancestor.id());
                }
            }
        }

        let piece = collapse_whitespace(text);
        if piece.is_empty() {
            continue;
        }
        if in_title {
            if title.is_none() {
                title = Some(piece);
            }
            continue;
        }
        if skipped {
            continue;
        }

        match lines.last_mut() {
            Some(last) if block == current_block => {
                last.push(' ');
                last.push_str(&piece);
            }
            _ => lines.push(piece),
        }
        current_block = block;
    }

    HtmlText {
        title,
        text: lines.join("\n"),
    }
}

fn collapse_whitespace(input: &str) -> String {
    input.split_whitespace().collect::<Vec<_>>().join(" ")
}
