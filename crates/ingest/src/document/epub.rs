use std::collections::HashMap;
use std::io::Cursor;
use std::sync::OnceLock;

use jarvis_core::DocumentUnit;
use regex::Regex;
use zip::ZipArchive;

use super::html::html_to_text;
use super::md::TITLE_KEY;
use super::office::read_entry;
use super::xml::{first_capture, unescape};
use super::{DocumentLoader, ExtractionError};

struct EpubPatterns {
    rootfile: Regex,
    title: Regex,
    item: Regex,
    itemref: Regex,
    attr: Regex,
}

fn patterns() -> &'static EpubPatterns {
    static P: OnceLock<EpubPatterns> = OnceLock::new();
    P.get_or_init(|| EpubPatterns {
        rootfile: Regex::new(r#"<rootfile\b[^>]*\bfull-path\s*=\s*"([^"]+)""#).expect("rootfile regex"),
        title: Regex::new(r"<dc:title\b[^>]*>([^<]*)</dc:title>").expect("title regex"),
        item: Regex::new(r"<(?:opf:)?item\b[^>]*>").expect("item regex"),
        itemref: Regex::new(r#"<(?:opf:)?itemref\b[^>]*\bidref\s*=\s*"([^"]+)""#).expect("itemref regex"),
        attr: Regex::new(r#"\b([\w:-]+)\s*=\s*"([^"]*)""#).expect("attr regex"),
    })
}

/// EPUB book: spine documents in reading order, concatenated into one unit.
#[derive(Debug, Clone, Default)]
pub struct EpubLoader;

impl DocumentLoader for EpubLoader {
    fn name(&self) -> &'static str {
        "epub"
    }

    fn load_bytes(&self, bytes: &[u8], source: &str) -> Result<Vec<DocumentUnit>, ExtractionError> {
        let p = patterns();
        let mut archive = ZipArchive::new(Cursor::new(bytes))?;

        let container = read_entry(&mut archive, "META-INF/container.xml")?;
        let opf_path = first_capture(&p.rootfile, &container)
            .ok_or_else(|| ExtractionError::Malformed("container.xml has no rootfile".into()))?;
        let opf = read_entry(&mut archive, &opf_path)?;
        let base = opf_path.rsplit_once('/').map(|(dir, _)| dir).unwrap_or("");

        let manifest: HashMap<String, String> = p
            .item
            .find_iter(&opf)
            .filter_map(|tag| {
                let attrs: HashMap<&str, &str> = p
                    .attr
                    .captures_iter(tag.as_str())
                    .filter_map(|c| Some((c.get(1)?.as_str(), c.get(2)?.as_str())))
                    .collect();
                Some((attrs.get("id")?.to_string(), unescape(attrs.get("href")?)))
            })
            .collect();

        let mut sections = Vec::new();
        for idref in p.itemref.captures_iter(&opf).filter_map(|c| c.get(1)) {
            let Some(href) = manifest.get(idref.as_str()) else {
                tracing::debug!(idref = idref.as_str(), "spine entry missing from manifest");
                continue;
            };
            let path = resolve(base, href);
            let xhtml = read_entry(&mut archive, &path)?;
            let text = html_to_text(&xhtml).text;
            if !text.trim().is_empty() {
                sections.push(text);
            }
        }
        if sections.is_empty() {
            return Err(ExtractionError::Malformed("epub spine has no readable content".into()));
        }

        let mut unit = DocumentUnit::new(sections.join("\n\n"), source);
        if let Some(title) = first_capture(&p.title, &opf) {
            unit = unit.with_meta(TITLE_KEY, title);
        }
        Ok(vec![unit])
    }
}

/// Join a manifest href onto the OPF directory, folding `..` segments and
/// dropping any fragment.
fn resolve(base: &str, href: &str) -> String {
    let href = href.split('#').next().unwrap_or(href);
    let mut parts: Vec<&str> = base.split('/').filter(|s| !s.is_empty()).collect();
    for segment in href.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            other => parts.push(other),
        }
    }
    parts.join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::office::tests::build_zip;
    use jarvis_core::FieldValue;

    const CONTAINER: &str = r#"<?xml version="1.0"?>
<container version="1.0" xmlns="urn:oasis:names:tc:opendocument:xmlns:container">
  <rootfiles><rootfile full-path="OEBPS/content.opf" media-type="application/oebps-package+xml"/></rootfiles>
</container>"#;

    const OPF: &str = r#"<?xml version="1.0"?>
<package xmlns="http://www.idpf.org/2007/opf" version="3.0">
  <metadata><dc:title>The Handbook</dc:title></metadata>
  <manifest>
    <item id="c2" href="text/ch2.xhtml" media-type="application/xhtml+xml"/>
    <item href="text/ch1.xhtml" id="c1" media-type="application/xhtml+xml"/>
  </manifest>
  <spine><itemref idref="c1"/><itemref idref="c2"/><itemref idref="ghost"/></spine>
</package>"#;

    fn book() -> Vec<u8> {
        build_zip(&[
            ("META-INF/container.xml", CONTAINER),
            ("OEBPS/content.opf", OPF),
            ("OEBPS/text/ch1.xhtml", "<html><body><h1>Chapter One</h1><p>It begins.</p></body></html>"),
            ("OEBPS/text/ch2.xhtml", "<html><body><p>It ends.</p></body></html>"),
        ])
    }

    #[test]
    fn spine_order_and_title() {
        let units = EpubLoader.load_bytes(&book(), "h.epub").unwrap();
        assert_eq!(units.len(), 1);
        assert_eq!(units[0].text, "Chapter One\nIt begins.\n\nIt ends.");
        assert_eq!(units[0].metadata.get(TITLE_KEY), Some(&FieldValue::from("The Handbook")));
    }

    #[test]
    fn missing_container_is_malformed() {
        let bytes = build_zip(&[("mimetype", "application/epub+zip")]);
        let err = EpubLoader.load_bytes(&bytes, "x.epub").unwrap_err();
        assert!(matches!(err, ExtractionError::Malformed(_)));
    }

    #[test]
    fn resolves_relative_hrefs() {
        assert_eq!(resolve("OEBPS", "text/ch1.xhtml"), "OEBPS/text/ch1.xhtml");
        assert_eq!(resolve("OEBPS/text", "../images/a.xhtml#p3"), "OEBPS/images/a.xhtml");
        assert_eq!(resolve("", "ch.xhtml"), "ch.xhtml");
    }
}
