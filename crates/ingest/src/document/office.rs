use std::io::{Cursor, Read};

use jarvis_core::{DocumentUnit, PAGE_KEY};
use zip::ZipArchive;

use super::xml::{xml_to_text, TextRules};
use super::{DocumentLoader, ExtractionError};

const WORD_RULES: TextRules = TextRules {
    paragraph: &["w:p"],
    line_break: &["w:br", "w:cr"],
    tab: &["w:tab"],
    space: &[],
};

const ODF_RULES: TextRules = TextRules {
    paragraph: &["text:p", "text:h"],
    line_break: &["text:line-break"],
    tab: &["text:tab"],
    space: &["text:s"],
};

const SLIDE_RULES: TextRules = TextRules {
    paragraph: &["a:p"],
    line_break: &["a:br"],
    tab: &[],
    space: &[],
};

/// Zipped XML office formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OfficeFormat {
    /// Word 2007+ (`word/document.xml`).
    Docx,
    /// OpenDocument text (`content.xml`).
    Odt,
    /// PowerPoint 2007+, one unit per slide.
    Pptx,
}

#[derive(Debug, Clone)]
pub struct OfficeLoader {
    pub format: OfficeFormat,
}

impl OfficeLoader {
    pub fn new(format: OfficeFormat) -> Self {
        Self { format }
    }
}

impl DocumentLoader for OfficeLoader {
    fn name(&self) -> &'static str {
        match self.format {
            OfficeFormat::Docx => "docx",
            OfficeFormat::Odt => "odt",
            OfficeFormat::Pptx => "pptx",
        }
    }

    fn load_bytes(&self, bytes: &[u8], source: &str) -> Result<Vec<DocumentUnit>, ExtractionError> {
        let mut archive = ZipArchive::new(Cursor::new(bytes))?;
        match self.format {
            OfficeFormat::Docx => {
                let xml = read_entry(&mut archive, "word/document.xml")?;
                Ok(vec![DocumentUnit::new(xml_to_text(&xml, &WORD_RULES), source)])
            }
            OfficeFormat::Odt => {
                let xml = read_entry(&mut archive, "content.xml")?;
                Ok(vec![DocumentUnit::new(xml_to_text(&xml, &ODF_RULES), source)])
            }
            OfficeFormat::Pptx => load_slides(&mut archive, source),
        }
    }
}

fn load_slides(
    archive: &mut ZipArchive<Cursor<&[u8]>>,
    source: &str,
) -> Result<Vec<DocumentUnit>, ExtractionError> {
    let mut slides: Vec<(usize, String)> = archive
        .file_names()
        .filter_map(|name| slide_number(name).map(|n| (n, name.to_string())))
        .collect();
    if slides.is_empty() {
        return Err(ExtractionError::Malformed("presentation has no slides".into()));
    }
    slides.sort_by_key(|(n, _)| *n);

    let mut units = Vec::new();
    for (number, name) in slides {
        let xml = read_entry(archive, &name)?;
        let text = xml_to_text(&xml, &SLIDE_RULES);
        if text.trim().is_empty() {
            continue;
        }
        units.push(DocumentUnit::new(text, source).with_meta(PAGE_KEY, number));
    }
    Ok(units)
}

/// `ppt/slides/slide12.xml` → 12
fn slide_number(name: &str) -> Option<usize> {
    name.strip_prefix("ppt/slides/slide")?
        .strip_suffix(".xml")?
        .parse()
        .ok()
}

pub(crate) fn read_entry(
    archive: &mut ZipArchive<Cursor<&[u8]>>,
    name: &str,
) -> Result<String, ExtractionError> {
    let mut file = archive
        .by_name(name)
        .map_err(|_| ExtractionError::Malformed(format!("missing archive entry {name}")))?;
    let mut xml = String::new();
    file.read_to_string(&mut xml)
        .map_err(|e| ExtractionError::Decode(format!("{name}: {e}")))?;
    Ok(xml)
}
