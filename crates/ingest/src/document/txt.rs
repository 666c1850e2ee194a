use jarvis_core::DocumentUnit;

use super::{DocumentLoader, ExtractionError};

/// Whole-file plain text.
#[derive(Debug, Clone)]
pub struct TextLoader {
    /// Reject invalid UTF-8 instead of replacing bad sequences.
    pub strict_utf8: bool,
}

impl TextLoader {
    pub fn strict() -> Self {
        Self { strict_utf8: true }
    }

    pub fn lossy() -> Self {
        Self { strict_utf8: false }
    }
}

impl DocumentLoader for TextLoader {
    fn name(&self) -> &'static str {
        "text"
    }

    fn load_bytes(&self, bytes: &[u8], source: &str) -> Result<Vec<DocumentUnit>, ExtractionError> {
        let text = decode_utf8(bytes, self.strict_utf8)?;
        Ok(vec![DocumentUnit::new(text, source)])
    }
}

/// Decode UTF-8, dropping a leading BOM.
pub(crate) fn decode_utf8(bytes: &[u8], strict: bool) -> Result<String, ExtractionError> {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    if strict {
        String::from_utf8(bytes.to_vec()).map_err(|e| ExtractionError::Decode(e.to_string()))
    } else {
        Ok(String::from_utf8_lossy(bytes).into_owned())
    }
}
