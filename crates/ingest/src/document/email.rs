use jarvis_core::DocumentUnit;
use mail_parser::MessageParser;

use super::html::html_to_text;
use super::{DocumentLoader, ExtractionError};

pub const SUBJECT_KEY: &str = "subject";
pub const FROM_KEY: &str = "from";
pub const DATE_KEY: &str = "date";

/// RFC 5322 message (`.eml`). The first text body part is the unit text,
/// falling back to the first HTML part rendered as text.
#[derive(Debug, Clone, Default)]
pub struct EmailLoader;

impl DocumentLoader for EmailLoader {
    fn name(&self) -> &'static str {
        "email"
    }

    fn load_bytes(&self, bytes: &[u8], source: &str) -> Result<Vec<DocumentUnit>, ExtractionError> {
        let message = MessageParser::default()
            .parse(bytes)
            .ok_or_else(|| ExtractionError::Email("not an RFC 5322 message".into()))?;

        let body = message
            .body_text(0)
            .map(|text| text.into_owned())
            .or_else(|| message.body_html(0).map(|html| html_to_text(&html).text))
            .unwrap_or_default();

        let mut unit = DocumentUnit::new(body, source);
        if let Some(subject) = message.subject() {
            unit = unit.with_meta(SUBJECT_KEY, subject);
        }
        if let Some(addr) = message.from().and_then(|a| a.first()) {
            let from = match (addr.name(), addr.address()) {
                (Some(name), Some(address)) => format!("{name} <{address}>"),
                (None, Some(address)) => address.to_string(),
                (Some(name), None) => name.to_string(),
                (None, None) => String::new(),
            };
            if !from.is_empty() {
                unit = unit.with_meta(FROM_KEY, from);
            }
        }
        if let Some(date) = message.date() {
            unit = unit.with_meta(DATE_KEY, date.to_rfc3339());
        }
        Ok(vec![unit])
    }
}
