use jarvis_core::DocumentUnit;

use super::{DocumentLoader, ExtractionError};

pub const ROW_KEY: &str = "row";

/// One unit per CSV record, rendered as `header: value` lines.
#[derive(Debug, Clone)]
pub struct CsvLoader {
    pub delimiter: u8,
}

impl Default for CsvLoader {
    fn default() -> Self {
        Self { delimiter: b',' }
    }
}

impl DocumentLoader for CsvLoader {
    fn name(&self) -> &'static str {
        "csv"
    }

    fn load_bytes(&self, bytes: &[u8], source: &str) -> Result<Vec<DocumentUnit>, ExtractionError> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(self.delimiter)
            .flexible(true)
            .from_reader(bytes);
        let headers = reader.headers()?.clone();

        let mut units = Vec::new();
        for (row, record) in reader.records().enumerate() {
            let record = record?;
            let text = record
                .iter()
                .enumerate()
                .map(|(i, value)| {
                    let header = headers.get(i).unwrap_or("");
                    format!("{}: {}", header.trim(), value.trim())
                })
                .collect::<Vec<_>>()
                .join("\n");
            units.push(DocumentUnit::new(text, source).with_meta(ROW_KEY, row));
        }
        Ok(units)
    }
}
