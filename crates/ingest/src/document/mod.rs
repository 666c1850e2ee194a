pub mod chunker;
mod csv;
mod email;
mod epub;
mod html;
mod md;
mod office;
mod pdf;
mod registry;
mod txt;
mod xml;

use std::path::Path;

use jarvis_core::DocumentUnit;
use thiserror::Error;

pub use self::csv::CsvLoader;
pub use email::EmailLoader;
pub use epub::EpubLoader;
pub use html::HtmlLoader;
pub use md::MarkdownLoader;
pub use office::{OfficeFormat, OfficeLoader};
pub use pdf::PdfLoader;
pub use registry::LoaderRegistry;
pub use txt::TextLoader;

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("Unsupported file extension '{0}'")]
    UnsupportedFormat(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("decode failed: {0}")]
    Decode(String),
    #[error("PDF extraction failed: {0}")]
    Pdf(String),
    #[error("CSV error: {0}")]
    Csv(#[from] ::csv::Error),
    #[error("archive error: {0}")]
    Archive(String),
    #[error("email parse failed: {0}")]
    Email(String),
    #[error("malformed document: {0}")]
    Malformed(String),
    #[error("loader task failed: {0}")]
    Task(String),
}

impl From<zip::result::ZipError> for ExtractionError {
    fn from(err: zip::result::ZipError) -> Self {
        ExtractionError::Archive(err.to_string())
    }
}

/// A file-format strategy: raw bytes in, Document Units out.
///
/// Implementations are stateless apart from construction-time options and
/// must not touch the filesystem beyond what [`DocumentLoader::load`] reads.
pub trait DocumentLoader: Send + Sync {
    /// Short name for logs, e.g. "pdf".
    fn name(&self) -> &'static str;

    /// Parse `bytes`. `source` is recorded verbatim as the `source` metadata
    /// of every unit produced.
    fn load_bytes(&self, bytes: &[u8], source: &str) -> Result<Vec<DocumentUnit>, ExtractionError>;

    fn load(&self, path: &Path) -> Result<Vec<DocumentUnit>, ExtractionError> {
        let bytes = std::fs::read(path)?;
        self.load_bytes(&bytes, &path.to_string_lossy())
    }
}

/// Lowercased extension without the dot, or "" when there is none.
pub fn extension_of(path: &Path) -> String {
    path.extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default()
}
