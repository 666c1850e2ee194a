use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use jarvis_core::DocumentUnit;

use super::{
    extension_of, CsvLoader, DocumentLoader, EmailLoader, EpubLoader, ExtractionError,
    HtmlLoader, MarkdownLoader, OfficeFormat, OfficeLoader, PdfLoader, TextLoader,
};

/// Extension → loader mapping, fixed at construction.
#[derive(Clone)]
pub struct LoaderRegistry {
    loaders: BTreeMap<String, Arc<dyn DocumentLoader>>,
}

impl Default for LoaderRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register("txt", TextLoader::strict());
        registry.register("md", MarkdownLoader);
        registry.register("csv", CsvLoader::default());
        registry.register("html", HtmlLoader);
        registry.register("htm", HtmlLoader);
        registry.register("eml", EmailLoader);
        registry.register("pdf", PdfLoader);
        registry.register("docx", OfficeLoader::new(OfficeFormat::Docx));
        registry.register("odt", OfficeLoader::new(OfficeFormat::Odt));
        registry.register("pptx", OfficeLoader::new(OfficeFormat::Pptx));
        registry.register("epub", EpubLoader);
        registry
    }
}

impl LoaderRegistry {
    pub fn empty() -> Self {
        Self {
            loaders: BTreeMap::new(),
        }
    }

    /// Map `ext` (with or without the leading dot, any case) to `loader`,
    /// replacing a previous registration.
    pub fn register(&mut self, ext: &str, loader: impl DocumentLoader + 'static) {
        let key = ext.trim_start_matches('.').to_lowercase();
        self.loaders.insert(key, Arc::new(loader));
    }

    pub fn loader_for(&self, ext: &str) -> Option<&Arc<dyn DocumentLoader>> {
        self.loaders.get(&ext.trim_start_matches('.').to_lowercase())
    }

    pub fn supports(&self, path: &Path) -> bool {
        self.loaders.contains_key(&extension_of(path))
    }

    /// Registered extensions in sorted order.
    pub fn extensions(&self) -> Vec<&str> {
        self.loaders.keys().map(String::as_str).collect()
    }

    /// Resolve the loader for `path` by extension and run it.
    pub fn load_single_document(&self, path: &Path) -> Result<Vec<DocumentUnit>, ExtractionError> {
        let ext = extension_of(path);
        let loader = self
            .loaders
            .get(&ext)
            .ok_or_else(|| ExtractionError::UnsupportedFormat(format!(".{ext}")))?;
        let units = loader.load(path)?;
        tracing::debug!(
            path = %path.display(),
            loader = loader.name(),
            units = units.len(),
            "document loaded"
        );
        Ok(units)
    }
}

impl std::fmt::Debug for LoaderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoaderRegistry")
            .field("extensions", &self.extensions())
            .finish()
    }
}
