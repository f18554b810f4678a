use crate::error::{ErrorKind, Result};
use crate::strategy::{FolderProcessor, PdfProcessor, TextProcessor, YamlProcessor};
use crate::{FileCategory, ProcessorHandle};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Maps each [`FileCategory`] to the strategy that handles it.
///
/// Registering a category twice replaces the earlier strategy. Lookups for a
/// category with nothing registered fail with
/// [`Unregistered`](ErrorKind::Unregistered) rather than falling back.
#[derive(Clone, Default)]
pub struct ProcessorRegistry {
    processors: HashMap<FileCategory, ProcessorHandle>,
}

impl ProcessorRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with the built-in strategy for every category.
    pub fn with_defaults() -> Self {
        let pdf: ProcessorHandle = Arc::new(PdfProcessor::default());
        Self::new()
            .with(FileCategory::PlainText, Arc::new(TextProcessor::default()))
            .with(FileCategory::PdfDocument, pdf.clone())
            .with(FileCategory::YamlDocument, Arc::new(YamlProcessor))
            .with(FileCategory::PdfFolder, Arc::new(FolderProcessor::new(pdf, "pdf")))
    }

    pub fn register(&mut self, category: FileCategory, processor: ProcessorHandle) -> Option<ProcessorHandle> {
        self.processors.insert(category, processor)
    }

    #[must_use]
    pub fn with(mut self, category: FileCategory, processor: ProcessorHandle) -> Self {
        self.register(category, processor);
        self
    }

    pub fn get(&self, category: FileCategory) -> Result<ProcessorHandle> {
        match self.processors.get(&category) {
            Some(processor) => Ok(Arc::clone(processor)),
            None => exn::bail!(ErrorKind::Unregistered(category)),
        }
    }

    /// Dispatch `path` to the strategy registered for `category`.
    pub fn process(&self, category: FileCategory, path: &Path) -> Result<PathBuf> {
        let processor = self.get(category)?;
        tracing::debug!(%category, processor = processor.name(), path = %path.display(), "Dispatching to processor");
        processor.process(path)
    }
}

impl fmt::Debug for ProcessorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for (category, processor) in &self.processors {
            map.entry(category, &processor.name());
        }
        map.finish()
    }
}
