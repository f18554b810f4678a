use crate::error::{ErrorKind, Result};
use crate::strategy::read_bytes;
use crate::{Processor, output_path, write_atomic};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::instrument;

/// Every PDF starts with this (followed by the version, e.g. `1.7`).
const PDF_SIGNATURE: &[u8] = b"%PDF-";

type Transform = Box<dyn Fn(&[u8]) -> Vec<u8> + Send + Sync>;

/// PDF document strategy.
///
/// Verifies the PDF signature, applies a byte transformation and writes the
/// result to a `processed_` sibling. The default transformation is the
/// identity; content-aware transformations plug in via [`new()`](Self::new).
pub struct PdfProcessor {
    transform: Transform,
}

impl PdfProcessor {
    pub fn new(transform: impl Fn(&[u8]) -> Vec<u8> + Send + Sync + 'static) -> Self {
        Self {
            transform: Box::new(transform),
        }
    }

    pub fn passthrough() -> Self {
        Self::new(<[u8]>::to_vec)
    }
}

impl Default for PdfProcessor {
    fn default() -> Self {
        Self::passthrough()
    }
}

impl Processor for PdfProcessor {
    fn name(&self) -> &str {
        "pdf"
    }

    #[instrument(skip(self))]
    fn process(&self, path: &Path) -> Result<PathBuf> {
        let document = read_bytes(path)?;
        if !document.starts_with(PDF_SIGNATURE) {
            exn::bail!(ErrorKind::InvalidContent {
                path: path.to_path_buf(),
                reason: "missing %PDF- signature".to_string(),
            });
        }
        let transformed = (self.transform)(&document);
        let output = output_path(path)?;
        write_atomic(&output, |f| f.write_all(&transformed))?;
        Ok(output)
    }
}
