use crate::error::Result;
use crate::strategy::read_text;
use crate::{Processor, output_path, write_atomic};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::instrument;

type Transform = Box<dyn Fn(&str) -> String + Send + Sync>;

/// Plain text strategy: reads the whole file as UTF-8, applies a pure
/// transformation and writes the result to a `processed_` sibling.
///
/// Defaults to uppercasing, which is idempotent: processing an already
/// processed file yields identical content.
///
/// # Examples
///
/// ```no_run
/// use safehold_process::{Processor, strategy::TextProcessor};
/// use std::path::Path;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let reverse = TextProcessor::new(|text| text.chars().rev().collect());
/// let output = reverse.process(Path::new("/docs/notes.txt"))?;
/// assert_eq!(output, Path::new("/docs/processed_notes.txt"));
/// # Ok(())
/// # }
/// ```
pub struct TextProcessor {
    transform: Transform,
}

impl TextProcessor {
    pub fn new(transform: impl Fn(&str) -> String + Send + Sync + 'static) -> Self {
        Self {
            transform: Box::new(transform),
        }
    }

    pub fn uppercase() -> Self {
        Self::new(str::to_uppercase)
    }
}

impl Default for TextProcessor {
    fn default() -> Self {
        Self::uppercase()
    }
}

impl Processor for TextProcessor {
    fn name(&self) -> &str {
        "text"
    }

    #[instrument(skip(self))]
    fn process(&self, path: &Path) -> Result<PathBuf> {
        let text = read_text(path)?;
        let transformed = (self.transform)(&text);
        let output = output_path(path)?;
        write_atomic(&output, |f| f.write_all(transformed.as_bytes()))?;
        tracing::debug!(output = %output.display(), bytes = transformed.len(), "Text processed");
        Ok(output)
    }
}
