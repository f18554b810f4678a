use crate::error::Result;
use crate::strategy::read_text;
use crate::{Processor, output_path, write_atomic};
use std::io::Write;
use std::path::{Path, PathBuf};

/// YAML strategy.
///
/// Currently a pass-through: the document is read as UTF-8 and copied
/// unchanged to its `processed_` sibling. It exists as its own strategy so a
/// real YAML transformation can be dropped in here without the pipeline
/// noticing.
#[derive(Debug, Default, Clone, Copy)]
pub struct YamlProcessor;

impl Processor for YamlProcessor {
    fn name(&self) -> &str {
        "yaml"
    }

    fn process(&self, path: &Path) -> Result<PathBuf> {
        let document = read_text(path)?;
        let output = output_path(path)?;
        write_atomic(&output, |f| f.write_all(document.as_bytes()))?;
        Ok(output)
    }
}
