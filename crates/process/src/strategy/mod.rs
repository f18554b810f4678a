//! The built-in processing strategies.
//!
//! | category       | strategy              | output                               |
//! |----------------|-----------------------|--------------------------------------|
//! | `txt`          | [`TextProcessor`]     | transformed text, `processed_` file  |
//! | `pdf`          | [`PdfProcessor`]      | transformed bytes, `processed_` file |
//! | `yaml`         | [`YamlProcessor`]     | unchanged copy, `processed_` file    |
//! | `pdf-folder`   | [`FolderProcessor`]   | one output per member; folder path   |

mod folder;
mod pdf;
mod text;
mod yaml;

pub use self::folder::FolderProcessor;
pub use self::pdf::PdfProcessor;
pub use self::text::TextProcessor;
pub use self::yaml::YamlProcessor;
use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use std::path::Path;

fn read_bytes(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).or_raise(|| ErrorKind::Read(path.to_path_buf()))
}

fn read_text(path: &Path) -> Result<String> {
    String::from_utf8(read_bytes(path)?).or_raise(|| ErrorKind::InvalidContent {
        path: path.to_path_buf(),
        reason: "not valid UTF-8".to_string(),
    })
}
