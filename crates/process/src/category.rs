use crate::error::{Error, ErrorKind};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::path::Path;
use std::str::FromStr;

/// What kind of selection a pipeline run processes.
///
/// Chosen once by the caller before a run starts. Each category also
/// describes what the file picker should offer: a single file with one of
/// [`extensions()`](Self::extensions), or a directory.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FileCategory {
    /// Plain text (.txt)
    #[default]
    #[serde(alias = "txt")]
    PlainText,
    /// A single PDF document (.pdf)
    #[serde(alias = "pdf")]
    PdfDocument,
    /// A single YAML document (.yaml, .yml)
    #[serde(alias = "yaml")]
    YamlDocument,
    /// A directory of PDF documents
    PdfFolder,
}

impl FileCategory {
    pub const ALL: [FileCategory; 4] = [Self::PlainText, Self::PdfDocument, Self::YamlDocument, Self::PdfFolder];

    /// Short name for configuration and the command line.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PlainText => "txt",
            Self::PdfDocument => "pdf",
            Self::YamlDocument => "yaml",
            Self::PdfFolder => "pdf-folder",
        }
    }

    /// Human-readable title (for menus).
    #[must_use]
    pub fn title(&self) -> &'static str {
        match self {
            Self::PlainText => "TXT Handling",
            Self::PdfDocument => "PDF Handling",
            Self::YamlDocument => "YAML Handling",
            Self::PdfFolder => "PDF Folder Handling",
        }
    }

    /// File extensions a selection should have, lowercase and without the
    /// dot. Empty for directory categories.
    #[must_use]
    pub fn extensions(&self) -> &'static [&'static str] {
        match self {
            Self::PlainText => &["txt"],
            Self::PdfDocument => &["pdf"],
            Self::YamlDocument => &["yaml", "yml"],
            Self::PdfFolder => &[],
        }
    }

    /// Whether the selection is a directory rather than a file.
    #[must_use]
    pub fn selects_directory(&self) -> bool {
        matches!(self, Self::PdfFolder)
    }

    /// Whether `path` is a selection this category can process: an existing
    /// directory, or a file with one of the accepted extensions (any case).
    pub fn accepts(&self, path: &Path) -> bool {
        if self.selects_directory() {
            return path.is_dir();
        }
        let extension = path.extension().and_then(|ext| ext.to_str());
        path.is_file() && extension.is_some_and(|ext| self.extensions().iter().any(|e| e.eq_ignore_ascii_case(ext)))
    }
}

impl Display for FileCategory {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for FileCategory {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "txt" | "text" | "plain-text" => Ok(Self::PlainText),
            "pdf" | "pdf-document" => Ok(Self::PdfDocument),
            "yaml" | "yml" | "yaml-document" => Ok(Self::YamlDocument),
            "pdf-folder" | "folder" => Ok(Self::PdfFolder),
            _ => exn::bail!(ErrorKind::UnknownCategory(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("txt", FileCategory::PlainText)]
    #[case("TEXT", FileCategory::PlainText)]
    #[case("pdf", FileCategory::PdfDocument)]
    #[case("yml", FileCategory::YamlDocument)]
    #[case("yaml-document", FileCategory::YamlDocument)]
    #[case("folder", FileCategory::PdfFolder)]
    #[case("pdf-folder", FileCategory::PdfFolder)]
    fn test_from_str(#[case] input: &str, #[case] expected: FileCategory) {
        assert_eq!(input.parse::<FileCategory>().unwrap(), expected);
    }

    #[test]
    fn test_from_str_invalid() {
        let err = "docx".parse::<FileCategory>().unwrap_err();
        assert!(matches!(&*err, ErrorKind::UnknownCategory(s) if s == "docx"));
    }

    #[test]
    fn test_display_parses_back() {
        for category in FileCategory::ALL {
            assert_eq!(category.to_string().parse::<FileCategory>().unwrap(), category);
        }
    }

    #[rstest]
    #[case(FileCategory::PlainText, &["txt"], false)]
    #[case(FileCategory::PdfDocument, &["pdf"], false)]
    #[case(FileCategory::YamlDocument, &["yaml", "yml"], false)]
    #[case(FileCategory::PdfFolder, &[], true)]
    fn test_selection_rules(#[case] category: FileCategory, #[case] extensions: &[&str], #[case] directory: bool) {
        assert_eq!(category.extensions(), extensions);
        assert_eq!(category.selects_directory(), directory);
    }

    #[test]
    fn test_accepts() {
        let temp_dir = tempfile::tempdir().unwrap();
        let notes = temp_dir.path().join("Notes.TXT");
        std::fs::write(&notes, "hello").unwrap();
        assert!(FileCategory::PlainText.accepts(&notes));
        assert!(!FileCategory::PdfDocument.accepts(&notes));
        assert!(!FileCategory::PdfFolder.accepts(&notes));
        assert!(FileCategory::PdfFolder.accepts(temp_dir.path()));
        assert!(!FileCategory::PlainText.accepts(&temp_dir.path().join("missing.txt")));
    }
}
