//! Document type detection by extension

use std::path::Path;

pub const SUPPORTED_EXTENSIONS: [&str; 4] = ["txt", "md", "markdown", "pdf"];

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FileType {
    Pdf,
    Text,
    Markdown,
    Unknown,
}

impl FileType {
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_lowercase().as_str() {
            "pdf" => FileType::Pdf,
            "txt" => FileType::Text,
            "md" | "markdown" => FileType::Markdown,
            _ => FileType::Unknown,
        }
    }

    pub fn from_path(path: &Path) -> Self {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map_or(FileType::Unknown, FileType::from_extension)
    }

    pub fn is_supported(&self) -> bool {
        *self != FileType::Unknown
    }
}
