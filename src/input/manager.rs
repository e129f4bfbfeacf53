//! Input manager: resolves paths to documents and loads their text

use crate::error::{CvEvaluatorError, Result};
use crate::input::file_detector::FileType;
use crate::input::text_extractor::{MarkdownExtractor, PdfExtractor, PlainTextExtractor, TextExtractor};
use crate::pipeline::SourceDocument;
use log::{info, warn};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

pub struct InputManager {
    cache: HashMap<PathBuf, String>,
}

impl Default for InputManager {
    fn default() -> Self {
        Self::new()
    }
}

impl InputManager {
    pub fn new() -> Self {
        Self {
            cache: HashMap::new(),
        }
    }

    /// Expand a path into the documents it names: the file itself, or the
    /// supported files directly inside a directory, sorted by name.
    pub fn discover(&self, path: &Path) -> Result<Vec<PathBuf>> {
        if !path.exists() {
            return Err(CvEvaluatorError::InvalidInput(format!(
                "Path does not exist: {}",
                path.display()
            )));
        }

        if path.is_file() {
            return Ok(vec![path.to_path_buf()]);
        }

        let mut files = Vec::new();
        for entry in std::fs::read_dir(path)? {
            let entry_path = entry?.path();
            if entry_path.is_file() && FileType::from_path(&entry_path).is_supported() {
                files.push(entry_path);
            }
        }
        files.sort();

        if files.is_empty() {
            warn!("No supported documents found in {}", path.display());
        }
        Ok(files)
    }

    pub async fn extract_text(&mut self, path: &Path) -> Result<String> {
        if let Some(cached_text) = self.cache.get(path) {
            info!("Using cached text for: {}", path.display());
            return Ok(cached_text.clone());
        }

        if !path.exists() {
            return Err(CvEvaluatorError::InvalidInput(format!(
                "File does not exist: {}",
                path.display()
            )));
        }

        let text = match FileType::from_path(path) {
            FileType::Pdf => {
                info!("Extracting text from PDF: {}", path.display());
                PdfExtractor.extract(path).await?
            }
            FileType::Text => {
                info!("Reading plain text file: {}", path.display());
                PlainTextExtractor.extract(path).await?
            }
            FileType::Markdown => {
                info!("Processing markdown file: {}", path.display());
                MarkdownExtractor.extract(path).await?
            }
            FileType::Unknown => {
                return Err(CvEvaluatorError::UnsupportedFormat(format!(
                    "Unsupported file type for: {}",
                    path.display()
                )));
            }
        };

        self.cache.insert(path.to_path_buf(), text.clone());

        Ok(text)
    }

    /// Load every path; failures are carried per document rather than
    /// aborting the batch.
    pub async fn load_all(&mut self, paths: &[PathBuf]) -> Vec<SourceDocument> {
        let mut documents = Vec::with_capacity(paths.len());
        for path in paths {
            let content = self.extract_text(path).await;
            if let Err(e) = &content {
                warn!("Could not load {}: {}", path.display(), e);
            }
            documents.push(SourceDocument {
                source: path.display().to_string(),
                content,
            });
        }
        documents
    }

    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }

    pub fn cache_size(&self) -> usize {
        self.cache.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_discover_filters_and_sorts() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("b.txt"), "b").unwrap();
        std::fs::write(dir.path().join("a.md"), "a").unwrap();
        std::fs::write(dir.path().join("notes.docx"), "x").unwrap();
        std::fs::create_dir(dir.path().join("nested.txt")).unwrap();

        let files = InputManager::new().discover(dir.path()).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["a.md", "b.txt"]);
    }

    #[test]
    fn test_discover_missing_path() {
        let result = InputManager::new().discover(Path::new("/definitely/not/here"));
        assert!(matches!(result, Err(CvEvaluatorError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_cache_and_load_failures() {
        let dir = TempDir::new().unwrap();
        let good = dir.path().join("cv.txt");
        std::fs::write(&good, "  Jane Doe  \n\nRust engineer\n").unwrap();
        let bad = dir.path().join("cv.docx");
        std::fs::write(&bad, "binary").unwrap();

        let mut manager = InputManager::new();
        let documents = manager.load_all(&[good.clone(), bad]).await;

        assert_eq!(documents.len(), 2);
        assert_eq!(documents[0].content.as_deref().unwrap(), "Jane Doe\nRust engineer");
        assert!(matches!(documents[1].content, Err(CvEvaluatorError::UnsupportedFormat(_))));
        assert_eq!(manager.cache_size(), 1);

        manager.clear_cache();
        assert_eq!(manager.cache_size(), 0);
    }
}
