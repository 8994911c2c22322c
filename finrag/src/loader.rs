//! Statement discovery and page-level text extraction.
//!
//! [`CorpusLoader`] enumerates the corpus directory and turns each recognized
//! file into a [`Document`] of ordered page texts. Extraction is delegated to a
//! [`PageExtractor`] chosen by file extension:
//!
//! - `pdf`: [`PdfExtractor`] (feature `pdf`, on by default)
//! - `txt`: [`TextExtractor`], pages separated by form feeds
//!
//! Corpus-wide loading skips documents that fail to parse and reports them in
//! [`CorpusLoad::skipped`]; it never aborts on a single bad file.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::document::Document;
use crate::error::{RagError, Result};
use crate::month::Month;

/// Extracts ordered page texts from one file format.
pub trait PageExtractor: Send + Sync {
    /// Lowercase file extensions handled by this extractor.
    fn extensions(&self) -> &[&'static str];

    /// Read `path` and return its page texts in order.
    fn extract(&self, path: &Path) -> Result<Vec<String>>;
}

/// Plain-text statements; a form feed (`\x0c`) starts a new page.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextExtractor;

impl PageExtractor for TextExtractor {
    fn extensions(&self) -> &[&'static str] {
        &["txt"]
    }

    fn extract(&self, path: &Path) -> Result<Vec<String>> {
        let text = std::fs::read_to_string(path).map_err(|e| RagError::DocumentLoadError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        let mut pages: Vec<String> = text.split('\x0c').map(str::to_string).collect();
        if pages.len() > 1 && pages.last().is_some_and(|p| p.trim().is_empty()) {
            pages.pop();
        }
        Ok(pages)
    }
}

#[cfg(feature = "pdf")]
pub use pdf::PdfExtractor;

#[cfg(feature = "pdf")]
mod pdf {
    use std::path::Path;

    use super::PageExtractor;
    use crate::error::{RagError, Result};

    /// PDF statements, one text entry per page, via `lopdf`.
    #[derive(Debug, Clone, Copy, Default)]
    pub struct PdfExtractor;

    impl PageExtractor for PdfExtractor {
        fn extensions(&self) -> &[&'static str] {
            &["pdf"]
        }

        fn extract(&self, path: &Path) -> Result<Vec<String>> {
            let load_err = |message: String| RagError::DocumentLoadError {
                path: path.to_path_buf(),
                message,
            };
            let document = lopdf::Document::load(path).map_err(|e| load_err(e.to_string()))?;
            if document.is_encrypted() {
                return Err(load_err("encrypted PDFs are not supported".to_string()));
            }
            document
                .get_pages()
                .keys()
                .map(|&page| {
                    document
                        .extract_text(&[page])
                        .map_err(|e| load_err(format!("page {page}: {e}")))
                })
                .collect()
        }
    }
}

/// A document that could not be loaded during a corpus-wide load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedDocument {
    /// The file that failed.
    pub path: PathBuf,
    /// Why it failed.
    pub reason: String,
}

/// Result of loading every document in the corpus.
#[derive(Debug, Clone, Default)]
pub struct CorpusLoad {
    /// Documents that loaded, in file-name order.
    pub documents: Vec<Document>,
    /// Documents that were skipped.
    pub skipped: Vec<SkippedDocument>,
}

/// Loads statement documents from a corpus directory.
///
/// # Example
///
/// ```rust,ignore
/// use finrag::CorpusLoader;
///
/// let loader = CorpusLoader::new("KnowledgeBase");
/// let january = loader.load_named("January.pdf")?;
/// let corpus = loader.load_all()?;
/// ```
#[derive(Clone)]
pub struct CorpusLoader {
    dir: PathBuf,
    extractors: Vec<Arc<dyn PageExtractor>>,
}

impl std::fmt::Debug for CorpusLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let extensions: Vec<&str> =
            self.extractors.iter().flat_map(|e| e.extensions().iter().copied()).collect();
        f.debug_struct("CorpusLoader")
            .field("dir", &self.dir)
            .field("extensions", &extensions)
            .finish()
    }
}

impl CorpusLoader {
    /// Create a loader for `dir` with the default extractors.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        let mut extractors: Vec<Arc<dyn PageExtractor>> = Vec::new();
        #[cfg(feature = "pdf")]
        extractors.push(Arc::new(PdfExtractor));
        extractors.push(Arc::new(TextExtractor));
        Self { dir: dir.into(), extractors }
    }

    /// Register an additional extractor. Later registrations win on shared extensions.
    pub fn with_extractor(mut self, extractor: Arc<dyn PageExtractor>) -> Self {
        self.extractors.insert(0, extractor);
        self
    }

    /// The corpus directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn extractor_for(&self, path: &Path) -> Option<&Arc<dyn PageExtractor>> {
        let extension = path.extension()?.to_str()?.to_ascii_lowercase();
        self.extractors.iter().find(|e| e.extensions().contains(&extension.as_str()))
    }

    /// List files with a recognized extension, sorted by file name.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::DocumentLoadError`] if the directory cannot be read.
    pub fn discover(&self) -> Result<Vec<PathBuf>> {
        let entries = std::fs::read_dir(&self.dir).map_err(|e| RagError::DocumentLoadError {
            path: self.dir.clone(),
            message: format!("cannot read corpus directory: {e}"),
        })?;

        let mut paths = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if path.is_file() && self.extractor_for(&path).is_some() {
                paths.push(path);
            }
        }
        paths.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
        debug!(corpus_dir = %self.dir.display(), document_count = paths.len(), "discovered documents");
        Ok(paths)
    }

    /// Load a single document from `path`.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::DocumentNotFound`] if the file is absent and
    /// [`RagError::DocumentLoadError`] if it is unrecognized or fails to parse.
    pub fn load(&self, path: &Path) -> Result<Document> {
        if !path.is_file() {
            return Err(RagError::DocumentNotFound(path.to_path_buf()));
        }
        let extractor = self.extractor_for(path).ok_or_else(|| RagError::DocumentLoadError {
            path: path.to_path_buf(),
            message: "unrecognized document extension".to_string(),
        })?;
        let id = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let pages = extractor.extract(path)?;
        debug!(document.id = %id, page_count = pages.len(), "loaded document");
        Ok(Document::new(id, pages, path))
    }

    /// Load `<corpus_dir>/<file_name>`, e.g. `January.pdf`.
    pub fn load_named(&self, file_name: &str) -> Result<Document> {
        self.load(&self.dir.join(file_name))
    }

    /// The document whose file stem equals the month name, ignoring case.
    pub fn find_month_document(&self, month: Month) -> Result<Option<PathBuf>> {
        Ok(self.discover()?.into_iter().find(|path| {
            path.file_stem()
                .and_then(|s| s.to_str())
                .is_some_and(|stem| stem.eq_ignore_ascii_case(month.name()))
        }))
    }

    /// Load every discovered document, skipping and logging those that fail.
    ///
    /// # Errors
    ///
    /// Only fails if the corpus directory itself cannot be listed.
    pub fn load_all(&self) -> Result<CorpusLoad> {
        let mut corpus = CorpusLoad::default();
        for path in self.discover()? {
            match self.load(&path) {
                Ok(document) => corpus.documents.push(document),
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "skipping document");
                    corpus.skipped.push(SkippedDocument { path, reason: e.to_string() });
                }
            }
        }
        info!(
            corpus_dir = %self.dir.display(),
            loaded = corpus.documents.len(),
            skipped = corpus.skipped.len(),
            "loaded corpus"
        );
        Ok(corpus)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FailingExtractor;

    impl PageExtractor for FailingExtractor {
        fn extensions(&self) -> &[&'static str] {
            &["bad"]
        }

        fn extract(&self, path: &Path) -> Result<Vec<String>> {
            Err(RagError::DocumentLoadError {
                path: path.to_path_buf(),
                message: "corrupt".to_string(),
            })
        }
    }

    fn write(dir: &Path, name: &str, text: &str) {
        std::fs::write(dir.join(name), text).unwrap();
    }

    #[test]
    fn text_pages_split_on_form_feed() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "February.txt", "page one\x0cpage two\x0c");
        let document = CorpusLoader::new(dir.path()).load_named("February.txt").unwrap();
        assert_eq!(document.id, "February");
        assert_eq!(document.pages, vec!["page one", "page two"]);
    }

    #[test]
    fn discover_ignores_unrecognized_files_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "March.txt", "m");
        write(dir.path(), "January.txt", "j");
        write(dir.path(), "notes.md", "ignored");
        let names: Vec<String> = CorpusLoader::new(dir.path())
            .discover()
            .unwrap()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["January.txt", "March.txt"]);
    }

    #[test]
    fn missing_named_document_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = CorpusLoader::new(dir.path()).load_named("May.pdf").unwrap_err();
        assert!(matches!(err, RagError::DocumentNotFound(_)));
    }

    #[test]
    fn month_document_matches_stem_case_insensitively() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "january.txt", "j");
        let loader = CorpusLoader::new(dir.path());
        let found = loader.find_month_document(Month::January).unwrap();
        assert_eq!(found, Some(dir.path().join("january.txt")));
        assert_eq!(loader.find_month_document(Month::June).unwrap(), None);
    }

    #[test]
    fn load_all_skips_failing_documents() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "April.txt", "Rent 1200");
        write(dir.path(), "Broken.bad", "???");
        let loader = CorpusLoader::new(dir.path()).with_extractor(Arc::new(FailingExtractor));
        let corpus = loader.load_all().unwrap();
        assert_eq!(corpus.documents.len(), 1);
        assert_eq!(corpus.documents[0].id, "April");
        assert_eq!(corpus.skipped.len(), 1);
        assert!(corpus.skipped[0].reason.contains("corrupt"));
    }

    #[test]
    fn unreadable_corpus_dir_is_a_load_error() {
        let err = CorpusLoader::new("/definitely/not/here").discover().unwrap_err();
        assert!(matches!(err, RagError::DocumentLoadError { .. }));
    }
}
