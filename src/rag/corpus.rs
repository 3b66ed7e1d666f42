//! Corpus loading.
//!
//! `DirectorySource` walks a directory tree in path order and hands each file
//! to the first registered `DocumentParser` that accepts it. A file that fails
//! to read or parse is recorded and skipped; the rest of the corpus still loads.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use walkdir::WalkDir;

use crate::core::errors::TutorError;

/// One source document, immutable once loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    /// Path relative to the corpus root, with `/` separators.
    pub id: String,
    pub text: String,
    pub source: PathBuf,
}

impl Document {
    pub fn new(id: impl Into<String>, text: impl Into<String>, source: impl Into<PathBuf>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            source: source.into(),
        }
    }
}

/// A document that could not be loaded or indexed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentFailure {
    pub source: PathBuf,
    pub reason: String,
}

/// Extracts raw text segments (e.g. pages) from one file.
///
/// PDF and other binary formats are handled by parsers supplied from outside
/// this crate.
pub trait DocumentParser: Send + Sync {
    fn name(&self) -> &str;

    fn supports(&self, path: &Path) -> bool;

    fn parse(&self, path: &Path) -> Result<Vec<String>, String>;
}

/// `.txt` and `.md` files, decoded as lossy UTF-8.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlainTextParser;

impl DocumentParser for PlainTextParser {
    fn name(&self) -> &str {
        "plain_text"
    }

    fn supports(&self, path: &Path) -> bool {
        matches!(
            path.extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| ext.to_ascii_lowercase())
                .as_deref(),
            Some("txt") | Some("md")
        )
    }

    fn parse(&self, path: &Path) -> Result<Vec<String>, String> {
        let bytes = fs::read(path).map_err(|e| e.to_string())?;
        Ok(vec![String::from_utf8_lossy(&bytes).into_owned()])
    }
}

#[derive(Debug, Default)]
pub struct CorpusLoad {
    pub documents: Vec<Document>,
    pub failures: Vec<DocumentFailure>,
}

pub struct DirectorySource {
    parsers: Vec<Box<dyn DocumentParser>>,
}

impl DirectorySource {
    pub fn new() -> Self {
        Self {
            parsers: vec![Box::new(PlainTextParser)],
        }
    }

    /// Register an additional parser; parsers are tried in registration order.
    pub fn with_parser(mut self, parser: Box<dyn DocumentParser>) -> Self {
        self.parsers.push(parser);
        self
    }

    pub fn load(&self, root: &Path) -> Result<CorpusLoad, TutorError> {
        if !root.is_dir() {
            return Err(TutorError::Corpus(format!(
                "corpus directory not found: {}",
                root.display()
            )));
        }

        let mut load = CorpusLoad::default();
        for entry in WalkDir::new(root).sort_by_file_name() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    let source = err.path().map(Path::to_path_buf).unwrap_or_else(|| root.to_path_buf());
                    tracing::warn!("Skipping unreadable corpus entry {}: {}", source.display(), err);
                    load.failures.push(DocumentFailure {
                        source,
                        reason: err.to_string(),
                    });
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }

            let path = entry.path();
            let Some(parser) = self.parsers.iter().find(|p| p.supports(path)) else {
                tracing::debug!("No parser for {}, skipping", path.display());
                continue;
            };

            match parser.parse(path) {
                Ok(segments) => {
                    let id = document_id(root, path);
                    tracing::debug!("Loaded {} via {} ({} segments)", id, parser.name(), segments.len());
                    load.documents.push(Document::new(id, segments.join("\n"), path));
                }
                Err(reason) => {
                    tracing::warn!("Failed to parse {}: {}", path.display(), reason);
                    load.failures.push(DocumentFailure {
                        source: path.to_path_buf(),
                        reason,
                    });
                }
            }
        }

        tracing::info!(
            "Loaded {} documents from {} ({} failures)",
            load.documents.len(),
            root.display(),
            load.failures.len()
        );
        Ok(load)
    }
}

impl Default for DirectorySource {
    fn default() -> Self {
        Self::new()
    }
}

fn document_id(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    struct BrokenPdfParser;

    impl DocumentParser for BrokenPdfParser {
        fn name(&self) -> &str {
            "broken_pdf"
        }

        fn supports(&self, path: &Path) -> bool {
            path.extension().and_then(|e| e.to_str()) == Some("pdf")
        }

        fn parse(&self, _path: &Path) -> Result<Vec<String>, String> {
            Err("encrypted document".to_string())
        }
    }

    struct PagedParser;

    impl DocumentParser for PagedParser {
        fn name(&self) -> &str {
            "paged"
        }

        fn supports(&self, path: &Path) -> bool {
            path.extension().and_then(|e| e.to_str()) == Some("pages")
        }

        fn parse(&self, _path: &Path) -> Result<Vec<String>, String> {
            Ok(vec!["page one".to_string(), "page two".to_string()])
        }
    }

    #[test]
    fn loads_text_files_recursively_in_path_order() {
        let tmp = tempfile::tempdir().expect("tempdir");
        fs::create_dir_all(tmp.path().join("grammar")).expect("mkdir");
        fs::write(tmp.path().join("b.txt"), "bravo").expect("write");
        fs::write(tmp.path().join("a.md"), "alpha").expect("write");
        fs::write(tmp.path().join("grammar/tenses.txt"), "past tense").expect("write");
        fs::write(tmp.path().join("image.png"), [0u8, 1, 2]).expect("write");

        let load = DirectorySource::new().load(tmp.path()).expect("load");

        let ids: Vec<&str> = load.documents.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["a.md", "b.txt", "grammar/tenses.txt"]);
        assert_eq!(load.documents[2].text, "past tense");
        assert!(load.failures.is_empty());
    }

    #[test]
    fn parse_failure_does_not_abort_the_corpus() {
        let tmp = tempfile::tempdir().expect("tempdir");
        fs::write(tmp.path().join("a.txt"), "kept").expect("write");
        fs::write(tmp.path().join("manual.pdf"), "%PDF-1.7").expect("write");
        fs::write(tmp.path().join("z.txt"), "also kept").expect("write");

        let load = DirectorySource::new()
            .with_parser(Box::new(BrokenPdfParser))
            .load(tmp.path())
            .expect("load");

        assert_eq!(load.documents.len(), 2);
        assert_eq!(load.failures.len(), 1);
        assert!(load.failures[0].source.ends_with("manual.pdf"));
        assert_eq!(load.failures[0].reason, "encrypted document");
    }

    #[test]
    fn segments_are_joined_into_one_document() {
        let tmp = tempfile::tempdir().expect("tempdir");
        fs::write(tmp.path().join("book.pages"), "").expect("write");

        let load = DirectorySource::new()
            .with_parser(Box::new(PagedParser))
            .load(tmp.path())
            .expect("load");

        assert_eq!(load.documents[0].text, "page one\npage two");
    }

    #[test]
    fn invalid_utf8_is_decoded_lossily() {
        let tmp = tempfile::tempdir().expect("tempdir");
        fs::write(tmp.path().join("latin1.txt"), [b'c', b'a', b'f', 0xE9]).expect("write");

        let load = DirectorySource::new().load(tmp.path()).expect("load");
        assert!(load.documents[0].text.starts_with("caf"));
    }

    #[test]
    fn missing_root_is_a_corpus_error() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let err = DirectorySource::new()
            .load(&tmp.path().join("nope"))
            .expect_err("missing dir");
        assert!(matches!(err, TutorError::Corpus(_)));
    }
}
