use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use engine_logging::engine_debug;
use tempfile::NamedTempFile;
use thiserror::Error;
use url::Url;

use crate::document::{article_url, build_document};
use crate::filename::document_filename;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("output directory missing or not writable: {0}")]
    OutputDir(String),
    #[error("invalid article base url: {0}")]
    BaseUrl(String),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

/// Ensure output directory exists; create if missing.
pub fn ensure_output_dir(dir: &Path) -> Result<(), PersistError> {
    if dir.exists() {
        let meta = fs::metadata(dir).map_err(|e| PersistError::OutputDir(e.to_string()))?;
        if !meta.is_dir() {
            return Err(PersistError::OutputDir("path is not a directory".into()));
        }
    } else {
        fs::create_dir_all(dir).map_err(|e| PersistError::OutputDir(e.to_string()))?;
    }
    // Basic writability probe: try creating a temp file.
    NamedTempFile::new_in(dir).map_err(|e| PersistError::OutputDir(e.to_string()))?;
    Ok(())
}

/// Atomically write content to `{dir}/{filename}` by writing a temp file then renaming.
#[derive(Debug, Clone)]
pub struct AtomicFileWriter {
    dir: PathBuf,
}

impl AtomicFileWriter {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn write(&self, filename: &str, content: &str) -> Result<PathBuf, PersistError> {
        let target = self.dir.join(filename);
        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(content.as_bytes())?;
        tmp.flush()?;
        tmp.as_file_mut().sync_all()?;

        // Rename replaces an existing target, so readers see old or new, never a mix.
        tmp.persist(&target).map_err(|e| PersistError::Io(e.error))?;
        Ok(target)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    Written { path: PathBuf, bytes: u64 },
    /// Nothing to persist for an empty body.
    Skipped,
}

/// One text file per article inside a single output directory.
#[derive(Debug, Clone)]
pub struct DocumentStore {
    writer: AtomicFileWriter,
    article_base: Url,
}

impl DocumentStore {
    /// Create the output directory (idempotent) and check it is writable.
    pub fn open(dir: impl Into<PathBuf>, article_base_url: &str) -> Result<Self, PersistError> {
        let dir = dir.into();
        let article_base =
            Url::parse(article_base_url).map_err(|e| PersistError::BaseUrl(e.to_string()))?;
        ensure_output_dir(&dir)?;
        Ok(Self {
            writer: AtomicFileWriter::new(dir),
            article_base,
        })
    }

    pub fn dir(&self) -> &Path {
        self.writer.dir()
    }

    /// Path the document for `title` is written to.
    pub fn path_for(&self, title: &str) -> PathBuf {
        self.writer.dir().join(document_filename(title))
    }

    /// Write `body` under the sanitized title, replacing any previous file.
    pub fn save(&self, title: &str, body: &str) -> Result<SaveOutcome, PersistError> {
        if body.is_empty() {
            return Ok(SaveOutcome::Skipped);
        }
        let source_url = article_url(&self.article_base, title);
        let content = build_document(title, &source_url, body);
        let path = self.writer.write(&document_filename(title), &content)?;
        engine_debug!("Wrote {} bytes to {:?}", content.len(), path);
        Ok(SaveOutcome::Written {
            path,
            bytes: content.len() as u64,
        })
    }
}
