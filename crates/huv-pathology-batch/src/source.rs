//! OCR text sources.
//!
//! OCR itself happens upstream; a source only hands back the text of a
//! document.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::{BatchError, BatchResult};

/// Supplies the OCR text of a document.
pub trait TextSource {
    /// Text of the document at `path`. Unreadable or empty documents fail.
    fn text_from_pdf(&self, path: &Path) -> BatchResult<String>;
}

/// Reads pre-OCR'd text stored next to each PDF.
///
/// `report.pdf` is read from `report.pdf.txt`; a `.txt` path is read as is.
#[derive(Debug, Clone, Copy, Default)]
pub struct SidecarTextSource;

impl SidecarTextSource {
    pub fn new() -> Self {
        Self
    }

    /// Where the text for `path` is stored.
    pub fn sidecar_path(path: &Path) -> PathBuf {
        if has_extension(path, "txt") {
            return path.to_path_buf();
        }
        let mut sidecar = path.as_os_str().to_owned();
        sidecar.push(".txt");
        PathBuf::from(sidecar)
    }
}

impl TextSource for SidecarTextSource {
    fn text_from_pdf(&self, path: &Path) -> BatchResult<String> {
        let sidecar = Self::sidecar_path(path);
        debug!(path = %path.display(), sidecar = %sidecar.display(), "Reading OCR text");

        let text = fs::read_to_string(&sidecar)
            .map_err(|err| BatchError::source_error(path, format!("{}: {}", sidecar.display(), err)))?;
        if text.trim().is_empty() {
            return Err(BatchError::source_error(path, "no text recognized"));
        }
        Ok(text)
    }
}

/// Text held in memory, keyed by path.
#[derive(Debug, Clone, Default)]
pub struct InMemoryTextSource {
    texts: HashMap<PathBuf, String>,
}

impl InMemoryTextSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: impl Into<PathBuf>, text: impl Into<String>) {
        self.texts.insert(path.into(), text.into());
    }
}

impl TextSource for InMemoryTextSource {
    fn text_from_pdf(&self, path: &Path) -> BatchResult<String> {
        self.texts
            .get(path)
            .cloned()
            .ok_or_else(|| BatchError::source_error(path, "unknown document"))
    }
}

/// Expand inputs into document paths.
///
/// Files are kept as given. Directories contribute their `.pdf` files and
/// standalone `.txt` files (sidecars such as `x.pdf.txt` are skipped),
/// sorted by name.
pub fn collect_inputs(inputs: &[PathBuf]) -> BatchResult<Vec<PathBuf>> {
    let mut documents = Vec::new();

    for input in inputs {
        if !input.is_dir() {
            documents.push(input.clone());
            continue;
        }

        let mut entries: Vec<PathBuf> = fs::read_dir(input)?
            .filter_map(|entry| entry.ok().map(|entry| entry.path()))
            .filter(|path| path.is_file() && is_document(path))
            .collect();
        entries.sort();
        documents.extend(entries);
    }

    Ok(documents)
}

fn is_document(path: &Path) -> bool {
    if has_extension(path, "pdf") {
        return true;
    }
    let is_sidecar = path
        .file_stem()
        .map(Path::new)
        .is_some_and(|stem| has_extension(stem, "pdf"));
    has_extension(path, "txt") && !is_sidecar
}

fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(extension))
}
