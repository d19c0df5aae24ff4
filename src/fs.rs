//! Output directory layout and file helpers.
//!
//! Every artifact name for a document is derived from its stem by
//! [`OutputLayout`]; the writers here open, write, and close each file
//! within a single call.

use crate::error::{Error, Result};
use crate::model::AssetKind;
use crate::render::{from_json, to_json, JsonFormat};
use log::debug;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Suffix of the structured JSON file, stripped when deriving the HTML stem.
pub const STRUCTURED_SUFFIX: &str = "_structured";

/// Artifact names for one document in one output directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLayout {
    dir: PathBuf,
    stem: String,
}

impl OutputLayout {
    /// Layout for `stem` inside `dir`.
    pub fn new(dir: impl Into<PathBuf>, stem: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            stem: stem.into(),
        }
    }

    /// Layout named after an input file.
    pub fn for_input(dir: impl Into<PathBuf>, input: &Path) -> Self {
        Self::new(dir, file_stem(input))
    }

    /// Layout for a structured JSON file, dropping its `_structured` suffix.
    pub fn for_structured_json(dir: impl Into<PathBuf>, json: &Path) -> Self {
        let stem = file_stem(json);
        let stem = stem
            .strip_suffix(STRUCTURED_SUFFIX)
            .map(str::to_string)
            .unwrap_or(stem);
        Self::new(dir, stem)
    }

    /// Output directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Document stem.
    pub fn stem(&self) -> &str {
        &self.stem
    }

    fn file(&self, suffix: &str) -> PathBuf {
        self.dir.join(format!("{}{}", self.stem, suffix))
    }

    /// `<stem>_structured.json`
    pub fn structured_json(&self) -> PathBuf {
        self.file("_structured.json")
    }

    /// `<stem>_section_summary.json`
    pub fn section_summary(&self) -> PathBuf {
        self.file("_section_summary.json")
    }

    /// `<stem>.md`
    pub fn markdown(&self) -> PathBuf {
        self.file(".md")
    }

    /// `<stem>-with-images.md`
    pub fn markdown_with_images(&self) -> PathBuf {
        self.file("-with-images.md")
    }

    /// `<stem>-with-image-refs.md`
    pub fn markdown_with_refs(&self) -> PathBuf {
        self.file("-with-image-refs.md")
    }

    /// `<stem>-docling.html`
    pub fn docling_html(&self) -> PathBuf {
        self.file("-docling.html")
    }

    /// `<stem>_output.html`
    pub fn output_html(&self) -> PathBuf {
        self.file("_output.html")
    }

    /// `<stem>-<table|picture>-<index>.png`
    pub fn asset_file_name(&self, kind: AssetKind, index: u32) -> String {
        format!("{}-{}-{}.png", self.stem, kind.file_tag(), index)
    }

    /// Full path of an asset file.
    pub fn asset_path(&self, kind: AssetKind, index: u32) -> PathBuf {
        self.dir.join(self.asset_file_name(kind, index))
    }
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document".to_string())
}

/// Create `dir` and its parents if missing.
pub fn ensure_dir(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir).map_err(|e| Error::output_write(dir, e))
}

/// Write `bytes` to `path`, replacing any existing file.
pub fn write_bytes(path: &Path, bytes: &[u8]) -> Result<()> {
    let mut file = File::create(path).map_err(|e| Error::output_write(path, e))?;
    file.write_all(bytes)
        .and_then(|_| file.flush())
        .map_err(|e| Error::output_write(path, e))?;
    debug!("Wrote {} ({} bytes)", path.display(), bytes.len());
    Ok(())
}

/// Write UTF-8 text to `path`.
pub fn write_text(path: &Path, text: &str) -> Result<()> {
    write_bytes(path, text.as_bytes())
}

/// Serialize `value` to `path`.
pub fn write_json<T: Serialize>(path: &Path, value: &T, format: JsonFormat) -> Result<()> {
    let json = to_json(value, format)?;
    write_text(path, &json)
}

/// Read and deserialize JSON from `path`.
///
/// Content that does not match `T` is reported as a malformed document.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    if !path.exists() {
        return Err(Error::InputNotFound(path.to_path_buf()));
    }
    let text = fs::read_to_string(path)?;
    from_json(&text)
}

/// PDF files directly inside `dir`, sorted by name.
pub fn list_pdfs(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.exists() {
        return Err(Error::InputNotFound(dir.to_path_buf()));
    }
    if !dir.is_dir() {
        return Err(Error::InvalidInput(format!(
            "not a directory: {}",
            dir.display()
        )));
    }

    let mut pdfs = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && crate::detect::has_pdf_extension(&path) {
            pdfs.push(path);
        }
    }
    pdfs.sort();
    Ok(pdfs)
}
