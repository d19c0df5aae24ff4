//! Input validation before a document is handed to the loader.
//!
//! The loader is expensive to start, so obviously bad inputs (missing files,
//! wrong extension, oversized files, non-PDF content) are rejected here.

use crate::error::{Error, Result};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// PDF header information read from the first bytes of a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdfHeader {
    /// PDF version (e.g., "1.7", "2.0")
    pub version: String,
    /// File size in bytes
    pub size_bytes: u64,
}

impl PdfHeader {
    /// File size in mebibytes.
    pub fn size_mb(&self) -> f64 {
        self.size_bytes as f64 / (1024.0 * 1024.0)
    }
}

impl std::fmt::Display for PdfHeader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PDF {} ({:.1}MB)", self.version, self.size_mb())
    }
}

const PDF_MAGIC: &[u8] = b"%PDF-";
const VERSION_LEN: usize = 3;

/// Validate a PDF input path and return its header.
///
/// Checks, in order: existence, `.pdf` extension (case-insensitive), size
/// against `max_file_size_mb`, and the `%PDF-x.y` magic header.
pub fn validate_pdf<P: AsRef<Path>>(path: P, max_file_size_mb: u64) -> Result<PdfHeader> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(Error::InputNotFound(path.to_path_buf()));
    }
    if !has_pdf_extension(path) {
        return Err(Error::InvalidInput(format!(
            "file must be a PDF: {}",
            path.display()
        )));
    }

    let size_bytes = std::fs::metadata(path)?.len();
    let limit = max_file_size_mb.saturating_mul(1024 * 1024);
    if size_bytes > limit {
        return Err(Error::InvalidInput(format!(
            "file too large: {:.1}MB > {}MB",
            size_bytes as f64 / (1024.0 * 1024.0),
            max_file_size_mb
        )));
    }

    let mut header = [0u8; 16];
    let read = read_prefix(path, &mut header)?;
    let version = pdf_version(&header[..read])?;

    Ok(PdfHeader {
        version,
        size_bytes,
    })
}

/// Whether the path ends in `.pdf`, ignoring case.
pub fn has_pdf_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("pdf"))
        .unwrap_or(false)
}

/// Extract the version string from a PDF header.
pub fn pdf_version(data: &[u8]) -> Result<String> {
    if data.len() < PDF_MAGIC.len() + VERSION_LEN || !data.starts_with(PDF_MAGIC) {
        return Err(Error::UnknownFormat);
    }

    let version_bytes = &data[PDF_MAGIC.len()..PDF_MAGIC.len() + VERSION_LEN];
    let version = String::from_utf8_lossy(version_bytes).to_string();
    if !is_valid_version(&version) {
        return Err(Error::UnsupportedVersion(version));
    }
    Ok(version)
}

/// Check if bytes start with a valid PDF header.
pub fn is_pdf_bytes(data: &[u8]) -> bool {
    pdf_version(data).is_ok()
}

fn is_valid_version(version: &str) -> bool {
    let bytes = version.as_bytes();
    bytes.len() == 3 && bytes[0].is_ascii_digit() && bytes[1] == b'.' && bytes[2].is_ascii_digit()
}

/// Read up to `buf.len()` bytes; short files are not an error here.
fn read_prefix(path: &Path, buf: &mut [u8]) -> Result<usize> {
    let mut file = File::open(path)?;
    let mut filled = 0;
    while filled < buf.len() {
        let n = file.read(&mut buf[filled..])?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    Ok(filled)
}
