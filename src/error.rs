//! Error types for the chunk-monkey pipeline.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for chunk-monkey operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while loading, extracting, or rendering a document.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error when reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The input path does not exist.
    #[error("Input not found: {}", .0.display())]
    InputNotFound(PathBuf),

    /// The input exists but cannot be processed (wrong extension, too large, ...).
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The file does not carry a PDF header.
    #[error("Unknown file format: not a valid PDF")]
    UnknownFormat,

    /// The PDF header names a version we do not recognise.
    #[error("Unsupported PDF version: {0}")]
    UnsupportedVersion(String),

    /// The document loader could not be started.
    #[error("Document loader unavailable: {0}")]
    LoaderUnavailable(String),

    /// The document loader ran but failed to convert the input.
    #[error("Document loader failed: {0}")]
    Loader(String),

    /// The loader produced a document tree we cannot interpret.
    #[error("Malformed document: {0}")]
    MalformedDocument(String),

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Error during rendering (Markdown, HTML, JSON).
    #[error("Rendering error: {0}")]
    Render(String),

    /// An element image could not be stored.
    #[error("Asset error: {0}")]
    Asset(String),

    /// Writing an output artifact failed.
    #[error("Failed to write {}: {source}", path.display())]
    OutputWrite {
        /// Destination that could not be written.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },

    /// Configuration value out of range or unparsable.
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl Error {
    /// Wrap an I/O failure with the output path it happened on.
    pub fn output_write(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Error::OutputWrite {
            path: path.into(),
            source,
        }
    }

    /// Whether this error comes from the input rather than the environment.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            Error::InputNotFound(_)
                | Error::InvalidInput(_)
                | Error::UnknownFormat
                | Error::UnsupportedVersion(_)
                | Error::MalformedDocument(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::UnknownFormat;
        assert_eq!(err.to_string(), "Unknown file format: not a valid PDF");

        let err = Error::InputNotFound(PathBuf::from("missing.pdf"));
        assert_eq!(err.to_string(), "Input not found: missing.pdf");

        let err = Error::output_write(
            "out/doc.md",
            io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        );
        assert_eq!(err.to_string(), "Failed to write out/doc.md: denied");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_input_error_classification() {
        assert!(Error::UnknownFormat.is_input_error());
        assert!(Error::InvalidInput("too large".into()).is_input_error());
        assert!(!Error::Loader("crashed".into()).is_input_error());
        assert!(!Error::Render("oops".into()).is_input_error());
    }
}
