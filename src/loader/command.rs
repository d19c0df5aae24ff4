//! Loader that drives Docling through a Python subprocess.

use super::docling::parse_docling_file;
use super::{DocumentLoader, LoaderOptions};
use crate::error::{Error, Result};
use crate::model::DocumentTree;
use log::{debug, info};
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Instant;

/// Environment variable naming the Python interpreter with Docling installed.
pub const PYTHON_ENV: &str = "DOCLING_PYTHON";

/// Driver run with `python -c`.
///
/// Arguments: input, output JSON, image scale, then 0/1 flags for table,
/// picture, and page images. Images are embedded in the JSON as data URIs.
const DRIVER: &str = r#"
import sys
from pathlib import Path
from docling.datamodel.base_models import InputFormat
from docling.datamodel.pipeline_options import PdfPipelineOptions
from docling.document_converter import DocumentConverter, PdfFormatOption
from docling_core.types.doc import ImageRefMode

src, dst, scale, tables, pictures, pages = sys.argv[1:7]
opts = PdfPipelineOptions()
opts.images_scale = float(scale)
opts.generate_table_images = tables == "1"
opts.generate_picture_images = pictures == "1"
opts.generate_page_images = pages == "1"
converter = DocumentConverter(
    format_options={InputFormat.PDF: PdfFormatOption(pipeline_options=opts)}
)
result = converter.convert(Path(src))
result.document.save_as_json(Path(dst), image_mode=ImageRefMode.EMBEDDED)
"#;

/// Lines of stderr kept in error messages.
const STDERR_TAIL: usize = 12;

/// Runs Docling in a Python interpreter and parses its JSON export.
#[derive(Debug, Clone)]
pub struct DoclingCommandLoader {
    python: PathBuf,
}

impl DoclingCommandLoader {
    /// Use `$DOCLING_PYTHON`, or `python3` from `PATH`.
    pub fn new() -> Self {
        let python = std::env::var_os(PYTHON_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("python3"));
        Self { python }
    }

    /// Use a specific interpreter.
    pub fn with_python(python: impl Into<PathBuf>) -> Self {
        Self {
            python: python.into(),
        }
    }

    /// Interpreter this loader runs.
    pub fn python(&self) -> &Path {
        &self.python
    }

    fn command(&self, input: &Path, output: &Path, options: &LoaderOptions) -> Command {
        let flag = |enabled: bool| if enabled { "1" } else { "0" };

        let mut cmd = Command::new(&self.python);
        cmd.arg("-c")
            .arg(DRIVER)
            .arg(input)
            .arg(output)
            .arg(options.image_scale.to_string())
            .arg(flag(options.generate_table_images))
            .arg(flag(options.generate_picture_images))
            .arg(flag(options.generate_page_images));
        cmd
    }
}

impl Default for DoclingCommandLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentLoader for DoclingCommandLoader {
    fn name(&self) -> &str {
        "docling"
    }

    fn load(&self, path: &Path, options: &LoaderOptions) -> Result<DocumentTree> {
        let scratch = tempfile::Builder::new()
            .prefix("chunk-monkey-")
            .tempdir()?;
        let export = scratch.path().join("document.json");

        info!(
            "Converting {} with Docling (scale {})",
            path.display(),
            options.image_scale
        );
        let started = Instant::now();

        let output = self
            .command(path, &export, options)
            .output()
            .map_err(|e| match e.kind() {
                io::ErrorKind::NotFound => Error::LoaderUnavailable(format!(
                    "{} not found; set {} to a Python with docling installed",
                    self.python.display(),
                    PYTHON_ENV
                )),
                _ => Error::LoaderUnavailable(format!(
                    "failed to start {}: {}",
                    self.python.display(),
                    e
                )),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::Loader(format!(
                "Docling exited with {}: {}",
                output.status,
                stderr_tail(&stderr)
            )));
        }
        if !export.exists() {
            return Err(Error::Loader("Docling produced no output".into()));
        }

        debug!("Docling finished in {:.1?}", started.elapsed());
        parse_docling_file(&export, options)
    }
}

/// Last few non-empty stderr lines, where Python puts the exception.
fn stderr_tail(stderr: &str) -> String {
    let lines: Vec<&str> = stderr.lines().filter(|l| !l.trim().is_empty()).collect();
    let start = lines.len().saturating_sub(STDERR_TAIL);
    lines[start..].join("\n")
}
