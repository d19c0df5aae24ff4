//! End-to-end processing: PDF → structured JSON → Markdown and HTML.
//!
//! # Example
//!
//! ```no_run
//! use chunk_monkey::pipeline::{Pipeline, PipelineOptions};
//! use std::path::Path;
//!
//! fn main() -> chunk_monkey::Result<()> {
//!     let options = PipelineOptions::new().with_output_dir("out");
//!     let pipeline = Pipeline::new(options)?;
//!
//!     let output = pipeline.process_full_pipeline(Path::new("paper.pdf"))?;
//!     for file in &output.files {
//!         println!("{}", file.display());
//!     }
//!     Ok(())
//! }
//! ```

mod batch;
mod options;

pub use batch::{BatchFailure, BatchReport};
pub use options::{
    PipelineOptions, DEFAULT_MAX_FILE_SIZE_MB, DEFAULT_OUTPUT_DIR, IMAGE_SCALE_ENV,
    MAX_FILE_SIZE_ENV, OUTPUT_DIR_ENV,
};

use crate::detect::validate_pdf;
use crate::error::Result;
use crate::extract::{section_summary, AssetSink, FileAssets, StructuredExtractor};
use crate::fs::{ensure_dir, list_pdfs, read_json, write_json, write_text, OutputLayout};
use crate::loader::{DoclingCommandLoader, DocumentLoader};
use crate::model::StructuredDocument;
use crate::render::{HtmlRenderer, ImageMode, MarkdownRenderer, RenderOptions};
use log::{error, info, warn};
use std::path::{Path, PathBuf};

/// Artifacts produced for one document.
#[derive(Debug, Clone)]
pub struct ProcessOutput {
    /// Names of the artifacts
    pub layout: OutputLayout,
    /// The extracted document
    pub document: StructuredDocument,
    /// Every file written, in write order
    pub files: Vec<PathBuf>,
}

impl ProcessOutput {
    /// Path of the structured JSON.
    pub fn json_path(&self) -> PathBuf {
        self.layout.structured_json()
    }
}

/// Runs a loader and the extractor and writes artifacts.
pub struct Pipeline {
    options: PipelineOptions,
    loader: Box<dyn DocumentLoader>,
}

impl Pipeline {
    /// Pipeline backed by the Docling command loader.
    pub fn new(options: PipelineOptions) -> Result<Self> {
        Self::with_loader(options, Box::new(DoclingCommandLoader::new()))
    }

    /// Pipeline backed by `loader`.
    pub fn with_loader(options: PipelineOptions, loader: Box<dyn DocumentLoader>) -> Result<Self> {
        options.validate()?;
        Ok(Self { options, loader })
    }

    /// Options in use.
    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    /// Validate, load and extract `pdf`, handing rasters to `assets`.
    pub fn extract(&self, pdf: &Path, assets: &mut dyn AssetSink) -> Result<StructuredDocument> {
        let header = validate_pdf(pdf, self.options.max_file_size_mb)?;
        info!(
            "Processing {} ({}) with {}",
            pdf.display(),
            header,
            self.loader.name()
        );

        let tree = self.loader.load(pdf, &self.options.loader)?;
        info!("Document loaded: {} pages, {} nodes", tree.page_count, tree.node_count());

        let mut extract = self.options.extract.clone();
        if let Some(name) = pdf.file_name() {
            extract = extract.with_source_file(name.to_string_lossy());
        }
        Ok(StructuredExtractor::new(extract).extract(&tree, assets))
    }

    /// Write PNG assets, `<stem>_structured.json` and the section summary.
    pub fn process_pdf_to_json(&self, pdf: &Path) -> Result<ProcessOutput> {
        ensure_dir(&self.options.output_dir)?;
        let layout = OutputLayout::for_input(&self.options.output_dir, pdf);

        let mut assets = FileAssets::new(layout.clone());
        let document = self.extract(pdf, &mut assets)?;
        let mut files = assets.into_written();

        let json_path = layout.structured_json();
        write_json(&json_path, &document, self.options.json_format)?;
        info!("JSON saved: {}", json_path.display());
        files.push(json_path);

        if self.options.write_section_summary {
            let summary_path = layout.section_summary();
            write_json(&summary_path, &section_summary(&document), self.options.json_format)?;
            files.push(summary_path);
        }

        Ok(ProcessOutput {
            layout,
            document,
            files,
        })
    }

    /// Render `<stem>_output.html` from a structured JSON file.
    pub fn generate_html_from_json(&self, json: &Path) -> Result<PathBuf> {
        info!("Generating HTML from: {}", json.display());
        let document: StructuredDocument = read_json(json)?;

        ensure_dir(&self.options.output_dir)?;
        let layout = OutputLayout::for_structured_json(&self.options.output_dir, json);
        let asset_dir = json
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));

        let mut render = RenderOptions::new()
            .with_image_mode(ImageMode::Referenced)
            .with_asset_dir(asset_dir);
        if !same_dir(asset_dir, &self.options.output_dir) {
            let prefix = asset_dir
                .canonicalize()
                .unwrap_or_else(|_| asset_dir.to_path_buf());
            render = render.with_image_prefix(format!("{}/", prefix.display()));
        }

        let path = layout.output_html();
        write_text(&path, &HtmlRenderer::new(render).render(&document))?;
        info!("HTML saved: {}", path.display());
        Ok(path)
    }

    /// Run every stage: assets, JSON, three Markdown variants and both HTML pages.
    pub fn process_full_pipeline(&self, pdf: &Path) -> Result<ProcessOutput> {
        info!("Starting full pipeline for: {}", pdf.display());
        let mut output = self.process_pdf_to_json(pdf)?;
        let layout = output.layout.clone();
        let dir = layout.dir();

        let variants = [
            (layout.markdown(), ImageMode::Placeholder),
            (layout.markdown_with_images(), ImageMode::Embedded),
            (layout.markdown_with_refs(), ImageMode::Referenced),
        ];
        for (path, mode) in variants {
            let options = RenderOptions::new()
                .with_image_mode(mode)
                .with_asset_dir(dir);
            write_text(&path, &MarkdownRenderer::new(options).render(&output.document))?;
            output.files.push(path);
        }

        let html = HtmlRenderer::styled(dir);
        let docling = layout.docling_html();
        write_text(&docling, &html.render_basic(&output.document))?;
        output.files.push(docling);

        let styled = layout.output_html();
        write_text(&styled, &html.render(&output.document))?;
        output.files.push(styled);

        info!("Pipeline completed: {} files written", output.files.len());
        Ok(output)
    }

    /// Run the full pipeline over every PDF in `dir`.
    pub fn batch_process(&self, dir: &Path) -> Result<BatchReport> {
        self.batch_process_with(dir, |_, _| {})
    }

    /// Like [`batch_process`](Self::batch_process), calling `on_file` with
    /// each input and whether it succeeded.
    pub fn batch_process_with<F>(&self, dir: &Path, mut on_file: F) -> Result<BatchReport>
    where
        F: FnMut(&Path, bool),
    {
        let pdfs = list_pdfs(dir)?;
        let mut report = BatchReport::default();
        if pdfs.is_empty() {
            warn!("No PDF files found in: {}", dir.display());
            return Ok(report);
        }

        info!("Found {} PDF files to process", pdfs.len());
        for pdf in &pdfs {
            match self.process_full_pipeline(pdf) {
                Ok(_) => {
                    report.record_success(pdf);
                    on_file(pdf, true);
                }
                Err(e) => {
                    if e.is_input_error() {
                        warn!("Skipping {}: {}", pdf.display(), e);
                    } else {
                        error!("Failed to process {}: {}", pdf.display(), e);
                    }
                    report.record_failure(pdf, &e);
                    on_file(pdf, false);
                }
            }
        }

        info!(
            "Batch processing completed: {} succeeded, {} failed",
            report.succeeded.len(),
            report.failed.len()
        );
        Ok(report)
    }
}

fn same_dir(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::loader::LoaderOptions;
    use crate::model::{DocumentTree, Node};
    use tempfile::TempDir;

    struct FixedLoader;

    impl DocumentLoader for FixedLoader {
        fn name(&self) -> &str {
            "fixed"
        }

        fn load(&self, _: &Path, _: &LoaderOptions) -> Result<DocumentTree> {
            Ok(DocumentTree::new()
                .with_page_count(1)
                .with_node(Node::heading("Scope", 1))
                .with_node(Node::paragraph("Body text.")))
        }
    }

    fn pipeline(out: &Path) -> Pipeline {
        let options = PipelineOptions::new().with_output_dir(out);
        Pipeline::with_loader(options, Box::new(FixedLoader)).unwrap()
    }

    #[test]
    fn test_rejects_invalid_options() {
        let options = PipelineOptions::new().with_image_scale(9.0);
        assert!(Pipeline::with_loader(options, Box::new(FixedLoader)).is_err());
    }

    #[test]
    fn test_json_stage() {
        let dir = TempDir::new().unwrap();
        let pdf = dir.path().join("memo.pdf");
        std::fs::write(&pdf, b"%PDF-1.7\n").unwrap();
        let out = dir.path().join("out");

        let output = pipeline(&out).process_pdf_to_json(&pdf).unwrap();
        assert_eq!(output.document.content.len(), 2);
        assert_eq!(
            output.document.metadata.source_file.as_deref(),
            Some("memo.pdf")
        );
        assert!(out.join("memo_structured.json").exists());
        assert!(out.join("memo_section_summary.json").exists());
    }

    #[test]
    fn test_missing_input() {
        let dir = TempDir::new().unwrap();
        let err = pipeline(dir.path())
            .process_pdf_to_json(&dir.path().join("absent.pdf"))
            .unwrap_err();
        assert!(matches!(err, Error::InputNotFound(_)));
    }

    #[test]
    fn test_html_requires_schema() {
        let dir = TempDir::new().unwrap();
        let json = dir.path().join("bad_structured.json");
        std::fs::write(&json, "{\"content\": \"nope\"}").unwrap();
        let err = pipeline(dir.path()).generate_html_from_json(&json).unwrap_err();
        assert!(matches!(err, Error::MalformedDocument(_)));
    }
}
