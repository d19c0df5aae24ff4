//! # chunk-monkey
//!
//! Turns PDF documents into section-aware structured JSON for chunking and
//! retrieval, plus Markdown and HTML views of the same content.
//!
//! Layout analysis and rasterisation are delegated to a document loader
//! (Docling by default); this crate flattens the loaded tree into ordered
//! records that each carry the heading path enclosing them.
//!
//! ## Quick Start
//!
//! ```no_run
//! use chunk_monkey::pipeline::{Pipeline, PipelineOptions};
//! use std::path::Path;
//!
//! fn main() -> chunk_monkey::Result<()> {
//!     let pipeline = Pipeline::new(PipelineOptions::from_env()?)?;
//!     let output = pipeline.process_pdf_to_json(Path::new("paper.pdf"))?;
//!
//!     for record in &output.document.content {
//!         println!("{:?} {:?}", record.section.section_hierarchy, record.text);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Section context**: every record carries its heading hierarchy
//! - **Asset extraction**: table and picture rasters as PNG files or inline base64
//! - **References detection**: bibliography entries split into their own list
//! - **Multiple views**: plain, image-embedded and image-referenced Markdown, styled HTML

pub mod detect;
pub mod error;
pub mod extract;
pub mod fs;
pub mod loader;
pub mod model;
pub mod pipeline;
pub mod render;

// Re-export commonly used types
pub use detect::{validate_pdf, PdfHeader};
pub use error::{Error, Result};
pub use extract::{
    filter_by_section, section_summary, AssetSink, ExtractOptions, SectionFilter, SectionSummary,
    StructuredExtractor,
};
pub use loader::{DoclingCommandLoader, DoclingJsonLoader, DocumentLoader, LoaderOptions};
pub use model::{
    AssetRef, ContentRecord, DocumentMetadata, DocumentTree, ImageRecord, Node, NodeKind,
    RecordKind, SectionContext, StructuredDocument, TableRecord,
};
pub use pipeline::{BatchReport, Pipeline, PipelineOptions};
pub use render::{ImageMode, JsonFormat, RenderOptions};

use std::path::Path;

/// Extract a PDF into a structured document without writing anything.
///
/// Uses the Docling command loader; element rasters are discarded.
///
/// # Example
///
/// ```no_run
/// use chunk_monkey::extract_file;
///
/// let doc = extract_file("paper.pdf").unwrap();
/// println!("{} records", doc.content.len());
/// ```
pub fn extract_file<P: AsRef<Path>>(path: P) -> Result<StructuredDocument> {
    let pipeline = Pipeline::new(PipelineOptions::default())?;
    pipeline.extract(path.as_ref(), &mut extract::NoAssets)
}

/// Flatten an already loaded tree with default options.
///
/// # Example
///
/// ```
/// use chunk_monkey::{extract_tree, DocumentTree, Node};
///
/// let tree = DocumentTree::new()
///     .with_node(Node::heading("Results", 1))
///     .with_node(Node::paragraph("All green."));
/// let doc = extract_tree(&tree);
/// assert_eq!(doc.content[1].section.parent_section.as_deref(), Some("Results"));
/// ```
pub fn extract_tree(tree: &DocumentTree) -> StructuredDocument {
    StructuredExtractor::new(ExtractOptions::default()).extract(tree, &mut extract::NoAssets)
}

/// Read a `_structured.json` file.
///
/// # Example
///
/// ```no_run
/// use chunk_monkey::{load_structured_json, section_summary};
///
/// let doc = load_structured_json("output/paper_structured.json").unwrap();
/// for (section, summary) in section_summary(&doc) {
///     println!("{}: {} items", section, summary.content_count);
/// }
/// ```
pub fn load_structured_json<P: AsRef<Path>>(path: P) -> Result<StructuredDocument> {
    fs::read_json(path.as_ref())
}

/// Render a structured document as plain Markdown (placeholders for assets).
///
/// # Example
///
/// ```
/// use chunk_monkey::{extract_tree, to_markdown, DocumentTree, Node};
///
/// let tree = DocumentTree::new().with_node(Node::heading("Intro", 1));
/// assert_eq!(to_markdown(&extract_tree(&tree)), "# Intro\n");
/// ```
pub fn to_markdown(doc: &StructuredDocument) -> String {
    render::MarkdownRenderer::plain().render(doc)
}

/// Serialize a structured document.
pub fn to_json(doc: &StructuredDocument, format: JsonFormat) -> Result<String> {
    render::to_json(doc, format)
}
