//! Structured extraction: flattening a [`DocumentTree`] into records.
//!
//! The extractor walks the tree depth-first in reading order and emits one
//! [`ContentRecord`] per heading, text run, table, and picture, each annotated
//! with the heading chain enclosing it.
//!
//! # Example
//!
//! ```
//! use chunk_monkey::extract::{ExtractOptions, NoAssets, StructuredExtractor};
//! use chunk_monkey::model::{DocumentTree, Node, TableData};
//!
//! let tree = DocumentTree::new()
//!     .with_node(Node::heading("Introduction", 1))
//!     .with_node(Node::paragraph("Chunking documents for retrieval."))
//!     .with_node(Node::table(TableData::from_rows([["a", "b"]])));
//!
//! let extractor = StructuredExtractor::new(ExtractOptions::default());
//! let doc = extractor.extract(&tree, &mut NoAssets);
//!
//! assert_eq!(doc.content.len(), 3);
//! assert_eq!(doc.content[1].section.section_hierarchy, vec!["Introduction"]);
//! assert_eq!(doc.tables[0].index, 1);
//! ```

mod assets;
mod clean;
mod sections;
mod summary;

pub use assets::{AssetSink, EmbeddedAssets, FileAssets, NoAssets};
pub use clean::TextCleaner;
pub use sections::SectionStack;
pub use summary::{filter_by_section, section_summary, SectionFilter, SectionSummary, UNKNOWN_SECTION};

use crate::model::{
    AssetKind, AssetRef, ContentRecord, DocumentMetadata, DocumentTree, ExtractionSettings,
    ImageRecord, Node, NodeKind, StructuredDocument, TableData, TableRecord, TextLabel,
    PROCESSOR_VERSION,
};
use chrono::Utc;
use log::{debug, info, warn};
use regex::Regex;

/// Keywords that open a references section by default.
pub const DEFAULT_REFERENCE_KEYWORDS: &[&str] =
    &["references", "bibliography", "citations", "works cited"];

/// Options controlling extraction.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractOptions {
    /// Paragraphs shorter than this (in characters, after trimming) are dropped;
    /// empty text is always dropped
    pub min_text_length: usize,

    /// Route text under a references heading into `references`
    pub detect_references: bool,

    /// Heading keywords that open a references section (matched on word boundaries)
    pub reference_keywords: Vec<String>,

    /// Request table rasters from the asset sink
    pub table_assets: bool,

    /// Request picture rasters from the asset sink
    pub picture_assets: bool,

    /// Image scale the loader ran with, recorded in metadata
    pub image_scale: f32,

    /// Source file name, recorded in metadata
    pub source_file: Option<String>,
}

impl ExtractOptions {
    /// Create options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the minimum text length.
    pub fn with_min_text_length(mut self, len: usize) -> Self {
        self.min_text_length = len;
        self
    }

    /// Enable or disable references detection.
    pub fn with_references(mut self, detect: bool) -> Self {
        self.detect_references = detect;
        self
    }

    /// Replace the references keywords.
    pub fn with_reference_keywords<S: Into<String>>(
        mut self,
        keywords: impl IntoIterator<Item = S>,
    ) -> Self {
        self.reference_keywords = keywords.into_iter().map(Into::into).collect();
        self
    }

    /// Enable or disable asset requests for tables and pictures.
    pub fn with_assets(mut self, tables: bool, pictures: bool) -> Self {
        self.table_assets = tables;
        self.picture_assets = pictures;
        self
    }

    /// Record the image scale.
    pub fn with_image_scale(mut self, scale: f32) -> Self {
        self.image_scale = scale;
        self
    }

    /// Record the source file name.
    pub fn with_source_file(mut self, name: impl Into<String>) -> Self {
        self.source_file = Some(name.into());
        self
    }

    fn settings(&self) -> ExtractionSettings {
        ExtractionSettings {
            image_scale: self.image_scale,
            detect_references: self.detect_references,
            min_text_length: self.min_text_length,
        }
    }
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            min_text_length: 0,
            detect_references: true,
            reference_keywords: DEFAULT_REFERENCE_KEYWORDS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            table_assets: true,
            picture_assets: true,
            image_scale: crate::loader::DEFAULT_IMAGE_SCALE,
            source_file: None,
        }
    }
}

/// Flattens document trees into [`StructuredDocument`]s.
pub struct StructuredExtractor {
    options: ExtractOptions,
    cleaner: TextCleaner,
    reference_pattern: Option<Regex>,
}

impl StructuredExtractor {
    /// Create an extractor.
    pub fn new(options: ExtractOptions) -> Self {
        let reference_pattern = if options.detect_references {
            reference_regex(&options.reference_keywords)
        } else {
            None
        };

        Self {
            options,
            cleaner: TextCleaner::new(),
            reference_pattern,
        }
    }

    /// Extraction options.
    pub fn options(&self) -> &ExtractOptions {
        &self.options
    }

    /// Flatten `tree`, handing table and picture rasters to `assets`.
    ///
    /// Never fails: unrecognised nodes and asset problems are logged and
    /// skipped so the rest of the document still comes through.
    pub fn extract(&self, tree: &DocumentTree, assets: &mut dyn AssetSink) -> StructuredDocument {
        info!("Extracting and structuring document content...");

        let mut walker = Walker {
            extractor: self,
            tree,
            assets,
            sections: SectionStack::new(),
            references_level: None,
            doc: StructuredDocument::default(),
            tables: 0,
            images: 0,
            visited: 0,
        };
        for node in &tree.nodes {
            walker.visit(node);
        }

        let mut doc = walker.doc;
        doc.metadata = DocumentMetadata {
            title: tree.title(),
            page_count: tree.page_count,
            processing_timestamp: Utc::now(),
            total_items: walker.visited,
            processor_version: PROCESSOR_VERSION.to_string(),
            source_file: self.options.source_file.clone(),
            configuration: self.options.settings(),
        };

        info!(
            "Document processing complete: {} items, {} content, {} tables, {} images, {} references",
            doc.metadata.total_items,
            doc.content.len(),
            doc.tables.len(),
            doc.images.len(),
            doc.references.len()
        );
        doc
    }

    fn is_references_heading(&self, text: &str) -> bool {
        self.reference_pattern
            .as_ref()
            .map(|re| re.is_match(text))
            .unwrap_or(false)
    }
}

fn reference_regex(keywords: &[String]) -> Option<Regex> {
    let alternatives: Vec<String> = keywords
        .iter()
        .map(|k| k.trim())
        .filter(|k| !k.is_empty())
        .map(regex::escape)
        .collect();
    if alternatives.is_empty() {
        return None;
    }

    let pattern = format!(r"(?i)\b({})\b", alternatives.join("|"));
    match Regex::new(&pattern) {
        Ok(re) => Some(re),
        Err(e) => {
            warn!("References detection disabled: {}", e);
            None
        }
    }
}

/// Traversal state for one document.
struct Walker<'a> {
    extractor: &'a StructuredExtractor,
    tree: &'a DocumentTree,
    assets: &'a mut dyn AssetSink,
    sections: SectionStack,
    /// Level of the heading that opened the active references section
    references_level: Option<u8>,
    doc: StructuredDocument,
    tables: u32,
    images: u32,
    visited: usize,
}

impl Walker<'_> {
    fn visit(&mut self, node: &Node) {
        self.visited += 1;
        if self.visited % 50 == 0 {
            debug!("Processed {} items...", self.visited);
        }

        match &node.kind {
            NodeKind::Title { text } => self.heading(text, 1),
            NodeKind::SectionHeader { text, level } => self.heading(text, (*level).max(1)),
            NodeKind::Text { label, text } => self.text(*label, text),
            NodeKind::Table { data, caption } => {
                self.table(node, data, caption.as_deref());
                return;
            }
            NodeKind::Picture { caption } => {
                self.picture(node, caption.as_deref());
                return;
            }
            NodeKind::Group { .. } => {}
            NodeKind::Unknown { label } => {
                warn!("Skipping unrecognised node type '{}'", label);
            }
        }

        for child in &node.children {
            self.visit(child);
        }
    }

    fn heading(&mut self, raw: &str, level: u8) {
        let text = self.extractor.cleaner.clean(raw);
        if text.is_empty() {
            warn!("Skipping empty level-{} heading", level);
            return;
        }

        if let Some(open) = self.references_level {
            if level <= open {
                debug!("Leaving references section at '{}'", text);
                self.references_level = None;
            }
        }

        let context = self.sections.enter(text.clone(), level);
        if self.references_level.is_none() && self.extractor.is_references_heading(&text) {
            info!("Detected references section: {}", text);
            self.references_level = Some(level);
        }
        self.doc
            .content
            .push(ContentRecord::heading(text, level, context));
    }

    fn text(&mut self, label: TextLabel, raw: &str) {
        let text = match label {
            TextLabel::Code | TextLabel::Formula => self.extractor.cleaner.clean_preformatted(raw),
            _ => self.extractor.cleaner.clean(raw),
        };

        let min = self.extractor.options.min_text_length.max(1);
        if text.chars().count() < min {
            debug!("Skipping short {} ({} chars)", label.as_str(), text.chars().count());
            return;
        }

        let record = ContentRecord::paragraph(text, self.sections.context());
        if self.references_level.is_some() {
            self.doc.references.push(record);
        } else {
            self.doc.content.push(record);
        }
    }

    fn table(&mut self, node: &Node, data: &TableData, caption: Option<&str>) {
        self.tables += 1;
        let index = self.tables;
        let context = self.sections.context();
        let caption = self.caption(caption);
        let asset = if self.extractor.options.table_assets {
            self.store_asset(AssetKind::Table, index, node)
        } else {
            None
        };

        self.doc
            .content
            .push(ContentRecord::table(index, node.page(), context.clone()));
        self.doc.tables.push(TableRecord {
            index,
            label: format!("table_{}", index),
            page: node.page(),
            caption,
            content: data.to_markdown(),
            num_rows: data.num_rows,
            num_cols: data.num_cols,
            rows: data.grid(),
            asset,
            section: context,
        });
    }

    fn picture(&mut self, node: &Node, caption: Option<&str>) {
        self.images += 1;
        let index = self.images;
        let context = self.sections.context();
        let caption = self.caption(caption);
        let asset = if self.extractor.options.picture_assets {
            self.store_asset(AssetKind::Picture, index, node)
        } else {
            None
        };

        self.doc
            .content
            .push(ContentRecord::image(index, node.page(), context.clone()));
        self.doc.images.push(ImageRecord {
            index,
            label: format!("image_{}", index),
            page: node.page(),
            caption,
            image_filename: asset.as_ref().and_then(|a| a.path()).map(str::to_string),
            asset,
            section: context,
        });
    }

    fn caption(&self, caption: Option<&str>) -> Option<String> {
        caption
            .map(|c| self.extractor.cleaner.clean(c))
            .filter(|c| !c.is_empty())
    }

    fn store_asset(&mut self, kind: AssetKind, index: u32, node: &Node) -> Option<AssetRef> {
        let Some(image) = self.tree.render_element(node) else {
            warn!("No rendered image for {} {}", kind.file_tag(), index);
            return None;
        };
        if image.is_empty() {
            warn!("Empty rendered image for {} {}", kind.file_tag(), index);
            return None;
        }

        match self.assets.store(kind, index, image) {
            Ok(asset) => asset,
            Err(e) => {
                warn!("Could not store {} {}: {}", kind.file_tag(), index, e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ElementImage, RecordKind};

    fn extract(tree: &DocumentTree) -> StructuredDocument {
        StructuredExtractor::new(ExtractOptions::default()).extract(tree, &mut NoAssets)
    }

    #[test]
    fn test_heading_record_carries_ancestors_only() {
        let tree = DocumentTree::new()
            .with_node(Node::heading("Methods", 1))
            .with_node(Node::heading("Setup", 2));
        let doc = extract(&tree);

        assert!(doc.content[0].section.section_hierarchy.is_empty());
        assert_eq!(doc.content[1].section.section_hierarchy, vec!["Methods"]);
        assert_eq!(doc.content[1].level, Some(2));
    }

    #[test]
    fn test_title_is_level_one() {
        let tree = DocumentTree::new()
            .with_node(Node::title("Paper"))
            .with_node(Node::paragraph("Abstract text"));
        let doc = extract(&tree);

        assert_eq!(doc.content[0].level, Some(1));
        assert_eq!(doc.content[1].section.parent_section.as_deref(), Some("Paper"));
        assert_eq!(doc.metadata.title.as_deref(), Some("Paper"));
    }

    #[test]
    fn test_min_text_length() {
        let tree = DocumentTree::new()
            .with_node(Node::paragraph("ok"))
            .with_node(Node::paragraph("long enough"))
            .with_node(Node::paragraph("   "));

        let doc = extract(&tree);
        assert_eq!(doc.content.len(), 2);

        let strict = StructuredExtractor::new(ExtractOptions::new().with_min_text_length(10))
            .extract(&tree, &mut NoAssets);
        assert_eq!(strict.content.len(), 1);
        assert_eq!(strict.content[0].text.as_deref(), Some("long enough"));
    }

    #[test]
    fn test_references_routing() {
        let tree = DocumentTree::new()
            .with_node(Node::heading("Discussion", 1))
            .with_node(Node::paragraph("Findings."))
            .with_node(Node::heading("References", 1))
            .with_node(Node::paragraph("[1] A. Author. A paper."))
            .with_node(Node::table(TableData::from_rows([["x"]])))
            .with_node(Node::heading("Appendix", 1))
            .with_node(Node::paragraph("Extra."));
        let doc = extract(&tree);

        let texts: Vec<&str> = doc
            .content
            .iter()
            .filter(|r| r.kind != RecordKind::Table)
            .map(|r| r.text_or_empty())
            .collect();
        assert_eq!(
            texts,
            vec!["Discussion", "Findings.", "References", "Appendix", "Extra."]
        );
        assert_eq!(doc.references.len(), 1);
        assert_eq!(
            doc.references[0].section.section_hierarchy,
            vec!["References"]
        );
        assert_eq!(doc.tables.len(), 1);
    }

    #[test]
    fn test_references_keyword_word_boundary() {
        let tree = DocumentTree::new()
            .with_node(Node::heading("Cross-referenced work", 1))
            .with_node(Node::paragraph("Body"));
        let doc = extract(&tree);
        assert!(doc.references.is_empty());

        let disabled = StructuredExtractor::new(ExtractOptions::new().with_references(false))
            .extract(
                &DocumentTree::new()
                    .with_node(Node::heading("Bibliography", 2))
                    .with_node(Node::paragraph("Entry")),
                &mut NoAssets,
            );
        assert!(disabled.references.is_empty());
        assert_eq!(disabled.content.len(), 2);
    }

    #[test]
    fn test_subheading_keeps_references_open() {
        let tree = DocumentTree::new()
            .with_node(Node::heading("Works Cited", 1))
            .with_node(Node::heading("Books", 2))
            .with_node(Node::paragraph("Entry"));
        let doc = extract(&tree);
        assert_eq!(doc.references.len(), 1);
        assert_eq!(
            doc.references[0].section.subsection.as_deref(),
            Some("Books")
        );
    }

    #[test]
    fn test_nested_keyword_heading_keeps_outer_section() {
        let tree = DocumentTree::new()
            .with_node(Node::heading("References", 1))
            .with_node(Node::heading("Citations in press", 2))
            .with_node(Node::paragraph("[1] In press."))
            .with_node(Node::heading("Books", 2))
            .with_node(Node::paragraph("[2] A book."))
            .with_node(Node::heading("Appendix", 1))
            .with_node(Node::paragraph("Extra."));
        let doc = extract(&tree);

        let refs: Vec<&str> = doc.references.iter().map(|r| r.text_or_empty()).collect();
        assert_eq!(refs, vec!["[1] In press.", "[2] A book."]);
        assert_eq!(doc.content.last().unwrap().text_or_empty(), "Extra.");
    }

    #[test]
    fn test_unknown_node_skipped_children_visited() {
        let mut unknown = Node::new(NodeKind::Unknown {
            label: "form".into(),
        });
        unknown.children.push(Node::paragraph("inside"));
        let tree = DocumentTree::new()
            .with_node(unknown)
            .with_node(Node::paragraph("after"));

        let doc = extract(&tree);
        let texts: Vec<&str> = doc.content.iter().map(|r| r.text_or_empty()).collect();
        assert_eq!(texts, vec!["inside", "after"]);
        assert_eq!(doc.metadata.total_items, 3);
    }

    #[test]
    fn test_assets_paired_by_index() {
        let tree = DocumentTree::new()
            .with_node(Node::picture().with_image(ElementImage::png(vec![1])))
            .with_node(Node::table(TableData::default()))
            .with_node(
                Node::picture()
                    .with_caption("Figure 2")
                    .with_image(ElementImage::png(vec![2])),
            );

        let doc = StructuredExtractor::new(ExtractOptions::default())
            .extract(&tree, &mut EmbeddedAssets);

        assert_eq!(doc.images.len(), 2);
        assert_eq!(doc.images[1].index, 2);
        assert_eq!(doc.images[1].caption.as_deref(), Some("Figure 2"));
        assert_eq!(
            doc.images[1].asset,
            Some(AssetRef::embedded("image/png", &[2]))
        );
        assert!(doc.tables[0].asset.is_none());
        assert!(doc.images[0].image_filename.is_none());
    }

    #[test]
    fn test_picture_children_not_emitted() {
        let tree = DocumentTree::new().with_node(
            Node::picture().with_child(Node::paragraph("axis label")),
        );
        let doc = extract(&tree);
        assert_eq!(doc.content.len(), 1);
        assert_eq!(doc.content[0].kind, RecordKind::Image);
    }

    #[test]
    fn test_metadata_configuration() {
        let options = ExtractOptions::new()
            .with_image_scale(3.0)
            .with_min_text_length(5)
            .with_source_file("paper.pdf");
        let doc = StructuredExtractor::new(options)
            .extract(&DocumentTree::new().with_page_count(4), &mut NoAssets);

        assert_eq!(doc.metadata.page_count, 4);
        assert_eq!(doc.metadata.source_file.as_deref(), Some("paper.pdf"));
        assert_eq!(doc.metadata.configuration.image_scale, 3.0);
        assert_eq!(doc.metadata.configuration.min_text_length, 5);
        assert_eq!(doc.metadata.processor_version, "1.0.0");
    }
}
