//! The structured JSON document consumed by the renderers.
//!
//! The serialized shape of [`StructuredDocument`] is a stable contract for
//! downstream consumers; field names here are part of that contract.

use super::{ContentRecord, RecordKind, SectionContext};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Version stamped into every document's metadata.
pub const PROCESSOR_VERSION: &str = "1.0.0";

/// Flattened document: ordered content plus parallel table, image, and
/// reference lists.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StructuredDocument {
    /// Document-level metadata
    pub metadata: DocumentMetadata,

    /// All records in reading order
    #[serde(default)]
    pub content: Vec<ContentRecord>,

    /// Table details, ordered by index
    #[serde(default)]
    pub tables: Vec<TableRecord>,

    /// Image details, ordered by index
    #[serde(default)]
    pub images: Vec<ImageRecord>,

    /// Text found inside a references/bibliography section
    #[serde(default)]
    pub references: Vec<ContentRecord>,
}

impl StructuredDocument {
    /// Look up a table by its 1-based index.
    pub fn table(&self, index: u32) -> Option<&TableRecord> {
        self.tables.iter().find(|t| t.index == index)
    }

    /// Look up an image by its 1-based index.
    pub fn image(&self, index: u32) -> Option<&ImageRecord> {
        self.images.iter().find(|i| i.index == index)
    }

    /// Heading records in order.
    pub fn headings(&self) -> impl Iterator<Item = &ContentRecord> {
        self.content.iter().filter(|r| r.kind == RecordKind::Heading)
    }

    /// Number of content records of `kind`.
    pub fn count(&self, kind: RecordKind) -> usize {
        self.content.iter().filter(|r| r.kind == kind).count()
    }

    /// Document title for display, falling back to the source file name.
    pub fn display_title(&self) -> String {
        self.metadata
            .title
            .clone()
            .or_else(|| self.metadata.source_file.clone())
            .unwrap_or_else(|| "Document".to_string())
    }

    /// Whether nothing was extracted.
    pub fn is_empty(&self) -> bool {
        self.content.is_empty() && self.references.is_empty()
    }
}

/// Document metadata copied from the loader summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    /// Document title
    pub title: Option<String>,

    /// Number of pages
    pub page_count: u32,

    /// When extraction ran
    pub processing_timestamp: DateTime<Utc>,

    /// Number of tree nodes visited
    pub total_items: usize,

    /// Version of the extractor that produced this document
    pub processor_version: String,

    /// Source file name
    #[serde(default)]
    pub source_file: Option<String>,

    /// Settings the document was produced with
    pub configuration: ExtractionSettings,
}

impl Default for DocumentMetadata {
    fn default() -> Self {
        Self {
            title: None,
            page_count: 0,
            processing_timestamp: Utc::now(),
            total_items: 0,
            processor_version: PROCESSOR_VERSION.to_string(),
            source_file: None,
            configuration: ExtractionSettings::default(),
        }
    }
}

impl DocumentMetadata {
    /// Convert metadata to YAML frontmatter format.
    pub fn to_yaml_frontmatter(&self) -> String {
        let mut lines = vec!["---".to_string()];

        if let Some(ref title) = self.title {
            lines.push(format!("title: \"{}\"", escape_yaml(title)));
        }
        if let Some(ref source) = self.source_file {
            lines.push(format!("source: \"{}\"", escape_yaml(source)));
        }
        lines.push(format!("pages: {}", self.page_count));
        lines.push(format!(
            "processed: {}",
            self.processing_timestamp.to_rfc3339()
        ));
        lines.push(format!("processor_version: \"{}\"", self.processor_version));

        lines.push("---".to_string());
        lines.push(String::new());

        lines.join("\n")
    }
}

fn escape_yaml(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
}

/// Extraction settings recorded in the metadata block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionSettings {
    /// Raster scale requested from the loader
    pub image_scale: f32,
    /// Whether references sections were split out
    pub detect_references: bool,
    /// Minimum trimmed text length kept
    pub min_text_length: usize,
}

impl Default for ExtractionSettings {
    fn default() -> Self {
        Self {
            image_scale: 2.0,
            detect_references: true,
            min_text_length: 0,
        }
    }
}

/// Kind of extracted asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetKind {
    /// Rendered table
    Table,
    /// Picture/figure
    Picture,
}

impl AssetKind {
    /// Tag used in asset file names (`<stem>-<tag>-<n>.png`).
    pub fn file_tag(&self) -> &'static str {
        match self {
            AssetKind::Table => "table",
            AssetKind::Picture => "picture",
        }
    }
}

/// Reference from a table/image entry to its raster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AssetRef {
    /// PNG written next to the other outputs
    File {
        /// Path relative to the output directory
        path: String,
    },
    /// Inline payload
    Embedded {
        /// MIME type of the payload
        mime_type: String,
        /// Base64-encoded bytes
        data: String,
    },
}

impl AssetRef {
    /// File reference.
    pub fn file(path: impl Into<String>) -> Self {
        AssetRef::File { path: path.into() }
    }

    /// Embedded reference from raw bytes.
    pub fn embedded(mime_type: impl Into<String>, bytes: &[u8]) -> Self {
        AssetRef::Embedded {
            mime_type: mime_type.into(),
            data: STANDARD.encode(bytes),
        }
    }

    /// Relative file path, for file references.
    pub fn path(&self) -> Option<&str> {
        match self {
            AssetRef::File { path } => Some(path),
            AssetRef::Embedded { .. } => None,
        }
    }

    /// `data:` URI, for embedded references.
    pub fn data_uri(&self) -> Option<String> {
        match self {
            AssetRef::Embedded { mime_type, data } => {
                Some(format!("data:{};base64,{}", mime_type, data))
            }
            AssetRef::File { .. } => None,
        }
    }
}

/// Details of one table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableRecord {
    /// 1-based table index
    pub index: u32,

    /// `table_<index>`
    pub label: String,

    /// Source page
    #[serde(default)]
    pub page: Option<u32>,

    /// Caption text
    #[serde(default)]
    pub caption: Option<String>,

    /// Table as Markdown grid text
    #[serde(default)]
    pub content: String,

    /// Grid rows
    #[serde(default)]
    pub num_rows: usize,

    /// Grid columns
    #[serde(default)]
    pub num_cols: usize,

    /// Cell text, row by row; spanning cells repeat
    #[serde(default)]
    pub rows: Vec<Vec<String>>,

    /// Rendered raster
    #[serde(default)]
    pub asset: Option<AssetRef>,

    /// Section path
    #[serde(flatten)]
    pub section: SectionContext,
}

/// Details of one picture.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageRecord {
    /// 1-based image index
    pub index: u32,

    /// `image_<index>`
    pub label: String,

    /// Source page
    #[serde(default)]
    pub page: Option<u32>,

    /// Caption text
    #[serde(default)]
    pub caption: Option<String>,

    /// File name of the written PNG, when assets go to disk
    #[serde(default)]
    pub image_filename: Option<String>,

    /// Rendered raster
    #[serde(default)]
    pub asset: Option<AssetRef>,

    /// Section path
    #[serde(flatten)]
    pub section: SectionContext,
}
