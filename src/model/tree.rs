//! Hierarchical document tree produced by a [`DocumentLoader`](crate::loader::DocumentLoader).
//!
//! Mirrors what the external loader knows
//! about a document: typed nodes in reading order, their provenance, and any
//! raster the loader rendered for them.

use super::TableData;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};

/// A loaded document, ready for structured extraction.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentTree {
    /// Document name reported by the loader (usually the file stem)
    pub name: Option<String>,

    /// Number of pages in the source document
    pub page_count: u32,

    /// Top-level nodes in reading order
    pub nodes: Vec<Node>,
}

impl DocumentTree {
    /// Create an empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the document name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the page count.
    pub fn with_page_count(mut self, pages: u32) -> Self {
        self.page_count = pages;
        self
    }

    /// Append a top-level node.
    pub fn push(&mut self, node: Node) {
        self.nodes.push(node);
    }

    /// Builder form of [`push`](Self::push).
    pub fn with_node(mut self, node: Node) -> Self {
        self.nodes.push(node);
        self
    }

    /// Document title: the first `Title` node, else the loader's name.
    pub fn title(&self) -> Option<String> {
        self.walk()
            .find_map(|node| match &node.kind {
                NodeKind::Title { text } if !text.trim().is_empty() => Some(text.clone()),
                _ => None,
            })
            .or_else(|| self.name.clone())
    }

    /// Total number of nodes, including nested ones.
    pub fn node_count(&self) -> usize {
        self.walk().count()
    }

    /// Depth-first iterator over every node in reading order.
    pub fn walk(&self) -> Walk<'_> {
        Walk {
            stack: self.nodes.iter().rev().collect(),
        }
    }

    /// Raster the loader rendered for `node`, if any.
    ///
    /// Per-element rendering is the loader's job; the tree only hands back
    /// what was produced during loading.
    pub fn render_element<'a>(&self, node: &'a Node) -> Option<&'a ElementImage> {
        node.image.as_ref()
    }

    /// Whether the tree has no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Depth-first pre-order traversal of a [`DocumentTree`].
pub struct Walk<'a> {
    stack: Vec<&'a Node>,
}

impl<'a> Iterator for Walk<'a> {
    type Item = &'a Node;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children.iter().rev());
        Some(node)
    }
}

/// A single element of the document tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    /// What this node is
    pub kind: NodeKind,

    /// Where it came from in the source
    pub provenance: Option<Provenance>,

    /// Raster rendered by the loader (tables and pictures)
    pub image: Option<ElementImage>,

    /// Child nodes in reading order
    pub children: Vec<Node>,
}

impl Node {
    /// Create a node of the given kind.
    pub fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            provenance: None,
            image: None,
            children: Vec::new(),
        }
    }

    /// Document title node.
    pub fn title(text: impl Into<String>) -> Self {
        Self::new(NodeKind::Title { text: text.into() })
    }

    /// Section heading at `level` (1 = top level).
    pub fn heading(text: impl Into<String>, level: u8) -> Self {
        Self::new(NodeKind::SectionHeader {
            text: text.into(),
            level: level.max(1),
        })
    }

    /// Body text.
    pub fn paragraph(text: impl Into<String>) -> Self {
        Self::text(TextLabel::Paragraph, text)
    }

    /// Text with an explicit label.
    pub fn text(label: TextLabel, text: impl Into<String>) -> Self {
        Self::new(NodeKind::Text {
            label,
            text: text.into(),
        })
    }

    /// Table node.
    pub fn table(data: TableData) -> Self {
        Self::new(NodeKind::Table {
            data,
            caption: None,
        })
    }

    /// Picture node.
    pub fn picture() -> Self {
        Self::new(NodeKind::Picture { caption: None })
    }

    /// Grouping container (lists, key-value areas, ...).
    pub fn group(label: impl Into<String>) -> Self {
        Self::new(NodeKind::Group {
            label: label.into(),
        })
    }

    /// Set the caption of a table or picture; ignored for other kinds.
    pub fn with_caption(mut self, text: impl Into<String>) -> Self {
        match &mut self.kind {
            NodeKind::Table { caption, .. } | NodeKind::Picture { caption } => {
                *caption = Some(text.into());
            }
            _ => {}
        }
        self
    }

    /// Set the source page.
    pub fn with_page(mut self, page: u32) -> Self {
        self.provenance = Some(Provenance { page, bbox: None });
        self
    }

    /// Set the full provenance.
    pub fn with_provenance(mut self, provenance: Provenance) -> Self {
        self.provenance = Some(provenance);
        self
    }

    /// Attach a rendered raster.
    pub fn with_image(mut self, image: ElementImage) -> Self {
        self.image = Some(image);
        self
    }

    /// Append a child node.
    pub fn with_child(mut self, child: Node) -> Self {
        self.children.push(child);
        self
    }

    /// Source page, if known.
    pub fn page(&self) -> Option<u32> {
        self.provenance.as_ref().map(|p| p.page)
    }

    /// Text carried by the node itself (titles, headings, text).
    pub fn text_content(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Title { text }
            | NodeKind::SectionHeader { text, .. }
            | NodeKind::Text { text, .. } => Some(text),
            _ => None,
        }
    }
}

/// Node type as understood by the extractor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NodeKind {
    /// Document title; treated as a level-1 heading
    Title {
        /// Title text
        text: String,
    },

    /// Section heading
    SectionHeader {
        /// Heading text
        text: String,
        /// Heading depth (1 = top level)
        level: u8,
    },

    /// A run of body text
    Text {
        /// Loader label
        label: TextLabel,
        /// Text content
        text: String,
    },

    /// Table with its cell grid
    Table {
        /// Cell data
        data: TableData,
        /// Caption text
        caption: Option<String>,
    },

    /// Figure or embedded picture
    Picture {
        /// Caption text
        caption: Option<String>,
    },

    /// Structural container without content of its own
    Group {
        /// Loader label (list, chapter, ...)
        label: String,
    },

    /// Anything the loader reported that we do not recognise
    Unknown {
        /// Raw loader label
        label: String,
    },
}

impl NodeKind {
    /// Short name used in log messages.
    pub fn name(&self) -> &str {
        match self {
            NodeKind::Title { .. } => "title",
            NodeKind::SectionHeader { .. } => "section_header",
            NodeKind::Text { label, .. } => label.as_str(),
            NodeKind::Table { .. } => "table",
            NodeKind::Picture { .. } => "picture",
            NodeKind::Group { .. } => "group",
            NodeKind::Unknown { label } => label,
        }
    }
}

/// Label of a text node.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextLabel {
    /// Ordinary body text
    #[default]
    Paragraph,
    /// Bullet or numbered list entry
    ListItem,
    /// Caption not attached to a table or picture
    Caption,
    /// Footnote text
    Footnote,
    /// Source code block
    Code,
    /// Mathematical formula
    Formula,
    /// Bibliography entry
    Reference,
}

impl TextLabel {
    /// Parse a loader label, returning `None` for labels that are not text.
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "text" | "paragraph" => Some(TextLabel::Paragraph),
            "list_item" => Some(TextLabel::ListItem),
            "caption" => Some(TextLabel::Caption),
            "footnote" => Some(TextLabel::Footnote),
            "code" => Some(TextLabel::Code),
            "formula" => Some(TextLabel::Formula),
            "reference" => Some(TextLabel::Reference),
            _ => None,
        }
    }

    /// Label as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            TextLabel::Paragraph => "paragraph",
            TextLabel::ListItem => "list_item",
            TextLabel::Caption => "caption",
            TextLabel::Footnote => "footnote",
            TextLabel::Code => "code",
            TextLabel::Formula => "formula",
            TextLabel::Reference => "reference",
        }
    }
}

/// Source location of a node.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Provenance {
    /// 1-based page number
    pub page: u32,
    /// Bounding box on the page, in points
    pub bbox: Option<BoundingBox>,
}

/// Axis-aligned box on a page.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
}

/// Raster image of an element, as rendered by the loader.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementImage {
    /// MIME type of `data` (normally `image/png`)
    pub mime_type: String,

    /// Encoded image bytes
    #[serde(skip)]
    pub data: Vec<u8>,

    /// Pixel width, if reported
    pub width: Option<u32>,

    /// Pixel height, if reported
    pub height: Option<u32>,

    /// Render resolution, if reported
    pub dpi: Option<u32>,
}

impl ElementImage {
    /// Create a PNG image from raw bytes.
    pub fn png(data: Vec<u8>) -> Self {
        Self {
            mime_type: "image/png".to_string(),
            data,
            width: None,
            height: None,
            dpi: None,
        }
    }

    /// Decode a `data:<mime>;base64,<payload>` URI.
    ///
    /// Returns `None` for anything that is not a base64 data URI.
    pub fn from_data_uri(uri: &str) -> Option<Self> {
        let rest = uri.strip_prefix("data:")?;
        let (header, payload) = rest.split_once(',')?;
        let mime_type = header.strip_suffix(";base64")?;
        let data = STANDARD.decode(payload.trim()).ok()?;
        Some(Self {
            mime_type: if mime_type.is_empty() {
                "application/octet-stream".to_string()
            } else {
                mime_type.to_string()
            },
            data,
            width: None,
            height: None,
            dpi: None,
        })
    }

    /// Encode as a `data:` URI.
    pub fn to_data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, STANDARD.encode(&self.data))
    }

    /// Whether the payload is empty.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}
