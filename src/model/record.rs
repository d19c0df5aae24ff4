//! Flattened content records.

use serde::{Deserialize, Serialize};

/// Kind of a [`ContentRecord`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    /// Section heading or document title
    Heading,
    /// Any body text (paragraphs, list items, captions, code, ...)
    Paragraph,
    /// Table placeholder; details live in `tables`
    Table,
    /// Picture placeholder; details live in `images`
    Image,
}

impl RecordKind {
    /// Kind as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordKind::Heading => "heading",
            RecordKind::Paragraph => "paragraph",
            RecordKind::Table => "table",
            RecordKind::Image => "image",
        }
    }
}

/// Section path of a record at the point it was emitted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionContext {
    /// Enclosing heading titles, outermost first
    #[serde(default)]
    pub section_hierarchy: Vec<String>,

    /// Top-level enclosing section
    #[serde(default)]
    pub parent_section: Option<String>,

    /// Innermost enclosing subsection, when nested below the top level
    #[serde(default)]
    pub subsection: Option<String>,
}

impl SectionContext {
    /// Build a context from a heading chain.
    pub fn from_path(path: &[String]) -> Self {
        Self {
            section_hierarchy: path.to_vec(),
            parent_section: path.first().cloned(),
            subsection: if path.len() > 1 {
                path.last().cloned()
            } else {
                None
            },
        }
    }

    /// Whether the record sits outside any section.
    pub fn is_root(&self) -> bool {
        self.section_hierarchy.is_empty()
    }

    /// Case-insensitive substring match against the hierarchy, falling back
    /// to `parent_section` when the hierarchy is empty.
    pub fn matches(&self, needle_lower: &str) -> bool {
        if !self.section_hierarchy.is_empty() {
            return self
                .section_hierarchy
                .iter()
                .any(|s| s.to_lowercase().contains(needle_lower));
        }
        self.parent_section
            .as_deref()
            .map(|p| p.to_lowercase().contains(needle_lower))
            .unwrap_or(false)
    }
}

/// One unit of flattened document content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentRecord {
    /// Record kind
    #[serde(rename = "type")]
    pub kind: RecordKind,

    /// Text for headings and paragraphs
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    /// Heading depth
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<u8>,

    /// 1-based index among records of the same kind (tables and images)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<u32>,

    /// Source page (tables and images)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,

    /// Stable label such as `table_1` (tables and images)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    /// Section path
    #[serde(flatten)]
    pub section: SectionContext,
}

impl ContentRecord {
    /// Heading record.
    pub fn heading(text: impl Into<String>, level: u8, section: SectionContext) -> Self {
        Self {
            kind: RecordKind::Heading,
            text: Some(text.into()),
            level: Some(level),
            index: None,
            page: None,
            label: None,
            section,
        }
    }

    /// Paragraph record.
    pub fn paragraph(text: impl Into<String>, section: SectionContext) -> Self {
        Self {
            kind: RecordKind::Paragraph,
            text: Some(text.into()),
            level: None,
            index: None,
            page: None,
            label: None,
            section,
        }
    }

    /// Table placeholder record.
    pub fn table(index: u32, page: Option<u32>, section: SectionContext) -> Self {
        Self {
            kind: RecordKind::Table,
            text: None,
            level: None,
            index: Some(index),
            page,
            label: Some(format!("table_{}", index)),
            section,
        }
    }

    /// Image placeholder record.
    pub fn image(index: u32, page: Option<u32>, section: SectionContext) -> Self {
        Self {
            kind: RecordKind::Image,
            text: None,
            level: None,
            index: Some(index),
            page,
            label: Some(format!("image_{}", index)),
            section,
        }
    }

    /// Whether this is a heading.
    pub fn is_heading(&self) -> bool {
        self.kind == RecordKind::Heading
    }

    /// Text, or empty for tables and images.
    pub fn text_or_empty(&self) -> &str {
        self.text.as_deref().unwrap_or("")
    }
}
