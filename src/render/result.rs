//! Document statistics shown in rendered output and CLI summaries.

use crate::model::{RecordKind, StructuredDocument};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Counts over a structured document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionStats {
    /// Pages in the source
    pub page_count: u32,

    /// Records in `content`
    pub total_items: usize,

    /// Heading records
    pub heading_count: usize,

    /// Paragraph records
    pub paragraph_count: usize,

    /// Tables
    pub table_count: usize,

    /// Images
    pub image_count: usize,

    /// Reference entries
    pub reference_count: usize,

    /// Distinct top-level sections
    pub section_count: usize,

    /// Approximate word count (whitespace-separated tokens)
    pub word_count: usize,

    /// Character count (excluding whitespace)
    pub char_count: usize,
}

impl ExtractionStats {
    /// Create new empty statistics.
    pub fn new() -> Self {
        Self::default()
    }

    /// Collect statistics from `doc`.
    pub fn from_document(doc: &StructuredDocument) -> Self {
        let mut stats = Self {
            page_count: doc.metadata.page_count,
            total_items: doc.content.len(),
            heading_count: doc.count(RecordKind::Heading),
            paragraph_count: doc.count(RecordKind::Paragraph),
            table_count: doc.tables.len(),
            image_count: doc.images.len(),
            reference_count: doc.references.len(),
            ..Self::default()
        };

        let sections: BTreeSet<&str> = doc
            .content
            .iter()
            .filter_map(|r| r.section.parent_section.as_deref())
            .collect();
        stats.section_count = sections.len();

        for record in doc.content.iter().chain(&doc.references) {
            if let Some(text) = &record.text {
                stats.count_text(text);
            }
        }
        stats
    }

    /// Add word and character counts from text.
    pub fn count_text(&mut self, text: &str) {
        self.word_count += text.split_whitespace().count();
        self.char_count += text.chars().filter(|c| !c.is_whitespace()).count();
    }

    /// Labelled counts by content type, in display order.
    pub fn content_types(&self) -> Vec<(&'static str, usize)> {
        vec![
            ("heading", self.heading_count),
            ("paragraph", self.paragraph_count),
            ("table", self.table_count),
            ("image", self.image_count),
            ("reference", self.reference_count),
        ]
    }
}
