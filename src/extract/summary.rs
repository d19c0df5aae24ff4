//! Per-section summaries and filtering over a structured document.

use crate::model::{
    ContentRecord, ImageRecord, RecordKind, SectionContext, StructuredDocument, TableRecord,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Key used for records outside any section.
pub const UNKNOWN_SECTION: &str = "Unknown";

/// Content counts for one top-level section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionSummary {
    /// Heading and paragraph records
    pub content_count: usize,
    /// Tables
    pub table_count: usize,
    /// Images
    pub image_count: usize,
    /// Reference entries
    pub reference_count: usize,
    /// Distinct subsections, sorted
    pub subsections: Vec<String>,
}

#[derive(Clone, Copy)]
enum Tally {
    Content,
    Table,
    Image,
    Reference,
}

type Counts = BTreeMap<String, (SectionSummary, BTreeSet<String>)>;

fn bump(counts: &mut Counts, section: &SectionContext, tally: Tally) {
    let key = section
        .parent_section
        .clone()
        .unwrap_or_else(|| UNKNOWN_SECTION.to_string());
    let (summary, subsections) = counts.entry(key).or_default();
    match tally {
        Tally::Content => summary.content_count += 1,
        Tally::Table => summary.table_count += 1,
        Tally::Image => summary.image_count += 1,
        Tally::Reference => summary.reference_count += 1,
    }
    if let Some(sub) = &section.subsection {
        subsections.insert(sub.clone());
    }
}

/// Summarise `doc` by `parent_section`.
pub fn section_summary(doc: &StructuredDocument) -> BTreeMap<String, SectionSummary> {
    let mut counts = Counts::new();

    for record in &doc.content {
        if matches!(record.kind, RecordKind::Heading | RecordKind::Paragraph) {
            bump(&mut counts, &record.section, Tally::Content);
        }
    }
    for table in &doc.tables {
        bump(&mut counts, &table.section, Tally::Table);
    }
    for image in &doc.images {
        bump(&mut counts, &image.section, Tally::Image);
    }
    for reference in &doc.references {
        bump(&mut counts, &reference.section, Tally::Reference);
    }

    counts
        .into_iter()
        .map(|(name, (mut summary, subsections))| {
            summary.subsections = subsections.into_iter().collect();
            (name, summary)
        })
        .collect()
}

/// Records belonging to a section, by list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SectionFilter {
    pub content: Vec<ContentRecord>,
    pub tables: Vec<TableRecord>,
    pub images: Vec<ImageRecord>,
    pub references: Vec<ContentRecord>,
}

impl SectionFilter {
    /// Total number of matched records.
    pub fn len(&self) -> usize {
        self.content.len() + self.tables.len() + self.images.len() + self.references.len()
    }

    /// Whether nothing matched.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Select records whose section path mentions `section_name`
/// (case-insensitive substring).
pub fn filter_by_section(doc: &StructuredDocument, section_name: &str) -> SectionFilter {
    let needle = section_name.to_lowercase();
    SectionFilter {
        content: doc
            .content
            .iter()
            .filter(|r| r.section.matches(&needle))
            .cloned()
            .collect(),
        tables: doc
            .tables
            .iter()
            .filter(|t| t.section.matches(&needle))
            .cloned()
            .collect(),
        images: doc
            .images
            .iter()
            .filter(|i| i.section.matches(&needle))
            .cloned()
            .collect(),
        references: doc
            .references
            .iter()
            .filter(|r| r.section.matches(&needle))
            .cloned()
            .collect(),
    }
}
