//! Markdown rendering for structured documents.

use super::source::asset_source;
use super::{ImageMode, RenderOptions};
use crate::model::{ContentRecord, RecordKind, StructuredDocument};
use log::warn;

/// Convert a document to Markdown.
pub fn to_markdown(doc: &StructuredDocument, options: &RenderOptions) -> String {
    MarkdownRenderer::new(options.clone()).render(doc)
}

/// Markdown renderer.
///
/// Records are emitted in their stored order, separated by blank lines.
pub struct MarkdownRenderer {
    options: RenderOptions,
}

impl MarkdownRenderer {
    /// Create a new Markdown renderer.
    pub fn new(options: RenderOptions) -> Self {
        Self { options }
    }

    /// Plain variant: placeholder comments for tables and images.
    pub fn plain() -> Self {
        Self::new(RenderOptions::default().with_image_mode(ImageMode::Placeholder))
    }

    /// Options in use.
    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    /// Render a document to Markdown.
    pub fn render(&self, doc: &StructuredDocument) -> String {
        let mut blocks: Vec<String> = Vec::new();

        for record in &doc.content {
            match record.kind {
                RecordKind::Heading => {
                    if let Some(text) = non_empty(record) {
                        let level = record
                            .level
                            .unwrap_or(1)
                            .clamp(1, self.options.max_heading_level);
                        blocks.push(format!("{} {}", "#".repeat(level as usize), text));
                    }
                }
                RecordKind::Paragraph => {
                    if let Some(text) = non_empty(record) {
                        blocks.push(text.to_string());
                    }
                }
                RecordKind::Table => self.render_table(&mut blocks, doc, record),
                RecordKind::Image => self.render_image(&mut blocks, doc, record),
            }
        }

        if self.options.include_references && !doc.references.is_empty() {
            if !references_heading_in_content(doc) {
                blocks.push("## References".to_string());
            }
            blocks.extend(
                doc.references
                    .iter()
                    .filter_map(non_empty)
                    .map(str::to_string),
            );
        }

        let mut output = String::new();
        if self.options.include_frontmatter {
            output.push_str(&doc.metadata.to_yaml_frontmatter());
            output.push('\n');
        }
        output.push_str(&blocks.join("\n\n"));
        output.push('\n');
        output
    }

    fn render_table(&self, blocks: &mut Vec<String>, doc: &StructuredDocument, record: &ContentRecord) {
        let Some(index) = record.index else {
            warn!("Table record without index skipped");
            return;
        };
        let placeholder = format!("<!-- table-{} -->", index);
        let Some(table) = doc.table(index) else {
            warn!("table_{} has no entry in the tables list", index);
            blocks.push(placeholder);
            return;
        };

        let mut parts = Vec::new();
        if let Some(caption) = table.caption.as_deref().filter(|c| !c.is_empty()) {
            parts.push(format!("*{}*", caption));
        }
        if !table.content.is_empty() {
            parts.push(table.content.trim_end().to_string());
        }
        match asset_source(&table.label, table.asset.as_ref(), &self.options) {
            Some(src) => parts.push(format!("![{}]({})", table.label, src)),
            None => parts.push(placeholder),
        }
        blocks.push(parts.join("\n\n"));
    }

    fn render_image(&self, blocks: &mut Vec<String>, doc: &StructuredDocument, record: &ContentRecord) {
        let Some(index) = record.index else {
            warn!("Image record without index skipped");
            return;
        };
        let placeholder = format!("<!-- image-{} -->", index);
        let Some(image) = doc.image(index) else {
            warn!("image_{} has no entry in the images list", index);
            blocks.push(placeholder);
            return;
        };

        let caption = image.caption.as_deref().filter(|c| !c.is_empty());
        let mut block = match asset_source(&image.label, image.asset.as_ref(), &self.options) {
            Some(src) => format!("![{}]({})", escape_alt(caption.unwrap_or(&image.label)), src),
            None => placeholder,
        };
        if let Some(caption) = caption {
            block.push_str("\n\n*");
            block.push_str(caption);
            block.push('*');
        }
        blocks.push(block);
    }
}

/// Whether the heading that opened the references section is already in `content`.
fn references_heading_in_content(doc: &StructuredDocument) -> bool {
    let Some(first) = doc.references.first() else {
        return false;
    };
    let path = &first.section.section_hierarchy;
    doc.content
        .iter()
        .filter(|r| r.kind == RecordKind::Heading)
        .filter_map(|r| r.text.as_deref())
        .any(|text| path.iter().any(|h| h == text))
}

fn non_empty(record: &ContentRecord) -> Option<&str> {
    record.text.as_deref().filter(|t| !t.trim().is_empty())
}

fn escape_alt(text: &str) -> String {
    text.replace('[', "\\[").replace(']', "\\]")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AssetRef, ImageRecord, SectionContext, TableRecord};

    fn ctx(path: &[&str]) -> SectionContext {
        let path: Vec<String> = path.iter().map(|s| s.to_string()).collect();
        SectionContext::from_path(&path)
    }

    fn sample() -> StructuredDocument {
        let mut doc = StructuredDocument::default();
        doc.content = vec![
            ContentRecord::heading("Introduction", 1, ctx(&[])),
            ContentRecord::paragraph("Some text.", ctx(&["Introduction"])),
            ContentRecord::table(1, Some(1), ctx(&["Introduction"])),
            ContentRecord::image(1, Some(1), ctx(&["Introduction"])),
        ];
        doc.tables.push(TableRecord {
            index: 1,
            label: "table_1".into(),
            page: Some(1),
            caption: Some("Results".into()),
            content: "| a | b |\n| --- | --- |\n| 1 | 2 |".into(),
            num_rows: 2,
            num_cols: 2,
            rows: vec![vec!["a".into(), "b".into()], vec!["1".into(), "2".into()]],
            asset: Some(AssetRef::embedded("image/png", b"t")),
            section: ctx(&["Introduction"]),
        });
        doc.images.push(ImageRecord {
            index: 1,
            label: "image_1".into(),
            page: Some(1),
            caption: None,
            image_filename: None,
            asset: Some(AssetRef::embedded("image/png", b"p")),
            section: ctx(&["Introduction"]),
        });
        doc
    }

    #[test]
    fn test_plain_markdown() {
        let md = MarkdownRenderer::plain().render(&sample());
        assert!(md.starts_with("# Introduction\n\nSome text.\n\n*Results*"));
        assert!(md.contains("| 1 | 2 |"));
        assert_eq!(md.matches("<!-- table-1 -->").count(), 1);
        assert_eq!(md.matches("<!-- image-1 -->").count(), 1);
        assert!(!md.contains("base64"));
        assert!(md.ends_with('\n'));
    }

    #[test]
    fn test_embedded_markdown() {
        let options = RenderOptions::new().with_image_mode(ImageMode::Embedded);
        let md = to_markdown(&sample(), &options);
        assert!(md.contains("![table_1](data:image/png;base64,"));
        assert!(md.contains("![image_1](data:image/png;base64,"));
        assert!(!md.contains("<!--"));
    }

    #[test]
    fn test_missing_asset_falls_back() {
        let mut doc = sample();
        doc.images[0].asset = None;
        let options = RenderOptions::new().with_image_mode(ImageMode::Embedded);
        let md = to_markdown(&doc, &options);
        assert!(md.contains("<!-- image-1 -->"));
    }

    #[test]
    fn test_references_appended() {
        let mut doc = sample();
        doc.references
            .push(ContentRecord::paragraph("[1] A. Author.", ctx(&["References"])));
        let md = MarkdownRenderer::plain().render(&doc);
        assert!(md.trim_end().ends_with("## References\n\n[1] A. Author."));

        let without = to_markdown(&doc, &RenderOptions::new().with_references(false));
        assert!(!without.contains("A. Author"));
    }

    #[test]
    fn test_references_under_existing_heading() {
        let mut doc = sample();
        doc.content
            .push(ContentRecord::heading("References", 1, ctx(&[])));
        doc.references
            .push(ContentRecord::paragraph("[1] A. Author.", ctx(&["References"])));
        let md = MarkdownRenderer::plain().render(&doc);
        assert_eq!(md.matches("References").count(), 1);
        assert!(md.trim_end().ends_with("# References\n\n[1] A. Author."));
    }

    #[test]
    fn test_heading_level_clamped_and_frontmatter() {
        let mut doc = StructuredDocument::default();
        doc.metadata.title = Some("T".into());
        doc.content
            .push(ContentRecord::heading("Deep", 5, SectionContext::default()));
        let options = RenderOptions::new().with_max_heading(3).with_frontmatter(true);
        let md = to_markdown(&doc, &options);
        assert!(md.starts_with("---\n"));
        assert!(md.contains("\n### Deep\n"));
    }

    #[test]
    fn test_empty_text_skipped() {
        let mut doc = StructuredDocument::default();
        doc.content.push(ContentRecord::paragraph("  ", SectionContext::default()));
        doc.content.push(ContentRecord::paragraph("kept", SectionContext::default()));
        assert_eq!(MarkdownRenderer::plain().render(&doc), "kept\n");
    }
}
