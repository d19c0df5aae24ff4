//! Integration tests for structured extraction and rendering.

use chunk_monkey::extract::{EmbeddedAssets, ExtractOptions, NoAssets, StructuredExtractor};
use chunk_monkey::model::{
    DocumentTree, ElementImage, Node, RecordKind, StructuredDocument, TableData, TextLabel,
};
use chunk_monkey::render::{
    escape_html, from_json, to_json, HtmlRenderer, ImageMode, JsonFormat, MarkdownRenderer,
    RenderOptions,
};

fn extract(tree: &DocumentTree) -> StructuredDocument {
    StructuredExtractor::new(ExtractOptions::default()).extract(tree, &mut NoAssets)
}

fn report_tree() -> DocumentTree {
    DocumentTree::new()
        .with_name("report")
        .with_page_count(3)
        .with_node(Node::title("Annual Report"))
        .with_node(Node::paragraph("Prepared for the board."))
        .with_node(Node::heading("Finances", 2))
        .with_node(
            Node::table(TableData::from_rows([["Year", "Revenue"], ["2024", "10"]]))
                .with_caption("Revenue by year")
                .with_page(1)
                .with_image(ElementImage::png(vec![1, 2, 3])),
        )
        .with_node(Node::heading("Costs", 3))
        .with_node(Node::text(TextLabel::ListItem, "Salaries"))
        .with_node(
            Node::picture()
                .with_caption("Cost breakdown")
                .with_page(2)
                .with_image(ElementImage::png(vec![4, 5])),
        )
        .with_node(Node::heading("Outlook", 2))
        .with_node(
            Node::group("list")
                .with_child(Node::paragraph("Grow."))
                .with_child(Node::picture().with_page(3)),
        )
        .with_node(Node::heading("References", 2))
        .with_node(Node::paragraph("[1] Ledger, 2024."))
}

#[test]
fn test_single_page_scenario() {
    let tree = DocumentTree::new()
        .with_page_count(1)
        .with_node(Node::heading("Introduction", 1).with_page(1))
        .with_node(Node::paragraph("This paper introduces chunking.").with_page(1))
        .with_node(
            Node::table(TableData::from_rows([["k", "v"], ["a", "1"]])).with_page(1),
        );

    let doc = extract(&tree);

    assert_eq!(doc.content.len(), 3);
    assert_eq!(
        doc.content[1].section.section_hierarchy,
        vec!["Introduction".to_string()]
    );
    assert_eq!(doc.tables.len(), 1);
    assert_eq!(doc.tables[0].index, 1);

    let md = MarkdownRenderer::plain().render(&doc);
    assert!(md.contains("This paper introduces chunking."));
    assert_eq!(md.matches("<!-- table-").count(), 1);
}

#[test]
fn test_hierarchy_follows_heading_levels() {
    let tree = DocumentTree::new()
        .with_node(Node::paragraph("preamble"))
        .with_node(Node::heading("A", 1))
        .with_node(Node::paragraph("in a"))
        .with_node(Node::heading("B", 2))
        .with_node(Node::paragraph("in b"))
        .with_node(Node::heading("C", 1))
        .with_node(Node::paragraph("in c"));

    let doc = extract(&tree);
    let paths: Vec<Vec<String>> = doc
        .content
        .iter()
        .filter(|r| r.kind == RecordKind::Paragraph)
        .map(|r| r.section.section_hierarchy.clone())
        .collect();

    assert_eq!(
        paths,
        vec![
            vec![],
            vec!["A".to_string()],
            vec!["A".to_string(), "B".to_string()],
            vec!["C".to_string()],
        ]
    );

    let preamble = &doc.content[0];
    assert_eq!(preamble.section.parent_section, None);
    assert_eq!(preamble.section.subsection, None);

    let in_b = &doc.content[4];
    assert_eq!(in_b.section.parent_section.as_deref(), Some("A"));
    assert_eq!(in_b.section.subsection.as_deref(), Some("B"));
}

#[test]
fn test_reading_order_and_contiguous_indices() {
    let doc = extract(&report_tree());

    let kinds: Vec<RecordKind> = doc.content.iter().map(|r| r.kind).collect();
    assert_eq!(
        kinds,
        vec![
            RecordKind::Heading,
            RecordKind::Paragraph,
            RecordKind::Heading,
            RecordKind::Table,
            RecordKind::Heading,
            RecordKind::Paragraph,
            RecordKind::Image,
            RecordKind::Heading,
            RecordKind::Paragraph,
            RecordKind::Image,
            RecordKind::Heading,
        ]
    );

    let table_indices: Vec<u32> = doc.tables.iter().map(|t| t.index).collect();
    let image_indices: Vec<u32> = doc.images.iter().map(|i| i.index).collect();
    assert_eq!(table_indices, vec![1]);
    assert_eq!(image_indices, vec![1, 2]);
    assert_eq!(doc.images[1].label, "image_2");

    assert_eq!(doc.references.len(), 1);
    assert_eq!(doc.references[0].text.as_deref(), Some("[1] Ledger, 2024."));

    assert_eq!(doc.metadata.title.as_deref(), Some("Annual Report"));
    assert_eq!(doc.metadata.page_count, 3);
}

#[test]
fn test_title_counts_as_level_one() {
    let doc = extract(&report_tree());
    let table = &doc.content[3];
    assert_eq!(
        table.section.section_hierarchy,
        vec!["Annual Report".to_string(), "Finances".to_string()]
    );
    assert_eq!(doc.tables[0].caption.as_deref(), Some("Revenue by year"));
    assert_eq!(doc.tables[0].rows[1], vec!["2024".to_string(), "10".to_string()]);
}

#[test]
fn test_json_round_trip_renders_all_text_in_order() {
    let doc = StructuredExtractor::new(ExtractOptions::default())
        .extract(&report_tree(), &mut EmbeddedAssets);
    let json = to_json(&doc, JsonFormat::Pretty).unwrap();
    let back: StructuredDocument = from_json(&json).unwrap();

    let md = MarkdownRenderer::new(RenderOptions::new().with_image_mode(ImageMode::Embedded))
        .render(&back);
    let mut cursor = 0;
    for record in &back.content {
        if let Some(text) = &record.text {
            let found = md[cursor..]
                .find(text.as_str())
                .unwrap_or_else(|| panic!("{:?} missing or out of order", text));
            cursor += found + text.len();
        }
    }

    for table in back.tables.iter().filter(|t| t.asset.is_some()) {
        let link = format!("![{}](data:image/png;base64,", table.label);
        assert!(md.contains(&link), "no reference for {}", table.label);
    }
    for image in back.images.iter().filter(|i| i.asset.is_some()) {
        let alt = image.caption.clone().unwrap_or_else(|| image.label.clone());
        assert!(md.contains(&format!("![{}](data:", alt)));
    }

    let html = HtmlRenderer::new(RenderOptions::new().with_image_mode(ImageMode::Embedded))
        .render(&back);
    assert!(html.contains("src=\"data:image/png;base64,AQID\""));

    let mut cursor = html
        .find("<main id=\"content-section\">")
        .expect("content section");
    for record in &back.content {
        if let Some(text) = &record.text {
            let escaped = escape_html(text);
            let found = html[cursor..]
                .find(escaped.as_str())
                .unwrap_or_else(|| panic!("{:?} missing or out of order in HTML", text));
            cursor += found + escaped.len();
        }
    }
    for reference in &back.references {
        let text = reference.text.as_deref().unwrap_or_default();
        assert!(html[cursor..].contains(&escape_html(text)));
    }
}

#[test]
fn test_extraction_is_deterministic() {
    let tree = report_tree();
    let first = extract(&tree);
    let second = extract(&tree);

    assert_eq!(first.content, second.content);
    assert_eq!(first.tables, second.tables);
    assert_eq!(first.images, second.images);
    assert_eq!(first.references, second.references);
}
