//! End-to-end tests driven by a Docling JSON export.

use std::path::Path;

use chunk_monkey::loader::{DoclingJsonLoader, DocumentLoader, LoaderOptions};
use chunk_monkey::model::RecordKind;
use chunk_monkey::pipeline::{Pipeline, PipelineOptions};
use chunk_monkey::{section_summary, Error};
use tempfile::TempDir;

const EXPORT: &str = r##"{
    "name": "study",
    "body": {"label": "unspecified", "children": [
        {"$ref": "#/texts/0"},
        {"$ref": "#/texts/1"},
        {"$ref": "#/texts/2"},
        {"$ref": "#/texts/3"},
        {"$ref": "#/pictures/0"},
        {"$ref": "#/texts/5"},
        {"$ref": "#/tables/0"},
        {"$ref": "#/texts/7"},
        {"$ref": "#/texts/8"},
        {"$ref": "#/texts/9"}
    ]},
    "texts": [
        {"label": "page_header", "text": "Journal of Tests", "content_layer": "furniture"},
        {"label": "title", "text": "A Study of Chunking", "prov": [{"page_no": 1}]},
        {"label": "section_header", "text": "Methods", "level": 1, "prov": [{"page_no": 1}]},
        {"label": "text", "text": "We split documents by heading.", "prov": [{"page_no": 1}]},
        {"label": "caption", "text": "Figure 1: Pipeline overview"},
        {"label": "section_header", "text": "Data", "level": 2, "prov": [{"page_no": 2}]},
        {"label": "caption", "text": "Table 1: Corpus"},
        {"label": "section_header", "text": "References", "level": 1, "prov": [{"page_no": 3}]},
        {"label": "text", "text": "[1] Doe, J. Chunking. 2021.", "prov": [{"page_no": 3}]},
        {"label": "page_footer", "text": "3", "content_layer": "furniture"}
    ],
    "tables": [{
        "captions": [{"$ref": "#/texts/6"}],
        "prov": [{"page_no": 2}],
        "data": {"num_rows": 2, "num_cols": 2, "table_cells": [
            {"text": "corpus", "start_row_offset_idx": 0, "start_col_offset_idx": 0, "column_header": true},
            {"text": "docs", "start_row_offset_idx": 0, "start_col_offset_idx": 1, "column_header": true},
            {"text": "arxiv", "start_row_offset_idx": 1, "start_col_offset_idx": 0},
            {"text": "120", "start_row_offset_idx": 1, "start_col_offset_idx": 1}
        ]}
    }],
    "pictures": [{
        "captions": [{"$ref": "#/texts/4"}],
        "prov": [{"page_no": 1}],
        "image": {"mimetype": "image/png", "uri": "data:image/png;base64,iVBORw=="}
    }],
    "pages": {"1": {"page_no": 1}, "2": {"page_no": 2}, "3": {"page_no": 3}}
}"##;

struct Workspace {
    _tmp: TempDir,
    pdf: std::path::PathBuf,
    export: std::path::PathBuf,
    out: std::path::PathBuf,
}

fn workspace() -> Workspace {
    let tmp = TempDir::new().unwrap();
    let pdf = tmp.path().join("study.pdf");
    std::fs::write(&pdf, b"%PDF-1.5\n%fixture\n").unwrap();
    let export = tmp.path().join("exports");
    std::fs::create_dir(&export).unwrap();
    std::fs::write(export.join("study.json"), EXPORT).unwrap();
    let out = tmp.path().join("out");
    Workspace {
        pdf,
        export,
        out,
        _tmp: tmp,
    }
}

fn pipeline(ws: &Workspace) -> Pipeline {
    Pipeline::with_loader(
        PipelineOptions::new().with_output_dir(&ws.out),
        Box::new(DoclingJsonLoader::with_export_dir(&ws.export)),
    )
    .unwrap()
}

#[test]
fn test_export_resolves_to_tree() {
    let ws = workspace();
    let loader = DoclingJsonLoader::with_export_dir(&ws.export);
    let tree = loader.load(&ws.pdf, &LoaderOptions::default()).unwrap();

    assert_eq!(tree.page_count, 3);
    assert_eq!(tree.nodes.len(), 8);
    assert!(tree.nodes.iter().all(|n| n.page() != Some(0)));
}

#[test]
fn test_missing_export_is_loader_error() {
    let ws = workspace();
    let loader = DoclingJsonLoader::with_export_dir(ws.out.clone());
    let err = loader
        .load(&ws.pdf, &LoaderOptions::default())
        .unwrap_err();
    assert!(matches!(err, Error::Loader(_)));
}

#[test]
fn test_structured_output_from_export() {
    let ws = workspace();
    let output = pipeline(&ws).process_pdf_to_json(&ws.pdf).unwrap();
    let doc = &output.document;

    assert_eq!(doc.metadata.title.as_deref(), Some("A Study of Chunking"));
    assert_eq!(doc.metadata.page_count, 3);
    assert!(doc
        .content
        .iter()
        .all(|r| r.text.as_deref() != Some("Journal of Tests")));

    let paragraph = doc
        .content
        .iter()
        .find(|r| r.kind == RecordKind::Paragraph)
        .unwrap();
    assert_eq!(paragraph.section.section_hierarchy, vec!["Methods".to_string()]);

    assert_eq!(doc.images.len(), 1);
    assert_eq!(doc.images[0].caption.as_deref(), Some("Figure 1: Pipeline overview"));
    assert_eq!(doc.images[0].image_filename.as_deref(), Some("study-picture-1.png"));
    assert_eq!(
        std::fs::read(ws.out.join("study-picture-1.png")).unwrap(),
        vec![0x89, b'P', b'N', b'G']
    );

    assert_eq!(doc.tables.len(), 1);
    assert_eq!(doc.tables[0].caption.as_deref(), Some("Table 1: Corpus"));
    assert_eq!(doc.tables[0].num_rows, 2);
    assert!(doc.tables[0].asset.is_none());
    assert_eq!(
        doc.tables[0].section.section_hierarchy,
        vec!["Methods".to_string(), "Data".to_string()]
    );

    assert_eq!(doc.references.len(), 1);
    assert!(doc
        .content
        .iter()
        .all(|r| r.text.as_deref() != Some("[1] Doe, J. Chunking. 2021.")));

    let summary = section_summary(doc);
    assert_eq!(summary["Methods"].subsections, vec!["Data".to_string()]);
    assert_eq!(summary["References"].reference_count, 1);
}

#[test]
fn test_full_pipeline_from_export() {
    let ws = workspace();
    pipeline(&ws).process_full_pipeline(&ws.pdf).unwrap();

    let md = std::fs::read_to_string(ws.out.join("study.md")).unwrap();
    assert!(md.starts_with("# A Study of Chunking"));
    assert!(md.contains("# Methods"));
    assert!(md.contains("## Data"));
    assert!(md.contains("| corpus | docs |"));
    assert!(md.contains("# References\n\n[1] Doe, J. Chunking. 2021."));
    assert_eq!(md.matches("References").count(), 1);
    assert!(!md.contains("Journal of Tests"));

    let refs = std::fs::read_to_string(ws.out.join("study-with-image-refs.md")).unwrap();
    assert!(refs.contains("![Figure 1: Pipeline overview](study-picture-1.png)"));

    let html = std::fs::read_to_string(ws.out.join("study_output.html")).unwrap();
    assert!(html.contains("<title>A Study of Chunking</title>"));
    assert!(html.contains("<th>corpus</th>"));
    assert!(html.contains("Doe, J. Chunking."));
}

#[test]
fn test_html_from_copied_json_uses_absolute_asset_paths() {
    let ws = workspace();
    let pipeline = pipeline(&ws);
    let output = pipeline.process_pdf_to_json(&ws.pdf).unwrap();

    let other = ws.out.parent().unwrap().join("html");
    let html_pipeline = Pipeline::with_loader(
        PipelineOptions::new().with_output_dir(&other),
        Box::new(DoclingJsonLoader::new()),
    )
    .unwrap();
    let page = html_pipeline
        .generate_html_from_json(&output.json_path())
        .unwrap();
    assert_eq!(page, other.join("study_output.html"));

    let html = std::fs::read_to_string(page).unwrap();
    let asset = ws.out.canonicalize().unwrap().join("study-picture-1.png");
    assert!(html.contains(&format!("src=\"{}\"", asset.display())));
    assert!(Path::new(&asset).exists());
}
