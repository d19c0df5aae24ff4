//! Reader for Docling's JSON document export.
//!
//! Docling stores items in flat collections (`texts`, `tables`, `pictures`,
//! `groups`) and links them with `{"$ref": "#/texts/3"}` pointers starting
//! from `body`. This module resolves those pointers into a [`DocumentTree`].

use super::{DocumentLoader, LoaderOptions};
use crate::error::{Error, Result};
use crate::model::{
    BoundingBox, DocumentTree, ElementImage, Node, NodeKind, Provenance, TableCell, TableData,
    TextLabel,
};
use log::{debug, warn};
use serde::Deserialize;
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

/// Nesting limit; deeper references are dropped.
const MAX_DEPTH: usize = 64;

/// Largest row or column offset accepted for a table cell.
const MAX_TABLE_EXTENT: usize = 4096;

#[derive(Debug, Deserialize)]
struct RawDocument {
    #[serde(default)]
    name: Option<String>,
    body: RawGroup,
    #[serde(default)]
    groups: Vec<RawGroup>,
    #[serde(default)]
    texts: Vec<RawText>,
    #[serde(default)]
    tables: Vec<RawTable>,
    #[serde(default)]
    pictures: Vec<RawPicture>,
    #[serde(default)]
    pages: BTreeMap<String, serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct RawRef {
    #[serde(rename = "$ref")]
    target: String,
}

#[derive(Debug, Deserialize)]
struct RawGroup {
    #[serde(default)]
    label: String,
    #[serde(default)]
    children: Vec<RawRef>,
    #[serde(default)]
    content_layer: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawText {
    #[serde(default)]
    label: String,
    #[serde(default)]
    text: String,
    #[serde(default)]
    level: Option<u8>,
    #[serde(default)]
    prov: Vec<RawProv>,
    #[serde(default)]
    children: Vec<RawRef>,
    #[serde(default)]
    content_layer: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawTable {
    #[serde(default)]
    prov: Vec<RawProv>,
    #[serde(default)]
    captions: Vec<RawRef>,
    #[serde(default)]
    data: RawTableData,
    #[serde(default)]
    image: Option<RawImage>,
    #[serde(default)]
    content_layer: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RawTableData {
    #[serde(default)]
    table_cells: Vec<RawCell>,
    #[serde(default)]
    num_rows: usize,
    #[serde(default)]
    num_cols: usize,
}

#[derive(Debug, Deserialize)]
struct RawCell {
    #[serde(default)]
    text: String,
    #[serde(default)]
    start_row_offset_idx: usize,
    #[serde(default)]
    start_col_offset_idx: usize,
    #[serde(default = "one")]
    row_span: usize,
    #[serde(default = "one")]
    col_span: usize,
    #[serde(default)]
    column_header: bool,
}

fn one() -> usize {
    1
}

#[derive(Debug, Deserialize)]
struct RawPicture {
    #[serde(default)]
    prov: Vec<RawProv>,
    #[serde(default)]
    captions: Vec<RawRef>,
    #[serde(default)]
    image: Option<RawImage>,
    #[serde(default)]
    content_layer: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawProv {
    page_no: u32,
    #[serde(default)]
    bbox: Option<RawBox>,
}

#[derive(Debug, Deserialize)]
struct RawBox {
    l: f64,
    t: f64,
    r: f64,
    b: f64,
}

#[derive(Debug, Deserialize)]
struct RawImage {
    #[serde(default)]
    mimetype: Option<String>,
    #[serde(default)]
    dpi: Option<u32>,
    #[serde(default)]
    size: Option<RawSize>,
    uri: String,
}

#[derive(Debug, Deserialize)]
struct RawSize {
    width: f64,
    height: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Target {
    Body,
    Group(usize),
    Text(usize),
    Table(usize),
    Picture(usize),
}

fn parse_ref(target: &str) -> Option<Target> {
    let path = target.strip_prefix("#/")?;
    if path == "body" {
        return Some(Target::Body);
    }
    let (collection, index) = path.split_once('/')?;
    let index: usize = index.parse().ok()?;
    match collection {
        "groups" => Some(Target::Group(index)),
        "texts" => Some(Target::Text(index)),
        "tables" => Some(Target::Table(index)),
        "pictures" => Some(Target::Picture(index)),
        _ => None,
    }
}

fn is_furniture(layer: &Option<String>) -> bool {
    layer.as_deref() == Some("furniture")
}

fn provenance(prov: &[RawProv]) -> Option<Provenance> {
    prov.first().map(|p| Provenance {
        page: p.page_no,
        bbox: p.bbox.as_ref().map(|b| BoundingBox {
            left: b.l,
            top: b.t,
            right: b.r,
            bottom: b.b,
        }),
    })
}

struct TreeBuilder<'a> {
    doc: &'a RawDocument,
    options: &'a LoaderOptions,
    base_dir: Option<&'a Path>,
    caption_refs: HashSet<&'a str>,
    /// Items already placed in the tree; each Docling item has one parent
    placed: HashSet<Target>,
}

impl<'a> TreeBuilder<'a> {
    fn new(doc: &'a RawDocument, options: &'a LoaderOptions, base_dir: Option<&'a Path>) -> Self {
        let caption_refs = doc
            .tables
            .iter()
            .flat_map(|t| t.captions.iter())
            .chain(doc.pictures.iter().flat_map(|p| p.captions.iter()))
            .map(|r| r.target.as_str())
            .collect();

        Self {
            doc,
            options,
            base_dir,
            caption_refs,
            placed: HashSet::new(),
        }
    }

    fn build(mut self) -> DocumentTree {
        let doc = self.doc;
        let mut tree = DocumentTree::new();
        tree.name = doc.name.clone();
        tree.nodes = self.children(&doc.body.children, 0);
        tree.page_count = self.page_count();
        tree
    }

    fn page_count(&self) -> u32 {
        if !self.doc.pages.is_empty() {
            return self.doc.pages.len() as u32;
        }
        let text_pages = self.doc.texts.iter().flat_map(|t| t.prov.iter());
        let table_pages = self.doc.tables.iter().flat_map(|t| t.prov.iter());
        let picture_pages = self.doc.pictures.iter().flat_map(|p| p.prov.iter());
        text_pages
            .chain(table_pages)
            .chain(picture_pages)
            .map(|p| p.page_no)
            .max()
            .unwrap_or(0)
    }

    fn children(&mut self, refs: &'a [RawRef], depth: usize) -> Vec<Node> {
        let mut nodes = Vec::new();
        for r in refs {
            if self.caption_refs.contains(r.target.as_str()) {
                continue;
            }
            if let Some(node) = self.resolve(&r.target, depth + 1) {
                nodes.push(node);
            }
        }
        nodes
    }

    fn resolve(&mut self, target: &str, depth: usize) -> Option<Node> {
        if depth > MAX_DEPTH {
            warn!("Skipping {}: nesting deeper than {}", target, MAX_DEPTH);
            return None;
        }

        let doc = self.doc;
        let parsed = match parse_ref(target) {
            Some(Target::Body) => {
                warn!("Skipping self-reference to body");
                return None;
            }
            Some(parsed) => parsed,
            None => {
                warn!("Skipping unrecognised reference {}", target);
                return None;
            }
        };
        if !self.placed.insert(parsed) {
            warn!("Skipping repeated reference {}", target);
            return None;
        }

        let resolved = match parsed {
            Target::Group(i) => doc.groups.get(i).map(|g| self.group_node(g, depth)),
            Target::Text(i) => doc.texts.get(i).map(|t| self.text_node(t, depth)),
            Target::Table(i) => doc.tables.get(i).map(|t| self.table_node(t)),
            Target::Picture(i) => doc.pictures.get(i).map(|p| self.picture_node(p)),
            Target::Body => None,
        };

        match resolved {
            Some(node) => node,
            None => {
                warn!("Skipping dangling reference {}", target);
                None
            }
        }
    }

    fn group_node(&mut self, group: &'a RawGroup, depth: usize) -> Option<Node> {
        if is_furniture(&group.content_layer) {
            return None;
        }
        let mut node = Node::group(group.label.clone());
        node.children = self.children(&group.children, depth);
        Some(node)
    }

    fn text_node(&mut self, item: &'a RawText, depth: usize) -> Option<Node> {
        if is_furniture(&item.content_layer) {
            debug!("Skipping furniture text '{}'", item.label);
            return None;
        }

        let mut node = match item.label.as_str() {
            "title" => Node::title(item.text.clone()),
            "section_header" => Node::heading(item.text.clone(), item.level.unwrap_or(1)),
            "page_header" | "page_footer" => {
                debug!("Skipping {} outside the furniture layer", item.label);
                return None;
            }
            label => match TextLabel::from_label(label) {
                Some(text_label) => Node::text(text_label, item.text.clone()),
                None => Node::new(NodeKind::Unknown {
                    label: label.to_string(),
                }),
            },
        };
        node.provenance = provenance(&item.prov);
        node.children = self.children(&item.children, depth);
        Some(node)
    }

    fn table_node(&self, item: &RawTable) -> Option<Node> {
        if is_furniture(&item.content_layer) {
            return None;
        }

        let mut data = TableData::default();
        for cell in &item.data.table_cells {
            let (row, col) = (cell.start_row_offset_idx, cell.start_col_offset_idx);
            if row >= MAX_TABLE_EXTENT || col >= MAX_TABLE_EXTENT {
                warn!("Skipping table cell at ({}, {}): outside the table limit", row, col);
                continue;
            }
            data.add_cell(TableCell {
                text: cell.text.clone(),
                row,
                col,
                row_span: cell.row_span.clamp(1, MAX_TABLE_EXTENT - row),
                col_span: cell.col_span.clamp(1, MAX_TABLE_EXTENT - col),
                column_header: cell.column_header,
            });
        }
        if (item.data.num_rows, item.data.num_cols) != (data.num_rows, data.num_cols) {
            debug!(
                "Table declares {}x{} but its cells cover {}x{}",
                item.data.num_rows, item.data.num_cols, data.num_rows, data.num_cols
            );
        }

        let mut node = Node::table(data);
        if let Some(caption) = self.caption_text(&item.captions) {
            node = node.with_caption(caption);
        }
        node.provenance = provenance(&item.prov);
        if self.options.generate_table_images {
            node.image = item.image.as_ref().and_then(|img| self.element_image(img));
        }
        Some(node)
    }

    fn picture_node(&self, item: &RawPicture) -> Option<Node> {
        if is_furniture(&item.content_layer) {
            return None;
        }

        let mut node = Node::picture();
        if let Some(caption) = self.caption_text(&item.captions) {
            node = node.with_caption(caption);
        }
        node.provenance = provenance(&item.prov);
        if self.options.generate_picture_images {
            node.image = item.image.as_ref().and_then(|img| self.element_image(img));
        }
        Some(node)
    }

    fn caption_text(&self, refs: &[RawRef]) -> Option<String> {
        let parts: Vec<&str> = refs
            .iter()
            .filter_map(|r| match parse_ref(&r.target) {
                Some(Target::Text(i)) => self.doc.texts.get(i),
                _ => None,
            })
            .map(|t| t.text.trim())
            .filter(|t| !t.is_empty())
            .collect();

        if parts.is_empty() {
            None
        } else {
            Some(parts.join(" "))
        }
    }

    fn element_image(&self, raw: &RawImage) -> Option<ElementImage> {
        let mut image = if raw.uri.starts_with("data:") {
            match ElementImage::from_data_uri(&raw.uri) {
                Some(image) => image,
                None => {
                    warn!("Ignoring undecodable embedded image");
                    return None;
                }
            }
        } else {
            let path = self.resolve_image_path(&raw.uri);
            match std::fs::read(&path) {
                Ok(data) => ElementImage {
                    mime_type: raw
                        .mimetype
                        .clone()
                        .unwrap_or_else(|| "image/png".to_string()),
                    data,
                    width: None,
                    height: None,
                    dpi: None,
                },
                Err(e) => {
                    warn!("Cannot read image {}: {}", path.display(), e);
                    return None;
                }
            }
        };

        if let Some(size) = &raw.size {
            image.width = Some(size.width.round() as u32);
            image.height = Some(size.height.round() as u32);
        }
        image.dpi = raw.dpi;
        Some(image)
    }

    fn resolve_image_path(&self, uri: &str) -> PathBuf {
        let path = Path::new(uri.strip_prefix("file://").unwrap_or(uri));
        match self.base_dir {
            Some(base) if path.is_relative() => base.join(path),
            _ => path.to_path_buf(),
        }
    }
}

/// Parse a Docling JSON export into a document tree.
///
/// Element images are kept only for the kinds enabled in `options`.
pub fn parse_docling_json(json: &str, options: &LoaderOptions) -> Result<DocumentTree> {
    parse_with_base(json, options, None)
}

fn parse_with_base(
    json: &str,
    options: &LoaderOptions,
    base_dir: Option<&Path>,
) -> Result<DocumentTree> {
    let doc: RawDocument = serde_json::from_str(json)
        .map_err(|e| Error::MalformedDocument(format!("not a Docling document: {}", e)))?;

    let tree = TreeBuilder::new(&doc, options, base_dir).build();
    debug!(
        "Resolved Docling document: {} pages, {} nodes",
        tree.page_count,
        tree.node_count()
    );
    Ok(tree)
}

/// Parse a Docling JSON file; relative image paths resolve against its directory.
pub(crate) fn parse_docling_file(path: &Path, options: &LoaderOptions) -> Result<DocumentTree> {
    let json = std::fs::read_to_string(path)?;
    parse_with_base(&json, options, path.parent())
}

/// Loader that reads documents Docling has already exported to JSON.
///
/// With an export directory, a PDF path `dir/paper.pdf` is mapped to
/// `<export_dir>/paper.json`; without one, the given path is read directly.
#[derive(Debug, Clone, Default)]
pub struct DoclingJsonLoader {
    export_dir: Option<PathBuf>,
}

impl DoclingJsonLoader {
    /// Read the given path as Docling JSON.
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up `<stem>.json` in `dir` for every input.
    pub fn with_export_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            export_dir: Some(dir.into()),
        }
    }

    fn export_path(&self, path: &Path) -> PathBuf {
        match (&self.export_dir, path.file_stem()) {
            (Some(dir), Some(stem)) => {
                let mut name = stem.to_os_string();
                name.push(".json");
                dir.join(name)
            }
            _ => path.to_path_buf(),
        }
    }
}

impl DocumentLoader for DoclingJsonLoader {
    fn name(&self) -> &str {
        "docling-json"
    }

    fn load(&self, path: &Path, options: &LoaderOptions) -> Result<DocumentTree> {
        let export = self.export_path(path);
        if !export.exists() {
            return Err(Error::Loader(format!(
                "no Docling export at {}",
                export.display()
            )));
        }
        parse_docling_file(&export, options)
    }
}
