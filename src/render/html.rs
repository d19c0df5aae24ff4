//! HTML rendering for structured documents.
//!
//! Two flavours share the same record walk: a styled page with header,
//! statistics, table of contents and footer, and a plain export that only
//! carries the content.

use super::source::asset_source;
use super::{ExtractionStats, ImageMode, RenderOptions};
use crate::model::{ContentRecord, ImageRecord, RecordKind, StructuredDocument, TableRecord};
use chrono::Utc;
use log::warn;
use regex::Regex;
use std::collections::HashSet;
use std::fmt::Write;

/// Convert a document to styled HTML.
pub fn to_html(doc: &StructuredDocument, options: &RenderOptions) -> String {
    HtmlRenderer::new(options.clone()).render(doc)
}

/// HTML renderer.
pub struct HtmlRenderer {
    options: RenderOptions,
    inline: InlineFormatter,
}

impl HtmlRenderer {
    /// Create a new HTML renderer.
    pub fn new(options: RenderOptions) -> Self {
        Self {
            options,
            inline: InlineFormatter::new(),
        }
    }

    /// Renderer for the styled page, with images referenced from `asset_dir`.
    pub fn styled(asset_dir: impl Into<std::path::PathBuf>) -> Self {
        Self::new(
            RenderOptions::new()
                .with_image_mode(ImageMode::Referenced)
                .with_asset_dir(asset_dir),
        )
    }

    /// Render the styled page.
    pub fn render(&self, doc: &StructuredDocument) -> String {
        let title = self.title(doc);
        let ids = heading_ids(doc);
        let mut html = String::with_capacity(16 * 1024);

        let _ = write!(
            html,
            "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
             <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n\
             <title>{}</title>\n<style>{}</style>\n</head>\n<body>\n<div class=\"container\">\n",
            escape_html(&title),
            STYLE
        );

        let _ = write!(
            html,
            "<header class=\"header\">\n<h1>{}</h1>\n<p class=\"subtitle\">Generated {}</p>\n</header>\n",
            escape_html(&title),
            Utc::now().format("%Y-%m-%d %H:%M:%S UTC")
        );

        if self.options.include_stats {
            self.stats_card(&mut html, doc);
        }
        if self.options.include_toc {
            self.table_of_contents(&mut html, doc, &ids);
        }

        html.push_str("<main id=\"content-section\">\n");
        self.body(&mut html, doc, &ids, true);
        html.push_str("</main>\n");

        if self.options.include_references && !doc.references.is_empty() {
            html.push_str("<section id=\"references-section\" class=\"references\">\n<h2>References</h2>\n<ol>\n");
            for text in doc.references.iter().filter_map(non_empty) {
                let _ = writeln!(html, "<li>{}</li>", self.format(text));
            }
            html.push_str("</ol>\n</section>\n");
        }

        let _ = write!(
            html,
            "<footer class=\"footer\">Generated by chunk-monkey {} from {}</footer>\n</div>\n</body>\n</html>\n",
            doc.metadata.processor_version,
            escape_html(doc.metadata.source_file.as_deref().unwrap_or("structured JSON"))
        );
        html
    }

    /// Render the plain export: content only, images referenced, no styling.
    pub fn render_basic(&self, doc: &StructuredDocument) -> String {
        let title = self.title(doc);
        let ids = heading_ids(doc);
        let mut html = String::new();

        let _ = write!(
            html,
            "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{}</title>\n</head>\n<body>\n",
            escape_html(&title)
        );
        self.body(&mut html, doc, &ids, false);
        if self.options.include_references && !doc.references.is_empty() {
            html.push_str("<h2>References</h2>\n");
            for text in doc.references.iter().filter_map(non_empty) {
                let _ = writeln!(html, "<p>{}</p>", escape_html(text));
            }
        }
        html.push_str("</body>\n</html>\n");
        html
    }

    fn title(&self, doc: &StructuredDocument) -> String {
        self.options
            .title
            .clone()
            .unwrap_or_else(|| doc.display_title())
    }

    fn format(&self, text: &str) -> String {
        if self.options.format_inline {
            self.inline.format(text)
        } else {
            escape_html(text)
        }
    }

    fn body(&self, html: &mut String, doc: &StructuredDocument, ids: &[Option<String>], styled: bool) {
        for (record, id) in doc.content.iter().zip(ids) {
            match record.kind {
                RecordKind::Heading => {
                    let Some(text) = non_empty(record) else { continue };
                    let level = record
                        .level
                        .unwrap_or(1)
                        .clamp(1, self.options.max_heading_level);
                    let id = id.as_deref().unwrap_or("heading");
                    let text = if styled { self.format(text) } else { escape_html(text) };
                    let _ = writeln!(html, "<h{0} id=\"{1}\">{2}</h{0}>", level, id, text);
                }
                RecordKind::Paragraph => {
                    let Some(text) = non_empty(record) else { continue };
                    if styled {
                        let _ = writeln!(html, "<p class=\"text-item\">{}</p>", self.format(text));
                    } else {
                        let _ = writeln!(html, "<p>{}</p>", escape_html(text));
                    }
                }
                RecordKind::Table => match record.index.and_then(|i| doc.table(i)) {
                    Some(table) => self.table(html, table, styled),
                    None => warn!("Table record {:?} has no entry", record.index),
                },
                RecordKind::Image => match record.index.and_then(|i| doc.image(i)) {
                    Some(image) => self.image(html, image, styled),
                    None => warn!("Image record {:?} has no entry", record.index),
                },
            }
        }
    }

    fn table(&self, html: &mut String, table: &TableRecord, styled: bool) {
        let class = if styled { " class=\"content-item table-item\"" } else { "" };
        let _ = writeln!(html, "<div{} id=\"{}\">", class, table.label);
        if let Some(caption) = table.caption.as_deref().filter(|c| !c.is_empty()) {
            let _ = writeln!(html, "<div class=\"table-caption\">{}</div>", escape_html(caption));
        }

        if !table.rows.is_empty() {
            html.push_str(&grid_html(&table.rows));
        } else if !table.content.is_empty() {
            let _ = writeln!(html, "<pre class=\"table-raw\">{}</pre>", escape_html(&table.content));
        }

        if let Some(src) = asset_source(&table.label, table.asset.as_ref(), &self.options) {
            let lazy = if styled { " loading=\"lazy\"" } else { "" };
            let _ = writeln!(
                html,
                "<div class=\"table-image\"><img src=\"{}\" alt=\"Table {}\"{}></div>",
                escape_attr(&src),
                table.index,
                lazy
            );
        }
        html.push_str("</div>\n");
    }

    fn image(&self, html: &mut String, image: &ImageRecord, styled: bool) {
        let caption = image.caption.as_deref().filter(|c| !c.is_empty());
        let src = asset_source(&image.label, image.asset.as_ref(), &self.options);
        if src.is_none() && caption.is_none() {
            return;
        }

        let class = if styled { " class=\"content-item image-item\"" } else { "" };
        let _ = writeln!(html, "<figure{} id=\"{}\">", class, image.label);
        if let Some(src) = src {
            let lazy = if styled { " loading=\"lazy\"" } else { "" };
            let _ = writeln!(
                html,
                "<img src=\"{}\" alt=\"{}\"{}>",
                escape_attr(&src),
                escape_attr(caption.unwrap_or(&image.label)),
                lazy
            );
        }
        if let Some(caption) = caption {
            let _ = writeln!(html, "<figcaption>{}</figcaption>", escape_html(caption));
        }
        html.push_str("</figure>\n");
    }

    fn stats_card(&self, html: &mut String, doc: &StructuredDocument) {
        let stats = ExtractionStats::from_document(doc);
        html.push_str("<div class=\"stats-card\">\n<h3>Document Statistics</h3>\n<div class=\"stats-grid\">\n");
        let mut item = |name: &str, value: String| {
            let _ = writeln!(
                html,
                "<div class=\"stat-item\"><strong>{}:</strong> {}</div>",
                name, value
            );
        };
        item("Pages", stats.page_count.to_string());
        item("Total Items", stats.total_items.to_string());
        item("Sections", stats.section_count.to_string());
        item("Words", stats.word_count.to_string());
        let types: Vec<String> = stats
            .content_types()
            .into_iter()
            .filter(|(_, n)| *n > 0)
            .map(|(name, n)| format!("<span class=\"stat-detail\">{}: {}</span>", name, n))
            .collect();
        item("Content Types", types.join("<br>"));
        html.push_str("</div>\n</div>\n");
    }

    fn table_of_contents(&self, html: &mut String, doc: &StructuredDocument, ids: &[Option<String>]) {
        let entries: Vec<(&ContentRecord, &str)> = doc
            .content
            .iter()
            .zip(ids)
            .filter_map(|(r, id)| Some((r, id.as_deref()?)))
            .filter(|(r, _)| non_empty(r).is_some())
            .collect();
        if entries.is_empty() {
            return;
        }

        html.push_str("<nav class=\"table-of-contents\">\n<h3>Table of Contents</h3>\n<ul>\n");
        for (record, id) in entries {
            let level = record.level.unwrap_or(1);
            let depth = record.section.section_hierarchy.len();
            let _ = writeln!(
                html,
                "<li class=\"toc-level-{}\" style=\"margin-left: {}em\"><a href=\"#{}\">{}</a></li>",
                level,
                depth,
                id,
                escape_html(record.text_or_empty())
            );
        }
        if self.options.include_references && !doc.references.is_empty() {
            html.push_str("<li class=\"toc-level-1\"><a href=\"#references-section\">References</a></li>\n");
        }
        html.push_str("</ul>\n</nav>\n");
    }
}

fn non_empty(record: &ContentRecord) -> Option<&str> {
    record.text.as_deref().filter(|t| !t.trim().is_empty())
}

fn grid_html(rows: &[Vec<String>]) -> String {
    let mut html = String::from("<table class=\"markdown-table\">\n");
    let (head, body) = if rows.len() > 1 {
        (&rows[..1], &rows[1..])
    } else {
        (&rows[..0], rows)
    };
    for row in head {
        html.push_str("<thead><tr>");
        for cell in row {
            let _ = write!(html, "<th>{}</th>", escape_html(cell));
        }
        html.push_str("</tr></thead>\n");
    }
    html.push_str("<tbody>\n");
    for row in body {
        html.push_str("<tr>");
        for cell in row {
            let _ = write!(html, "<td>{}</td>", escape_html(cell));
        }
        html.push_str("</tr>\n");
    }
    html.push_str("</tbody>\n</table>\n");
    html
}

/// Slug ids for heading records, aligned with `doc.content`.
fn heading_ids(doc: &StructuredDocument) -> Vec<Option<String>> {
    let mut slugger = Slugger::new();
    doc.content
        .iter()
        .map(|r| {
            if r.kind == RecordKind::Heading {
                Some(slugger.slug(r.text_or_empty()))
            } else {
                None
            }
        })
        .collect()
}

/// Produces unique, URL-safe ids from heading text.
pub struct Slugger {
    strip: Regex,
    dashes: Regex,
    used: HashSet<String>,
}

impl Slugger {
    /// Create an empty slugger.
    pub fn new() -> Self {
        Self {
            strip: Regex::new(r"[^\w\s-]").unwrap(),
            dashes: Regex::new(r"[-\s]+").unwrap(),
            used: HashSet::new(),
        }
    }

    /// Slug for `text`, suffixed with `-N` if already handed out.
    pub fn slug(&mut self, text: &str) -> String {
        let lower = text.to_lowercase();
        let stripped = self.strip.replace_all(&lower, "");
        let dashed = self.dashes.replace_all(&stripped, "-");
        let base = match dashed.trim_matches('-') {
            "" => "heading".to_string(),
            s => s.to_string(),
        };

        let mut candidate = base.clone();
        let mut n = 1;
        while self.used.contains(&candidate) {
            candidate = format!("{}-{}", base, n);
            n += 1;
        }
        self.used.insert(candidate.clone());
        candidate
    }
}

impl Default for Slugger {
    fn default() -> Self {
        Self::new()
    }
}

/// Lightweight Markdown-style inline markup applied after escaping.
struct InlineFormatter {
    link: Regex,
    bold: Regex,
    italic: Regex,
    code: Regex,
}

impl InlineFormatter {
    fn new() -> Self {
        Self {
            link: Regex::new(r"\[([^\]]+)\]\(((?i:https?://|mailto:)[^)\s]+)\)").unwrap(),
            bold: Regex::new(r"\*\*([^*]+)\*\*").unwrap(),
            italic: Regex::new(r"\*([^*]+)\*").unwrap(),
            code: Regex::new(r"`([^`]+)`").unwrap(),
        }
    }

    fn format(&self, text: &str) -> String {
        let escaped = escape_html(text);
        let linked = self
            .link
            .replace_all(&escaped, r#"<a href="$2" target="_blank" rel="noopener">$1</a>"#);
        let bold = self.bold.replace_all(&linked, "<strong>$1</strong>");
        let italic = self.italic.replace_all(&bold, "<em>$1</em>");
        let code = self.code.replace_all(&italic, "<code>$1</code>");
        code.replace('\n', "<br>")
    }
}

/// Escape text for HTML element content.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn escape_attr(text: &str) -> String {
    escape_html(text)
}

const STYLE: &str = r#"
* { margin: 0; padding: 0; box-sizing: border-box; }
body { font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif; line-height: 1.6; color: #333; background-color: #f8f9fa; }
.container { max-width: 1200px; margin: 0 auto; padding: 20px; background: white; box-shadow: 0 2px 10px rgba(0,0,0,0.1); border-radius: 8px; }
.header { text-align: center; margin-bottom: 2rem; padding: 2rem 0; border-bottom: 2px solid #e9ecef; }
.header h1 { color: #2c3e50; font-size: 2.5rem; margin-bottom: 0.5rem; }
.header .subtitle { color: #6c757d; font-size: 1.1rem; }
.stats-card { background: #f8f9fa; border: 1px solid #dee2e6; border-radius: 6px; padding: 1.5rem; margin-bottom: 2rem; }
.stats-grid { display: grid; grid-template-columns: repeat(auto-fit, minmax(250px, 1fr)); gap: 1rem; }
.stat-item { background: white; padding: 1rem; border-radius: 4px; border-left: 4px solid #28a745; }
.stat-detail { font-size: 0.9rem; color: #6c757d; }
.table-of-contents { background: #f8f9fa; padding: 1rem 1.5rem; border-radius: 6px; margin-bottom: 2rem; }
.table-of-contents ul { list-style: none; }
.table-of-contents a { color: #007bff; text-decoration: none; }
main h1, main h2, main h3, main h4, main h5, main h6 { color: #2c3e50; margin: 1.5rem 0 0.75rem; }
.text-item { margin-bottom: 1rem; }
.content-item { margin: 1.5rem 0; }
.table-caption, figcaption { font-style: italic; color: #6c757d; margin: 0.5rem 0; }
.markdown-table { border-collapse: collapse; width: 100%; margin: 0.5rem 0; }
.markdown-table th, .markdown-table td { border: 1px solid #dee2e6; padding: 0.5rem; text-align: left; }
.markdown-table th { background: #e9ecef; }
.table-raw { white-space: pre-wrap; background: #f8f9fa; padding: 1rem; }
.image-item img, .table-image img { max-width: 100%; height: auto; border-radius: 4px; }
.references ol { padding-left: 2rem; }
.references li { margin-bottom: 0.5rem; }
code { background: #f1f3f5; padding: 0 0.25rem; border-radius: 3px; }
.footer { margin-top: 3rem; padding-top: 1rem; border-top: 1px solid #e9ecef; color: #6c757d; text-align: center; font-size: 0.9rem; }
"#;
