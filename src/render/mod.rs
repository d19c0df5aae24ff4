//! Rendering structured documents to Markdown, HTML and JSON.
//!
//! Renderers are templating over [`StructuredDocument`](crate::StructuredDocument)
//! records: they never reorder content and only skip empty text and
//! unresolvable assets.

mod html;
mod json;
mod markdown;
mod options;
mod result;
mod source;

pub use html::{escape_html, to_html, HtmlRenderer, Slugger};
pub use json::{from_json, to_json, JsonFormat};
pub use markdown::{to_markdown, MarkdownRenderer};
pub use options::{ImageMode, RenderOptions};
pub use result::ExtractionStats;
