//! Rendering options and configuration.

use std::path::PathBuf;

/// How table and image references appear in rendered output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImageMode {
    /// `<!-- table-N -->` / `<!-- image-N -->` comments, no bytes
    #[default]
    Placeholder,
    /// `data:image/png;base64,...` links
    Embedded,
    /// Relative paths to the PNG assets
    Referenced,
}

/// Options for rendering a structured document.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// How assets are referenced
    pub image_mode: ImageMode,

    /// Directory that file assets are resolved against
    pub asset_dir: Option<PathBuf>,

    /// Prefix for image paths in output (e.g., "./images/")
    pub image_path_prefix: String,

    /// Maximum heading level (1-6)
    pub max_heading_level: u8,

    /// Include YAML frontmatter with metadata (Markdown only)
    pub include_frontmatter: bool,

    /// Append the references list
    pub include_references: bool,

    /// Table of contents (styled HTML only)
    pub include_toc: bool,

    /// Statistics card (styled HTML only)
    pub include_stats: bool,

    /// Convert `**bold**`, `*italic*`, `` `code` `` and links (styled HTML only)
    pub format_inline: bool,

    /// Title override; defaults to the document's display title
    pub title: Option<String>,
}

impl RenderOptions {
    /// Create new render options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set how assets are referenced.
    pub fn with_image_mode(mut self, mode: ImageMode) -> Self {
        self.image_mode = mode;
        self
    }

    /// Resolve file assets against `dir`.
    pub fn with_asset_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.asset_dir = Some(dir.into());
        self
    }

    /// Set the image path prefix.
    pub fn with_image_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.image_path_prefix = prefix.into();
        self
    }

    /// Set the maximum heading level.
    pub fn with_max_heading(mut self, level: u8) -> Self {
        self.max_heading_level = level.clamp(1, 6);
        self
    }

    /// Enable or disable frontmatter.
    pub fn with_frontmatter(mut self, include: bool) -> Self {
        self.include_frontmatter = include;
        self
    }

    /// Enable or disable the references list.
    pub fn with_references(mut self, include: bool) -> Self {
        self.include_references = include;
        self
    }

    /// Enable or disable the table of contents.
    pub fn with_toc(mut self, include: bool) -> Self {
        self.include_toc = include;
        self
    }

    /// Enable or disable the statistics card.
    pub fn with_stats(mut self, include: bool) -> Self {
        self.include_stats = include;
        self
    }

    /// Enable or disable inline formatting.
    pub fn with_inline_formatting(mut self, enabled: bool) -> Self {
        self.format_inline = enabled;
        self
    }

    /// Override the document title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            image_mode: ImageMode::Placeholder,
            asset_dir: None,
            image_path_prefix: String::new(),
            max_heading_level: 6,
            include_frontmatter: false,
            include_references: true,
            include_toc: true,
            include_stats: true,
            format_inline: true,
            title: None,
        }
    }
}
