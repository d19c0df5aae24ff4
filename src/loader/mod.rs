//! Document loading.
//!
//! PDF parsing, layout analysis, and rasterisation happen in an external
//! document-understanding library. A [`DocumentLoader`] wraps that library
//! and hands back a [`DocumentTree`] the extractor can walk.
//!
//! # Example
//!
//! ```no_run
//! use chunk_monkey::loader::{DoclingCommandLoader, DocumentLoader, LoaderOptions};
//! use std::path::Path;
//!
//! fn main() -> chunk_monkey::Result<()> {
//!     let loader = DoclingCommandLoader::new();
//!     let tree = loader.load(Path::new("paper.pdf"), &LoaderOptions::default())?;
//!     println!("{} nodes", tree.node_count());
//!     Ok(())
//! }
//! ```

mod command;
mod docling;

pub use command::DoclingCommandLoader;
pub use docling::{parse_docling_json, DoclingJsonLoader};

use crate::error::{Error, Result};
use crate::model::DocumentTree;
use std::path::Path;

/// Default raster scale requested from the loader.
pub const DEFAULT_IMAGE_SCALE: f32 = 2.0;

/// Accepted range for [`LoaderOptions::image_scale`].
pub const IMAGE_SCALE_RANGE: std::ops::RangeInclusive<f32> = 0.5..=5.0;

/// Options passed to a loader.
#[derive(Debug, Clone, PartialEq)]
pub struct LoaderOptions {
    /// Raster scale factor for element images (1.0 = 72 DPI)
    pub image_scale: f32,

    /// Render an image for every table
    pub generate_table_images: bool,

    /// Render an image for every picture
    pub generate_picture_images: bool,

    /// Render full page images
    pub generate_page_images: bool,
}

impl LoaderOptions {
    /// Create options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the image scale.
    pub fn with_image_scale(mut self, scale: f32) -> Self {
        self.image_scale = scale;
        self
    }

    /// Enable or disable table images.
    pub fn with_table_images(mut self, enabled: bool) -> Self {
        self.generate_table_images = enabled;
        self
    }

    /// Enable or disable picture images.
    pub fn with_picture_images(mut self, enabled: bool) -> Self {
        self.generate_picture_images = enabled;
        self
    }

    /// Enable or disable page images.
    pub fn with_page_images(mut self, enabled: bool) -> Self {
        self.generate_page_images = enabled;
        self
    }

    /// Check that the options are within supported bounds.
    pub fn validate(&self) -> Result<()> {
        if !IMAGE_SCALE_RANGE.contains(&self.image_scale) {
            return Err(Error::Config(format!(
                "image scale must be between {} and {}, got {}",
                IMAGE_SCALE_RANGE.start(),
                IMAGE_SCALE_RANGE.end(),
                self.image_scale
            )));
        }
        Ok(())
    }
}

impl Default for LoaderOptions {
    fn default() -> Self {
        Self {
            image_scale: DEFAULT_IMAGE_SCALE,
            generate_table_images: true,
            generate_picture_images: true,
            generate_page_images: true,
        }
    }
}

/// Trait for document loaders.
///
/// Implement this to plug in a different document-understanding backend.
pub trait DocumentLoader: Send + Sync {
    /// Name of this loader, for logs.
    fn name(&self) -> &str;

    /// Load the document at `path` into a tree.
    ///
    /// A loader error is fatal for this document only.
    fn load(&self, path: &Path, options: &LoaderOptions) -> Result<DocumentTree>;
}
