//! Pipeline configuration.

use crate::error::{Error, Result};
use crate::extract::ExtractOptions;
use crate::loader::LoaderOptions;
use crate::render::JsonFormat;
use std::path::PathBuf;

/// Environment variable overriding the raster scale.
pub const IMAGE_SCALE_ENV: &str = "PDF_IMAGE_SCALE";
/// Environment variable overriding the output directory.
pub const OUTPUT_DIR_ENV: &str = "OUTPUT_DIR";
/// Environment variable overriding the input size limit.
pub const MAX_FILE_SIZE_ENV: &str = "MAX_FILE_SIZE_MB";

/// Default output directory.
pub const DEFAULT_OUTPUT_DIR: &str = "output";
/// Default input size limit in megabytes.
pub const DEFAULT_MAX_FILE_SIZE_MB: u64 = 100;

/// Options for the PDF → JSON/Markdown/HTML pipeline.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// Directory every artifact is written into
    pub output_dir: PathBuf,

    /// Options passed to the loader
    pub loader: LoaderOptions,

    /// Options for the structured extractor
    pub extract: ExtractOptions,

    /// Largest accepted input, in megabytes
    pub max_file_size_mb: u64,

    /// Write `<stem>_section_summary.json` next to the structured JSON
    pub write_section_summary: bool,

    /// Layout of written JSON
    pub json_format: JsonFormat,
}

impl PipelineOptions {
    /// Create new pipeline options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults overridden by `PDF_IMAGE_SCALE`, `OUTPUT_DIR` and
    /// `MAX_FILE_SIZE_MB` when set.
    pub fn from_env() -> Result<Self> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_vars(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut options = Self::default();

        if let Some(dir) = get(OUTPUT_DIR_ENV).filter(|v| !v.trim().is_empty()) {
            options = options.with_output_dir(dir.trim());
        }
        if let Some(raw) = get(IMAGE_SCALE_ENV) {
            let scale: f32 = raw.trim().parse().map_err(|_| {
                Error::Config(format!("{} must be a number, got {:?}", IMAGE_SCALE_ENV, raw))
            })?;
            options = options.with_image_scale(scale);
        }
        if let Some(raw) = get(MAX_FILE_SIZE_ENV) {
            let mb: u64 = raw.trim().parse().map_err(|_| {
                Error::Config(format!(
                    "{} must be a whole number, got {:?}",
                    MAX_FILE_SIZE_ENV, raw
                ))
            })?;
            options = options.with_max_file_size_mb(mb);
        }

        Ok(options)
    }

    /// Set the output directory.
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    /// Set the raster scale for both loader and metadata.
    pub fn with_image_scale(mut self, scale: f32) -> Self {
        self.loader.image_scale = scale;
        self.extract.image_scale = scale;
        self
    }

    /// Replace the loader options.
    pub fn with_loader_options(mut self, loader: LoaderOptions) -> Self {
        self.extract.image_scale = loader.image_scale;
        self.loader = loader;
        self
    }

    /// Replace the extractor options.
    pub fn with_extract_options(mut self, extract: ExtractOptions) -> Self {
        self.extract = extract;
        self
    }

    /// Set the input size limit.
    pub fn with_max_file_size_mb(mut self, mb: u64) -> Self {
        self.max_file_size_mb = mb;
        self
    }

    /// Enable or disable the section summary file.
    pub fn with_section_summary(mut self, write: bool) -> Self {
        self.write_section_summary = write;
        self
    }

    /// Set the JSON layout.
    pub fn with_json_format(mut self, format: JsonFormat) -> Self {
        self.json_format = format;
        self
    }

    /// Check option ranges.
    pub fn validate(&self) -> Result<()> {
        self.loader.validate()?;
        if self.max_file_size_mb == 0 {
            return Err(Error::Config(
                "maximum file size must be greater than 0 MB".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            loader: LoaderOptions::default(),
            extract: ExtractOptions::default(),
            max_file_size_mb: DEFAULT_MAX_FILE_SIZE_MB,
            write_section_summary: true,
            json_format: JsonFormat::Pretty,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let options = PipelineOptions::default();
        assert_eq!(options.output_dir, PathBuf::from("output"));
        assert_eq!(options.loader.image_scale, 2.0);
        assert!(options.loader.generate_table_images);
        assert!(options.loader.generate_picture_images);
        assert_eq!(options.max_file_size_mb, 100);
        assert!(options.write_section_summary);
        assert_eq!(options.json_format, JsonFormat::Pretty);
        assert!(options.validate().is_ok());
    }

    #[test]
    fn test_from_vars() {
        let options = PipelineOptions::from_vars(vars(&[
            ("OUTPUT_DIR", "/tmp/out"),
            ("PDF_IMAGE_SCALE", "3.5"),
            ("MAX_FILE_SIZE_MB", "20"),
        ]))
        .unwrap();

        assert_eq!(options.output_dir, PathBuf::from("/tmp/out"));
        assert_eq!(options.loader.image_scale, 3.5);
        assert_eq!(options.extract.image_scale, 3.5);
        assert_eq!(options.max_file_size_mb, 20);
    }

    #[test]
    fn test_from_vars_rejects_garbage() {
        let err = PipelineOptions::from_vars(vars(&[("PDF_IMAGE_SCALE", "big")])).unwrap_err();
        assert!(matches!(err, Error::Config(_)));

        let err = PipelineOptions::from_vars(vars(&[("MAX_FILE_SIZE_MB", "-1")])).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_validate_ranges() {
        assert!(PipelineOptions::new().with_image_scale(0.1).validate().is_err());
        assert!(PipelineOptions::new().with_image_scale(5.0).validate().is_ok());
        assert!(PipelineOptions::new()
            .with_max_file_size_mb(0)
            .validate()
            .is_err());
    }
}
