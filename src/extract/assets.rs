//! Destinations for table and picture rasters.

use crate::error::{Error, Result};
use crate::fs::{write_bytes, OutputLayout};
use crate::model::{AssetKind, AssetRef, ElementImage};
use log::debug;
use std::path::PathBuf;

/// Receives element rasters during extraction and hands back a reference.
///
/// `index` is the 1-based running index of the element within its kind.
pub trait AssetSink {
    /// Store `image` and return how records should refer to it.
    ///
    /// `Ok(None)` means the sink deliberately keeps no reference.
    fn store(&mut self, kind: AssetKind, index: u32, image: &ElementImage)
        -> Result<Option<AssetRef>>;
}

/// Sink that discards every raster.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoAssets;

impl AssetSink for NoAssets {
    fn store(&mut self, _: AssetKind, _: u32, _: &ElementImage) -> Result<Option<AssetRef>> {
        Ok(None)
    }
}

/// Sink that inlines rasters as base64 payloads.
#[derive(Debug, Default, Clone, Copy)]
pub struct EmbeddedAssets;

impl AssetSink for EmbeddedAssets {
    fn store(
        &mut self,
        _: AssetKind,
        _: u32,
        image: &ElementImage,
    ) -> Result<Option<AssetRef>> {
        Ok(Some(AssetRef::embedded(&image.mime_type, &image.data)))
    }
}

/// Sink that writes `<stem>-<table|picture>-<n>.png` files.
///
/// Bytes are written as delivered by the loader.
#[derive(Debug, Clone)]
pub struct FileAssets {
    layout: OutputLayout,
    written: Vec<PathBuf>,
}

impl FileAssets {
    /// Write assets according to `layout`.
    pub fn new(layout: OutputLayout) -> Self {
        Self {
            layout,
            written: Vec::new(),
        }
    }

    /// Files written so far, in order.
    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }

    /// Number of files written for `kind`.
    pub fn count(&self, kind: AssetKind) -> usize {
        let marker = format!("-{}-", kind.file_tag());
        self.written
            .iter()
            .filter_map(|p| p.file_name().and_then(|n| n.to_str()))
            .filter(|name| name.contains(&marker))
            .count()
    }

    /// Consume the sink, returning the written paths.
    pub fn into_written(self) -> Vec<PathBuf> {
        self.written
    }
}

impl AssetSink for FileAssets {
    fn store(
        &mut self,
        kind: AssetKind,
        index: u32,
        image: &ElementImage,
    ) -> Result<Option<AssetRef>> {
        if image.is_empty() {
            return Err(Error::Asset(format!(
                "empty raster for {} {}",
                kind.file_tag(),
                index
            )));
        }
        if image.mime_type != "image/png" {
            debug!(
                "{} {} is {}, stored under a .png name unchanged",
                kind.file_tag(),
                index,
                image.mime_type
            );
        }

        let file_name = self.layout.asset_file_name(kind, index);
        let path = self.layout.dir().join(&file_name);
        write_bytes(&path, &image.data)?;
        debug!("Saved {} image: {}", kind.file_tag(), path.display());

        self.written.push(path);
        Ok(Some(AssetRef::file(file_name)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_file_assets_naming() {
        let dir = TempDir::new().unwrap();
        let mut sink = FileAssets::new(OutputLayout::new(dir.path(), "paper"));
        let image = ElementImage::png(vec![1, 2, 3]);

        let table = sink.store(AssetKind::Table, 1, &image).unwrap();
        let picture = sink.store(AssetKind::Picture, 2, &image).unwrap();

        assert_eq!(table, Some(AssetRef::file("paper-table-1.png")));
        assert_eq!(picture, Some(AssetRef::file("paper-picture-2.png")));
        assert_eq!(
            std::fs::read(dir.path().join("paper-table-1.png")).unwrap(),
            vec![1, 2, 3]
        );
        assert_eq!(sink.count(AssetKind::Table), 1);
        assert_eq!(sink.written().len(), 2);
    }

    #[test]
    fn test_embedded_assets() {
        let mut sink = EmbeddedAssets;
        let image = ElementImage::png(b"abc".to_vec());
        let asset = sink.store(AssetKind::Picture, 1, &image).unwrap().unwrap();
        assert_eq!(asset.data_uri().as_deref(), Some("data:image/png;base64,YWJj"));
    }

    #[test]
    fn test_no_assets() {
        let mut sink = NoAssets;
        let image = ElementImage::png(vec![0]);
        assert_eq!(sink.store(AssetKind::Table, 1, &image).unwrap(), None);
    }

    #[test]
    fn test_empty_raster_rejected() {
        let dir = TempDir::new().unwrap();
        let mut sink = FileAssets::new(OutputLayout::new(dir.path(), "x"));
        let err = sink
            .store(AssetKind::Picture, 4, &ElementImage::png(Vec::new()))
            .unwrap_err();
        assert!(matches!(err, Error::Asset(_)));
        assert!(sink.written().is_empty());
    }

    #[test]
    fn test_write_failure_surfaces() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("does-not-exist");
        let mut sink = FileAssets::new(OutputLayout::new(&missing, "x"));
        let image = ElementImage::png(vec![0]);
        assert!(sink.store(AssetKind::Table, 1, &image).is_err());
    }
}
