//! Resolving asset references into link targets.

use super::{ImageMode, RenderOptions};
use crate::model::AssetRef;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use log::warn;
use std::path::PathBuf;

const FILE_MIME: &str = "image/png";

/// Link target for `asset` under `options`, or `None` when the output should
/// fall back to a placeholder.
///
/// Missing files are logged and skipped.
pub(crate) fn asset_source(
    label: &str,
    asset: Option<&AssetRef>,
    options: &RenderOptions,
) -> Option<String> {
    let asset = asset?;
    match (options.image_mode, asset) {
        (ImageMode::Placeholder, _) => None,
        (_, AssetRef::Embedded { .. }) => asset.data_uri(),
        (ImageMode::Referenced, AssetRef::File { path }) => {
            if let Some(full) = resolve(options, path) {
                if !full.exists() {
                    warn!("Asset for {} not found: {}", label, full.display());
                    return None;
                }
            }
            Some(format!("{}{}", options.image_path_prefix, path))
        }
        (ImageMode::Embedded, AssetRef::File { path }) => {
            let full = resolve(options, path).unwrap_or_else(|| PathBuf::from(path));
            match std::fs::read(&full) {
                Ok(bytes) => Some(format!(
                    "data:{};base64,{}",
                    FILE_MIME,
                    STANDARD.encode(bytes)
                )),
                Err(e) => {
                    warn!("Cannot embed asset for {} ({}): {}", label, full.display(), e);
                    None
                }
            }
        }
    }
}

fn resolve(options: &RenderOptions, path: &str) -> Option<PathBuf> {
    options.asset_dir.as_ref().map(|dir| dir.join(path))
}
