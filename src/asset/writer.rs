use std::{
    borrow::Cow,
    path::{Path, PathBuf},
};

use crate::{
    foundation::core::ColorModel, foundation::error::WriteError, raster::buffer::RawImage,
};

/// Destination for display-ready layer rasters.
///
/// Implementations must be deterministic: the same `(target_dir, order_index)` always names the
/// same file, so re-runs overwrite rather than accumulate.
pub trait AssetWriter {
    /// Write `image` for the layer at `order_index` under `target_dir` and return its path.
    fn write(&self, image: &RawImage, target_dir: &Path, order_index: usize)
    -> Result<PathBuf, WriteError>;

    /// Remove a previously written asset. Missing files are not an error.
    fn remove(&self, path: &Path) -> Result<(), WriteError>;
}

/// File name of the asset for `order_index`.
pub fn asset_file_name(order_index: usize) -> String {
    format!("{order_index}.png")
}

/// Writes RGBA PNG files, or 3-channel RGB files when alpha is dropped.
#[derive(Clone, Copy, Debug)]
pub struct PngAssetWriter {
    keep_alpha: bool,
}

impl Default for PngAssetWriter {
    fn default() -> Self {
        Self { keep_alpha: true }
    }
}

impl PngAssetWriter {
    /// Create a new RGBA PNG writer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep (`true`, the default) or discard the alpha channel. Discarding leaves color samples
    /// untouched and writes `Rgb8` files.
    pub fn with_alpha(mut self, keep_alpha: bool) -> Self {
        self.keep_alpha = keep_alpha;
        self
    }
}

impl AssetWriter for PngAssetWriter {
    #[tracing::instrument(skip(self, image), fields(w = image.width, h = image.height))]
    fn write(
        &self,
        image: &RawImage,
        target_dir: &Path,
        order_index: usize,
    ) -> Result<PathBuf, WriteError> {
        if image.model != ColorModel::Rgb {
            return Err(WriteError::ColorModel(image.model));
        }
        std::fs::create_dir_all(target_dir).map_err(|source| WriteError::CreateDir {
            path: target_dir.to_path_buf(),
            source,
        })?;

        let path = target_dir.join(asset_file_name(order_index));
        // PNG has no zero-sized images; empty layers become one transparent pixel.
        let (width, height, data): (u32, u32, &[u8]) = if image.is_empty() {
            (1, 1, &[0, 0, 0, 0])
        } else {
            (image.width, image.height, &image.data)
        };
        let (data, color): (Cow<'_, [u8]>, _) = if self.keep_alpha {
            (Cow::Borrowed(data), image::ColorType::Rgba8)
        } else {
            let rgb = data.chunks_exact(4).flat_map(|px| [px[0], px[1], px[2]]);
            (Cow::Owned(rgb.collect()), image::ColorType::Rgb8)
        };
        image::save_buffer_with_format(&path, &data, width, height, color, image::ImageFormat::Png)
            .map_err(|source| WriteError::Encode {
                path: path.clone(),
                source,
            })?;
        tracing::debug!(path = %path.display(), "asset written");
        Ok(path)
    }

    fn remove(&self, path: &Path) -> Result<(), WriteError> {
        match std::fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(WriteError::Remove {
                path: path.to_path_buf(),
                source,
            }),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/asset/writer.rs"]
mod tests;
