use crate::foundation::core::ColorModel;
use crate::foundation::error::{RasterError, RasterResult};

/// Upper bound on pixels in a single raster; larger layers are treated as corrupt.
pub(crate) const MAX_RASTER_PIXELS: u64 = 1 << 30;

/// A composited layer raster.
///
/// Samples are 8-bit, interleaved, row-major, with straight (non-premultiplied) alpha as the last
/// channel of every pixel.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawImage {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Color model of the non-alpha channels.
    pub model: ColorModel,
    /// `width * height * (model.channels() + 1)` bytes.
    pub data: Vec<u8>,
}

impl RawImage {
    /// Fully transparent raster of the given size.
    pub fn transparent(width: u32, height: u32, model: ColorModel) -> RasterResult<Self> {
        let len = buffer_len(width, height, model.channels() + 1)?;
        Ok(Self {
            width,
            height,
            model,
            data: vec![0; len],
        })
    }

    /// Wrap existing interleaved samples, checking the buffer length.
    pub fn from_raw(width: u32, height: u32, model: ColorModel, data: Vec<u8>) -> RasterResult<Self> {
        let len = buffer_len(width, height, model.channels() + 1)?;
        if data.len() != len {
            return Err(RasterError::corrupt(format!(
                "raster buffer holds {} bytes, expected {len}",
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            model,
            data,
        })
    }

    /// Bytes per pixel, alpha included.
    pub fn stride(&self) -> usize {
        self.model.channels() + 1
    }

    /// Return `true` when the raster covers no pixels.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Samples of the pixel at `(x, y)`.
    pub fn pixel(&self, x: u32, y: u32) -> &[u8] {
        let stride = self.stride();
        let idx = (y as usize * self.width as usize + x as usize) * stride;
        &self.data[idx..idx + stride]
    }
}

/// `width * height * channels`, bounded by [`MAX_RASTER_PIXELS`].
pub(crate) fn buffer_len(width: u32, height: u32, channels: usize) -> RasterResult<usize> {
    let pixels = u64::from(width) * u64::from(height);
    if pixels > MAX_RASTER_PIXELS {
        return Err(RasterError::corrupt(format!(
            "raster {width}x{height} exceeds {MAX_RASTER_PIXELS} pixels"
        )));
    }
    usize::try_from(pixels)
        .ok()
        .and_then(|p| p.checked_mul(channels))
        .ok_or_else(|| RasterError::corrupt("raster size overflow"))
}
