use crate::{
    container::header::PixelFormat,
    container::tree::{LayerKind, LayerMask, LayerNode, PixelData},
    foundation::core::{BBox, ColorModel},
    foundation::error::{RasterError, RasterResult},
    raster::buffer::{RawImage, buffer_len},
    raster::composite::Canvas,
    raster::decode::decode_channel,
};

const ALPHA_CHANNEL: i16 = -1;

impl LayerNode {
    /// Flatten this layer into a raster covering its bounding box.
    ///
    /// Samples stay in the document color model with straight alpha; see
    /// [`to_display_color`](crate::to_display_color) for display conversion. The layer's own
    /// visibility flag is ignored, hidden children of groups are not.
    #[tracing::instrument(skip(self), fields(name = %self.name, kind = self.kind.tag()))]
    pub fn composite(&self) -> RasterResult<RawImage> {
        let canvas = self.render()?;
        canvas.into_image(self.format.model)
    }

    fn render(&self) -> RasterResult<Canvas> {
        let mut canvas = match &self.kind {
            LayerKind::Raster(pixels) => decode_pixels(pixels, self.bbox, self.format)?,
            LayerKind::Adjustment { pixels, .. } if pixels.has_color() => {
                decode_pixels(pixels, self.bbox, self.format)?
            }
            LayerKind::Adjustment { .. } | LayerKind::Unknown => {
                Canvas::transparent(self.bbox, self.format.model)?
            }
            LayerKind::Group(children) => self.render_group(children)?,
        };
        if let Some(mask) = &self.mask {
            apply_mask(&mut canvas, mask, self.format)?;
        }
        canvas.apply_opacity(self.opacity);
        Ok(canvas)
    }

    fn render_group(&self, children: &[LayerNode]) -> RasterResult<Canvas> {
        let mut canvas = Canvas::transparent(self.bbox, self.format.model)?;
        let mut base = ClipBase::NoBase;
        for child in children {
            let clipped = child.clipping && !matches!(base, ClipBase::NoBase);
            let Some(mut layer) = child.render_visible()? else {
                if !clipped {
                    base = ClipBase::Hidden;
                }
                continue;
            };
            if !clipped {
                canvas.draw(&layer);
                base = ClipBase::Alpha(layer);
                continue;
            }
            if let ClipBase::Alpha(base) = &base {
                layer.clip_to(base);
                canvas.draw(&layer);
            }
        }
        Ok(canvas)
    }

    fn render_visible(&self) -> RasterResult<Option<Canvas>> {
        if !self.visible {
            return Ok(None);
        }
        self.render().map(Some)
    }
}

/// What clipped layers are masked against.
enum ClipBase {
    /// Nothing below yet; a clipping flag here is ignored.
    NoBase,
    /// Base is hidden, so its clipped layers are too.
    Hidden,
    Alpha(Canvas),
}

fn decode_pixels(pixels: &PixelData, bbox: BBox, format: PixelFormat) -> RasterResult<Canvas> {
    let (width, height) = (bbox.width(), bbox.height());
    let model = format.model;
    let colors = model.channels();
    let stride = colors + 1;
    let len = buffer_len(width, height, stride)?;
    if len == 0 {
        return Canvas::transparent(bbox, model);
    }

    // Planes are decoded, and their stored sizes checked, before the interleaved buffer exists.
    let mut planes = Vec::with_capacity(stride);
    for c in 0..colors {
        let id = c as i16;
        let channel = pixels
            .channel(id)
            .ok_or_else(|| RasterError::corrupt(format!("missing color channel {id}")))?;
        planes.push(decode_channel(channel, width, height, format)?);
    }
    let alpha = match pixels.channel(ALPHA_CHANNEL) {
        Some(channel) => Some(decode_channel(channel, width, height, format)?),
        None => None,
    };

    let invert = model == ColorModel::Cmyk;
    let mut data = vec![255u8; len];
    for (c, plane) in planes.into_iter().enumerate() {
        for (px, v) in data.chunks_exact_mut(stride).zip(plane) {
            px[c] = if invert { 255 - v } else { v };
        }
    }
    if let Some(plane) = alpha {
        for (px, a) in data.chunks_exact_mut(stride).zip(plane) {
            px[colors] = a;
        }
    }
    Ok(Canvas::from_straight(bbox, stride, data))
}

fn apply_mask(canvas: &mut Canvas, mask: &LayerMask, format: PixelFormat) -> RasterResult<()> {
    if mask.info.disabled {
        return Ok(());
    }
    let rect = mask.info.rect;
    let plane = decode_channel(&mask.channel, rect.width(), rect.height(), format)?;
    canvas.apply_coverage(&plane, rect, mask.info.default_color);
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/raster/rasterize.rs"]
mod tests;
