use crate::{
    foundation::core::{BBox, ColorModel},
    foundation::error::RasterResult,
    foundation::math::{div_alpha_u8, mul_div255_u16, mul_div255_u8},
    raster::buffer::{RawImage, buffer_len},
};

/// Source-over of one premultiplied pixel onto another.
///
/// Both slices hold color samples followed by alpha. `opacity` scales the source, 255 = full.
pub(crate) fn over(dst: &mut [u8], src: &[u8], opacity: u8) {
    let Some((&src_alpha, src_color)) = src.split_last() else {
        return;
    };
    if opacity == 0 || src_alpha == 0 {
        return;
    }
    let op = u16::from(opacity);
    let sa = mul_div255_u16(u16::from(src_alpha), op);
    if sa == 0 {
        return;
    }
    let inv = 255 - sa;

    let n = src_color.len();
    for (d, &s) in dst[..n].iter_mut().zip(src_color) {
        let sc = mul_div255_u16(u16::from(s), op);
        let dc = mul_div255_u16(u16::from(*d), inv);
        *d = (sc + dc).min(255) as u8;
    }
    let da = mul_div255_u16(u16::from(dst[n]), inv);
    dst[n] = (sa + da).min(255) as u8;
}

/// Premultiplied working buffer positioned in document coordinates.
#[derive(Clone, Debug)]
pub(crate) struct Canvas {
    pub(crate) bbox: BBox,
    pub(crate) stride: usize,
    pub(crate) data: Vec<u8>,
}

impl Canvas {
    pub(crate) fn transparent(bbox: BBox, model: ColorModel) -> RasterResult<Self> {
        let stride = model.channels() + 1;
        let len = buffer_len(bbox.width(), bbox.height(), stride)?;
        Ok(Self {
            bbox,
            stride,
            data: vec![0; len],
        })
    }

    /// Build from straight-alpha interleaved samples.
    pub(crate) fn from_straight(bbox: BBox, stride: usize, mut data: Vec<u8>) -> Self {
        for px in data.chunks_exact_mut(stride) {
            if let Some((a, color)) = px.split_last_mut() {
                let a = *a;
                for c in color {
                    *c = mul_div255_u8(*c, a);
                }
            }
        }
        Self { bbox, stride, data }
    }

    fn width(&self) -> usize {
        self.bbox.width() as usize
    }

    fn alpha_at(&self, x: i32, y: i32) -> u8 {
        let b = self.bbox;
        if x < b.left || x >= b.right || y < b.top || y >= b.bottom {
            return 0;
        }
        let idx = ((y - b.top) as usize * self.width() + (x - b.left) as usize) * self.stride;
        self.data[idx + self.stride - 1]
    }

    /// Composite `src` over `self` where the two boxes overlap.
    pub(crate) fn draw(&mut self, src: &Canvas) {
        let Some(area) = intersect(self.bbox, src.bbox) else {
            return;
        };
        let stride = self.stride;
        let (dw, sw) = (self.width(), src.width());
        for y in area.top..area.bottom {
            let drow = (y - self.bbox.top) as usize * dw;
            let srow = (y - src.bbox.top) as usize * sw;
            for x in area.left..area.right {
                let di = (drow + (x - self.bbox.left) as usize) * stride;
                let si = (srow + (x - src.bbox.left) as usize) * stride;
                over(&mut self.data[di..di + stride], &src.data[si..si + stride], 255);
            }
        }
    }

    /// Scale every pixel by the alpha of `base` at the same document position.
    pub(crate) fn clip_to(&mut self, base: &Canvas) {
        let (left, top, w) = (self.bbox.left, self.bbox.top, self.width());
        let stride = self.stride;
        for (i, px) in self.data.chunks_exact_mut(stride).enumerate() {
            let x = left + (i % w) as i32;
            let y = top + (i / w) as i32;
            let a = base.alpha_at(x, y);
            scale_pixel(px, a);
        }
    }

    /// Scale every pixel by a coverage plane placed at `rect`; pixels outside use `default`.
    pub(crate) fn apply_coverage(&mut self, plane: &[u8], rect: BBox, default: u8) {
        let (left, top, w) = (self.bbox.left, self.bbox.top, self.width());
        let rw = rect.width() as usize;
        let stride = self.stride;
        for (i, px) in self.data.chunks_exact_mut(stride).enumerate() {
            let x = left + (i % w) as i32;
            let y = top + (i / w) as i32;
            let inside = x >= rect.left && x < rect.right && y >= rect.top && y < rect.bottom;
            let cov = if inside {
                plane
                    .get((y - rect.top) as usize * rw + (x - rect.left) as usize)
                    .copied()
                    .unwrap_or(default)
            } else {
                default
            };
            scale_pixel(px, cov);
        }
    }

    pub(crate) fn apply_opacity(&mut self, opacity: u8) {
        if opacity == 255 {
            return;
        }
        for px in self.data.chunks_exact_mut(self.stride) {
            scale_pixel(px, opacity);
        }
    }

    /// Convert to a straight-alpha [`RawImage`].
    pub(crate) fn into_image(mut self, model: ColorModel) -> RasterResult<RawImage> {
        for px in self.data.chunks_exact_mut(self.stride) {
            if let Some((a, color)) = px.split_last_mut() {
                let a = *a;
                for c in color {
                    *c = div_alpha_u8(*c, a);
                }
            }
        }
        RawImage::from_raw(self.bbox.width(), self.bbox.height(), model, self.data)
    }
}

fn scale_pixel(px: &mut [u8], k: u8) {
    if k == 255 {
        return;
    }
    for v in px {
        *v = mul_div255_u8(*v, k);
    }
}

fn intersect(a: BBox, b: BBox) -> Option<BBox> {
    let out = BBox::new(
        a.left.max(b.left),
        a.top.max(b.top),
        a.right.min(b.right),
        a.bottom.min(b.bottom),
    );
    (!out.is_empty()).then_some(out)
}

#[cfg(test)]
#[path = "../../tests/unit/raster/composite.rs"]
mod tests;
