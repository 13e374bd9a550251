use rayon::prelude::*;

use crate::{
    foundation::core::ColorModel, foundation::math::mul_div255_u8, raster::buffer::RawImage,
};

/// D50 reference white used by the Lab encoding.
const WHITE_D50: [f32; 3] = [0.964_22, 1.0, 0.825_21];

/// Bradford-adapted XYZ (D50) to linear sRGB.
const XYZ_D50_TO_SRGB: [[f32; 3]; 3] = [
    [3.133_856_1, -1.616_866_7, -0.490_614_6],
    [-0.978_768_4, 1.916_141_5, 0.033_454],
    [0.071_945_3, -0.228_991_4, 1.405_242_7],
];

/// Convert a raster into 8-bit RGB plus alpha.
///
/// RGB input is returned unchanged. Alpha is carried through as-is. This never fails: every
/// possible sample combination maps to some RGB value.
#[tracing::instrument(skip(image), fields(model = ?image.model, w = image.width, h = image.height))]
pub fn to_display_color(image: RawImage) -> RawImage {
    let convert: fn(&[u8]) -> [u8; 3] = match image.model {
        ColorModel::Rgb => return image,
        ColorModel::Gray => |px| [px[0]; 3],
        ColorModel::Cmyk => |px| cmyk_to_rgb([px[0], px[1], px[2], px[3]]),
        ColorModel::Lab => |px| lab_to_rgb([px[0], px[1], px[2]]),
    };

    let stride = image.stride();
    let mut data = vec![0u8; image.data.len() / stride * 4];
    data.par_chunks_exact_mut(4)
        .zip(image.data.par_chunks_exact(stride))
        .for_each(|(out, px)| {
            let [r, g, b] = convert(px);
            out.copy_from_slice(&[r, g, b, px[stride - 1]]);
        });

    RawImage {
        width: image.width,
        height: image.height,
        model: ColorModel::Rgb,
        data,
    }
}

/// Naive ink-to-light conversion; `ink` holds C, M, Y, K amounts with 255 = full ink.
pub fn cmyk_to_rgb(ink: [u8; 4]) -> [u8; 3] {
    let k = 255 - ink[3];
    [
        mul_div255_u8(255 - ink[0], k),
        mul_div255_u8(255 - ink[1], k),
        mul_div255_u8(255 - ink[2], k),
    ]
}

/// 8-bit encoded Lab (`L * 255 / 100`, `a + 128`, `b + 128`) to sRGB.
pub fn lab_to_rgb(lab: [u8; 3]) -> [u8; 3] {
    let l = f32::from(lab[0]) * 100.0 / 255.0;
    let a = f32::from(lab[1]) - 128.0;
    let b = f32::from(lab[2]) - 128.0;

    let fy = (l + 16.0) / 116.0;
    let fx = fy + a / 500.0;
    let fz = fy - b / 200.0;
    let xyz = [
        lab_f_inv(fx) * WHITE_D50[0],
        lab_f_inv(fy) * WHITE_D50[1],
        lab_f_inv(fz) * WHITE_D50[2],
    ];

    XYZ_D50_TO_SRGB.map(|row| {
        let linear = row[0] * xyz[0] + row[1] * xyz[1] + row[2] * xyz[2];
        encode_srgb(linear)
    })
}

fn lab_f_inv(t: f32) -> f32 {
    const DELTA: f32 = 6.0 / 29.0;
    if t > DELTA {
        t * t * t
    } else {
        3.0 * DELTA * DELTA * (t - 4.0 / 29.0)
    }
}

fn encode_srgb(linear: f32) -> u8 {
    let c = linear.clamp(0.0, 1.0);
    let v = if c <= 0.003_130_8 {
        12.92 * c
    } else {
        1.055 * c.powf(1.0 / 2.4) - 0.055
    };
    (v * 255.0).round().clamp(0.0, 255.0) as u8
}

#[cfg(test)]
#[path = "../../tests/unit/raster/color.rs"]
mod tests;
