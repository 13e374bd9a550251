use super::*;

#[test]
fn cmyk_reference_values() {
    assert_eq!(cmyk_to_rgb([0, 0, 0, 0]), [255, 255, 255]);
    assert_eq!(cmyk_to_rgb([0, 0, 0, 255]), [0, 0, 0]);
    assert_eq!(cmyk_to_rgb([255, 0, 0, 0]), [0, 255, 255]);
    // (255 - 100) * (255 - 5) / 255, rounded.
    assert_eq!(cmyk_to_rgb([0, 255, 100, 5]), [250, 0, 152]);
}

#[test]
fn cmyk_conversion_is_total() {
    for c in (0..=255u8).step_by(5) {
        for m in (0..=255u8).step_by(15) {
            for y in (0..=255u8).step_by(17) {
                for k in (0..=255u8).step_by(51) {
                    let [r, g, b] = cmyk_to_rgb([c, m, y, k]);
                    assert!(r <= 255 - c && g <= 255 - m && b <= 255 - y);
                }
            }
        }
    }
}

#[test]
fn lab_extremes_map_to_black_and_white() {
    assert_eq!(lab_to_rgb([255, 128, 128]), [255, 255, 255]);
    assert_eq!(lab_to_rgb([0, 128, 128]), [0, 0, 0]);
    let [r, g, b] = lab_to_rgb([128, 128, 128]);
    assert!(r.abs_diff(g) <= 1 && g.abs_diff(b) <= 1);
    let [r, g, b] = lab_to_rgb([140, 255, 128]);
    assert!(r > g && r > b);
}

#[test]
fn rgb_passes_through_untouched() {
    let img = RawImage::from_raw(1, 1, ColorModel::Rgb, vec![1, 2, 3, 4]).unwrap();
    assert_eq!(to_display_color(img.clone()), img);
}

#[test]
fn gray_and_cmyk_become_rgb_with_alpha_kept() {
    let gray = RawImage::from_raw(2, 1, ColorModel::Gray, vec![7, 10, 200, 0]).unwrap();
    let out = to_display_color(gray);
    assert_eq!(out.model, ColorModel::Rgb);
    assert_eq!(out.data, vec![7, 7, 7, 10, 200, 200, 200, 0]);

    let cmyk = RawImage::from_raw(1, 1, ColorModel::Cmyk, vec![0, 0, 0, 255, 99]).unwrap();
    assert_eq!(to_display_color(cmyk).data, vec![0, 0, 0, 99]);
}

#[test]
fn empty_raster_converts_to_empty_rgb() {
    let img = RawImage::transparent(0, 3, ColorModel::Lab).unwrap();
    let out = to_display_color(img);
    assert_eq!(out.model, ColorModel::Rgb);
    assert!(out.data.is_empty());
}
