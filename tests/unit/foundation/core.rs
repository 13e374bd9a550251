use super::*;

#[test]
fn bbox_dimensions_handle_negative_edges() {
    let b = BBox::new(-10, -5, 20, 15);
    assert_eq!(b.width(), 30);
    assert_eq!(b.height(), 20);
    assert!(!b.is_empty());
}

#[test]
fn inverted_bbox_is_empty() {
    let b = BBox::new(10, 10, 5, 20);
    assert_eq!(b.width(), 0);
    assert!(b.is_empty());
}

#[test]
fn extreme_bbox_width_does_not_overflow() {
    let b = BBox::new(i32::MIN, 0, i32::MAX, 1);
    assert_eq!(b.width(), u32::MAX);
}

#[test]
fn union_ignores_empty_boxes() {
    let a = BBox::new(0, 0, 4, 4);
    let b = BBox::new(-2, 2, 3, 9);
    assert_eq!(a.union(b), BBox::new(-2, 0, 4, 9));
    assert_eq!(BBox::EMPTY.union(a), a);
    assert_eq!(a.union(BBox::EMPTY), a);
}

#[test]
fn color_model_channel_counts() {
    assert_eq!(ColorModel::Gray.channels(), 1);
    assert_eq!(ColorModel::Rgb.channels(), 3);
    assert_eq!(ColorModel::Lab.channels(), 3);
    assert_eq!(ColorModel::Cmyk.channels(), 4);
}
