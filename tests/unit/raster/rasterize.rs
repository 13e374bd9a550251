use super::*;
use crate::synth::{RLE, SynthDoc, SynthLayer, SynthMask};

fn layers(doc: SynthDoc) -> Vec<LayerNode> {
    crate::container::open(&doc.to_bytes()).unwrap().layers
}

#[test]
fn raster_matches_bbox_and_keeps_samples() {
    let nodes = layers(
        SynthDoc::rgb(4, 4).layer(SynthLayer::filled("a", (-2, 1, 3, 3), &[10, 20, 30], Some(200))),
    );
    let img = nodes[0].composite().unwrap();
    assert_eq!((img.width, img.height), (5, 2));
    assert_eq!(img.model, ColorModel::Rgb);
    assert_eq!(img.data.len(), 5 * 2 * 4);
    assert_eq!(img.pixel(4, 1)[3], 200);
}

#[test]
fn missing_alpha_is_opaque_and_rle_decodes() {
    let nodes = layers(
        SynthDoc::gray(4, 4)
            .layer(SynthLayer::filled("g", (0, 0, 4, 2), &[90], None).compressed(RLE)),
    );
    let img = nodes[0].composite().unwrap();
    assert!(img.data.chunks_exact(2).all(|px| px == [90, 255]));
}

#[test]
fn cmyk_samples_become_ink_amounts() {
    // Stored values are inverted on disk: 255 means no ink.
    let nodes = layers(
        SynthDoc::cmyk(2, 2).layer(SynthLayer::filled("c", (0, 0, 1, 1), &[255, 0, 155, 250], None)),
    );
    let img = nodes[0].composite().unwrap();
    assert_eq!(img.pixel(0, 0), &[0, 255, 100, 5, 255]);
}

#[test]
fn opacity_applies_to_alpha() {
    let nodes = layers(
        SynthDoc::rgb(2, 2)
            .layer(SynthLayer::filled("o", (0, 0, 1, 1), &[255, 255, 255], None).with_opacity(51)),
    );
    assert_eq!(nodes[0].composite().unwrap().pixel(0, 0), &[255, 255, 255, 51]);
}

#[test]
fn hidden_top_level_layer_still_rasterizes() {
    let nodes = layers(
        SynthDoc::rgb(2, 2).layer(SynthLayer::filled("h", (0, 0, 1, 1), &[1, 2, 3], None).hidden()),
    );
    assert!(!nodes[0].visible);
    assert_eq!(nodes[0].composite().unwrap().pixel(0, 0), &[1, 2, 3, 255]);
}

#[test]
fn mask_applies_against_its_own_rect() {
    let layer = SynthLayer::filled("m", (0, 0, 3, 1), &[9, 9, 9], None).with_mask(SynthMask {
        rect: (1, 0, 2, 1),
        default_color: 255,
        disabled: false,
        data: vec![0],
    });
    let img = layers(SynthDoc::rgb(3, 1).layer(layer))[0].composite().unwrap();
    let alphas: Vec<u8> = img.data.chunks_exact(4).map(|px| px[3]).collect();
    assert_eq!(alphas, vec![255, 0, 255]);
}

#[test]
fn disabled_mask_is_ignored() {
    let layer = SynthLayer::filled("m", (0, 0, 2, 1), &[9, 9, 9], None).with_mask(SynthMask {
        rect: (0, 0, 2, 1),
        default_color: 0,
        disabled: true,
        data: vec![0, 0],
    });
    let img = layers(SynthDoc::rgb(2, 1).layer(layer))[0].composite().unwrap();
    assert!(img.data.chunks_exact(4).all(|px| px[3] == 255));
}

#[test]
fn group_flattens_children_and_skips_hidden() {
    let nodes = layers(
        SynthDoc::rgb(4, 4)
            .layer(SynthLayer::group_end())
            .layer(SynthLayer::filled("under", (0, 0, 2, 1), &[100, 0, 0], None))
            .layer(SynthLayer::filled("over", (1, 0, 3, 1), &[0, 100, 0], None))
            .layer(SynthLayer::filled("ghost", (0, 0, 3, 1), &[0, 0, 100], None).hidden())
            .layer(SynthLayer::group_open("g")),
    );
    let img = nodes[0].composite().unwrap();
    assert_eq!((img.width, img.height), (3, 1));
    assert_eq!(img.pixel(0, 0), &[100, 0, 0, 255]);
    assert_eq!(img.pixel(1, 0), &[0, 100, 0, 255]);
    assert_eq!(img.pixel(2, 0), &[0, 100, 0, 255]);
}

#[test]
fn clipped_layers_follow_their_base() {
    let nodes = layers(
        SynthDoc::rgb(4, 4)
            .layer(SynthLayer::group_end())
            .layer(SynthLayer::filled("base", (0, 0, 1, 1), &[0, 0, 0], None))
            .layer(SynthLayer::filled("clip", (0, 0, 2, 1), &[50, 50, 50], None).clipped())
            .layer(SynthLayer::filled("hidden base", (3, 0, 4, 1), &[0, 0, 0], None).hidden())
            .layer(SynthLayer::filled("orphan", (2, 0, 4, 1), &[70, 70, 70], None).clipped())
            .layer(SynthLayer::group_open("g")),
    );
    let img = nodes[0].composite().unwrap();
    // Group box is the union of visible children: x 0..4.
    assert_eq!(img.width, 4);
    assert_eq!(img.pixel(0, 0), &[50, 50, 50, 255]);
    assert_eq!(img.pixel(1, 0)[3], 0);
    assert_eq!(img.pixel(2, 0)[3], 0);
    assert_eq!(img.pixel(3, 0)[3], 0);
}

#[test]
fn adjustment_without_pixels_and_unknown_are_transparent() {
    let mut odd = SynthLayer::new("odd", (0, 0, 2, 2));
    odd.divider = Some(9);
    let nodes = layers(
        SynthDoc::rgb(4, 4)
            .layer(SynthLayer::new("levels", (0, 0, 3, 2)).with_block(b"levl", vec![0; 4]))
            .layer(odd),
    );
    for node in &nodes {
        let img = node.composite().unwrap();
        assert_eq!(img.width as i32, node.bbox.right - node.bbox.left);
        assert!(img.data.iter().all(|&v| v == 0));
    }
}

#[test]
fn empty_bbox_yields_empty_raster() {
    let nodes = layers(
        SynthDoc::rgb(4, 4)
            .layer(SynthLayer::group_end())
            .layer(SynthLayer::group_open("empty")),
    );
    let img = nodes[0].composite().unwrap();
    assert!(img.is_empty());
    assert!(img.data.is_empty());
}

#[test]
fn truncated_channel_is_corrupt() {
    let mut layer = SynthLayer::filled("bad", (0, 0, 2, 2), &[1, 2, 3], None);
    layer.channels[0].1.truncate(1);
    let nodes = layers(SynthDoc::rgb(2, 2).layer(layer));
    assert!(matches!(nodes[0].composite(), Err(RasterError::CorruptData(_))));
}

#[test]
fn huge_layer_with_empty_channels_is_corrupt() {
    let mut layer = SynthLayer::new("huge", (0, 0, 30_000, 30_000));
    for id in 0..3 {
        layer = layer.with_channel(id, Vec::new());
    }
    let nodes = layers(SynthDoc::rgb(8, 8).layer(layer));
    assert!(matches!(nodes[0].composite(), Err(RasterError::CorruptData(_))));
}
