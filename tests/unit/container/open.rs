use super::*;
use crate::synth::{SynthDoc, SynthLayer};
use crate::{BBox, ParseError};

#[test]
fn opens_three_layer_cmyk_document() {
    let doc = SynthDoc::cmyk(20, 10)
        .layer(SynthLayer::filled("Background", (0, 0, 20, 10), &[255, 128, 0, 200], None))
        .layer(SynthLayer::filled("left", (-5, 2, 5, 8), &[0, 0, 0, 0], Some(255)))
        .layer(SynthLayer::filled("right", (15, -1, 30, 4), &[10, 20, 30, 40], Some(128)));
    let tree = open(&doc.to_bytes()).unwrap();

    assert_eq!(tree.header.width, 20);
    assert_eq!(tree.len(), 3);
    let boxes: Vec<BBox> = tree.layers.iter().map(|l| l.bbox).collect();
    assert_eq!(
        boxes,
        vec![
            BBox::new(0, 0, 20, 10),
            BBox::new(-5, 2, 5, 8),
            BBox::new(15, -1, 30, 4)
        ]
    );
}

#[test]
fn document_without_layers_parses_empty() {
    let tree = open(&SynthDoc::rgb(4, 4).to_bytes()).unwrap();
    assert!(tree.is_empty());
}

#[test]
fn garbage_and_truncation_fail_cleanly() {
    assert!(matches!(open(b""), Err(ParseError::Malformed(_))));
    assert!(matches!(
        open(b"GIF89a........................"),
        Err(ParseError::UnsupportedFormat(_))
    ));

    let bytes = SynthDoc::rgb(4, 4)
        .layer(SynthLayer::filled("a", (0, 0, 4, 4), &[1, 2, 3], None))
        .to_bytes();
    for cut in [10, 26, 30, 40, 60] {
        assert!(
            matches!(open(&bytes[..cut]), Err(ParseError::Malformed(_))),
            "cut at {cut}"
        );
    }
}

#[test]
fn absurd_section_length_is_malformed() {
    let mut bytes = SynthDoc::rgb(4, 4).to_bytes();
    // Color mode data length sits right after the 26-byte header.
    bytes[26..30].copy_from_slice(&u32::MAX.to_be_bytes());
    assert!(matches!(open(&bytes), Err(ParseError::Malformed(_))));
}
