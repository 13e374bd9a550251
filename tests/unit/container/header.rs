use super::*;

fn header_bytes(sig: &[u8; 4], version: u16, channels: u16, w: u32, h: u32, depth: u16, mode: u16) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(sig);
    out.extend_from_slice(&version.to_be_bytes());
    out.extend_from_slice(&[0u8; 6]);
    out.extend_from_slice(&channels.to_be_bytes());
    out.extend_from_slice(&h.to_be_bytes());
    out.extend_from_slice(&w.to_be_bytes());
    out.extend_from_slice(&depth.to_be_bytes());
    out.extend_from_slice(&mode.to_be_bytes());
    out
}

fn parse(bytes: &[u8]) -> ParseResult<FileHeader> {
    read_header(&mut ByteReader::new(bytes))
}

#[test]
fn reads_psd_and_psb_headers() {
    let h = parse(&header_bytes(b"8BPS", 1, 4, 640, 480, 8, 4)).unwrap();
    assert_eq!(h.version, PsdVersion::Psd);
    assert_eq!((h.width, h.height), (640, 480));
    assert_eq!(h.color_mode, ColorMode::Cmyk);

    let h = parse(&header_bytes(b"8BPS", 2, 3, 100_000, 20, 16, 3)).unwrap();
    assert_eq!(h.version, PsdVersion::Psb);
    assert!(h.version.is_large());
}

#[test]
fn foreign_signature_and_version_are_unsupported() {
    let png = header_bytes(b"\x89PNG", 1, 3, 1, 1, 8, 3);
    assert!(matches!(parse(&png), Err(ParseError::UnsupportedFormat(_))));

    let v3 = header_bytes(b"8BPS", 3, 3, 1, 1, 8, 3);
    assert!(matches!(parse(&v3), Err(ParseError::UnsupportedFormat(_))));

    let mode = header_bytes(b"8BPS", 1, 3, 1, 1, 8, 5);
    assert!(matches!(parse(&mode), Err(ParseError::UnsupportedFormat(_))));

    let depth = header_bytes(b"8BPS", 1, 3, 1, 1, 12, 3);
    assert!(matches!(parse(&depth), Err(ParseError::UnsupportedFormat(_))));
}

#[test]
fn truncated_header_is_malformed() {
    let full = header_bytes(b"8BPS", 1, 3, 1, 1, 8, 3);
    assert!(matches!(parse(&full[..20]), Err(ParseError::Malformed(_))));
}

#[test]
fn canvas_size_is_bounded_by_version() {
    let too_wide = header_bytes(b"8BPS", 1, 3, 30_001, 10, 8, 3);
    assert!(matches!(parse(&too_wide), Err(ParseError::Malformed(_))));

    let zero = header_bytes(b"8BPS", 1, 3, 0, 10, 8, 3);
    assert!(matches!(parse(&zero), Err(ParseError::Malformed(_))));

    let channels = header_bytes(b"8BPS", 1, 57, 10, 10, 8, 3);
    assert!(matches!(parse(&channels), Err(ParseError::Malformed(_))));
}

#[test]
fn pixel_format_maps_layer_capable_modes() {
    let mut h = parse(&header_bytes(b"8BPS", 1, 1, 4, 4, 16, 8)).unwrap();
    let f = h.pixel_format().unwrap();
    assert_eq!(f.model, ColorModel::Gray);
    assert_eq!(f.depth, SampleDepth::Sixteen);

    h.color_mode = ColorMode::Indexed;
    assert!(matches!(
        h.pixel_format(),
        Err(ParseError::UnsupportedFormat(_))
    ));

    h.color_mode = ColorMode::Rgb;
    h.depth = 1;
    assert!(matches!(
        h.pixel_format(),
        Err(ParseError::UnsupportedFormat(_))
    ));
}
