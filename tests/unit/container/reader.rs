use super::*;

#[test]
fn reads_big_endian_scalars() {
    let bytes = [0x00, 0x01, 0xff, 0xfe, 0x00, 0x00, 0x01, 0x00, 0xff, 0xff, 0xff, 0xf6];
    let mut r = ByteReader::new(&bytes);
    assert_eq!(r.u16("a").unwrap(), 1);
    assert_eq!(r.i16("b").unwrap(), -2);
    assert_eq!(r.u32("c").unwrap(), 256);
    assert_eq!(r.i32("d").unwrap(), -10);
    assert!(r.is_empty());
}

#[test]
fn overrun_is_malformed() {
    let mut r = ByteReader::new(&[1, 2, 3]);
    let err = r.u32("header").unwrap_err();
    assert!(matches!(err, ParseError::Malformed(_)));
    assert!(err.to_string().contains("header"));
    // A failed read does not advance.
    assert_eq!(r.position(), 0);
}

#[test]
fn implausible_length_is_rejected_before_allocation() {
    let mut bytes = vec![0xff, 0xff, 0xff, 0xf0];
    bytes.extend_from_slice(&[0u8; 8]);
    let mut r = ByteReader::new(&bytes);
    assert!(matches!(
        r.section(false, "layer info"),
        Err(ParseError::Malformed(_))
    ));

    let mut long = vec![0x7f, 0, 0, 0, 0, 0, 0, 0];
    long.extend_from_slice(&[0u8; 4]);
    let mut r = ByteReader::new(&long);
    assert!(matches!(
        r.section(true, "layer info"),
        Err(ParseError::Malformed(_))
    ));
}

#[test]
fn section_splits_nested_reader() {
    let bytes = [0, 0, 0, 2, 0xaa, 0xbb, 0xcc];
    let mut r = ByteReader::new(&bytes);
    let mut inner = r.section(false, "block").unwrap();
    assert_eq!(inner.remaining(), 2);
    assert_eq!(inner.u8("x").unwrap(), 0xaa);
    assert_eq!(r.u8("y").unwrap(), 0xcc);
}

#[test]
fn pascal_string_honors_padding() {
    // "ab" + length byte = 3 bytes, padded to 4.
    let bytes = [2, b'a', b'b', 0, 0xee];
    let mut r = ByteReader::new(&bytes);
    assert_eq!(r.pascal_string(4, "name").unwrap(), "ab");
    assert_eq!(r.u8("next").unwrap(), 0xee);
}

#[test]
fn pascal_string_tolerates_missing_trailing_padding() {
    let bytes = [1, b'x'];
    let mut r = ByteReader::new(&bytes);
    assert_eq!(r.pascal_string(4, "name").unwrap(), "x");
    assert!(r.is_empty());
}

#[test]
fn zero_padding_skip_stops_at_data() {
    let bytes = [0, 0, b'8', b'B'];
    let mut r = ByteReader::new(&bytes);
    r.skip_zero_padding();
    assert_eq!(r.position(), 2);
}
