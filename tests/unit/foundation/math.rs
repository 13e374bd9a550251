use super::*;

#[test]
fn mul_div255_variants_align() {
    for x in [0u8, 1, 127, 255] {
        for y in [0u8, 1, 127, 255] {
            assert_eq!(
                u16::from(mul_div255_u8(x, y)),
                mul_div255_u16(u16::from(x), u16::from(y))
            );
        }
    }
}

#[test]
fn mul_div255_identities() {
    for x in 0..=255u8 {
        assert_eq!(mul_div255_u8(x, 255), x);
        assert_eq!(mul_div255_u8(x, 0), 0);
    }
}

#[test]
fn div_alpha_undoes_premultiplication_at_full_alpha() {
    for c in 0..=255u8 {
        assert_eq!(div_alpha_u8(c, 255), c);
    }
    assert_eq!(div_alpha_u8(10, 0), 0);
    assert_eq!(div_alpha_u8(64, 128), 128);
    assert_eq!(div_alpha_u8(200, 100), 255);
}
