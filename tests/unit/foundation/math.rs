use super::*;

#[test]
fn premultiply_then_unpremultiply_opaque_is_identity() {
    let src = vec![12u8, 34, 56, 255, 255, 0, 128, 255];
    let mut buf = src.clone();
    premultiply_rgba8_in_place(&mut buf);
    assert_eq!(buf, src);
    unpremultiply_rgba8_in_place(&mut buf);
    assert_eq!(buf, src);
}

#[test]
fn premultiply_zero_alpha_clears_color() {
    let mut buf = vec![200u8, 150, 100, 0];
    premultiply_rgba8_in_place(&mut buf);
    assert_eq!(buf, vec![0, 0, 0, 0]);
}

#[test]
fn unpremultiply_half_alpha_recovers_color_within_rounding() {
    let mut buf = vec![200u8, 100, 50, 128];
    premultiply_rgba8_in_place(&mut buf);
    unpremultiply_rgba8_in_place(&mut buf);
    assert!((i32::from(buf[0]) - 200).abs() <= 1);
    assert!((i32::from(buf[1]) - 100).abs() <= 1);
    assert!((i32::from(buf[2]) - 50).abs() <= 1);
    assert_eq!(buf[3], 128);
}

#[test]
fn clamp_unit_to_u8_saturates() {
    assert_eq!(clamp_unit_to_u8(-0.5), 0);
    assert_eq!(clamp_unit_to_u8(0.5), 128);
    assert_eq!(clamp_unit_to_u8(3.0), 255);
}
