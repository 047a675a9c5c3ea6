use super::*;

#[test]
fn mul_div255_rounds_to_nearest() {
    assert_eq!(mul_div255_u16(255, 255), 255);
    assert_eq!(mul_div255_u16(0, 255), 0);
    assert_eq!(mul_div255_u16(128, 255), 128);
    assert_eq!(mul_div255_u16(100, 128), 50);
}

#[test]
fn clamp_unit_to_u8_saturates() {
    assert_eq!(clamp_unit_to_u8(-3.0), 0);
    assert_eq!(clamp_unit_to_u8(300.0), 255);
    assert_eq!(clamp_unit_to_u8(148.75), 149);
    assert_eq!(clamp_unit_to_u8(f32::NAN), 0);
}
