use super::*;

fn striped(width: u32, height: u32) -> FrameRGBA {
    let mut f = FrameRGBA::transparent(Dimensions::new(width, height)).unwrap();
    for y in 0..height {
        for x in 0..width {
            let px = if (x + y) % 3 == 0 {
                [10, 250, 15, 255]
            } else if (x + y) % 3 == 1 {
                [60, 170, 40, 255]
            } else {
                [200, 120, 90, 255]
            };
            f.set_pixel(x, y, px);
        }
    }
    f
}

#[test]
fn cropped_width_floors() {
    assert_eq!(cropped_width(100, 0.0), 100);
    assert_eq!(cropped_width(100, 0.1), 90);
    assert_eq!(cropped_width(101, 0.1), 90);
    assert_eq!(cropped_width(1920, 0.15), 1632);
    assert_eq!(cropped_width(3, 0.5), 1);
    assert_eq!(cropped_width(1, 0.5), 0);
}

#[test]
fn tiny_crop_of_a_wide_frame_still_drops_a_column() {
    assert_eq!(cropped_width(1000, 5e-7), 999);
    assert_eq!(cropped_width(4096, 0.001), 4091);
}

#[test]
fn crop_keeps_left_columns_only() {
    let mut src = FrameRGBA::solid(Dimensions::new(10, 2), [1, 2, 3, 255]).unwrap();
    for y in 0..2 {
        for x in 8..10 {
            src.set_pixel(x, y, [9, 9, 9, 9]);
        }
    }
    let out = crop_right(&src, 0.2).unwrap();
    assert_eq!(out.dimensions(), Dimensions::new(8, 2));
    assert!(out.data.chunks_exact(4).all(|px| px == [1, 2, 3, 255]));
}

#[test]
fn copy_cropped_rejects_mismatched_dst() {
    let src = FrameRGBA::solid(Dimensions::new(4, 2), [0, 0, 0, 255]).unwrap();
    let mut dst = vec![0u8; 3 * 2 * 4 - 1];
    assert!(copy_cropped_into(&src, 3, &mut dst).is_err());
    let mut dst = vec![0u8; 5 * 2 * 4];
    assert!(copy_cropped_into(&src, 5, &mut dst).is_err());
}

#[test]
fn parallel_keying_matches_sequential() {
    let table = KeyTable::new(KeyingParams::default().with_spill_suppression(true));
    let src = striped(37, 23);

    let mut seq = src.data.clone();
    key_rgba8_in_place(&mut seq, &table).unwrap();
    let mut par = src.data.clone();
    key_rgba8_in_place_par(&mut par, src.width, &table).unwrap();

    assert_eq!(seq, par);
    assert_ne!(seq, src.data);
}

#[test]
fn in_place_rejects_partial_pixels() {
    let table = KeyTable::new(KeyingParams::default());
    let mut buf = vec![0u8; 7];
    assert!(key_rgba8_in_place(&mut buf, &table).is_err());
    assert!(key_rgba8_in_place_par(&mut buf, 0, &table).is_err());
}

#[test]
fn key_frame_crops_then_keys() {
    let params = KeyingParams::soft(0.35, 0.12)
        .unwrap()
        .with_crop_fraction(0.5);
    let src = striped(6, 1);
    let out = key_frame(&src, &params).unwrap();
    assert_eq!(out.dimensions(), Dimensions::new(3, 1));
    assert_eq!(out.pixel(0, 0), Some([10, 250, 15, 0]));
    assert_eq!(out.pixel(2, 0), Some([200, 120, 90, 255]));
}

#[test]
fn key_frame_rejects_invalid_params() {
    let src = striped(2, 2);
    let bad = KeyingParams::default().with_crop_fraction(-0.5);
    assert!(key_frame(&src, &bad).is_err());
}
