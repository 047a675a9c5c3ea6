use rayon::prelude::*;

use crate::foundation::core::Dimensions;
use crate::foundation::error::{GreenkeyError, GreenkeyResult};
use crate::frame::FrameRGBA;
use crate::key::params::KeyingParams;
use crate::key::table::KeyTable;

/// Width left after trimming `fraction` of the right edge: `floor(width * (1 - fraction))`.
///
/// The product is nudged up by one f32 epsilon (relative) to absorb the representation error of
/// the fraction, so `0.1` of `100` keeps exactly `90` columns while tiny fractions of wide frames
/// still drop a column.
pub fn cropped_width(width: u32, fraction: f32) -> u32 {
    if fraction <= 0.0 || !fraction.is_finite() {
        return width;
    }
    let kept = (f64::from(width) * (1.0 - f64::from(fraction)) * (1.0 + f64::from(f32::EPSILON)))
        .floor();
    (kept.max(0.0) as u32).min(width)
}

/// Dimensions of the processed area for a source of `src` dimensions.
pub fn processed_dimensions(src: Dimensions, params: &KeyingParams) -> Dimensions {
    Dimensions::new(cropped_width(src.width, params.crop_fraction), src.height)
}

/// Copy the left `kept_width` columns of `src` into `dst` (tightly packed).
///
/// Columns at or beyond `kept_width` are never read.
pub fn copy_cropped_into(src: &FrameRGBA, kept_width: u32, dst: &mut [u8]) -> GreenkeyResult<()> {
    if kept_width > src.width {
        return Err(GreenkeyError::validation(format!(
            "crop width {kept_width} exceeds source width {}",
            src.width
        )));
    }
    let src_stride = src.width as usize * 4;
    let dst_stride = kept_width as usize * 4;
    if dst.len() != dst_stride * src.height as usize {
        return Err(GreenkeyError::validation(
            "copy_cropped_into expects dst matching kept_width*height*4",
        ));
    }
    if dst_stride == 0 {
        return Ok(());
    }
    for (row, out) in src
        .data
        .chunks_exact(src_stride)
        .zip(dst.chunks_exact_mut(dst_stride))
    {
        out.copy_from_slice(&row[..dst_stride]);
    }
    Ok(())
}

/// Trim the right edge of a frame according to `fraction`.
pub fn crop_right(src: &FrameRGBA, fraction: f32) -> GreenkeyResult<FrameRGBA> {
    let kept = cropped_width(src.width, fraction);
    let mut out = FrameRGBA::transparent(Dimensions::new(kept, src.height))?;
    copy_cropped_into(src, kept, &mut out.data)?;
    Ok(out)
}

/// Key a tightly packed straight-alpha RGBA8 buffer in place.
pub fn key_rgba8_in_place(data: &mut [u8], table: &KeyTable) -> GreenkeyResult<()> {
    if !data.len().is_multiple_of(4) {
        return Err(GreenkeyError::validation(
            "key_rgba8_in_place expects an rgba8 buffer",
        ));
    }
    key_pixels(data, table);
    Ok(())
}

/// Row-parallel variant of [`key_rgba8_in_place`]; output is byte-identical.
pub fn key_rgba8_in_place_par(
    data: &mut [u8],
    width: u32,
    table: &KeyTable,
) -> GreenkeyResult<()> {
    let stride = width as usize * 4;
    if stride == 0 || !data.len().is_multiple_of(stride) {
        return Err(GreenkeyError::validation(
            "key_rgba8_in_place_par expects whole rows of rgba8 pixels",
        ));
    }
    data.par_chunks_mut(stride)
        .for_each(|row| key_pixels(row, table));
    Ok(())
}

/// Crop and key a whole frame, returning a new buffer.
pub fn key_frame(src: &FrameRGBA, params: &KeyingParams) -> GreenkeyResult<FrameRGBA> {
    params.validate()?;
    let table = KeyTable::new(*params);
    let mut out = crop_right(src, params.crop_fraction)?;
    if out.width > 0 {
        key_rgba8_in_place_par(&mut out.data, out.width, &table)?;
    }
    Ok(out)
}

#[inline]
fn key_pixels(data: &mut [u8], table: &KeyTable) {
    for px in data.chunks_exact_mut(4) {
        let out = table.key_pixel([px[0], px[1], px[2], px[3]]);
        px.copy_from_slice(&out);
    }
}

#[cfg(test)]
#[path = "../../tests/unit/key/pass.rs"]
mod tests;
