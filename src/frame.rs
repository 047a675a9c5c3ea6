use crate::foundation::core::Dimensions;
use crate::foundation::error::{GreenkeyError, GreenkeyResult};

/// A frame as RGBA8 pixels.
///
/// Decoded video frames and keyed output both use **straight** (non-premultiplied) alpha: keying
/// only rewrites the alpha channel and leaves colour as-is for hidden pixels.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameRGBA {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// RGBA8 bytes, tightly packed, row-major.
    pub data: Vec<u8>,
}

impl FrameRGBA {
    /// Wrap an existing RGBA8 buffer, validating its length.
    pub fn from_raw(width: u32, height: u32, data: Vec<u8>) -> GreenkeyResult<Self> {
        let expected = Dimensions::new(width, height).rgba8_len()?;
        if data.len() != expected {
            return Err(GreenkeyError::validation(format!(
                "rgba8 buffer has {} bytes, expected {expected} for {width}x{height}",
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Allocate a fully transparent frame.
    pub fn transparent(dims: Dimensions) -> GreenkeyResult<Self> {
        let len = dims.rgba8_len()?;
        Ok(Self {
            width: dims.width,
            height: dims.height,
            data: vec![0u8; len],
        })
    }

    /// Fill a frame with a single straight-alpha colour.
    pub fn solid(dims: Dimensions, rgba: [u8; 4]) -> GreenkeyResult<Self> {
        let px = (dims.width as usize)
            .checked_mul(dims.height as usize)
            .ok_or_else(|| GreenkeyError::validation("rgba8 buffer size overflow"))?;
        Ok(Self {
            width: dims.width,
            height: dims.height,
            data: rgba.repeat(px),
        })
    }

    /// Frame dimensions.
    pub fn dimensions(&self) -> Dimensions {
        Dimensions::new(self.width, self.height)
    }

    /// Read the pixel at `(x, y)`.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = ((y as usize) * (self.width as usize) + (x as usize)) * 4;
        Some([
            self.data[i],
            self.data[i + 1],
            self.data[i + 2],
            self.data[i + 3],
        ])
    }

    /// Overwrite the pixel at `(x, y)`; out-of-bounds writes are ignored.
    pub fn set_pixel(&mut self, x: u32, y: u32, rgba: [u8; 4]) {
        if x >= self.width || y >= self.height {
            return;
        }
        let i = ((y as usize) * (self.width as usize) + (x as usize)) * 4;
        self.data[i..i + 4].copy_from_slice(&rgba);
    }

    /// Decode an encoded still image (PNG, JPEG, ...) into straight-alpha RGBA8.
    pub fn decode(bytes: &[u8]) -> GreenkeyResult<Self> {
        use anyhow::Context as _;

        let img = image::load_from_memory(bytes)
            .context("decode image from memory")?
            .to_rgba8();
        let (width, height) = img.dimensions();
        Self::from_raw(width, height, img.into_raw())
    }

    /// Encode the frame as PNG, preserving alpha.
    pub fn encode_png(&self) -> GreenkeyResult<Vec<u8>> {
        use anyhow::Context as _;
        use image::ImageEncoder as _;

        let mut buf = Vec::new();
        image::codecs::png::PngEncoder::new(&mut buf)
            .write_image(
                &self.data,
                self.width,
                self.height,
                image::ExtendedColorType::Rgba8,
            )
            .context("encode png")?;
        Ok(buf)
    }
}

#[cfg(test)]
#[path = "../tests/unit/frame.rs"]
mod tests;
