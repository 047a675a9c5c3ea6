use crate::encode::sink::{FrameSink, SinkConfig};
use crate::foundation::core::{Dimensions, FrameIndex, Fps};
use crate::foundation::error::{GreenkeyError, GreenkeyResult};
use crate::frame::FrameRGBA;
use crate::key::pass::copy_cropped_into;

/// A host-provided 2D drawing surface holding one RGBA8 pixel buffer.
///
/// Mirrors what the compositor needs from a canvas: stored dimensions, a resize, a raw frame blit,
/// and batch get/put of pixel data.
pub trait DrawingSurface {
    /// Stored dimensions of the pixel buffer.
    fn dimensions(&self) -> Dimensions;

    /// Reallocate the buffer for new dimensions. Contents are reset to transparent.
    fn resize(&mut self, dims: Dimensions) -> GreenkeyResult<()>;

    /// Copy the left `dimensions().width` columns of `frame` into the buffer unmodified.
    fn draw_frame(&mut self, frame: &FrameRGBA) -> GreenkeyResult<()>;

    /// Read the buffer back into `dst`.
    ///
    /// Fails with [`GreenkeyError::TaintedSurface`] when the host forbids pixel read-back.
    fn read_pixels(&self, dst: &mut [u8]) -> GreenkeyResult<()>;

    /// Replace the buffer with `src` in one batch.
    fn put_pixels(&mut self, src: &[u8]) -> GreenkeyResult<()>;
}

/// Operation counters for a [`PixelSurface`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SurfaceStats {
    /// Number of reallocations caused by dimension changes.
    pub resizes: u64,
    /// Raw frame blits.
    pub draws: u64,
    /// Batch writes.
    pub puts: u64,
}

/// In-memory drawing surface.
#[derive(Debug, Default)]
pub struct PixelSurface {
    dims: Dimensions,
    pixels: Vec<u8>,
    tainted: bool,
    stats: SurfaceStats,
}

impl PixelSurface {
    /// Create an empty `0x0` surface.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a surface whose read-back is refused, as for an off-origin source without CORS.
    pub fn tainted() -> Self {
        Self {
            tainted: true,
            ..Self::default()
        }
    }

    /// Toggle the read-back restriction.
    pub fn set_tainted(&mut self, tainted: bool) {
        self.tainted = tainted;
    }

    /// Operation counters.
    pub fn stats(&self) -> SurfaceStats {
        self.stats
    }

    /// Borrow the currently displayed pixels.
    pub fn displayed(&self) -> &[u8] {
        &self.pixels
    }

    /// Copy the currently displayed pixels into a frame.
    pub fn snapshot(&self) -> GreenkeyResult<FrameRGBA> {
        FrameRGBA::from_raw(self.dims.width, self.dims.height, self.pixels.clone())
    }
}

impl DrawingSurface for PixelSurface {
    fn dimensions(&self) -> Dimensions {
        self.dims
    }

    fn resize(&mut self, dims: Dimensions) -> GreenkeyResult<()> {
        let len = dims.rgba8_len()?;
        self.pixels.clear();
        self.pixels.resize(len, 0);
        self.dims = dims;
        self.stats.resizes = self.stats.resizes.saturating_add(1);
        Ok(())
    }

    fn draw_frame(&mut self, frame: &FrameRGBA) -> GreenkeyResult<()> {
        if frame.height != self.dims.height {
            return Err(GreenkeyError::validation(format!(
                "frame height {} does not match surface {}",
                frame.height, self.dims
            )));
        }
        copy_cropped_into(frame, self.dims.width, &mut self.pixels)?;
        self.stats.draws = self.stats.draws.saturating_add(1);
        Ok(())
    }

    fn read_pixels(&self, dst: &mut [u8]) -> GreenkeyResult<()> {
        if self.tainted {
            return Err(GreenkeyError::tainted(
                "surface pixels are not readable (cross-origin source)",
            ));
        }
        if dst.len() != self.pixels.len() {
            return Err(GreenkeyError::validation(
                "read_pixels expects dst matching surface size",
            ));
        }
        dst.copy_from_slice(&self.pixels);
        Ok(())
    }

    fn put_pixels(&mut self, src: &[u8]) -> GreenkeyResult<()> {
        if src.len() != self.pixels.len() {
            return Err(GreenkeyError::validation(
                "put_pixels expects src matching surface size",
            ));
        }
        self.pixels.copy_from_slice(src);
        self.stats.puts = self.stats.puts.saturating_add(1);
        Ok(())
    }
}

/// A [`PixelSurface`] that forwards every displayed buffer to a [`FrameSink`].
///
/// The sink is started lazily on the first write, when the output dimensions are known.
pub struct SinkSurface<S: FrameSink> {
    inner: PixelSurface,
    sink: S,
    fps: Fps,
    next_idx: u64,
    started: bool,
    scratch: FrameRGBA,
}

impl<S: FrameSink> SinkSurface<S> {
    /// Wrap `sink`; frames are tagged with consecutive indices at `fps`.
    pub fn new(sink: S, fps: Fps) -> Self {
        Self {
            inner: PixelSurface::new(),
            sink,
            fps,
            next_idx: 0,
            started: false,
            scratch: FrameRGBA {
                width: 0,
                height: 0,
                data: Vec::new(),
            },
        }
    }

    /// The underlying in-memory surface.
    pub fn surface(&self) -> &PixelSurface {
        &self.inner
    }

    /// Number of frames forwarded so far.
    pub fn frames_written(&self) -> u64 {
        self.next_idx
    }

    /// Finish the sink (if it was started) and return it.
    pub fn finish(mut self) -> GreenkeyResult<S> {
        if self.started {
            self.sink.end()?;
        }
        Ok(self.sink)
    }
}

impl<S: FrameSink> DrawingSurface for SinkSurface<S> {
    fn dimensions(&self) -> Dimensions {
        self.inner.dimensions()
    }

    fn resize(&mut self, dims: Dimensions) -> GreenkeyResult<()> {
        self.inner.resize(dims)
    }

    fn draw_frame(&mut self, frame: &FrameRGBA) -> GreenkeyResult<()> {
        self.inner.draw_frame(frame)
    }

    fn read_pixels(&self, dst: &mut [u8]) -> GreenkeyResult<()> {
        self.inner.read_pixels(dst)
    }

    fn put_pixels(&mut self, src: &[u8]) -> GreenkeyResult<()> {
        self.inner.put_pixels(src)?;

        let dims = self.inner.dimensions();
        if !self.started {
            self.sink.begin(SinkConfig {
                width: dims.width,
                height: dims.height,
                fps: self.fps,
            })?;
            self.started = true;
        }

        self.scratch.width = dims.width;
        self.scratch.height = dims.height;
        self.scratch.data.clear();
        self.scratch.data.extend_from_slice(src);
        self.sink
            .push_frame(FrameIndex(self.next_idx), &self.scratch)?;
        self.next_idx += 1;
        Ok(())
    }
}

#[cfg(test)]
#[path = "../tests/unit/surface.rs"]
mod tests;
