use crate::foundation::core::{Dimensions, FrameIndex};
use crate::foundation::error::{GreenkeyError, GreenkeyResult};
use crate::key::params::KeyingParams;
use crate::key::pass::{key_rgba8_in_place, key_rgba8_in_place_par, processed_dimensions};
use crate::key::table::KeyTable;
use crate::source::{FrameSource, SourceStatus};
use crate::surface::DrawingSurface;

/// Options for [`ChromaKeyCompositor`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CompositorOpts {
    /// Key rows in parallel on the rayon global pool.
    pub parallel: bool,
}

impl Default for CompositorOpts {
    fn default() -> Self {
        Self { parallel: true }
    }
}

/// Result of one successful call to [`ChromaKeyCompositor::process_frame`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PassOutcome {
    /// The surface now shows a freshly keyed frame.
    Composited {
        /// Sequence number of this pass within the compositor's lifetime.
        pass: FrameIndex,
        /// Processed (post-crop) dimensions.
        dims: Dimensions,
        /// Whether the surface was reallocated for this pass.
        resized: bool,
    },
    /// The source has no decoded frame yet (zero dimensions); nothing was touched.
    NotReady,
}

/// Chroma-key compositor: copies the current source frame onto a surface, keys it, writes it back.
///
/// Holds no per-frame state beyond the keying table and a scratch buffer reused between passes.
#[derive(Debug)]
pub struct ChromaKeyCompositor {
    table: KeyTable,
    opts: CompositorOpts,
    scratch: Vec<u8>,
    passes: u64,
}

impl ChromaKeyCompositor {
    /// Create a compositor for validated `params`.
    pub fn new(params: KeyingParams, opts: CompositorOpts) -> GreenkeyResult<Self> {
        params.validate()?;
        Ok(Self {
            table: KeyTable::new(params),
            opts,
            scratch: Vec::new(),
            passes: 0,
        })
    }

    /// Keying parameters in use.
    pub fn params(&self) -> &KeyingParams {
        self.table.params()
    }

    /// Number of passes that reached the surface.
    pub fn passes(&self) -> u64 {
        self.passes
    }

    /// Run one compositing pass.
    ///
    /// Returns [`GreenkeyError::StaleFrame`] (without writing anything) when the source is not
    /// playing at the start or stopped before the keyed buffer was written back, and
    /// [`GreenkeyError::TaintedSurface`] when the surface refuses read-back.
    pub fn process_frame<S, D>(&mut self, source: &S, surface: &mut D) -> GreenkeyResult<PassOutcome>
    where
        S: FrameSource + ?Sized,
        D: DrawingSurface + ?Sized,
    {
        if source.status() != SourceStatus::Playing {
            return Err(GreenkeyError::StaleFrame);
        }
        if source.dimensions().is_empty() {
            return Ok(PassOutcome::NotReady);
        }
        let Some(frame) = source.current_frame() else {
            return Ok(PassOutcome::NotReady);
        };
        let dims = processed_dimensions(frame.dimensions(), self.params());
        if dims.is_empty() {
            return Ok(PassOutcome::NotReady);
        }

        let resized = surface.dimensions() != dims;
        if resized {
            tracing::debug!(from = %surface.dimensions(), to = %dims, "resizing surface");
            surface.resize(dims)?;
        }

        surface.draw_frame(frame)?;

        let len = dims.rgba8_len()?;
        if self.scratch.len() != len {
            self.scratch.clear();
            self.scratch.resize(len, 0);
        }
        surface.read_pixels(&mut self.scratch)?;

        if self.opts.parallel {
            key_rgba8_in_place_par(&mut self.scratch, dims.width, &self.table)?;
        } else {
            key_rgba8_in_place(&mut self.scratch, &self.table)?;
        }

        if source.status() != SourceStatus::Playing {
            return Err(GreenkeyError::StaleFrame);
        }
        surface.put_pixels(&self.scratch)?;

        let pass = FrameIndex(self.passes);
        self.passes += 1;
        Ok(PassOutcome::Composited {
            pass,
            dims,
            resized,
        })
    }
}

#[cfg(test)]
#[path = "../tests/unit/compositor.rs"]
mod tests;
