use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::encode::sink::{FrameSink, SinkConfig};
use crate::foundation::core::FrameIndex;
use crate::foundation::error::{GreenkeyError, GreenkeyResult};
use crate::frame::FrameRGBA;

/// Writes each frame as `frame_NNNNN.png` into a directory, keeping the alpha channel.
///
/// Each file carries its own dimensions, so frames may change size mid-sequence.
#[derive(Debug)]
pub struct PngSequenceSink {
    dir: PathBuf,
    started: bool,
    written: u64,
}

impl PngSequenceSink {
    /// Create a sink writing into `dir` (created on `begin`).
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            started: false,
            written: 0,
        }
    }

    /// Output directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Number of frames written.
    pub fn written(&self) -> u64 {
        self.written
    }

    /// Path used for frame `idx`.
    pub fn frame_path(&self, idx: FrameIndex) -> PathBuf {
        self.dir.join(format!("frame_{:05}.png", idx.0))
    }
}

impl FrameSink for PngSequenceSink {
    fn begin(&mut self, cfg: SinkConfig) -> GreenkeyResult<()> {
        std::fs::create_dir_all(&self.dir)
            .with_context(|| format!("create output dir '{}'", self.dir.display()))?;
        tracing::debug!(dir = %self.dir.display(), width = cfg.width, height = cfg.height, "png sequence started");
        self.started = true;
        self.written = 0;
        Ok(())
    }

    fn push_frame(&mut self, idx: FrameIndex, frame: &FrameRGBA) -> GreenkeyResult<()> {
        if !self.started {
            return Err(GreenkeyError::evaluation("png sink not started"));
        }
        let path = self.frame_path(idx);
        let png = frame.encode_png()?;
        std::fs::write(&path, png).with_context(|| format!("write png '{}'", path.display()))?;
        self.written += 1;
        Ok(())
    }

    fn end(&mut self) -> GreenkeyResult<()> {
        self.started = false;
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/encode/png.rs"]
mod tests;
