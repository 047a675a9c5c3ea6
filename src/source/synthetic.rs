use crate::foundation::core::Dimensions;
use crate::foundation::error::{GreenkeyError, GreenkeyResult};
use crate::frame::FrameRGBA;
use crate::source::{FrameSource, SourceStatus};

/// In-memory frame source for tests, demos and still images.
///
/// Frames are shown one per tick in order. The source can simulate a loading delay (zero
/// dimensions for a few ticks), a rejected `play`, and looping.
#[derive(Clone, Debug)]
pub struct SyntheticSource {
    frames: Vec<FrameRGBA>,
    cursor: usize,
    status: SourceStatus,
    loading_ticks: u32,
    reject_play: Option<String>,
    looping: bool,
    play_calls: u32,
}

impl SyntheticSource {
    /// Create a source over `frames`.
    pub fn new(frames: Vec<FrameRGBA>) -> Self {
        Self {
            frames,
            cursor: 0,
            status: SourceStatus::Paused,
            loading_ticks: 0,
            reject_play: None,
            looping: false,
            play_calls: 0,
        }
    }

    /// Report zero dimensions for the first `ticks` advances after `play`.
    pub fn with_loading_ticks(mut self, ticks: u32) -> Self {
        self.loading_ticks = ticks;
        self
    }

    /// Make every `play` call fail with `reason`.
    pub fn rejecting_play(mut self, reason: impl Into<String>) -> Self {
        self.reject_play = Some(reason.into());
        self
    }

    /// Wrap around instead of ending.
    pub fn with_looping(mut self, looping: bool) -> Self {
        self.looping = looping;
        self
    }

    /// Force the source into the ended state.
    pub fn end_now(&mut self) {
        self.status = SourceStatus::Ended;
    }

    /// Index of the frame currently on display.
    pub fn position(&self) -> usize {
        self.cursor
    }

    /// Number of `play` requests received.
    pub fn play_calls(&self) -> u32 {
        self.play_calls
    }

    fn is_loading(&self) -> bool {
        self.loading_ticks > 0
    }
}

impl FrameSource for SyntheticSource {
    fn play(&mut self) -> GreenkeyResult<()> {
        self.play_calls += 1;
        if let Some(reason) = &self.reject_play {
            return Err(GreenkeyError::play_failure(reason.clone()));
        }
        if self.frames.is_empty() {
            return Err(GreenkeyError::play_failure("source has no frames"));
        }
        if self.status != SourceStatus::Ended {
            self.status = SourceStatus::Playing;
        }
        Ok(())
    }

    fn pause(&mut self) {
        if self.status == SourceStatus::Playing {
            self.status = SourceStatus::Paused;
        }
    }

    fn status(&self) -> SourceStatus {
        self.status
    }

    fn dimensions(&self) -> Dimensions {
        if self.is_loading() {
            return Dimensions::default();
        }
        self.frames
            .get(self.cursor)
            .map(FrameRGBA::dimensions)
            .unwrap_or_default()
    }

    fn current_frame(&self) -> Option<&FrameRGBA> {
        if self.is_loading() || self.status == SourceStatus::Ended {
            return None;
        }
        self.frames.get(self.cursor)
    }

    fn advance(&mut self) -> GreenkeyResult<()> {
        if self.status != SourceStatus::Playing {
            return Ok(());
        }
        if self.is_loading() {
            self.loading_ticks -= 1;
            return Ok(());
        }
        self.cursor += 1;
        if self.cursor >= self.frames.len() {
            if self.looping {
                self.cursor = 0;
            } else {
                self.cursor = self.frames.len() - 1;
                self.status = SourceStatus::Ended;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/source/synthetic.rs"]
mod tests;
