//! Frame sources: the decoder/player side of the compositor.

pub(crate) mod ffmpeg;
pub(crate) mod synthetic;

use crate::foundation::core::Dimensions;
use crate::foundation::error::GreenkeyResult;
use crate::frame::FrameRGBA;

/// Playback status reported by a [`FrameSource`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SourceStatus {
    /// Not playing: before `play`, or after `pause`.
    Paused,
    /// Frames are being produced.
    Playing,
    /// The source reached its end; no more frames.
    Ended,
}

/// A decoded video source driven by the session's frame clock.
///
/// `current_frame` is sampled once per pass; `advance` moves to the frame for the next tick.
pub trait FrameSource {
    /// Request playback. An error here is a play failure (blocked autoplay, decode error, ...).
    fn play(&mut self) -> GreenkeyResult<()>;

    /// Stop producing frames until `play` is called again.
    fn pause(&mut self);

    /// Current playback status.
    fn status(&self) -> SourceStatus;

    /// Native decoded dimensions; zero while the source is still loading.
    fn dimensions(&self) -> Dimensions;

    /// The frame currently on display, if one has been decoded.
    fn current_frame(&self) -> Option<&FrameRGBA>;

    /// Move to the next decoded frame.
    fn advance(&mut self) -> GreenkeyResult<()>;
}
