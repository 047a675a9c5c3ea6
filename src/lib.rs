//! Greenkey is a real-time green-screen keyer for looping video overlays.
//!
//! Each tick of a frame clock runs one pass: the current decoded frame is drawn onto a surface
//! (optionally trimmed on the right), read back, keyed per pixel and written back in one batch.
//!
//! - Configure a [`KeyingParams`] (or load a [`KeyConfig`])
//! - Bind a [`FrameSource`] and a [`DrawingSurface`] into a [`PlaybackSession`]
//! - Drive it with a [`FramePump`] over a [`FrameClock`]
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod foundation;

/// JSON keying configuration.
pub mod config;
/// Per-frame compositing pass.
pub mod compositor;
/// Keyed output sinks.
pub mod encode;
/// RGBA8 frame buffers.
pub mod frame;
pub(crate) mod key;
/// Playback sessions and pacing.
pub mod session;
/// Decoded video sources.
pub mod source;
/// Drawing surfaces.
pub mod surface;

pub use crate::foundation::core::{Dimensions, Fps, FrameIndex};
pub use crate::foundation::error::{GreenkeyError, GreenkeyResult};

pub use crate::compositor::{ChromaKeyCompositor, CompositorOpts, PassOutcome};
pub use crate::config::{KeyConfig, SessionConfig};
pub use crate::encode::ffmpeg::{FfmpegSink, FfmpegSinkOpts, ffmpeg_available};
pub use crate::encode::png::PngSequenceSink;
pub use crate::encode::sink::{FrameSink, InMemorySink, SinkConfig};
pub use crate::frame::FrameRGBA;
pub use crate::key::params::{
    DEFAULT_RATIO, DEFAULT_RATIO_MIN_GREEN, DEFAULT_SIMILARITY_THRESHOLD,
    DEFAULT_SMOOTHNESS_WIDTH, KeyMode, KeyingParams,
};
pub use crate::key::pass::{
    crop_right, cropped_width, key_frame, key_rgba8_in_place, key_rgba8_in_place_par,
    processed_dimensions,
};
pub use crate::key::table::{KeyTable, Keyed, classify_greenness, greenness};
pub use crate::session::notify::{EventLog, HostNotifier, NoopNotifier, SessionEvent};
pub use crate::session::playback::{PlaybackSession, PlaybackState, SessionStats, TickOutcome};
pub use crate::session::pump::{
    CancelToken, DEFAULT_REVEAL_AFTER, FrameClock, FramePump, IntervalClock, ManualClock,
    PumpOpts, PumpReport, Tick,
};
pub use crate::source::ffmpeg::{FfmpegSource, VideoSourceInfo};
pub use crate::source::synthetic::SyntheticSource;
pub use crate::source::{FrameSource, SourceStatus};
pub use crate::surface::{DrawingSurface, PixelSurface, SinkSurface, SurfaceStats};
