//! Frame sinks for keyed output.
//!
//! Sinks consume displayed surface buffers in order; see [`crate::SinkSurface`].

/// `ffmpeg`-based sinks (MP4 output via system `ffmpeg`).
pub mod ffmpeg;
/// PNG image-sequence sink.
pub mod png;
/// Generic frame sink trait and built-in sinks.
pub mod sink;
