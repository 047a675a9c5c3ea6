//! Playback sessions: lifecycle, host notifications and frame pacing.

/// Host notification trait and built-in notifiers.
pub mod notify;
/// Session lifecycle and per-tick pass scheduling.
pub mod playback;
/// Frame clocks and the loop that drives a session.
pub mod pump;
