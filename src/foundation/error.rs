/// Convenience result type used across greenkey.
pub type GreenkeyResult<T> = Result<T, GreenkeyError>;

/// Top-level error taxonomy used by compositor and session APIs.
///
/// Playback-related variants ([`GreenkeyError::PlayFailure`], [`GreenkeyError::TaintedSurface`],
/// [`GreenkeyError::StaleFrame`]) are contained by [`crate::PlaybackSession`]; hosts only observe
/// them through the session's error flag and notifier.
#[derive(thiserror::Error, Debug)]
pub enum GreenkeyError {
    /// Invalid user-provided parameters, configuration or buffer shapes.
    #[error("validation error: {0}")]
    Validation(String),

    /// The frame source could not begin playback.
    #[error("play failure: {0}")]
    PlayFailure(String),

    /// Pixel read-back from the drawing surface was refused.
    #[error("tainted surface: {0}")]
    TaintedSurface(String),

    /// The frame source stopped while a pass was in flight.
    #[error("stale frame: source stopped mid-pass")]
    StaleFrame,

    /// Runtime failures while decoding, encoding or writing frames.
    #[error("evaluation error: {0}")]
    Evaluation(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl GreenkeyError {
    /// Build a [`GreenkeyError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`GreenkeyError::PlayFailure`] value.
    pub fn play_failure(msg: impl Into<String>) -> Self {
        Self::PlayFailure(msg.into())
    }

    /// Build a [`GreenkeyError::TaintedSurface`] value.
    pub fn tainted(msg: impl Into<String>) -> Self {
        Self::TaintedSurface(msg.into())
    }

    /// Build a [`GreenkeyError::Evaluation`] value.
    pub fn evaluation(msg: impl Into<String>) -> Self {
        Self::Evaluation(msg.into())
    }

    /// Whether this error means the overlay can no longer be shown and the host should fall back
    /// to its placeholder.
    ///
    /// A tainted surface is indistinguishable from a play failure for the host.
    pub fn is_playback_fatal(&self) -> bool {
        matches!(self, Self::PlayFailure(_) | Self::TaintedSurface(_))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
