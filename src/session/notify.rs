use crate::foundation::error::GreenkeyError;
use crate::session::playback::PlaybackState;

/// Host callbacks for a playback session.
///
/// All methods default to no-ops. The session guarantees `on_ended` and `on_reveal` fire at most
/// once, and `on_error` at most once.
pub trait HostNotifier {
    /// The session moved between states.
    fn on_state_change(&mut self, _from: PlaybackState, _to: PlaybackState) {}
    /// Playback reached the end of the source.
    fn on_ended(&mut self) {}
    /// Playback failed; the host should show its placeholder.
    fn on_error(&mut self, _err: &GreenkeyError) {}
    /// The host may run its post-intro transition.
    fn on_reveal(&mut self) {}
}

/// Notifier that ignores everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopNotifier;

impl HostNotifier for NoopNotifier {}

/// One recorded host notification.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionEvent {
    /// See [`HostNotifier::on_state_change`].
    StateChanged {
        /// Previous state.
        from: PlaybackState,
        /// New state.
        to: PlaybackState,
    },
    /// See [`HostNotifier::on_ended`].
    Ended,
    /// See [`HostNotifier::on_error`]; carries the rendered error.
    Error(String),
    /// See [`HostNotifier::on_reveal`].
    Reveal,
}

/// Notifier that records every event in order.
#[derive(Clone, Debug, Default)]
pub struct EventLog {
    events: Vec<SessionEvent>,
}

impl EventLog {
    /// Create an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Recorded events in order.
    pub fn events(&self) -> &[SessionEvent] {
        &self.events
    }

    /// Count events matching `pred`.
    pub fn count(&self, pred: impl Fn(&SessionEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }
}

impl HostNotifier for EventLog {
    fn on_state_change(&mut self, from: PlaybackState, to: PlaybackState) {
        self.events.push(SessionEvent::StateChanged { from, to });
    }

    fn on_ended(&mut self) {
        self.events.push(SessionEvent::Ended);
    }

    fn on_error(&mut self, err: &GreenkeyError) {
        self.events.push(SessionEvent::Error(err.to_string()));
    }

    fn on_reveal(&mut self) {
        self.events.push(SessionEvent::Reveal);
    }
}
