use crate::compositor::{ChromaKeyCompositor, CompositorOpts, PassOutcome};
use crate::foundation::error::{GreenkeyError, GreenkeyResult};
use crate::key::params::KeyingParams;
use crate::session::notify::HostNotifier;
use crate::source::{FrameSource, SourceStatus};
use crate::surface::DrawingSurface;

/// Lifecycle of a [`PlaybackSession`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaybackState {
    /// Created or paused; no passes run.
    Idle,
    /// Passes run once per clock tick.
    Playing,
    /// The source finished. Terminal.
    Ended,
    /// Playback could not start or pixels could not be read back. Terminal.
    Failed,
}

impl PlaybackState {
    /// `Ended` and `Failed` never leave; a new session is needed.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Ended | Self::Failed)
    }
}

/// What one [`PlaybackSession::tick`] did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    /// The session is not playing; nothing ran.
    Inactive,
    /// A pass ran (or found no frame yet).
    Pass(PassOutcome),
    /// The source stopped during the pass; nothing was written.
    Stale,
    /// The pass failed and the session is now [`PlaybackState::Failed`].
    Failed,
}

/// Per-session counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SessionStats {
    /// Ticks received while playing.
    pub ticks: u64,
    /// Passes that wrote keyed pixels.
    pub composited: u64,
    /// Ticks skipped because the source had no frame yet.
    pub not_ready: u64,
    /// Passes abandoned because the source stopped.
    pub stale: u64,
}

/// One playback of one source onto one surface.
///
/// All playback failures are contained here: they move the session to
/// [`PlaybackState::Failed`], set the error flag and notify the host once. Nothing is retried.
pub struct PlaybackSession<S, D, N> {
    source: S,
    surface: D,
    notifier: N,
    compositor: ChromaKeyCompositor,
    state: PlaybackState,
    error: Option<String>,
    ended_notified: bool,
    revealed: bool,
    stats: SessionStats,
}

impl<S, D, N> PlaybackSession<S, D, N>
where
    S: FrameSource,
    D: DrawingSurface,
    N: HostNotifier,
{
    /// Bind a source and surface. The session starts [`PlaybackState::Idle`].
    pub fn new(
        source: S,
        surface: D,
        notifier: N,
        params: KeyingParams,
        opts: CompositorOpts,
    ) -> GreenkeyResult<Self> {
        Ok(Self {
            source,
            surface,
            notifier,
            compositor: ChromaKeyCompositor::new(params, opts)?,
            state: PlaybackState::Idle,
            error: None,
            ended_notified: false,
            revealed: false,
            stats: SessionStats::default(),
        })
    }

    /// Current state.
    pub fn state(&self) -> PlaybackState {
        self.state
    }

    /// Whether the host should render its placeholder.
    pub fn has_error(&self) -> bool {
        self.error.is_some()
    }

    /// Rendered failure, if any.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Counters.
    pub fn stats(&self) -> SessionStats {
        self.stats
    }

    /// Whether the reveal notification has been delivered.
    pub fn is_revealed(&self) -> bool {
        self.revealed
    }

    /// The bound source.
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Mutable access to the bound source.
    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    /// The output surface.
    pub fn surface(&self) -> &D {
        &self.surface
    }

    /// The host notifier.
    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    /// Tear the session down, returning its collaborators.
    pub fn into_parts(self) -> (S, D, N) {
        (self.source, self.surface, self.notifier)
    }

    /// Request playback.
    #[tracing::instrument(level = "debug", skip(self), fields(state = ?self.state))]
    pub fn start(&mut self) {
        match self.state {
            PlaybackState::Playing => return,
            PlaybackState::Ended | PlaybackState::Failed => {
                tracing::debug!("start ignored on a finished session");
                return;
            }
            PlaybackState::Idle => {}
        }
        match self.source.play() {
            Ok(()) => self.transition(PlaybackState::Playing),
            Err(e) => self.fail(e),
        }
    }

    /// Pause playback; passes stop until [`PlaybackSession::start`] is called again.
    pub fn pause(&mut self) {
        if self.state == PlaybackState::Playing {
            self.source.pause();
            self.transition(PlaybackState::Idle);
        }
    }

    /// Resume after [`PlaybackSession::pause`]; the source is asked to play again.
    pub fn resume(&mut self) {
        self.start();
    }

    /// Run one compositing pass and advance the source.
    pub fn tick(&mut self) -> TickOutcome {
        if self.state != PlaybackState::Playing {
            return TickOutcome::Inactive;
        }
        self.stats.ticks += 1;

        let outcome = match self
            .compositor
            .process_frame(&self.source, &mut self.surface)
        {
            Ok(pass) => {
                match pass {
                    PassOutcome::Composited { .. } => self.stats.composited += 1,
                    PassOutcome::NotReady => self.stats.not_ready += 1,
                }
                TickOutcome::Pass(pass)
            }
            Err(GreenkeyError::StaleFrame) => {
                self.stats.stale += 1;
                TickOutcome::Stale
            }
            Err(e) => {
                self.fail(e);
                return TickOutcome::Failed;
            }
        };

        if let Err(e) = self.source.advance() {
            self.fail(e);
            return TickOutcome::Failed;
        }
        match self.source.status() {
            SourceStatus::Ended => self.finish(),
            SourceStatus::Paused => self.transition(PlaybackState::Idle),
            SourceStatus::Playing => {}
        }
        outcome
    }

    /// Deliver the reveal notification (at most once).
    pub fn reveal(&mut self) {
        if !self.revealed {
            self.revealed = true;
            tracing::debug!(state = ?self.state, "revealing host ui");
            self.notifier.on_reveal();
        }
    }

    fn finish(&mut self) {
        self.transition(PlaybackState::Ended);
        if !self.ended_notified {
            self.ended_notified = true;
            tracing::info!(passes = self.compositor.passes(), "playback ended");
            self.notifier.on_ended();
        }
    }

    fn fail(&mut self, err: GreenkeyError) {
        if self.state == PlaybackState::Failed {
            return;
        }
        tracing::warn!(error = %err, "playback failed; host falls back to placeholder");
        self.source.pause();
        self.error = Some(err.to_string());
        self.notifier.on_error(&err);
        self.transition(PlaybackState::Failed);
    }

    fn transition(&mut self, to: PlaybackState) {
        let from = self.state;
        if from == to {
            return;
        }
        tracing::debug!(?from, ?to, "playback state change");
        self.state = to;
        self.notifier.on_state_change(from, to);
    }
}

#[cfg(test)]
#[path = "../../tests/unit/session/playback.rs"]
mod tests;
