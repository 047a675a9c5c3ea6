use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use crate::compositor::PassOutcome;
use crate::foundation::core::Fps;
use crate::session::notify::HostNotifier;
use crate::session::playback::{PlaybackSession, PlaybackState, TickOutcome};
use crate::source::FrameSource;
use crate::surface::DrawingSurface;

/// Default delay after which the host UI is revealed even if playback has not ended.
pub const DEFAULT_REVEAL_AFTER: Duration = Duration::from_millis(4000);

/// Shared cancellation flag for a running [`FramePump`].
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// Create an un-cancelled token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stop the pump at its next wait. An in-flight pass still completes.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    /// Whether `cancel` has been called.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// One wake-up from a [`FrameClock`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Tick {
    /// Time to run a pass; `elapsed` is measured from the clock's first tick.
    Frame {
        /// Time since the first tick.
        elapsed: Duration,
    },
    /// The clock was cancelled; no further ticks.
    Cancelled,
}

/// The single driving callback source for a session (a display refresh, a timer, a test script).
pub trait FrameClock {
    /// Block until the next tick.
    fn wait_next(&mut self) -> Tick;
}

/// Wall-clock pacing at a fixed frame rate.
#[derive(Debug)]
pub struct IntervalClock {
    interval: Duration,
    started: Option<Instant>,
    next_deadline: Option<Instant>,
    remaining: Option<u64>,
    cancel: CancelToken,
}

impl IntervalClock {
    /// Tick once per frame interval of `fps` until `cancel` fires.
    pub fn new(fps: Fps, cancel: CancelToken) -> Self {
        Self {
            interval: fps.frame_interval(),
            started: None,
            next_deadline: None,
            remaining: None,
            cancel,
        }
    }

    /// Cancel automatically after `ticks` ticks.
    pub fn with_max_ticks(mut self, ticks: u64) -> Self {
        self.remaining = Some(ticks);
        self
    }
}

fn take_tick(remaining: &mut Option<u64>) -> bool {
    match remaining {
        Some(0) => false,
        Some(left) => {
            *left -= 1;
            true
        }
        None => true,
    }
}

impl FrameClock for IntervalClock {
    fn wait_next(&mut self) -> Tick {
        if self.cancel.is_cancelled() || !take_tick(&mut self.remaining) {
            return Tick::Cancelled;
        }
        if let Some(deadline) = self.next_deadline {
            let now = Instant::now();
            if deadline > now {
                std::thread::sleep(deadline - now);
                if self.cancel.is_cancelled() {
                    return Tick::Cancelled;
                }
            }
        }
        let now = Instant::now();
        let started = *self.started.get_or_insert(now);
        // An overrunning pass delays the next tick instead of queueing a burst.
        self.next_deadline = Some(
            self.next_deadline
                .map(|d| (d + self.interval).max(now))
                .unwrap_or(now + self.interval),
        );
        Tick::Frame {
            elapsed: now - started,
        }
    }
}

/// Deterministic clock advancing synthetic time by a fixed step without sleeping.
///
/// Used for offline rendering and tests. Stops after `max_ticks` if set.
#[derive(Debug)]
pub struct ManualClock {
    step: Duration,
    elapsed: Option<Duration>,
    remaining: Option<u64>,
    cancel: CancelToken,
}

impl ManualClock {
    /// Step synthetic time by `step` per tick.
    pub fn new(step: Duration, cancel: CancelToken) -> Self {
        Self {
            step,
            elapsed: None,
            remaining: None,
            cancel,
        }
    }

    /// Cancel automatically after `ticks` ticks.
    pub fn with_max_ticks(mut self, ticks: u64) -> Self {
        self.remaining = Some(ticks);
        self
    }
}

impl FrameClock for ManualClock {
    fn wait_next(&mut self) -> Tick {
        if self.cancel.is_cancelled() || !take_tick(&mut self.remaining) {
            return Tick::Cancelled;
        }
        let elapsed = match self.elapsed {
            Some(prev) => prev + self.step,
            None => Duration::ZERO,
        };
        self.elapsed = Some(elapsed);
        Tick::Frame { elapsed }
    }
}

/// Options for [`FramePump`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PumpOpts {
    /// Reveal the host UI after this long even if playback has not ended. `None` waits for the
    /// end (or failure) only.
    pub reveal_after: Option<Duration>,
}

impl Default for PumpOpts {
    fn default() -> Self {
        Self {
            reveal_after: Some(DEFAULT_REVEAL_AFTER),
        }
    }
}

/// Summary of a [`FramePump::run`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PumpReport {
    /// Ticks received from the clock.
    pub ticks: u64,
    /// Passes that wrote keyed pixels.
    pub composited: u64,
    /// Session state when the pump stopped.
    pub final_state: PlaybackState,
    /// Whether the pump stopped because the clock was cancelled.
    pub cancelled: bool,
    /// Whether the host UI was revealed.
    pub revealed: bool,
}

/// Drives one session from one clock until it ends, fails, pauses or is cancelled.
///
/// The clock's timeline starts at the session's first tick, so a pump is spent by
/// [`run`](Self::run). Build a fresh pump (and clock) for every session.
#[derive(Debug)]
pub struct FramePump<C> {
    clock: C,
    opts: PumpOpts,
}

impl<C: FrameClock> FramePump<C> {
    /// Create a pump over `clock`.
    pub fn new(clock: C, opts: PumpOpts) -> Self {
        Self { clock, opts }
    }

    /// Run the session. Starts it if idle; on cancellation the session is paused.
    ///
    /// A failed session keeps the pump alive only until the reveal deadline so the host still gets
    /// its transition; no passes run in the meantime. The reveal deadline is measured on this
    /// pump's clock, which is dropped on return.
    #[tracing::instrument(level = "debug", skip_all)]
    pub fn run<S, D, N>(mut self, session: &mut PlaybackSession<S, D, N>) -> PumpReport
    where
        S: FrameSource,
        D: DrawingSurface,
        N: HostNotifier,
    {
        if session.state() == PlaybackState::Idle {
            session.start();
        }

        let mut report = PumpReport {
            ticks: 0,
            composited: 0,
            final_state: session.state(),
            cancelled: false,
            revealed: session.is_revealed(),
        };

        loop {
            match session.state() {
                PlaybackState::Ended => {
                    session.reveal();
                    break;
                }
                PlaybackState::Failed if self.opts.reveal_after.is_none() || session.is_revealed() => {
                    break;
                }
                PlaybackState::Idle => break,
                PlaybackState::Failed | PlaybackState::Playing => {}
            }

            let elapsed = match self.clock.wait_next() {
                Tick::Frame { elapsed } => elapsed,
                Tick::Cancelled => {
                    tracing::debug!(ticks = report.ticks, "frame clock cancelled");
                    session.pause();
                    report.cancelled = true;
                    break;
                }
            };
            report.ticks += 1;

            if let TickOutcome::Pass(PassOutcome::Composited { .. }) = session.tick() {
                report.composited += 1;
            }

            if let Some(after) = self.opts.reveal_after
                && elapsed >= after
            {
                session.reveal();
            }
        }

        report.final_state = session.state();
        report.revealed = session.is_revealed();
        report
    }
}

#[cfg(test)]
#[path = "../../tests/unit/session/pump.rs"]
mod tests;
