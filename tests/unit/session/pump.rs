use super::*;
use crate::compositor::CompositorOpts;
use crate::foundation::core::Dimensions;
use crate::frame::FrameRGBA;
use crate::key::params::KeyingParams;
use crate::session::notify::{EventLog, SessionEvent};
use crate::source::synthetic::SyntheticSource;
use crate::surface::PixelSurface;

type TestSession = PlaybackSession<SyntheticSource, PixelSurface, EventLog>;

fn session(source: SyntheticSource) -> TestSession {
    PlaybackSession::new(
        source,
        PixelSurface::new(),
        EventLog::new(),
        KeyingParams::default(),
        CompositorOpts { parallel: false },
    )
    .unwrap()
}

fn frames(n: usize) -> Vec<FrameRGBA> {
    (0..n)
        .map(|_| FrameRGBA::solid(Dimensions::new(2, 2), [0, 255, 0, 255]).unwrap())
        .collect()
}

fn clock(step_ms: u64) -> ManualClock {
    ManualClock::new(Duration::from_millis(step_ms), CancelToken::new())
}

fn reveals(s: &TestSession) -> usize {
    s.notifier().count(|e| *e == SessionEvent::Reveal)
}

#[test]
fn manual_clock_steps_and_stops() {
    let mut c = clock(10).with_max_ticks(3);
    let got: Vec<Tick> = (0..4).map(|_| c.wait_next()).collect();
    assert_eq!(
        got,
        vec![
            Tick::Frame {
                elapsed: Duration::ZERO
            },
            Tick::Frame {
                elapsed: Duration::from_millis(10)
            },
            Tick::Frame {
                elapsed: Duration::from_millis(20)
            },
            Tick::Cancelled,
        ]
    );
}

#[test]
fn interval_clock_honors_cancel() {
    let token = CancelToken::new();
    let mut c = IntervalClock::new(Fps::new(1000, 1).unwrap(), token.clone());
    let Tick::Frame { elapsed: first } = c.wait_next() else {
        panic!("expected a frame tick");
    };
    let Tick::Frame { elapsed: second } = c.wait_next() else {
        panic!("expected a frame tick");
    };
    assert_eq!(first, Duration::ZERO);
    assert!(second >= first);

    token.cancel();
    assert_eq!(c.wait_next(), Tick::Cancelled);
}

#[test]
fn runs_to_end_then_reveals() {
    let mut s = session(SyntheticSource::new(frames(3)));
    let pump = FramePump::new(clock(16), PumpOpts::default());
    let report = pump.run(&mut s);

    assert_eq!(
        report,
        PumpReport {
            ticks: 3,
            composited: 3,
            final_state: PlaybackState::Ended,
            cancelled: false,
            revealed: true,
        }
    );
    assert_eq!(s.notifier().events().last(), Some(&SessionEvent::Reveal));
    assert_eq!(reveals(&s), 1);
}

#[test]
fn long_playback_reveals_at_deadline() {
    let mut s = session(SyntheticSource::new(frames(4)).with_looping(true));
    let pump = FramePump::new(clock(1000).with_max_ticks(10), PumpOpts::default());
    let report = pump.run(&mut s);

    assert_eq!(report.ticks, 10);
    assert!(report.cancelled);
    assert!(report.revealed);
    assert_eq!(report.final_state, PlaybackState::Idle);
    assert_eq!(reveals(&s), 1);

    // Reveal lands on the tick whose elapsed time reaches 4000 ms.
    let before_reveal = s
        .notifier()
        .events()
        .iter()
        .take_while(|e| **e != SessionEvent::Reveal)
        .count();
    assert!(before_reveal > 0);
}

#[test]
fn failed_session_still_reveals_after_deadline() {
    let mut s = session(SyntheticSource::new(frames(2)).rejecting_play("blocked"));
    let pump = FramePump::new(clock(1000), PumpOpts::default());
    let report = pump.run(&mut s);

    assert_eq!(report.final_state, PlaybackState::Failed);
    assert_eq!(report.ticks, 5);
    assert_eq!(report.composited, 0);
    assert!(report.revealed);
    assert_eq!(s.surface().stats().draws, 0);
    assert_eq!(reveals(&s), 1);
}

#[test]
fn failed_session_without_deadline_exits_at_once() {
    let mut s = session(SyntheticSource::new(frames(2)).rejecting_play("blocked"));
    let pump = FramePump::new(clock(1000), PumpOpts { reveal_after: None });
    let report = pump.run(&mut s);

    assert_eq!(report.ticks, 0);
    assert!(!report.revealed);
    assert_eq!(report.final_state, PlaybackState::Failed);
}

#[test]
fn cancellation_pauses_the_session() {
    let token = CancelToken::new();
    token.cancel();
    let mut s = session(SyntheticSource::new(frames(2)));
    let pump = FramePump::new(
        ManualClock::new(Duration::from_millis(16), token.clone()),
        PumpOpts::default(),
    );
    let report = pump.run(&mut s);

    assert!(report.cancelled);
    assert_eq!(report.ticks, 0);
    assert_eq!(s.state(), PlaybackState::Idle);
    assert!(token.is_cancelled());
}

#[test]
fn ended_session_only_reveals() {
    let mut s = session(SyntheticSource::new(frames(1)));
    FramePump::new(clock(16), PumpOpts::default()).run(&mut s);
    assert_eq!(s.state(), PlaybackState::Ended);

    let report = FramePump::new(clock(16), PumpOpts::default()).run(&mut s);
    assert_eq!(report.ticks, 0);
    assert_eq!(reveals(&s), 1);
    assert_eq!(s.notifier().count(|e| *e == SessionEvent::Ended), 1);
}

#[test]
fn each_session_reveals_on_its_own_timeline() {
    let mut first = session(SyntheticSource::new(frames(3)).with_looping(true));
    let report = FramePump::new(clock(100).with_max_ticks(60), PumpOpts::default()).run(&mut first);
    assert!(report.revealed);

    // 40 ticks at 100 ms end at 3900 ms: one short of the deadline.
    let mut second = session(SyntheticSource::new(frames(3)).with_looping(true));
    let report =
        FramePump::new(clock(100).with_max_ticks(40), PumpOpts::default()).run(&mut second);
    assert_eq!(report.ticks, 40);
    assert!(!report.revealed);
    assert_eq!(reveals(&second), 0);

    let mut third = session(SyntheticSource::new(frames(3)).with_looping(true));
    let report = FramePump::new(clock(100).with_max_ticks(41), PumpOpts::default()).run(&mut third);
    assert!(report.revealed);
    assert_eq!(reveals(&third), 1);
}
