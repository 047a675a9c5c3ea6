use std::cell::Cell;

use super::*;
use crate::frame::FrameRGBA;
use crate::source::synthetic::SyntheticSource;
use crate::surface::PixelSurface;

fn green_frame(width: u32, height: u32) -> FrameRGBA {
    let mut f = FrameRGBA::solid(Dimensions::new(width, height), [10, 250, 15, 255]).unwrap();
    f.set_pixel(0, 0, [200, 210, 195, 255]);
    f
}

fn playing(frames: Vec<FrameRGBA>) -> SyntheticSource {
    let mut src = SyntheticSource::new(frames);
    src.play().unwrap();
    src
}

fn compositor(params: KeyingParams) -> ChromaKeyCompositor {
    ChromaKeyCompositor::new(params, CompositorOpts::default()).unwrap()
}

#[test]
fn pass_keys_the_surface() {
    let src = playing(vec![green_frame(4, 3)]);
    let mut surface = PixelSurface::new();
    let mut comp = compositor(KeyingParams::soft(0.35, 0.12).unwrap());

    let out = comp.process_frame(&src, &mut surface).unwrap();
    assert_eq!(
        out,
        PassOutcome::Composited {
            pass: FrameIndex(0),
            dims: Dimensions::new(4, 3),
            resized: true,
        }
    );
    let shown = surface.snapshot().unwrap();
    assert_eq!(shown.pixel(0, 0), Some([200, 210, 195, 255]));
    assert_eq!(shown.pixel(3, 2), Some([10, 250, 15, 0]));
    assert_eq!(surface.stats().puts, 1);
}

#[test]
fn surface_is_resized_once_per_resolution() {
    let src = playing(vec![green_frame(4, 3)]);
    let mut surface = PixelSurface::new();
    let mut comp = compositor(KeyingParams::default());

    for _ in 0..5 {
        comp.process_frame(&src, &mut surface).unwrap();
    }
    assert_eq!(surface.stats().resizes, 1);
    assert_eq!(comp.passes(), 5);
}

#[test]
fn resolution_change_uses_new_dimensions() {
    let mut src = playing(vec![green_frame(4, 3), green_frame(2, 5)]);
    let mut surface = PixelSurface::new();
    let mut comp = compositor(KeyingParams::default());

    comp.process_frame(&src, &mut surface).unwrap();
    src.advance().unwrap();
    let out = comp.process_frame(&src, &mut surface).unwrap();

    assert!(matches!(
        out,
        PassOutcome::Composited {
            dims: Dimensions {
                width: 2,
                height: 5
            },
            resized: true,
            ..
        }
    ));
    assert_eq!(surface.dimensions(), Dimensions::new(2, 5));
    assert_eq!(surface.displayed().len(), 2 * 5 * 4);
    assert_eq!(surface.stats().resizes, 2);
}

#[test]
fn crop_limits_processed_width() {
    let mut frame = green_frame(10, 2);
    for y in 0..2 {
        frame.set_pixel(9, y, [1, 2, 3, 4]);
    }
    let src = playing(vec![frame]);
    let mut surface = PixelSurface::new();
    let mut comp = compositor(KeyingParams::default().with_crop_fraction(0.1));

    comp.process_frame(&src, &mut surface).unwrap();
    assert_eq!(surface.dimensions(), Dimensions::new(9, 2));
    assert!(
        surface
            .displayed()
            .chunks_exact(4)
            .all(|px| px != [1, 2, 3, 4])
    );
}

#[test]
fn loading_source_is_not_ready() {
    let src = {
        let mut s = SyntheticSource::new(vec![green_frame(2, 2)]).with_loading_ticks(1);
        s.play().unwrap();
        s
    };
    let mut surface = PixelSurface::new();
    let mut comp = compositor(KeyingParams::default());

    assert_eq!(
        comp.process_frame(&src, &mut surface).unwrap(),
        PassOutcome::NotReady
    );
    assert_eq!(surface.stats(), Default::default());
}

#[test]
fn tainted_surface_fails_the_pass() {
    let src = playing(vec![green_frame(2, 2)]);
    let mut surface = PixelSurface::tainted();
    let mut comp = compositor(KeyingParams::default());

    let err = comp.process_frame(&src, &mut surface).unwrap_err();
    assert!(matches!(err, GreenkeyError::TaintedSurface(_)));
    assert_eq!(surface.stats().puts, 0);
}

#[test]
fn paused_source_is_stale() {
    let mut src = playing(vec![green_frame(2, 2)]);
    src.pause();
    let mut surface = PixelSurface::new();
    let mut comp = compositor(KeyingParams::default());
    assert!(matches!(
        comp.process_frame(&src, &mut surface),
        Err(GreenkeyError::StaleFrame)
    ));
}

/// Reports `Playing` for the first `playing_checks` status queries, then `Ended`.
struct EndsMidPass {
    frame: FrameRGBA,
    playing_checks: Cell<u32>,
}

impl FrameSource for EndsMidPass {
    fn play(&mut self) -> GreenkeyResult<()> {
        Ok(())
    }

    fn pause(&mut self) {}

    fn status(&self) -> SourceStatus {
        let left = self.playing_checks.get();
        if left == 0 {
            return SourceStatus::Ended;
        }
        self.playing_checks.set(left - 1);
        SourceStatus::Playing
    }

    fn dimensions(&self) -> Dimensions {
        self.frame.dimensions()
    }

    fn current_frame(&self) -> Option<&FrameRGBA> {
        Some(&self.frame)
    }

    fn advance(&mut self) -> GreenkeyResult<()> {
        Ok(())
    }
}

#[test]
fn source_ending_mid_pass_abandons_write() {
    let src = EndsMidPass {
        frame: green_frame(3, 3),
        playing_checks: Cell::new(1),
    };
    let mut surface = PixelSurface::new();
    let mut comp = compositor(KeyingParams::default());

    let err = comp.process_frame(&src, &mut surface).unwrap_err();
    assert!(matches!(err, GreenkeyError::StaleFrame));
    assert_eq!(surface.stats().puts, 0);
    assert_eq!(comp.passes(), 0);
    // The raw blit happened, but no keyed pixels were written.
    assert!(surface.displayed().chunks_exact(4).all(|px| px[3] == 255));
}

#[test]
fn sequential_and_parallel_passes_agree() {
    let src = playing(vec![green_frame(17, 9)]);
    let params = KeyingParams::default().with_spill_suppression(true);

    let mut a = PixelSurface::new();
    ChromaKeyCompositor::new(params, CompositorOpts { parallel: false })
        .unwrap()
        .process_frame(&src, &mut a)
        .unwrap();
    let mut b = PixelSurface::new();
    ChromaKeyCompositor::new(params, CompositorOpts { parallel: true })
        .unwrap()
        .process_frame(&src, &mut b)
        .unwrap();
    assert_eq!(a.displayed(), b.displayed());
}

#[test]
fn invalid_params_are_rejected() {
    let bad = KeyingParams {
        smoothness_width: 0.0,
        ..KeyingParams::default()
    };
    assert!(ChromaKeyCompositor::new(bad, CompositorOpts::default()).is_err());
}
