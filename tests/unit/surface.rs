use super::*;
use crate::encode::sink::InMemorySink;

fn frame(width: u32, height: u32) -> FrameRGBA {
    let mut f = FrameRGBA::solid(Dimensions::new(width, height), [1, 2, 3, 255]).unwrap();
    f.set_pixel(width - 1, 0, [9, 9, 9, 255]);
    f
}

#[test]
fn resize_resets_buffer_and_counts() {
    let mut s = PixelSurface::new();
    assert!(s.dimensions().is_empty());

    s.resize(Dimensions::new(2, 2)).unwrap();
    s.put_pixels(&[7u8; 16]).unwrap();
    s.resize(Dimensions::new(3, 1)).unwrap();

    assert_eq!(s.dimensions(), Dimensions::new(3, 1));
    assert_eq!(s.displayed(), &[0u8; 12]);
    assert_eq!(s.stats().resizes, 2);
}

#[test]
fn draw_copies_only_kept_columns() {
    let mut s = PixelSurface::new();
    s.resize(Dimensions::new(2, 2)).unwrap();
    s.draw_frame(&frame(3, 2)).unwrap();

    let shown = s.snapshot().unwrap();
    assert_eq!(shown.pixel(0, 0), Some([1, 2, 3, 255]));
    assert_eq!(shown.pixel(1, 1), Some([1, 2, 3, 255]));
    assert_eq!(s.stats().draws, 1);
}

#[test]
fn draw_rejects_height_mismatch() {
    let mut s = PixelSurface::new();
    s.resize(Dimensions::new(3, 1)).unwrap();
    let err = s.draw_frame(&frame(3, 2)).unwrap_err();
    assert!(matches!(err, GreenkeyError::Validation(_)));
}

#[test]
fn tainted_surface_refuses_read_back() {
    let mut s = PixelSurface::tainted();
    s.resize(Dimensions::new(1, 1)).unwrap();
    let mut dst = [0u8; 4];
    let err = s.read_pixels(&mut dst).unwrap_err();
    assert!(matches!(err, GreenkeyError::TaintedSurface(_)));

    s.set_tainted(false);
    s.read_pixels(&mut dst).unwrap();
}

#[test]
fn buffer_sizes_must_match() {
    let mut s = PixelSurface::new();
    s.resize(Dimensions::new(2, 1)).unwrap();
    assert!(s.put_pixels(&[0u8; 4]).is_err());
    let mut dst = [0u8; 12];
    assert!(s.read_pixels(&mut dst).is_err());
    assert_eq!(s.stats().puts, 0);
}

#[test]
fn sink_surface_starts_lazily_and_numbers_frames() {
    let mut s = SinkSurface::new(InMemorySink::new(), Fps::DISPLAY);
    s.resize(Dimensions::new(2, 1)).unwrap();
    s.draw_frame(&frame(2, 1)).unwrap();
    assert_eq!(s.frames_written(), 0);

    s.put_pixels(&[5u8; 8]).unwrap();
    s.put_pixels(&[6u8; 8]).unwrap();
    assert_eq!(s.frames_written(), 2);
    assert_eq!(s.surface().displayed(), &[6u8; 8]);

    let sink = s.finish().unwrap();
    let cfg = sink.config().unwrap();
    assert_eq!((cfg.width, cfg.height), (2, 1));
    assert_eq!(cfg.fps, Fps::DISPLAY);
    assert!(sink.is_ended());

    let idx: Vec<u64> = sink.frames().iter().map(|(i, _)| i.0).collect();
    assert_eq!(idx, vec![0, 1]);
    assert_eq!(sink.frames()[0].1.data, vec![5u8; 8]);
}

#[test]
fn unused_sink_surface_never_begins() {
    let s = SinkSurface::new(InMemorySink::new(), Fps::DISPLAY);
    let sink = s.finish().unwrap();
    assert!(sink.config().is_none());
    assert!(!sink.is_ended());
}
