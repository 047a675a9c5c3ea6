use super::*;
use crate::foundation::core::Fps;

fn cfg(width: u32, height: u32) -> SinkConfig {
    SinkConfig {
        width,
        height,
        fps: Fps::new(30, 1).unwrap(),
    }
}

#[test]
fn keyed_out_pixels_show_the_background() {
    let mut out = vec![0u8; 4];
    flatten_onto([10, 20, 30], &[10, 250, 15, 0], &mut out);
    assert_eq!(out, vec![10, 20, 30, 255]);
}

#[test]
fn opaque_pixels_pass_through() {
    let mut out = vec![0u8; 4];
    flatten_onto([10, 20, 30], &[1, 2, 3, 255], &mut out);
    assert_eq!(out, vec![1, 2, 3, 255]);
}

#[test]
fn soft_edge_blends_with_background() {
    let mut out = vec![0u8; 8];
    flatten_onto(
        [0, 0, 255],
        &[255, 0, 0, 128, 50, 152, 40, 149],
        &mut out,
    );
    assert_eq!(&out[..4], &[128, 0, 127, 255]);
    // 50*149/255 + 0, 152*149/255 + 0, 40*149/255 + 255*106/255
    assert_eq!(&out[4..], &[29, 89, 129, 255]);
}

#[test]
fn encoder_reads_raw_rgba_at_stream_rate() {
    let mut opts = FfmpegSinkOpts::new("out/keyed.mp4");
    opts.overwrite = false;
    let args: Vec<String> = encoder_args(&cfg(1280, 720), &opts)
        .into_iter()
        .map(|a| a.to_string_lossy().into_owned())
        .collect();

    assert_eq!(args[0], "-n");
    let after = |flag: &str| {
        args.iter()
            .position(|a| a == flag)
            .map(|i| args[i + 1].as_str())
    };
    assert_eq!(after("-f"), Some("rawvideo"));
    assert_eq!(after("-s"), Some("1280x720"));
    assert_eq!(after("-r"), Some("30/1"));
    assert_eq!(after("-i"), Some("pipe:0"));
    assert_eq!(after("-c:v"), Some("libx264"));
    assert_eq!(args.last().map(String::as_str), Some("out/keyed.mp4"));
}

#[test]
fn begin_rejects_odd_dimensions() {
    let mut sink = FfmpegSink::new(FfmpegSinkOpts::new("target/unit_ffmpeg/odd.mp4"));
    let err = sink.begin(cfg(3, 2)).unwrap_err();
    assert!(err.to_string().contains("even"));
}

#[test]
fn push_without_running_encoder_fails() {
    let mut sink = FfmpegSink::new(FfmpegSinkOpts::new("target/unit_ffmpeg/idle.mp4"));
    let frame = FrameRGBA::solid(crate::Dimensions::new(2, 2), [0, 0, 0, 255]).unwrap();
    assert!(sink.push_frame(FrameIndex(0), &frame).is_err());
    assert!(sink.end().is_ok());
}
