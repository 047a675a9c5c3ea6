use std::ffi::OsString;
use std::io::Write as _;
use std::path::PathBuf;
use std::process::{Child, ChildStdin, Command, Stdio};

use crate::encode::sink::{FrameSink, SinkConfig};
use crate::foundation::core::FrameIndex;
use crate::foundation::error::{GreenkeyError, GreenkeyResult};
use crate::foundation::math::mul_div255_u16;
use crate::frame::FrameRGBA;

/// Options for [`FfmpegSink`].
#[derive(Clone, Debug)]
pub struct FfmpegSinkOpts {
    /// Output MP4 file path.
    pub out_path: PathBuf,
    /// Replace an existing file instead of failing.
    pub overwrite: bool,
    /// Colour shown where the overlay is keyed out. MP4 has no alpha channel.
    pub background: [u8; 3],
}

impl FfmpegSinkOpts {
    /// Black background, overwriting `out_path`.
    pub fn new(out_path: impl Into<PathBuf>) -> Self {
        Self {
            out_path: out_path.into(),
            overwrite: true,
            background: [0, 0, 0],
        }
    }
}

/// MP4 output through the system `ffmpeg`.
///
/// Keyed frames are flattened onto the background colour and streamed as raw RGBA over stdin.
/// Every frame must keep the size given to `begin`: an H.264 stream cannot change resolution.
pub struct FfmpegSink {
    opts: FfmpegSinkOpts,
    encoder: Option<Encoder>,
    opaque: Vec<u8>,
}

struct Encoder {
    child: Child,
    stdin: ChildStdin,
    cfg: SinkConfig,
}

impl FfmpegSink {
    /// Create an idle sink; `ffmpeg` is spawned by `begin`.
    pub fn new(opts: FfmpegSinkOpts) -> Self {
        Self {
            opts,
            encoder: None,
            opaque: Vec::new(),
        }
    }
}

impl FrameSink for FfmpegSink {
    fn begin(&mut self, cfg: SinkConfig) -> GreenkeyResult<()> {
        // yuv420p subsamples chroma 2x2.
        if cfg.width == 0 || cfg.height == 0 || cfg.width % 2 == 1 || cfg.height % 2 == 1 {
            return Err(GreenkeyError::validation(format!(
                "mp4 output needs non-zero even dimensions, got {}x{}",
                cfg.width, cfg.height
            )));
        }
        if !self.opts.overwrite && self.opts.out_path.exists() {
            return Err(GreenkeyError::validation(format!(
                "'{}' exists and overwrite is off",
                self.opts.out_path.display()
            )));
        }
        if let Some(dir) = self.opts.out_path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir).map_err(|e| {
                GreenkeyError::evaluation(format!("create '{}': {e}", dir.display()))
            })?;
        }

        let mut child = Command::new("ffmpeg")
            .args(encoder_args(&cfg, &self.opts))
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| GreenkeyError::evaluation(format!("spawn ffmpeg: {e}")))?;
        let Some(stdin) = child.stdin.take() else {
            let _ = child.kill();
            return Err(GreenkeyError::evaluation("ffmpeg stdin unavailable"));
        };

        tracing::debug!(out = %self.opts.out_path.display(), width = cfg.width, height = cfg.height, "mp4 encoder running");
        self.opaque.resize(cfg.width as usize * cfg.height as usize * 4, 0);
        self.encoder = Some(Encoder { child, stdin, cfg });
        Ok(())
    }

    fn push_frame(&mut self, _idx: FrameIndex, frame: &FrameRGBA) -> GreenkeyResult<()> {
        let enc = self
            .encoder
            .as_mut()
            .ok_or_else(|| GreenkeyError::evaluation("mp4 sink is not running"))?;
        if frame.width != enc.cfg.width || frame.height != enc.cfg.height {
            return Err(GreenkeyError::validation(format!(
                "mp4 stream is {}x{}, cannot append a {}x{} frame",
                enc.cfg.width, enc.cfg.height, frame.width, frame.height
            )));
        }
        flatten_onto(self.opts.background, &frame.data, &mut self.opaque);
        enc.stdin
            .write_all(&self.opaque)
            .map_err(|e| GreenkeyError::evaluation(format!("stream frame to ffmpeg: {e}")))
    }

    fn end(&mut self) -> GreenkeyResult<()> {
        let Some(Encoder { child, stdin, .. }) = self.encoder.take() else {
            return Ok(());
        };
        drop(stdin);
        let out = child
            .wait_with_output()
            .map_err(|e| GreenkeyError::evaluation(format!("wait for ffmpeg: {e}")))?;
        if out.status.success() {
            return Ok(());
        }
        Err(GreenkeyError::evaluation(format!(
            "ffmpeg failed ({}): {}",
            out.status,
            String::from_utf8_lossy(&out.stderr).trim()
        )))
    }
}

impl Drop for FfmpegSink {
    fn drop(&mut self) {
        if let Some(mut enc) = self.encoder.take() {
            let _ = enc.child.kill();
            let _ = enc.child.wait();
        }
    }
}

/// Command line for a raw-RGBA-in, H.264-out encoder at `cfg`.
fn encoder_args(cfg: &SinkConfig, opts: &FfmpegSinkOpts) -> Vec<OsString> {
    let size = format!("{}x{}", cfg.width, cfg.height);
    let rate = format!("{}/{}", cfg.fps.num, cfg.fps.den);
    let mut args: Vec<OsString> = [
        if opts.overwrite { "-y" } else { "-n" },
        "-loglevel",
        "error",
        "-f",
        "rawvideo",
        "-pix_fmt",
        "rgba",
        "-s",
        size.as_str(),
        "-r",
        rate.as_str(),
        "-i",
        "pipe:0",
        "-an",
        "-c:v",
        "libx264",
        "-pix_fmt",
        "yuv420p",
        "-movflags",
        "+faststart",
    ]
    .into_iter()
    .map(OsString::from)
    .collect();
    args.push(opts.out_path.clone().into_os_string());
    args
}

/// Composite straight-alpha RGBA8 `src` over an opaque colour into `dst`.
///
/// `dst` must have the same length as `src`.
fn flatten_onto(background: [u8; 3], src: &[u8], dst: &mut [u8]) {
    for (out, px) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
        let a = u16::from(px[3]);
        let inv = 255 - a;
        for c in 0..3 {
            let v = mul_div255_u16(u16::from(px[c]), a) + mul_div255_u16(u16::from(background[c]), inv);
            out[c] = v.min(255) as u8;
        }
        out[3] = 255;
    }
}

/// Whether an `ffmpeg` binary runs from `PATH`.
pub fn ffmpeg_available() -> bool {
    Command::new("ffmpeg")
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .is_ok_and(|s| s.success())
}

#[cfg(test)]
#[path = "../../tests/unit/encode/ffmpeg.rs"]
mod tests;
