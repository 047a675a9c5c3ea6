use std::path::{Path, PathBuf};
use std::process::Child;

use crate::foundation::core::{Dimensions, Fps};
use crate::foundation::error::{GreenkeyError, GreenkeyResult};
use crate::frame::FrameRGBA;
use crate::source::{FrameSource, SourceStatus};

/// Stream metadata reported by `ffprobe`.
#[derive(Clone, Debug)]
pub struct VideoSourceInfo {
    /// Probed file.
    pub source_path: PathBuf,
    /// Native decoded width.
    pub width: u32,
    /// Native decoded height.
    pub height: u32,
    /// Stream frame rate numerator.
    pub fps_num: u32,
    /// Stream frame rate denominator.
    pub fps_den: u32,
    /// Container duration in seconds (0 when unknown).
    pub duration_sec: f64,
}

impl VideoSourceInfo {
    /// Stream frame rate, if it is well-formed.
    pub fn fps(&self) -> Option<Fps> {
        Fps::new(self.fps_num, self.fps_den).ok()
    }
}

/// Video file decoded frame by frame through the system `ffmpeg`.
///
/// `play` probes the file and spawns a decoder that streams raw RGBA8 frames over a pipe; each
/// `advance` reads exactly one frame. Any failure to start is a play failure.
pub struct FfmpegSource {
    path: PathBuf,
    info: Option<VideoSourceInfo>,
    decoder: Option<Decoder>,
    frame: Option<FrameRGBA>,
    status: SourceStatus,
}

#[cfg_attr(not(feature = "media-ffmpeg"), allow(dead_code))]
struct Decoder {
    child: Child,
    stdout: std::process::ChildStdout,
}

impl FfmpegSource {
    /// Bind a video file; nothing is opened until `play`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            info: None,
            decoder: None,
            frame: None,
            status: SourceStatus::Paused,
        }
    }

    /// Probed stream metadata, available after a successful `play`.
    pub fn info(&self) -> Option<&VideoSourceInfo> {
        self.info.as_ref()
    }

    fn read_next_frame(&mut self) -> GreenkeyResult<()> {
        let (Some(info), Some(decoder)) = (self.info.as_ref(), self.decoder.as_mut()) else {
            return Err(GreenkeyError::evaluation("ffmpeg decoder is not running"));
        };
        let dims = Dimensions::new(info.width, info.height);
        let len = dims.rgba8_len()?;
        let mut buf = match self.frame.take() {
            Some(f) if f.data.len() == len => f.data,
            _ => vec![0u8; len],
        };

        use std::io::Read as _;
        match decoder.stdout.read_exact(&mut buf) {
            Ok(()) => {
                self.frame = Some(FrameRGBA::from_raw(dims.width, dims.height, buf)?);
            }
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                tracing::debug!(path = %self.path.display(), "ffmpeg decoder reached end of stream");
                self.status = SourceStatus::Ended;
                self.shutdown();
            }
            Err(e) => {
                self.shutdown();
                return Err(GreenkeyError::evaluation(format!(
                    "failed to read frame from ffmpeg: {e}"
                )));
            }
        }
        Ok(())
    }

    fn shutdown(&mut self) {
        if let Some(mut decoder) = self.decoder.take() {
            let _ = decoder.child.kill();
            let _ = decoder.child.wait();
        }
    }
}

impl Drop for FfmpegSource {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl FrameSource for FfmpegSource {
    fn play(&mut self) -> GreenkeyResult<()> {
        match self.status {
            SourceStatus::Playing | SourceStatus::Ended => return Ok(()),
            SourceStatus::Paused if self.decoder.is_some() => {
                self.status = SourceStatus::Playing;
                return Ok(());
            }
            SourceStatus::Paused => {}
        }

        let info = probe_video(&self.path)
            .map_err(|e| GreenkeyError::play_failure(format!("probe failed: {e}")))?;
        if info.width == 0 || info.height == 0 {
            return Err(GreenkeyError::play_failure(format!(
                "'{}' has no decodable video dimensions",
                self.path.display()
            )));
        }
        let decoder = spawn_decoder(&info)
            .map_err(|e| GreenkeyError::play_failure(format!("decoder failed to start: {e}")))?;

        tracing::info!(
            path = %self.path.display(),
            width = info.width,
            height = info.height,
            fps_num = info.fps_num,
            fps_den = info.fps_den,
            "video source opened"
        );

        self.info = Some(info);
        self.decoder = Some(decoder);
        self.status = SourceStatus::Playing;
        self.read_next_frame()
            .map_err(|e| GreenkeyError::play_failure(e.to_string()))?;
        if self.frame.is_none() {
            return Err(GreenkeyError::play_failure(format!(
                "'{}' produced no frames",
                self.path.display()
            )));
        }
        Ok(())
    }

    fn pause(&mut self) {
        if self.status == SourceStatus::Playing {
            self.status = SourceStatus::Paused;
        }
    }

    fn status(&self) -> SourceStatus {
        self.status
    }

    fn dimensions(&self) -> Dimensions {
        self.frame
            .as_ref()
            .map(FrameRGBA::dimensions)
            .unwrap_or_default()
    }

    fn current_frame(&self) -> Option<&FrameRGBA> {
        if self.status == SourceStatus::Ended {
            return None;
        }
        self.frame.as_ref()
    }

    fn advance(&mut self) -> GreenkeyResult<()> {
        if self.status != SourceStatus::Playing {
            return Ok(());
        }
        self.read_next_frame()
    }
}

#[cfg(feature = "media-ffmpeg")]
pub(crate) fn probe_video(source_path: &Path) -> GreenkeyResult<VideoSourceInfo> {
    #[derive(serde::Deserialize)]
    struct ProbeStream {
        codec_type: Option<String>,
        width: Option<u32>,
        height: Option<u32>,
        r_frame_rate: Option<String>,
    }
    #[derive(serde::Deserialize)]
    struct ProbeFormat {
        duration: Option<String>,
    }
    #[derive(serde::Deserialize)]
    struct ProbeOut {
        streams: Vec<ProbeStream>,
        format: Option<ProbeFormat>,
    }

    let out = std::process::Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-print_format",
            "json",
            "-show_streams",
            "-show_format",
        ])
        .arg(source_path)
        .output()
        .map_err(|e| GreenkeyError::evaluation(format!("failed to run ffprobe: {e}")))?;
    if !out.status.success() {
        return Err(GreenkeyError::evaluation(format!(
            "ffprobe failed for '{}': {}",
            source_path.display(),
            String::from_utf8_lossy(&out.stderr).trim()
        )));
    }

    let parsed: ProbeOut = serde_json::from_slice(&out.stdout)
        .map_err(|e| GreenkeyError::evaluation(format!("ffprobe json parse failed: {e}")))?;
    let video_stream = parsed
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("video"))
        .ok_or_else(|| GreenkeyError::evaluation("no video stream found"))?;
    let width = video_stream
        .width
        .ok_or_else(|| GreenkeyError::evaluation("missing video width from ffprobe"))?;
    let height = video_stream
        .height
        .ok_or_else(|| GreenkeyError::evaluation("missing video height from ffprobe"))?;
    let (fps_num, fps_den) = parse_ff_ratio(video_stream.r_frame_rate.as_deref().unwrap_or("0/1"))
        .ok_or_else(|| GreenkeyError::evaluation("invalid video r_frame_rate"))?;
    let duration_sec = parsed
        .format
        .as_ref()
        .and_then(|f| f.duration.as_ref())
        .and_then(|s| s.parse::<f64>().ok())
        .unwrap_or(0.0);

    Ok(VideoSourceInfo {
        source_path: source_path.to_path_buf(),
        width,
        height,
        fps_num,
        fps_den,
        duration_sec,
    })
}

#[cfg(not(feature = "media-ffmpeg"))]
pub(crate) fn probe_video(_source_path: &Path) -> GreenkeyResult<VideoSourceInfo> {
    Err(GreenkeyError::evaluation(
        "video sources require the 'media-ffmpeg' feature",
    ))
}

#[cfg(feature = "media-ffmpeg")]
fn spawn_decoder(info: &VideoSourceInfo) -> GreenkeyResult<Decoder> {
    use std::process::{Command, Stdio};

    let mut child = Command::new("ffmpeg")
        .args(["-v", "error", "-i"])
        .arg(&info.source_path)
        .args(["-an", "-f", "rawvideo", "-pix_fmt", "rgba", "pipe:1"])
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|e| GreenkeyError::evaluation(format!("failed to spawn ffmpeg: {e}")))?;
    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| GreenkeyError::evaluation("failed to open ffmpeg stdout"))?;
    Ok(Decoder { child, stdout })
}

#[cfg(not(feature = "media-ffmpeg"))]
fn spawn_decoder(_info: &VideoSourceInfo) -> GreenkeyResult<Decoder> {
    Err(GreenkeyError::evaluation(
        "video sources require the 'media-ffmpeg' feature",
    ))
}

#[cfg_attr(not(feature = "media-ffmpeg"), allow(dead_code))]
pub(crate) fn parse_ff_ratio(s: &str) -> Option<(u32, u32)> {
    let mut parts = s.split('/');
    let a = parts.next()?.trim().parse::<u32>().ok()?;
    let b = parts.next()?.trim().parse::<u32>().ok()?;
    if b == 0 {
        return None;
    }
    Some((a, b))
}

#[cfg(test)]
#[path = "../../tests/unit/source/ffmpeg.rs"]
mod tests;
