use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand};

use greenkey::{
    CancelToken, DEFAULT_RATIO, DEFAULT_RATIO_MIN_GREEN, FfmpegSink, FfmpegSinkOpts,
    FfmpegSource, Fps, FramePump, FrameRGBA, FrameSink, FrameSource, GreenkeyError,
    HostNotifier, IntervalClock, KeyConfig, KeyMode, ManualClock, PlaybackSession, PlaybackState,
    PngSequenceSink, SinkSurface, SyntheticSource,
};

#[derive(Parser, Debug)]
#[command(name = "greenkey", version)]
struct Cli {
    /// Raise the log level (-v info, -vv debug, -vvv trace). `RUST_LOG` takes precedence.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Key a single image and write it as a PNG with alpha.
    Frame(FrameArgs),
    /// Key a video (or a directory of PNG frames) into a PNG sequence or an MP4.
    Render(RenderArgs),
}

#[derive(Args, Debug)]
struct KeyArgs {
    /// Keying config JSON; flags below override it.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Greenness at which suppression begins, in [0, 1].
    #[arg(long)]
    similarity: Option<f32>,

    /// Greenness range over which alpha fades, in (0, 1].
    #[arg(long)]
    smoothness: Option<f32>,

    /// Fraction of the right edge to trim before keying, in [0, 1).
    #[arg(long)]
    crop: Option<f32>,

    /// Pull green down to max(red, blue) on soft edges.
    #[arg(long)]
    spill: bool,

    /// Use the binary green-dominance key instead of the soft ramp.
    #[arg(long)]
    ratio_key: bool,
}

#[derive(Parser, Debug)]
struct FrameArgs {
    /// Input image (any format the `image` crate decodes).
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    #[command(flatten)]
    key: KeyArgs,
}

#[derive(Parser, Debug)]
struct RenderArgs {
    /// Input video file, or a directory of PNG frames played in name order.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Output directory for a PNG sequence, or an `.mp4` path (requires `ffmpeg` on PATH).
    #[arg(long)]
    out: PathBuf,

    /// Background colour for MP4 output as `RRGGBB`.
    #[arg(long, default_value = "000000", value_parser = parse_hex_rgb)]
    bg: [u8; 3],

    /// Output frame rate as `NUM` or `NUM/DEN`; defaults to the config's session fps.
    #[arg(long, value_parser = parse_fps)]
    fps: Option<Fps>,

    /// Pace passes on the wall clock instead of running as fast as possible.
    #[arg(long)]
    realtime: bool,

    /// Stop after this many clock ticks.
    #[arg(long)]
    max_frames: Option<u64>,

    #[command(flatten)]
    key: KeyArgs,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match cli.cmd {
        Command::Frame(args) => cmd_frame(args),
        Command::Render(args) => cmd_render(args),
    }
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn resolve_config(args: &KeyArgs) -> anyhow::Result<KeyConfig> {
    let mut cfg = match &args.config {
        Some(path) => KeyConfig::from_path(path)?,
        None => KeyConfig::default(),
    };
    if let Some(v) = args.similarity {
        cfg.keying.similarity_threshold = v;
    }
    if let Some(v) = args.smoothness {
        cfg.keying.smoothness_width = v;
    }
    if let Some(v) = args.crop {
        cfg.keying.crop_fraction = v;
    }
    if args.spill {
        cfg.keying.spill_suppression = true;
    }
    if args.ratio_key {
        cfg.keying.mode = KeyMode::Ratio {
            min_green: DEFAULT_RATIO_MIN_GREEN,
            ratio: DEFAULT_RATIO,
        };
    }
    cfg.validate()?;
    Ok(cfg)
}

fn cmd_frame(args: FrameArgs) -> anyhow::Result<()> {
    let cfg = resolve_config(&args.key)?;

    let bytes = std::fs::read(&args.in_path)
        .with_context(|| format!("read image '{}'", args.in_path.display()))?;
    let src = FrameRGBA::decode(&bytes)?;
    let keyed = greenkey::key_frame(&src, &cfg.keying)?;

    if let Some(dir) = args.out.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("create output dir '{}'", dir.display()))?;
    }
    std::fs::write(&args.out, keyed.encode_png()?)
        .with_context(|| format!("write png '{}'", args.out.display()))?;

    eprintln!(
        "wrote {} ({}x{})",
        args.out.display(),
        keyed.width,
        keyed.height
    );
    Ok(())
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    let cfg = resolve_config(&args.key)?;
    let fps = args.fps.unwrap_or(cfg.session.fps);
    let to_mp4 = args
        .out
        .extension()
        .is_some_and(|e| e.eq_ignore_ascii_case("mp4"));

    if to_mp4 && !greenkey::ffmpeg_available() {
        anyhow::bail!("MP4 output requires `ffmpeg` on PATH");
    }

    let sink = make_sink(&args, to_mp4);

    if args.in_path.is_dir() {
        let frames = load_png_dir(&args.in_path)?;
        let source = SyntheticSource::new(frames);
        match sink {
            OutputSink::Png(s) => drive(source, s, &cfg, fps, &args),
            OutputSink::Mp4(s) => drive(source, s, &cfg, fps, &args),
        }
    } else {
        let source = FfmpegSource::new(&args.in_path);
        match sink {
            OutputSink::Png(s) => drive(source, s, &cfg, fps, &args),
            OutputSink::Mp4(s) => drive(source, s, &cfg, fps, &args),
        }
    }
}

enum OutputSink {
    Png(PngSequenceSink),
    Mp4(FfmpegSink),
}

fn make_sink(args: &RenderArgs, to_mp4: bool) -> OutputSink {
    if to_mp4 {
        let mut opts = FfmpegSinkOpts::new(&args.out);
        opts.background = args.bg;
        OutputSink::Mp4(FfmpegSink::new(opts))
    } else {
        OutputSink::Png(PngSequenceSink::new(&args.out))
    }
}

fn drive<S, K>(
    source: S,
    sink: K,
    cfg: &KeyConfig,
    fps: Fps,
    args: &RenderArgs,
) -> anyhow::Result<()>
where
    S: FrameSource,
    K: FrameSink,
{
    let mut session = PlaybackSession::new(
        source,
        SinkSurface::new(sink, fps),
        LogNotifier,
        cfg.keying,
        cfg.compositor_opts(),
    )?;

    let cancel = CancelToken::new();
    let report = if args.realtime {
        let mut clock = IntervalClock::new(fps, cancel);
        if let Some(n) = args.max_frames {
            clock = clock.with_max_ticks(n);
        }
        FramePump::new(clock, cfg.pump_opts()).run(&mut session)
    } else {
        let mut clock = ManualClock::new(fps.frame_interval(), cancel);
        if let Some(n) = args.max_frames {
            clock = clock.with_max_ticks(n);
        }
        FramePump::new(clock, cfg.pump_opts()).run(&mut session)
    };

    let failure = session.error().map(str::to_owned);
    let (_, surface, _) = session.into_parts();
    let written = surface.frames_written();
    surface.finish()?;

    if report.final_state == PlaybackState::Failed {
        tracing::warn!("playback failed; a host would show its placeholder here");
        anyhow::bail!(
            "playback failed: {}",
            failure.unwrap_or_else(|| "unknown error".to_owned())
        );
    }

    eprintln!(
        "wrote {} frames to {} (state: {:?}, ticks: {})",
        written,
        args.out.display(),
        report.final_state,
        report.ticks
    );
    Ok(())
}

struct LogNotifier;

impl HostNotifier for LogNotifier {
    fn on_state_change(&mut self, from: PlaybackState, to: PlaybackState) {
        tracing::info!(?from, ?to, "state");
    }

    fn on_ended(&mut self) {
        tracing::info!("playback ended");
    }

    fn on_error(&mut self, err: &GreenkeyError) {
        tracing::error!(error = %err, "playback error");
    }

    fn on_reveal(&mut self) {
        tracing::info!("reveal");
    }
}

fn load_png_dir(dir: &Path) -> anyhow::Result<Vec<FrameRGBA>> {
    let mut paths = Vec::new();
    for entry in std::fs::read_dir(dir).with_context(|| format!("read dir '{}'", dir.display()))? {
        let path = entry?.path();
        if path
            .extension()
            .is_some_and(|e| e.eq_ignore_ascii_case("png"))
        {
            paths.push(path);
        }
    }
    paths.sort();
    if paths.is_empty() {
        anyhow::bail!("no PNG frames in '{}'", dir.display());
    }

    paths
        .iter()
        .map(|p| {
            let bytes = std::fs::read(p).with_context(|| format!("read frame '{}'", p.display()))?;
            Ok(FrameRGBA::decode(&bytes)?)
        })
        .collect()
}

fn parse_hex_rgb(s: &str) -> Result<[u8; 3], String> {
    let hex = s.trim_start_matches('#');
    if hex.len() != 6 || !hex.is_ascii() {
        return Err(format!("expected RRGGBB, got '{s}'"));
    }
    let channel = |i: usize| {
        u8::from_str_radix(&hex[i..i + 2], 16).map_err(|e| format!("bad colour '{s}': {e}"))
    };
    Ok([channel(0)?, channel(2)?, channel(4)?])
}

fn parse_fps(s: &str) -> Result<Fps, String> {
    let (num, den) = s.split_once('/').unwrap_or((s, "1"));
    let num: u32 = num.trim().parse().map_err(|e| format!("bad fps '{s}': {e}"))?;
    let den: u32 = den.trim().parse().map_err(|e| format!("bad fps '{s}': {e}"))?;
    Fps::new(num, den).map_err(|e| e.to_string())
}
