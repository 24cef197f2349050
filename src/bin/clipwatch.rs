//! clipwatch - motion-event clipper CLI
//!
//! Reads a local video stream, segments sustained motion into events, writes
//! one clip per kept event, and persists the event metadata as a JSON array
//! at the end of the run.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{anyhow, Result};
use clap::Parser;

use clipwatch::{
    BackendRegistry, ClipwatchConfig, DetectorBackend, EventSegmenter, FileConfig, FileSource,
    FrameDiffBackend, FrameDiffConfig, JsonFileSink, MjpegClipWriter, MotionDetector, Pipeline,
    PipelineOptions, StubBackend,
};

#[path = "../ui.rs"]
mod ui;

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Input video: stub://, an .mjpeg stream, or any container with the
    /// ingest-file-ffmpeg feature.
    #[arg(env = "CLIPWATCH_INPUT")]
    input: Option<String>,
    /// Label event regions with the object detector.
    #[arg(long)]
    detect: bool,
    /// Run the detector on every Nth active-event frame.
    #[arg(long, value_name = "N")]
    detect_stride: Option<u64>,
    /// Detector backend name (default: first registered).
    #[arg(long)]
    backend: Option<String>,
    /// Directory for event clips.
    #[arg(long)]
    clips_dir: Option<PathBuf>,
    /// Output path for the event metadata JSON.
    #[arg(long)]
    metadata: Option<PathBuf>,
    /// UI mode for stderr progress (auto|plain|pretty)
    #[arg(long, default_value = "auto", value_name = "MODE")]
    ui: String,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let mut cfg = ClipwatchConfig::load()?;

    if let Some(input) = args.input {
        cfg.input.path = input;
    }
    if args.detect {
        cfg.detect.enabled = true;
    }
    if let Some(stride) = args.detect_stride {
        if stride == 0 {
            return Err(anyhow!("--detect-stride must be at least 1"));
        }
        cfg.detect.stride = stride;
    }
    if let Some(backend) = args.backend {
        cfg.detect.backend = backend;
    }
    if let Some(clips_dir) = args.clips_dir {
        cfg.output.clips_dir = clips_dir;
    }
    if let Some(metadata) = args.metadata {
        cfg.output.metadata_path = metadata;
    }
    if cfg.input.path.trim().is_empty() {
        return Err(anyhow!(
            "no input: pass a path (or stub://) on the command line or set CLIPWATCH_INPUT"
        ));
    }

    let ui = ui::RunUi::new(&args.ui);

    let stop = Arc::new(AtomicBool::new(false));
    {
        let stop = stop.clone();
        ctrlc::set_handler(move || {
            stop.store(true, Ordering::Relaxed);
        })?;
    }

    ui.phase("Open input");
    let source = FileSource::new(FileConfig {
        path: cfg.input.path.clone(),
        target_fps: cfg.input.target_fps,
    })?;

    let motion = MotionDetector::new(
        Box::new(FrameDiffBackend::new(FrameDiffConfig {
            block_size: cfg.motion.block_size,
            diff_threshold: cfg.motion.diff_threshold,
            ..FrameDiffConfig::default()
        })),
        cfg.motion.min_area,
        cfg.motion.roi_expand,
    );
    let segmenter = EventSegmenter::new(cfg.events.inactivity_timeout, cfg.events.min_event_duration);

    let detector = if cfg.detect.enabled {
        let mut registry = BackendRegistry::new();
        registry.register(StubBackend::new(cfg.detect.confidence_threshold));
        let backend = registry.take(&cfg.detect.backend)?;
        log::info!("object labeling enabled (backend={})", backend.name());
        Some(backend)
    } else {
        None
    };

    let clip_writer = MjpegClipWriter::new(cfg.output.clips_dir.clone());
    let sink = JsonFileSink::new(cfg.output.metadata_path.clone());

    log::info!(
        "clipwatch running: input={} clips={} metadata={}",
        cfg.input.path,
        cfg.output.clips_dir.display(),
        cfg.output.metadata_path.display()
    );

    ui.phase("Process stream");
    let mut pipeline = Pipeline::new(
        Box::new(source),
        motion,
        segmenter,
        detector,
        Box::new(clip_writer),
        Box::new(sink),
        PipelineOptions {
            detect_stride: cfg.detect.stride,
            roi_padding: cfg.detect.roi_padding,
        },
    )
    .with_stop_flag(stop);

    let report = pipeline.run()?;

    ui.finish(&format!(
        "{} frame(s), {} event(s) recorded, {} discarded",
        report.frames, report.events_recorded, report.events_discarded
    ));
    Ok(())
}
