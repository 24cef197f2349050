//! clipwatch - motion-event clipper.
//!
//! Watches a video stream, detects periods of sustained motion, and turns
//! each period into a discrete event: a saved clip plus a metadata record
//! with aggregated object labels, duration, and timestamps.
//!
//! # Architecture
//!
//! Data flows strictly downstream, one frame at a time:
//!
//! source -> motion signal -> event segmenter -> (sampled) detector ->
//! label tally -> clip writer / metadata sink
//!
//! # Module Structure
//!
//! - `ingest`: frame sources (synthetic, MJPEG, optional FFmpeg)
//! - `roi`: bounding boxes and region consolidation
//! - `motion`: background-subtraction seam and the per-frame motion signal
//! - `event`: the segmentation state machine, label aggregation, sinks
//! - `detect`: object-detection seam and backends
//! - `clip`: per-event clip writers
//! - `pipeline`: the per-frame orchestration loop
//! - `config`: file + environment configuration

pub mod clip;
pub mod config;
pub mod detect;
pub mod event;
pub mod frame;
pub mod ingest;
pub mod motion;
pub mod pipeline;
pub mod roi;

pub use clip::{ClipWriter, MjpegClipWriter, NullClipWriter};
pub use config::ClipwatchConfig;
pub use detect::{BackendRegistry, Detection, DetectorBackend, StubBackend};
pub use event::{
    EventRecord, EventSegmenter, EventSignal, EventSink, InMemorySink, JsonFileSink, LabelSummary,
    LabelTally,
};
pub use frame::Frame;
pub use ingest::{FileConfig, FileSource, FrameSource, SyntheticConfig};
pub use motion::{
    ForegroundBlob, FrameDiffBackend, FrameDiffConfig, MotionBackend, MotionDetector, MotionFrame,
};
pub use pipeline::{Pipeline, PipelineOptions, PipelineReport};
pub use roi::{consolidate_boxes, BoundingBox};

/// Typed fault carried through `anyhow` for the failure classes callers are
/// expected to branch on.
#[derive(Clone, Debug)]
pub struct PipelineFault {
    pub code: &'static str,
    pub message: String,
}

impl PipelineFault {
    /// The video cannot be opened or read. Fatal before any events exist.
    pub fn source_unavailable(message: impl Into<String>) -> Self {
        Self {
            code: "SOURCE_UNAVAILABLE",
            message: message.into(),
        }
    }

    /// The clip encoder cannot be opened. Fatal for the affected event; the
    /// pipeline never silently proceeds as if a clip were recording.
    pub fn writer_init(message: impl Into<String>) -> Self {
        Self {
            code: "WRITER_INIT_FAILURE",
            message: message.into(),
        }
    }
}

impl std::fmt::Display for PipelineFault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for PipelineFault {}
