//! Frame ingestion sources.
//!
//! A source yields a lazy, finite, non-restartable sequence of decoded
//! frames with strictly increasing timestamps, and signals end of stream by
//! exhaustion. Sources shipped here:
//! - synthetic `stub://` streams (testing, demos)
//! - concatenated-JPEG (MJPEG) files (default build)
//! - arbitrary containers via FFmpeg (feature: ingest-file-ffmpeg)

pub mod file;
#[cfg(feature = "ingest-file-ffmpeg")]
pub(crate) mod file_ffmpeg;

pub use file::{FileConfig, FileSource, SyntheticConfig};

use anyhow::Result;

use crate::frame::Frame;

/// Fallback frame rate for inputs that do not declare one.
pub const FALLBACK_FPS: f64 = 30.0;

pub trait FrameSource: Send {
    /// Nominal frame rate of the stream, used for timestamps and clip pacing.
    fn fps(&self) -> f64;

    /// Produce the next frame and its timestamp in seconds, or `None` once
    /// the stream is exhausted.
    fn next_frame(&mut self) -> Result<Option<(Frame, f64)>>;
}
