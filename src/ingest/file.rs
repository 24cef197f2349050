//! Local file frame source.
//!
//! `FileSource` decodes frames from a local path. `stub://` paths produce a
//! deterministic synthetic stream; `.mjpeg`/`.mjpg` files are read as
//! concatenated JPEG images; anything else needs the `ingest-file-ffmpeg`
//! feature. Remote URLs are rejected.

use std::path::Path;

use anyhow::Result;
use image::ImageFormat;

use super::{FrameSource, FALLBACK_FPS};
#[cfg(feature = "ingest-file-ffmpeg")]
use super::file_ffmpeg::FfmpegFileSource;
use crate::frame::Frame;
use crate::roi::BoundingBox;
use crate::PipelineFault;

/// Configuration for a local file source.
#[derive(Clone, Debug)]
pub struct FileConfig {
    /// Local file path or `stub://` identifier.
    pub path: String,
    /// Frame rate used when the input does not declare one.
    pub target_fps: f64,
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            path: String::new(),
            target_fps: FALLBACK_FPS,
        }
    }
}

/// Local file frame source.
#[derive(Debug)]
pub struct FileSource {
    backend: FileBackend,
}

#[derive(Debug)]
enum FileBackend {
    Synthetic(SyntheticFileSource),
    Mjpeg(MjpegFileSource),
    #[cfg(feature = "ingest-file-ffmpeg")]
    Ffmpeg(FfmpegFileSource),
}

impl FileSource {
    pub fn new(config: FileConfig) -> Result<Self> {
        if !is_local_file_path(&config.path) {
            return Err(PipelineFault::source_unavailable(
                "file ingestion only supports local paths (no URL schemes)",
            )
            .into());
        }
        if config.path.starts_with("stub://") {
            return Ok(Self {
                backend: FileBackend::Synthetic(SyntheticFileSource::new(
                    SyntheticConfig::default(),
                    config.target_fps,
                )),
            });
        }
        if !Path::new(&config.path).exists() {
            return Err(PipelineFault::source_unavailable(format!(
                "video not found: {}",
                config.path
            ))
            .into());
        }
        let is_mjpeg = Path::new(&config.path)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case("mjpeg") || ext.eq_ignore_ascii_case("mjpg"))
            .unwrap_or(false);
        if is_mjpeg {
            return Ok(Self {
                backend: FileBackend::Mjpeg(MjpegFileSource::open(config)?),
            });
        }
        #[cfg(feature = "ingest-file-ffmpeg")]
        {
            Ok(Self {
                backend: FileBackend::Ffmpeg(FfmpegFileSource::open(config)?),
            })
        }
        #[cfg(not(feature = "ingest-file-ffmpeg"))]
        {
            Err(PipelineFault::source_unavailable(
                "this container needs the ingest-file-ffmpeg feature (or use an .mjpeg stream)",
            )
            .into())
        }
    }

    /// Synthetic source with an explicit script. Used by tests and demos.
    pub fn synthetic(config: SyntheticConfig, fps: f64) -> Self {
        Self {
            backend: FileBackend::Synthetic(SyntheticFileSource::new(config, fps)),
        }
    }
}

impl FrameSource for FileSource {
    fn fps(&self) -> f64 {
        match &self.backend {
            FileBackend::Synthetic(source) => source.fps,
            FileBackend::Mjpeg(source) => source.fps,
            #[cfg(feature = "ingest-file-ffmpeg")]
            FileBackend::Ffmpeg(source) => source.fps(),
        }
    }

    fn next_frame(&mut self) -> Result<Option<(Frame, f64)>> {
        match &mut self.backend {
            FileBackend::Synthetic(source) => source.next_frame(),
            FileBackend::Mjpeg(source) => source.next_frame(),
            #[cfg(feature = "ingest-file-ffmpeg")]
            FileBackend::Ffmpeg(source) => source.next_frame(),
        }
    }
}

// ----------------------------------------------------------------------------
// Synthetic source (stub://)
// ----------------------------------------------------------------------------

/// Script for the synthetic source: a fixed-size stream with a bright square
/// sweeping across the frame during the given frame spans.
#[derive(Clone, Debug)]
pub struct SyntheticConfig {
    pub frames: u64,
    pub width: u32,
    pub height: u32,
    /// Half-open frame index ranges during which the square moves.
    pub active_spans: Vec<(u64, u64)>,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            frames: 120,
            width: 64,
            height: 64,
            active_spans: vec![(20, 50), (80, 90)],
        }
    }
}

#[derive(Debug)]
struct SyntheticFileSource {
    config: SyntheticConfig,
    fps: f64,
    frame_index: u64,
}

impl SyntheticFileSource {
    fn new(config: SyntheticConfig, fps: f64) -> Self {
        log::info!(
            "FileSource: synthetic stream, {} frames at {:.1} fps",
            config.frames,
            fps
        );
        Self {
            config,
            fps,
            frame_index: 0,
        }
    }

    fn next_frame(&mut self) -> Result<Option<(Frame, f64)>> {
        if self.frame_index >= self.config.frames {
            return Ok(None);
        }
        let idx = self.frame_index;
        self.frame_index += 1;

        let mut frame = Frame::filled(self.config.width, self.config.height, [24, 24, 24]);
        if self
            .config
            .active_spans
            .iter()
            .any(|&(start, end)| idx >= start && idx < end)
        {
            let side = (self.config.width / 4).max(1);
            let max_x = self.config.width.saturating_sub(side);
            let x = if max_x == 0 {
                0
            } else {
                ((idx * 5) % max_x as u64) as u32
            };
            let y = (self.config.height - side) / 2;
            frame.fill_region(&BoundingBox::new(x, y, side, side), [230, 230, 230]);
        }

        let timestamp = idx as f64 / self.fps;
        Ok(Some((frame, timestamp)))
    }
}

// ----------------------------------------------------------------------------
// MJPEG source (concatenated JPEG images)
// ----------------------------------------------------------------------------

#[derive(Debug)]
struct MjpegFileSource {
    bytes: Vec<u8>,
    cursor: usize,
    fps: f64,
    frame_index: u64,
    path: String,
}

impl MjpegFileSource {
    fn open(config: FileConfig) -> Result<Self> {
        let bytes = std::fs::read(&config.path).map_err(|e| {
            PipelineFault::source_unavailable(format!(
                "failed to read {}: {}",
                config.path, e
            ))
        })?;
        let fps = if config.target_fps > 0.0 {
            config.target_fps
        } else {
            FALLBACK_FPS
        };
        log::info!("FileSource: mjpeg stream {} at {:.1} fps", config.path, fps);
        Ok(Self {
            bytes,
            cursor: 0,
            fps,
            frame_index: 0,
            path: config.path,
        })
    }

    fn next_frame(&mut self) -> Result<Option<(Frame, f64)>> {
        let Some((start, end)) = next_jpeg_span(&self.bytes, self.cursor) else {
            return Ok(None);
        };
        self.cursor = end;

        let image = image::load_from_memory_with_format(&self.bytes[start..end], ImageFormat::Jpeg)
            .map_err(|e| {
                PipelineFault::source_unavailable(format!(
                    "failed to decode frame {} of {}: {}",
                    self.frame_index, self.path, e
                ))
            })?;
        let rgb = image.to_rgb8();
        let (width, height) = rgb.dimensions();
        let frame = Frame::new(rgb.into_raw(), width, height);

        let timestamp = self.frame_index as f64 / self.fps;
        self.frame_index += 1;
        Ok(Some((frame, timestamp)))
    }
}

/// Locate the next SOI..EOI JPEG span at or after `from`.
fn next_jpeg_span(bytes: &[u8], from: usize) -> Option<(usize, usize)> {
    let start = find_marker(bytes, from, [0xFF, 0xD8])?;
    let end = find_marker(bytes, start + 2, [0xFF, 0xD9])? + 2;
    Some((start, end))
}

fn find_marker(bytes: &[u8], from: usize, marker: [u8; 2]) -> Option<usize> {
    bytes
        .get(from..)?
        .windows(2)
        .position(|w| w == marker)
        .map(|pos| from + pos)
}

fn is_local_file_path(path: &str) -> bool {
    if path.trim().is_empty() {
        return false;
    }
    if path.starts_with("stub://") {
        return true;
    }
    !path.contains("://")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clip::{ClipWriter, MjpegClipWriter};

    #[test]
    fn synthetic_source_is_finite_with_increasing_timestamps() {
        let mut source = FileSource::synthetic(
            SyntheticConfig {
                frames: 10,
                ..SyntheticConfig::default()
            },
            10.0,
        );

        let mut last_ts = -1.0;
        let mut count = 0;
        while let Some((frame, ts)) = source.next_frame().unwrap() {
            assert_eq!(frame.width, 64);
            assert!(ts > last_ts);
            last_ts = ts;
            count += 1;
        }
        assert_eq!(count, 10);
        assert!(source.next_frame().unwrap().is_none());
    }

    #[test]
    fn remote_urls_are_rejected() {
        let err = FileSource::new(FileConfig {
            path: "rtsp://camera-1/stream".to_string(),
            target_fps: 10.0,
        })
        .expect_err("remote url must be rejected");
        let fault = err.downcast_ref::<crate::PipelineFault>().expect("fault");
        assert_eq!(fault.code, "SOURCE_UNAVAILABLE");
    }

    #[test]
    fn missing_file_is_source_unavailable() {
        let err = FileSource::new(FileConfig {
            path: "/nonexistent/clip.mjpeg".to_string(),
            target_fps: 10.0,
        })
        .expect_err("missing file must be rejected");
        let fault = err.downcast_ref::<crate::PipelineFault>().expect("fault");
        assert_eq!(fault.code, "SOURCE_UNAVAILABLE");
    }

    #[test]
    fn mjpeg_round_trips_through_the_clip_writer() {
        let dir = tempfile::tempdir().expect("temp dir");
        let mut writer = MjpegClipWriter::new(dir.path());
        writer.start(1, 32, 24).expect("start");
        for shade in [40u8, 90, 140] {
            writer
                .write(&Frame::filled(32, 24, [shade, shade, shade]))
                .expect("write");
        }
        let path = writer.stop().expect("stop").expect("path");

        let mut source = FileSource::new(FileConfig {
            path: path.to_string_lossy().into_owned(),
            target_fps: 10.0,
        })
        .expect("open mjpeg");

        let mut frames = 0;
        let mut timestamps = Vec::new();
        while let Some((frame, ts)) = source.next_frame().expect("decode") {
            assert_eq!((frame.width, frame.height), (32, 24));
            timestamps.push(ts);
            frames += 1;
        }
        assert_eq!(frames, 3);
        assert_eq!(timestamps, vec![0.0, 0.1, 0.2]);
    }
}
