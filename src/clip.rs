//! Event clip writing.
//!
//! One clip per event, opened on event start and released on event end. The
//! default writer emits a concatenated-JPEG (MJPEG) stream, which keeps the
//! crate free of codec toolchains; real containers can be layered behind the
//! same trait.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use image::codecs::jpeg::JpegEncoder;
use image::ExtendedColorType;

use crate::frame::Frame;
use crate::PipelineFault;

pub trait ClipWriter: Send {
    /// Open a new clip keyed by event id. Fails when a clip is already open
    /// or the output cannot be created.
    fn start(&mut self, event_id: u64, width: u32, height: u32) -> Result<()>;

    /// Append a frame to the open clip. A write with no open clip is a
    /// silent no-op.
    fn write(&mut self, frame: &Frame) -> Result<()>;

    /// Close the open clip and return its path, or `None` when no clip was
    /// open.
    fn stop(&mut self) -> Result<Option<PathBuf>>;
}

struct OpenClip {
    path: PathBuf,
    file: BufWriter<File>,
    width: u32,
    height: u32,
    frames: u64,
}

/// Writes each frame as a JPEG image appended to `event_{id:03}.mjpeg`.
pub struct MjpegClipWriter {
    output_dir: PathBuf,
    quality: u8,
    open: Option<OpenClip>,
}

impl MjpegClipWriter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            quality: 85,
            open: None,
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }
}

impl ClipWriter for MjpegClipWriter {
    fn start(&mut self, event_id: u64, width: u32, height: u32) -> Result<()> {
        if self.open.is_some() {
            return Err(PipelineFault::writer_init(
                "clip writer already has an open clip",
            )
            .into());
        }
        std::fs::create_dir_all(&self.output_dir).map_err(|e| {
            PipelineFault::writer_init(format!(
                "failed to create clip directory {}: {}",
                self.output_dir.display(),
                e
            ))
        })?;

        let path = self.output_dir.join(format!("event_{:03}.mjpeg", event_id));
        let file = File::create(&path).map_err(|e| {
            PipelineFault::writer_init(format!("failed to open clip {}: {}", path.display(), e))
        })?;

        self.open = Some(OpenClip {
            path,
            file: BufWriter::new(file),
            width,
            height,
            frames: 0,
        });
        Ok(())
    }

    fn write(&mut self, frame: &Frame) -> Result<()> {
        let Some(open) = &mut self.open else {
            return Ok(());
        };
        if frame.width != open.width || frame.height != open.height {
            return Err(anyhow!(
                "frame geometry changed mid-clip ({}x{} -> {}x{})",
                open.width,
                open.height,
                frame.width,
                frame.height
            ));
        }
        JpegEncoder::new_with_quality(&mut open.file, self.quality)
            .encode(
                &frame.data,
                frame.width,
                frame.height,
                ExtendedColorType::Rgb8,
            )
            .context("failed to encode clip frame")?;
        open.frames += 1;
        Ok(())
    }

    fn stop(&mut self) -> Result<Option<PathBuf>> {
        let Some(mut open) = self.open.take() else {
            return Ok(None);
        };
        open.file.flush().context("failed to flush clip")?;
        log::debug!(
            "closed clip {} ({} frame(s))",
            open.path.display(),
            open.frames
        );
        Ok(Some(open.path))
    }
}

/// Clip writer that produces no files. Used by tests and metadata-only runs.
#[derive(Default)]
pub struct NullClipWriter {
    open: Option<PathBuf>,
    pub clips_started: u64,
    pub frames_written: u64,
}

impl NullClipWriter {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ClipWriter for NullClipWriter {
    fn start(&mut self, event_id: u64, _width: u32, _height: u32) -> Result<()> {
        if self.open.is_some() {
            return Err(PipelineFault::writer_init(
                "clip writer already has an open clip",
            )
            .into());
        }
        self.open = Some(PathBuf::from(format!("event_{:03}.null", event_id)));
        self.clips_started += 1;
        Ok(())
    }

    fn write(&mut self, _frame: &Frame) -> Result<()> {
        if self.open.is_some() {
            self.frames_written += 1;
        }
        Ok(())
    }

    fn stop(&mut self) -> Result<Option<PathBuf>> {
        Ok(self.open.take())
    }
}
