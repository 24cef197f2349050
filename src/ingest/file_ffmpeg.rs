//! Local file frame source using FFmpeg.
//!
//! Decodes arbitrary containers to RGB24 in-memory. Timestamps follow the
//! source's frame index over its declared rate, falling back to the
//! configured rate for badly encoded inputs.

use anyhow::{Context, Result};
use ffmpeg_next as ffmpeg;

use super::file::FileConfig;
use super::FALLBACK_FPS;
use crate::frame::Frame;
use crate::PipelineFault;

pub(crate) struct FfmpegFileSource {
    input: ffmpeg::format::context::Input,
    stream_index: usize,
    decoder: ffmpeg::codec::decoder::Video,
    scaler: ffmpeg::software::scaling::Context,
    fps: f64,
    frame_index: u64,
    flushed: bool,
}

impl FfmpegFileSource {
    pub(crate) fn open(config: FileConfig) -> Result<Self> {
        ffmpeg::init().context("initialize ffmpeg")?;
        let input = ffmpeg::format::input(&config.path).map_err(|e| {
            PipelineFault::source_unavailable(format!(
                "failed to open {} with ffmpeg: {}",
                config.path, e
            ))
        })?;
        let input_stream = input
            .streams()
            .best(ffmpeg::media::Type::Video)
            .ok_or_else(|| PipelineFault::source_unavailable("file has no video track"))?;
        let stream_index = input_stream.index();

        let declared_rate: f64 = input_stream.avg_frame_rate().into();
        let fps = if declared_rate.is_finite() && declared_rate > 0.0 {
            declared_rate
        } else if config.target_fps > 0.0 {
            config.target_fps
        } else {
            FALLBACK_FPS
        };

        let context = ffmpeg::codec::context::Context::from_parameters(input_stream.parameters())
            .context("load video decoder parameters")?;
        let decoder = context
            .decoder()
            .video()
            .context("open ffmpeg video decoder")?;

        let scaler = ffmpeg::software::scaling::context::Context::get(
            decoder.format(),
            decoder.width(),
            decoder.height(),
            ffmpeg::util::format::pixel::Pixel::RGB24,
            decoder.width(),
            decoder.height(),
            ffmpeg::software::scaling::flag::Flags::BILINEAR,
        )
        .context("create ffmpeg scaler")?;

        log::info!("FileSource: ffmpeg stream {} at {:.1} fps", config.path, fps);

        Ok(Self {
            input,
            stream_index,
            decoder,
            scaler,
            fps,
            frame_index: 0,
            flushed: false,
        })
    }

    pub(crate) fn fps(&self) -> f64 {
        self.fps
    }

    pub(crate) fn next_frame(&mut self) -> Result<Option<(Frame, f64)>> {
        let mut decoded = ffmpeg::frame::Video::empty();

        loop {
            if self.decoder.receive_frame(&mut decoded).is_ok() {
                let mut rgb_frame = ffmpeg::frame::Video::empty();
                self.scaler
                    .run(&decoded, &mut rgb_frame)
                    .context("scale frame to RGB")?;
                let (pixels, width, height) = frame_to_pixels(&rgb_frame)?;

                let timestamp = self.frame_index as f64 / self.fps;
                self.frame_index += 1;
                return Ok(Some((Frame::new(pixels, width, height), timestamp)));
            }

            if self.flushed {
                return Ok(None);
            }

            let mut sent = false;
            for (stream, packet) in self.input.packets() {
                if stream.index() != self.stream_index {
                    continue;
                }
                self.decoder
                    .send_packet(&packet)
                    .context("send packet to ffmpeg decoder")?;
                sent = true;
                break;
            }
            if !sent {
                self.decoder.send_eof().context("flush ffmpeg decoder")?;
                self.flushed = true;
            }
        }
    }
}

fn frame_to_pixels(frame: &ffmpeg::frame::Video) -> Result<(Vec<u8>, u32, u32)> {
    let width = frame.width();
    let height = frame.height();
    let row_bytes = (width as usize) * 3;
    let stride = frame.stride(0) as usize;
    let data = frame.data(0);

    if stride == row_bytes {
        return Ok((data.to_vec(), width, height));
    }

    let mut pixels = Vec::with_capacity(row_bytes * height as usize);
    for row in 0..height as usize {
        let start = row * stride;
        let end = start + row_bytes;
        pixels.extend_from_slice(
            data.get(start..end)
                .context("ffmpeg frame row is out of bounds")?,
        );
    }

    Ok((pixels, width, height))
}
