//! Per-frame pipeline orchestration.
//!
//! Drives the loop: source -> motion signal -> event segmenter ->
//! (stride-sampled) detector -> label tally, with the clip writer's
//! start/write/stop lifecycle locked to the segmenter's transitions and
//! closed events handed to the metadata sink. Strictly single-threaded,
//! frame at a time; nothing is buffered beyond the current frame.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::Result;

use crate::clip::ClipWriter;
use crate::detect::{prepare_regions, DetectorBackend};
use crate::event::{EventRecord, EventSegmenter, EventSignal, EventSink};
use crate::ingest::FrameSource;
use crate::motion::MotionDetector;

/// Orchestrator knobs that are not owned by a component.
#[derive(Clone, Copy, Debug)]
pub struct PipelineOptions {
    /// Run the detector on every Nth active-event frame.
    pub detect_stride: u64,
    /// Padding applied to motion ROIs before detection.
    pub roi_padding: u32,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            detect_stride: 5,
            roi_padding: 10,
        }
    }
}

/// Counters reported after a run.
#[derive(Clone, Copy, Debug, Default)]
pub struct PipelineReport {
    pub frames: u64,
    pub events_recorded: u64,
    pub events_discarded: u64,
}

pub struct Pipeline {
    source: Box<dyn FrameSource>,
    motion: MotionDetector,
    segmenter: EventSegmenter,
    detector: Option<Box<dyn DetectorBackend>>,
    clip_writer: Box<dyn ClipWriter>,
    sink: Box<dyn EventSink>,
    options: PipelineOptions,
    stop_flag: Option<Arc<AtomicBool>>,
}

impl Pipeline {
    pub fn new(
        source: Box<dyn FrameSource>,
        motion: MotionDetector,
        segmenter: EventSegmenter,
        detector: Option<Box<dyn DetectorBackend>>,
        clip_writer: Box<dyn ClipWriter>,
        sink: Box<dyn EventSink>,
        options: PipelineOptions,
    ) -> Self {
        Self {
            source,
            motion,
            segmenter,
            detector,
            clip_writer,
            sink,
            options,
            stop_flag: None,
        }
    }

    /// Cooperative stop: once the flag is set, no further frames are pulled
    /// and the run winds down as if the stream had ended.
    pub fn with_stop_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.stop_flag = Some(flag);
        self
    }

    /// Run the stream to exhaustion (or until the stop flag is raised),
    /// then flush the metadata sink.
    pub fn run(&mut self) -> Result<PipelineReport> {
        let mut report = PipelineReport::default();
        // Per-event counter, reset on every start, so the detector stride
        // never drifts across events.
        let mut event_frame_counter = 0u64;
        let mut last_timestamp: Option<f64> = None;

        if let Some(detector) = &mut self.detector {
            detector.warm_up()?;
        }

        loop {
            if let Some(flag) = &self.stop_flag {
                if flag.load(Ordering::Relaxed) {
                    log::info!("stop requested; treating as end of stream");
                    break;
                }
            }

            let Some((frame, timestamp)) = self.source.next_frame()? else {
                break;
            };
            report.frames += 1;
            last_timestamp = Some(timestamp);

            let motion_frame = self.motion.observe(&frame)?;
            let signal = self.segmenter.update(motion_frame.motion_present, timestamp);

            if matches!(signal, EventSignal::Started) {
                self.clip_writer.start(
                    self.segmenter.last_event_id(),
                    frame.width,
                    frame.height,
                )?;
                event_frame_counter = 0;
            }

            if self.segmenter.is_active() {
                if event_frame_counter % self.options.detect_stride == 0 {
                    if let Some(detector) = &mut self.detector {
                        let regions = prepare_regions(
                            &motion_frame.rois,
                            self.options.roi_padding,
                            frame.width,
                            frame.height,
                        );
                        if !regions.is_empty() {
                            let detections = detector.detect_regions(&frame, &regions)?;
                            let labels: Vec<String> =
                                detections.into_iter().map(|d| d.label).collect();
                            self.segmenter.add_observations(&labels);
                        }
                    }
                }
                self.clip_writer.write(&frame)?;
                event_frame_counter += 1;
            }

            if let EventSignal::Ended(record) = signal {
                self.close_event(record, &mut report)?;
            }
        }

        // A stream ending mid-event is a boundary condition, not an error:
        // force-close with the last observed timestamp.
        if self.segmenter.is_active() {
            let record = self.segmenter.finish(last_timestamp.unwrap_or(0.0));
            self.close_event(record, &mut report)?;
        }

        self.sink.save()?;
        log::info!(
            "stream done: {} frame(s), {} event(s) recorded, {} discarded",
            report.frames,
            report.events_recorded,
            report.events_discarded
        );
        Ok(report)
    }

    fn close_event(
        &mut self,
        record: Option<EventRecord>,
        report: &mut PipelineReport,
    ) -> Result<()> {
        let clip_path = self.clip_writer.stop()?;

        match record {
            Some(mut record) => {
                match clip_path {
                    Some(path) => record.attach_clip(path),
                    None => log::warn!(
                        "event {} closed without an open clip",
                        record.event_id
                    ),
                }
                log::info!("event {} saved", record.event_id);
                self.sink.add(record);
                report.events_recorded += 1;
            }
            None => {
                report.events_discarded += 1;
                // The clip of a discarded short event is an orphan; drop it.
                if let Some(path) = clip_path {
                    if path.exists() {
                        if let Err(e) = std::fs::remove_file(&path) {
                            log::warn!(
                                "failed to remove discarded clip {}: {}",
                                path.display(),
                                e
                            );
                        }
                    }
                }
            }
        }
        Ok(())
    }
}
