//! End-to-end pipeline scenarios with scripted collaborators.

use std::sync::{Arc, Mutex};

use anyhow::Result;

use clipwatch::{
    Detection, DetectorBackend, EventSegmenter, FileSource, ForegroundBlob, Frame, FrameSource,
    InMemorySink, JsonFileSink, MjpegClipWriter, MotionBackend, MotionDetector, NullClipWriter,
    Pipeline, PipelineOptions, StubBackend, SyntheticConfig,
};
use clipwatch::{BoundingBox, ClipWriter, EventRecord};

/// Source that replays a fixed list of timestamps; frame content is inert
/// because motion comes from the scripted backend below.
struct ScriptedSource {
    timestamps: Vec<f64>,
    cursor: usize,
}

impl ScriptedSource {
    fn new(timestamps: &[f64]) -> Self {
        Self {
            timestamps: timestamps.to_vec(),
            cursor: 0,
        }
    }
}

impl FrameSource for ScriptedSource {
    fn fps(&self) -> f64 {
        10.0
    }

    fn next_frame(&mut self) -> Result<Option<(Frame, f64)>> {
        let Some(&ts) = self.timestamps.get(self.cursor) else {
            return Ok(None);
        };
        self.cursor += 1;
        Ok(Some((Frame::filled(32, 32, [0, 0, 0]), ts)))
    }
}

/// Motion backend that replays a fixed presence script, one entry per frame.
struct ScriptedMotion {
    script: Vec<bool>,
    cursor: usize,
}

impl ScriptedMotion {
    fn new(script: &[bool]) -> Self {
        Self {
            script: script.to_vec(),
            cursor: 0,
        }
    }
}

impl MotionBackend for ScriptedMotion {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn apply(&mut self, _frame: &Frame) -> Result<Vec<ForegroundBlob>> {
        let present = self.script.get(self.cursor).copied().unwrap_or(false);
        self.cursor += 1;
        if present {
            Ok(vec![ForegroundBlob {
                bbox: BoundingBox::new(4, 4, 8, 8),
                area: 1000.0,
            }])
        } else {
            Ok(Vec::new())
        }
    }
}

/// Detector that counts invocations and always reports one person.
struct CountingDetector {
    calls: Arc<Mutex<u64>>,
}

impl DetectorBackend for CountingDetector {
    fn name(&self) -> &'static str {
        "counting"
    }

    fn detect_regions(&mut self, _frame: &Frame, rois: &[BoundingBox]) -> Result<Vec<Detection>> {
        *self.calls.lock().unwrap() += 1;
        Ok(rois
            .iter()
            .map(|roi| Detection {
                label: "person".to_string(),
                confidence: 0.9,
                bbox: *roi,
            })
            .collect())
    }
}

/// Clip writer whose counters survive the pipeline taking ownership.
#[derive(Clone, Default)]
struct SharedClipWriter {
    state: Arc<Mutex<SharedClipState>>,
}

#[derive(Default)]
struct SharedClipState {
    open: Option<u64>,
    starts: Vec<u64>,
    frames_written: u64,
}

impl ClipWriter for SharedClipWriter {
    fn start(&mut self, event_id: u64, _width: u32, _height: u32) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        assert!(state.open.is_none(), "one open clip at a time");
        state.open = Some(event_id);
        state.starts.push(event_id);
        Ok(())
    }

    fn write(&mut self, _frame: &Frame) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if state.open.is_some() {
            state.frames_written += 1;
        }
        Ok(())
    }

    fn stop(&mut self) -> Result<Option<std::path::PathBuf>> {
        let mut state = self.state.lock().unwrap();
        Ok(state
            .open
            .take()
            .map(|id| std::path::PathBuf::from(format!("event_{:03}.clip", id))))
    }
}

fn scripted_pipeline(
    steps: &[(bool, f64)],
    segmenter: EventSegmenter,
    detector: Option<Box<dyn DetectorBackend>>,
    clip_writer: Box<dyn ClipWriter>,
    sink: InMemorySink,
    options: PipelineOptions,
) -> Pipeline {
    let timestamps: Vec<f64> = steps.iter().map(|&(_, ts)| ts).collect();
    let flags: Vec<bool> = steps.iter().map(|&(flag, _)| flag).collect();
    let motion = MotionDetector::new(Box::new(ScriptedMotion::new(&flags)), 100.0, 5);
    Pipeline::new(
        Box::new(ScriptedSource::new(&timestamps)),
        motion,
        segmenter,
        detector,
        clip_writer,
        Box::new(sink),
        options,
    )
}

#[test]
fn long_gap_produces_one_recorded_event() {
    let steps = [
        (true, 0.0),
        (true, 0.2),
        (true, 0.4),
        (false, 0.6),
        (false, 3.0),
    ];
    let sink = InMemorySink::new();
    let clips = SharedClipWriter::default();
    let mut pipeline = scripted_pipeline(
        &steps,
        EventSegmenter::new(2.0, 0.5),
        None,
        Box::new(clips.clone()),
        sink.clone(),
        PipelineOptions::default(),
    );

    let report = pipeline.run().expect("run");

    assert_eq!(report.frames, 5);
    assert_eq!(report.events_recorded, 1);
    assert_eq!(report.events_discarded, 0);

    let records = sink.records();
    assert_eq!(records.len(), 1);
    let record = &records[0];
    assert_eq!(record.event_id, 1);
    assert_eq!(record.start_time, 0.0);
    assert_eq!(record.end_time, 3.0);
    assert_eq!(record.duration, 3.0);
    assert_eq!(record.primary_label, "unknown");
    assert_eq!(
        record.clip_path.as_deref(),
        Some(std::path::Path::new("event_001.clip"))
    );

    let state = clips.state.lock().unwrap();
    assert_eq!(state.starts, vec![1]);
    // The closing frame at t=3.0 is not part of the clip.
    assert_eq!(state.frames_written, 4);
    assert!(state.open.is_none());
}

#[test]
fn short_burst_at_stream_end_is_discarded() {
    let steps = [(true, 0.0), (false, 0.1), (false, 0.3)];
    let sink = InMemorySink::new();
    let mut pipeline = scripted_pipeline(
        &steps,
        EventSegmenter::new(2.0, 0.5),
        None,
        Box::new(NullClipWriter::new()),
        sink.clone(),
        PipelineOptions::default(),
    );

    let report = pipeline.run().expect("run");

    assert_eq!(report.events_recorded, 0);
    assert_eq!(report.events_discarded, 1);
    assert!(sink.records().is_empty());
}

#[test]
fn stream_end_mid_event_still_flushes_the_record() {
    let steps = [(true, 0.0), (true, 0.5), (true, 1.0)];
    let sink = InMemorySink::new();
    let mut pipeline = scripted_pipeline(
        &steps,
        EventSegmenter::new(2.0, 0.5),
        None,
        Box::new(NullClipWriter::new()),
        sink.clone(),
        PipelineOptions::default(),
    );

    let report = pipeline.run().expect("run");

    assert_eq!(report.events_recorded, 1);
    let records = sink.records();
    assert_eq!(records[0].end_time, 1.0);
    assert_eq!(records[0].duration, 1.0);
    assert!(records[0].clip_path.is_some());
}

#[test]
fn discarded_event_still_consumes_its_id() {
    let steps = [
        (true, 0.0),
        (false, 1.0), // closes event 1 at 1.0s, duration 1.0 < 1.5: discarded
        (true, 2.0),
        (true, 3.8),
        (false, 4.5), // closes event 2, duration 2.5 >= 1.5: recorded
    ];
    let sink = InMemorySink::new();
    let mut pipeline = scripted_pipeline(
        &steps,
        EventSegmenter::new(0.5, 1.5),
        None,
        Box::new(NullClipWriter::new()),
        sink.clone(),
        PipelineOptions::default(),
    );

    let report = pipeline.run().expect("run");

    assert_eq!(report.events_recorded, 1);
    assert_eq!(report.events_discarded, 1);
    let records = sink.records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].event_id, 2);
}

#[test]
fn detector_sampling_follows_the_per_event_stride() {
    let steps = [
        (true, 0.0),
        (true, 0.1),
        (true, 0.2),
        (true, 0.3),
        (true, 0.4),
        (false, 5.0),
    ];
    let calls = Arc::new(Mutex::new(0u64));
    let detector = CountingDetector {
        calls: calls.clone(),
    };
    let sink = InMemorySink::new();
    let mut pipeline = scripted_pipeline(
        &steps,
        EventSegmenter::new(2.0, 0.5),
        Some(Box::new(detector)),
        Box::new(NullClipWriter::new()),
        sink.clone(),
        PipelineOptions {
            detect_stride: 2,
            roi_padding: 2,
        },
    );

    pipeline.run().expect("run");

    // Active frames 0..4; stride 2 samples frames 0, 2, and 4.
    assert_eq!(*calls.lock().unwrap(), 3);

    let records = sink.records();
    assert_eq!(records[0].primary_label, "person");
    assert_eq!(records[0].primary_confidence, 1.0);
    assert_eq!(records[0].label_distribution.get("person"), Some(&3));
}

#[test]
fn full_stack_run_writes_clips_and_metadata() {
    let dir = tempfile::tempdir().expect("temp dir");
    let clips_dir = dir.path().join("events");
    let metadata_path = dir.path().join("metadata/events.json");

    let source = FileSource::synthetic(
        SyntheticConfig {
            frames: 100,
            width: 64,
            height: 64,
            active_spans: vec![(10, 40)],
        },
        10.0,
    );
    let motion = MotionDetector::new(
        Box::new(clipwatch::FrameDiffBackend::new(
            clipwatch::FrameDiffConfig::default(),
        )),
        200.0,
        25,
    );

    let mut pipeline = Pipeline::new(
        Box::new(source),
        motion,
        EventSegmenter::new(2.0, 0.5),
        Some(Box::new(StubBackend::new(0.5))),
        Box::new(MjpegClipWriter::new(&clips_dir)),
        Box::new(JsonFileSink::new(&metadata_path)),
        PipelineOptions {
            detect_stride: 3,
            roi_padding: 10,
        },
    );

    let report = pipeline.run().expect("run");

    assert_eq!(report.frames, 100);
    assert_eq!(report.events_recorded, 1);

    let raw = std::fs::read_to_string(&metadata_path).expect("metadata written");
    let records: Vec<EventRecord> = serde_json::from_str(&raw).expect("valid metadata");
    assert_eq!(records.len(), 1);

    let record = &records[0];
    assert_eq!(record.event_id, 1);
    // The square appears at frame 10 (t=1.0s).
    assert!((0.9..=1.3).contains(&record.start_time), "start {}", record.start_time);
    assert!(record.duration >= 0.5);
    assert_ne!(record.primary_label, "unknown");
    assert!(record.primary_confidence > 0.0);

    let clip_path = record.clip_path.as_ref().expect("clip attached");
    assert!(clip_path.exists(), "clip file exists");
    let clip_bytes = std::fs::read(clip_path).expect("read clip");
    assert_eq!(&clip_bytes[..2], &[0xFF, 0xD8]);
}
