//! Event segmentation state machine.
//!
//! Converts the per-frame boolean motion signal into debounced event
//! boundaries. Two states, Idle and Active; a gap in motion shorter than
//! `inactivity_timeout` stays inside the running event, a longer one closes
//! it. Events shorter than `min_event_duration` are closed but discarded:
//! the caller still gets `Ended` (so it can release the clip writer) with no
//! record attached.
//!
//! `update` must be called once per frame with non-decreasing timestamps.
//! A regressing timestamp is clamped to the last one seen rather than being
//! allowed to corrupt the event's motion bookkeeping.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::event::labels::LabelTally;

/// Result of advancing the state machine by one frame.
#[derive(Debug)]
pub enum EventSignal {
    None,
    Started,
    /// The event closed. A record is attached only when the event survived
    /// the minimum-duration filter; a discarded short event carries `None`.
    Ended(Option<EventRecord>),
}

/// Immutable result of a closed, non-discarded event.
///
/// `clip_path` is `None` at close time; the orchestrator attaches it exactly
/// once, after the clip writer releases the file.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EventRecord {
    pub event_id: u64,
    pub start_time: f64,
    pub end_time: f64,
    pub duration: f64,
    pub primary_label: String,
    pub primary_confidence: f64,
    pub label_distribution: BTreeMap<String, u64>,
    pub clip_path: Option<PathBuf>,
}

impl EventRecord {
    pub fn attach_clip(&mut self, path: PathBuf) {
        debug_assert!(self.clip_path.is_none(), "clip_path is attached once");
        self.clip_path = Some(path);
    }
}

struct ActiveEvent {
    event_id: u64,
    start_time: f64,
    last_motion_time: f64,
    labels: LabelTally,
}

/// Two-state (Idle/Active) segmenter with inactivity hysteresis and a
/// minimum-duration filter. One instance serves one stream; `event_count`
/// increments on every start and is never reused, so discarded events leave
/// gaps in the persisted id sequence.
pub struct EventSegmenter {
    inactivity_timeout: f64,
    min_event_duration: f64,
    event_count: u64,
    active: Option<ActiveEvent>,
    last_timestamp: Option<f64>,
}

impl EventSegmenter {
    pub fn new(inactivity_timeout: f64, min_event_duration: f64) -> Self {
        Self {
            inactivity_timeout,
            min_event_duration,
            event_count: 0,
            active: None,
            last_timestamp: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    /// Id of the most recently started event; 0 before the first start.
    pub fn last_event_id(&self) -> u64 {
        self.event_count
    }

    /// Advance the machine by one frame.
    pub fn update(&mut self, motion_present: bool, timestamp: f64) -> EventSignal {
        let timestamp = self.clamp_timestamp(timestamp);

        if motion_present {
            if let Some(event) = &mut self.active {
                event.last_motion_time = timestamp;
                return EventSignal::None;
            }
            self.start_event(timestamp);
            return EventSignal::Started;
        }

        let timed_out = match &self.active {
            Some(event) => timestamp - event.last_motion_time >= self.inactivity_timeout,
            None => return EventSignal::None,
        };

        if timed_out {
            EventSignal::Ended(self.end_event(timestamp))
        } else {
            // Gap inside one event.
            EventSignal::None
        }
    }

    /// Accumulate detector labels into the open event. No-op while Idle.
    pub fn add_observations(&mut self, labels: &[String]) {
        match &mut self.active {
            Some(event) => {
                for label in labels {
                    event.labels.add(label);
                }
            }
            None => {
                if !labels.is_empty() {
                    log::debug!("dropping {} observation(s) with no open event", labels.len());
                }
            }
        }
    }

    /// Force-close at end of stream, using the last observed timestamp as
    /// the close time. The minimum-duration filter still applies.
    pub fn finish(&mut self, timestamp: f64) -> Option<EventRecord> {
        if self.active.is_none() {
            return None;
        }
        let timestamp = self.clamp_timestamp(timestamp);
        self.end_event(timestamp)
    }

    fn clamp_timestamp(&mut self, timestamp: f64) -> f64 {
        let timestamp = match self.last_timestamp {
            Some(last) if timestamp < last => {
                log::warn!(
                    "timestamp went backwards ({:.3}s after {:.3}s); clamping",
                    timestamp,
                    last
                );
                last
            }
            _ => timestamp,
        };
        self.last_timestamp = Some(timestamp);
        timestamp
    }

    fn start_event(&mut self, timestamp: f64) {
        self.event_count += 1;
        self.active = Some(ActiveEvent {
            event_id: self.event_count,
            start_time: timestamp,
            last_motion_time: timestamp,
            labels: LabelTally::new(),
        });
        log::info!("[EVENT {}] START at {:.2}s", self.event_count, timestamp);
    }

    fn end_event(&mut self, timestamp: f64) -> Option<EventRecord> {
        let event = self.active.take()?;
        let duration = timestamp - event.start_time;

        if duration < self.min_event_duration {
            log::info!(
                "[EVENT {}] DISCARDED (duration={:.2}s)",
                event.event_id,
                duration
            );
            return None;
        }

        log::info!(
            "[EVENT {}] END at {:.2}s (duration={:.2}s)",
            event.event_id,
            timestamp,
            duration
        );

        let summary = event.labels.summarize();
        Some(EventRecord {
            event_id: event.event_id,
            start_time: event.start_time,
            end_time: timestamp,
            duration,
            primary_label: summary.primary_label,
            // Full precision internally; two decimals in the record.
            primary_confidence: (summary.primary_confidence * 100.0).round() / 100.0,
            label_distribution: summary.distribution,
            clip_path: None,
        })
    }
}
