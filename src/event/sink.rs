//! Event metadata persistence.
//!
//! Records are buffered in memory for the lifetime of the run and persisted
//! as one ordered JSON array on `save()`. Durability beyond that single
//! write is out of scope.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Context, Result};

use crate::event::segmenter::EventRecord;

pub trait EventSink: Send {
    /// Buffer a closed event's record.
    fn add(&mut self, record: EventRecord);

    /// Persist everything buffered so far.
    fn save(&mut self) -> Result<()>;
}

/// File-backed sink writing a pretty-printed JSON array at save time.
pub struct JsonFileSink {
    output_path: PathBuf,
    records: Vec<EventRecord>,
}

impl JsonFileSink {
    pub fn new(output_path: impl Into<PathBuf>) -> Self {
        Self {
            output_path: output_path.into(),
            records: Vec::new(),
        }
    }

    pub fn output_path(&self) -> &Path {
        &self.output_path
    }
}

impl EventSink for JsonFileSink {
    fn add(&mut self, record: EventRecord) {
        self.records.push(record);
    }

    fn save(&mut self) -> Result<()> {
        if let Some(parent) = self.output_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("failed to create metadata directory {}", parent.display())
                })?;
            }
        }
        let json = serde_json::to_string_pretty(&self.records)?;
        std::fs::write(&self.output_path, json).with_context(|| {
            format!(
                "failed to write event metadata to {}",
                self.output_path.display()
            )
        })?;
        log::info!(
            "wrote {} event record(s) to {}",
            self.records.len(),
            self.output_path.display()
        );
        Ok(())
    }
}

/// In-memory sink for tests. Cloning shares the underlying record buffer, so
/// a test can keep a handle while the pipeline owns the sink.
#[derive(Clone, Default)]
pub struct InMemorySink {
    records: Arc<Mutex<Vec<EventRecord>>>,
}

impl InMemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<EventRecord> {
        self.records.lock().expect("sink lock poisoned").clone()
    }
}

impl EventSink for InMemorySink {
    fn add(&mut self, record: EventRecord) {
        self.records
            .lock()
            .expect("sink lock poisoned")
            .push(record);
    }

    fn save(&mut self) -> Result<()> {
        self.records
            .lock()
            .map_err(|_| anyhow!("sink lock poisoned"))?;
        Ok(())
    }
}
