//! Event segmentation, label aggregation, and metadata persistence.

mod labels;
mod segmenter;
mod sink;

pub use labels::{LabelSummary, LabelTally};
pub use segmenter::{EventRecord, EventSegmenter, EventSignal};
pub use sink::{EventSink, InMemorySink, JsonFileSink};
