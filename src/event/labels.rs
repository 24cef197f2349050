use std::collections::BTreeMap;

/// Insertion-ordered frequency table of observed labels.
///
/// Scoped to one event: the segmenter clears it on every event start. Ties in
/// `summarize` break toward the first-inserted label, so aggregation is
/// deterministic for a given observation order.
#[derive(Clone, Debug, Default)]
pub struct LabelTally {
    counts: Vec<(String, u64)>,
}

/// Aggregated label summary for a closed event.
#[derive(Clone, Debug, PartialEq)]
pub struct LabelSummary {
    pub primary_label: String,
    /// Share of all observations held by the primary label, full precision.
    pub primary_confidence: f64,
    pub distribution: BTreeMap<String, u64>,
}

impl LabelTally {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn clear(&mut self) {
        self.counts.clear();
    }

    pub fn add(&mut self, label: &str) {
        if let Some(entry) = self.counts.iter_mut().find(|(name, _)| name == label) {
            entry.1 += 1;
        } else {
            self.counts.push((label.to_string(), 1));
        }
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().map(|(_, count)| count).sum()
    }

    pub fn summarize(&self) -> LabelSummary {
        let total = self.total();
        if total == 0 {
            return LabelSummary {
                primary_label: "unknown".to_string(),
                primary_confidence: 0.0,
                distribution: BTreeMap::new(),
            };
        }

        // Strictly-greater comparison in insertion order: first-inserted
        // label wins ties.
        let mut primary = &self.counts[0];
        for entry in &self.counts[1..] {
            if entry.1 > primary.1 {
                primary = entry;
            }
        }

        LabelSummary {
            primary_label: primary.0.clone(),
            primary_confidence: primary.1 as f64 / total as f64,
            distribution: self
                .counts
                .iter()
                .map(|(name, count)| (name.clone(), *count))
                .collect(),
        }
    }
}
