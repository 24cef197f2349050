use anyhow::Result;
use sha2::{Digest, Sha256};

use crate::detect::backend::DetectorBackend;
use crate::detect::result::Detection;
use crate::frame::Frame;
use crate::roi::BoundingBox;

const STUB_LABELS: [&str; 4] = ["person", "car", "dog", "bicycle"];

/// Stub backend for testing and model-less deployments.
///
/// Emits one detection per region, labeled deterministically from a hash of
/// the region's pixels, so the same content always yields the same label.
pub struct StubBackend {
    confidence_threshold: f32,
}

impl StubBackend {
    pub fn new(confidence_threshold: f32) -> Self {
        Self {
            confidence_threshold,
        }
    }
}

impl Default for StubBackend {
    fn default() -> Self {
        Self::new(0.5)
    }
}

impl DetectorBackend for StubBackend {
    fn name(&self) -> &'static str {
        "stub"
    }

    fn detect_regions(&mut self, frame: &Frame, rois: &[BoundingBox]) -> Result<Vec<Detection>> {
        let mut detections = Vec::with_capacity(rois.len());

        for roi in rois {
            let crop = frame.crop(roi);
            if crop.data.is_empty() {
                continue;
            }
            let digest: [u8; 32] = Sha256::digest(&crop.data).into();
            let label = STUB_LABELS[digest[0] as usize % STUB_LABELS.len()];
            let confidence = 0.5 + digest[1] as f32 / 512.0;

            if confidence < self.confidence_threshold {
                continue;
            }

            detections.push(Detection {
                label: label.to_string(),
                confidence,
                bbox: roi.clamped_to(frame.width, frame.height),
            });
        }

        Ok(detections)
    }
}
