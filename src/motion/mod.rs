//! Per-frame motion signal.
//!
//! `MotionDetector` wraps a [`MotionBackend`] (the background-subtraction
//! primitive) and turns its raw foreground blobs into a [`MotionFrame`]:
//! an area filter drops speckle contours, presence is decided on the
//! surviving raw boxes, and only then are the boxes consolidated into ROIs.

mod backend;
mod backends;
mod result;

use anyhow::Result;

pub use backend::{ForegroundBlob, MotionBackend};
pub use backends::{FrameDiffBackend, FrameDiffConfig};
pub use result::MotionFrame;

use crate::frame::Frame;
use crate::roi::consolidate_boxes;

/// Wraps a motion backend with area filtering and ROI consolidation.
pub struct MotionDetector {
    backend: Box<dyn MotionBackend>,
    min_area: f64,
    roi_expand: u32,
}

impl MotionDetector {
    pub fn new(backend: Box<dyn MotionBackend>, min_area: f64, roi_expand: u32) -> Self {
        Self {
            backend,
            min_area,
            roi_expand,
        }
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    /// Process one frame and produce its motion signal.
    pub fn observe(&mut self, frame: &Frame) -> Result<MotionFrame> {
        let blobs = self.backend.apply(frame)?;

        let raw_boxes: Vec<_> = blobs
            .iter()
            .filter(|blob| blob.area >= self.min_area)
            .map(|blob| blob.bbox)
            .collect();

        // Presence is decided on the raw filtered boxes; consolidation only
        // reshapes the ROI list.
        let motion_present = !raw_boxes.is_empty();
        let rois = consolidate_boxes(&raw_boxes, self.roi_expand);

        if motion_present {
            log::debug!(
                "motion: {} raw box(es) -> {} roi(s)",
                raw_boxes.len(),
                rois.len()
            );
        }

        Ok(MotionFrame {
            motion_present,
            rois,
        })
    }
}
