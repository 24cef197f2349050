//! Object-detection seam.
//!
//! The pipeline samples an object detector on the motion ROIs of active
//! events. The detector itself is a pluggable backend behind
//! [`DetectorBackend`]; this module also owns the region preparation shared
//! by all backends: each ROI is padded by a configured margin (context helps
//! classifiers) and clamped to the frame bounds.

mod backend;
mod backends;
mod registry;
mod result;

pub use backend::DetectorBackend;
pub use backends::StubBackend;
pub use registry::BackendRegistry;
pub use result::Detection;

use crate::roi::BoundingBox;

/// Pad each ROI by `padding` pixels and clamp it to the frame, dropping
/// regions that degenerate to zero size.
pub fn prepare_regions(
    rois: &[BoundingBox],
    padding: u32,
    frame_width: u32,
    frame_height: u32,
) -> Vec<BoundingBox> {
    rois.iter()
        .map(|roi| roi.padded_within(padding, frame_width, frame_height))
        .filter(|roi| roi.width > 0 && roi.height > 0)
        .collect()
}
