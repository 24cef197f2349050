use anyhow::Result;

use crate::detect::result::Detection;
use crate::frame::Frame;
use crate::roi::BoundingBox;

/// Object-detection backend trait.
///
/// Backends receive the full frame plus the candidate regions for it and
/// return zero or more labeled detections per region. Implementations must
/// treat the frame as read-only and ephemeral; regions handed in may extend
/// past the frame edges and must be clamped, never rejected.
pub trait DetectorBackend: Send {
    /// Backend identifier.
    fn name(&self) -> &'static str;

    /// Run detection on the candidate regions of one frame.
    fn detect_regions(&mut self, frame: &Frame, rois: &[BoundingBox]) -> Result<Vec<Detection>>;

    /// Optional warm-up hook (model loading, device init).
    fn warm_up(&mut self) -> Result<()> {
        Ok(())
    }
}
