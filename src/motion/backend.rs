use anyhow::Result;

use crate::frame::Frame;
use crate::roi::BoundingBox;

/// A raw foreground region reported by a motion backend, before any area
/// filtering or consolidation.
#[derive(Clone, Copy, Debug)]
pub struct ForegroundBlob {
    pub bbox: BoundingBox,
    /// Foreground area in pixels. May be coarser than the bbox area when the
    /// backend works on blocks.
    pub area: f64,
}

/// Background-subtraction backend trait.
///
/// Backends are stateful across calls: they maintain a rolling background
/// estimate and report the regions of the current frame that differ from it.
/// Implementations must treat the frame as read-only and must not retain it
/// beyond the call.
pub trait MotionBackend: Send {
    /// Backend identifier.
    fn name(&self) -> &'static str;

    /// Advance the background model with `frame` and return the raw
    /// foreground regions observed in it.
    fn apply(&mut self, frame: &Frame) -> Result<Vec<ForegroundBlob>>;
}
