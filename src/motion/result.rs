use crate::roi::BoundingBox;

/// Per-frame output of the motion stage.
///
/// Produced once per input frame and not retained beyond it. `motion_present`
/// is computed on the raw area-filtered boxes BEFORE consolidation, so ROI
/// merging can never change presence, only region shape and count.
#[derive(Clone, Debug)]
pub struct MotionFrame {
    pub motion_present: bool,
    pub rois: Vec<BoundingBox>,
}

impl MotionFrame {
    pub fn quiet() -> Self {
        Self {
            motion_present: false,
            rois: Vec::new(),
        }
    }
}
