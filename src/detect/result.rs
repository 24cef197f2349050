use crate::roi::BoundingBox;

/// One labeled detection inside a frame region.
///
/// `bbox` is in full-frame pixel coordinates (region offsets already applied
/// by the backend).
#[derive(Clone, Debug)]
pub struct Detection {
    pub label: String,
    pub confidence: f32,
    pub bbox: BoundingBox,
}
