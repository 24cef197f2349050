mod frame_diff;

pub use frame_diff::{FrameDiffBackend, FrameDiffConfig};
