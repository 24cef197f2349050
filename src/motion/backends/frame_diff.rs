use anyhow::Result;

use crate::frame::Frame;
use crate::motion::backend::{ForegroundBlob, MotionBackend};
use crate::roi::BoundingBox;

/// Tuning for the block frame-diff backend.
#[derive(Clone, Copy, Debug)]
pub struct FrameDiffConfig {
    /// Side length of the square comparison blocks, in pixels.
    pub block_size: u32,
    /// Minimum absolute luma delta for a block to count as foreground.
    pub diff_threshold: f32,
    /// Exponential decay rate of the rolling background estimate.
    pub background_alpha: f32,
}

impl Default for FrameDiffConfig {
    fn default() -> Self {
        Self {
            block_size: 16,
            diff_threshold: 25.0,
            background_alpha: 0.05,
        }
    }
}

/// Block-based frame differencing against a rolling background estimate.
///
/// The frame is divided into fixed-size blocks; each block's mean luma is
/// compared against an exponentially decaying per-block background value.
/// Foreground blocks are grouped into 4-connected components, each reported
/// as one blob. The first frame only seeds the background and reports
/// nothing.
pub struct FrameDiffBackend {
    config: FrameDiffConfig,
    background: Vec<f32>,
    cols: u32,
    rows: u32,
    frame_width: u32,
    frame_height: u32,
    warmed_up: bool,
}

impl FrameDiffBackend {
    pub fn new(config: FrameDiffConfig) -> Self {
        Self {
            config,
            background: Vec::new(),
            cols: 0,
            rows: 0,
            frame_width: 0,
            frame_height: 0,
            warmed_up: false,
        }
    }

    fn reset_for(&mut self, frame: &Frame) {
        let bs = self.config.block_size.max(1);
        self.cols = frame.width.div_ceil(bs);
        self.rows = frame.height.div_ceil(bs);
        self.background = vec![0.0; (self.cols * self.rows) as usize];
        self.frame_width = frame.width;
        self.frame_height = frame.height;
        self.warmed_up = false;
    }

    fn block_bounds(&self, col: u32, row: u32) -> BoundingBox {
        let bs = self.config.block_size.max(1);
        let x = col * bs;
        let y = row * bs;
        BoundingBox::new(
            x,
            y,
            bs.min(self.frame_width - x),
            bs.min(self.frame_height - y),
        )
    }

    /// Group foreground blocks into 4-connected components and return one
    /// blob per component.
    fn blobs_from_mask(&self, mask: &[bool]) -> Vec<ForegroundBlob> {
        let mut visited = vec![false; mask.len()];
        let mut blobs = Vec::new();
        let mut stack = Vec::new();

        for start in 0..mask.len() {
            if !mask[start] || visited[start] {
                continue;
            }
            visited[start] = true;
            stack.push(start);

            let mut bbox: Option<BoundingBox> = None;
            let mut area = 0.0f64;

            while let Some(idx) = stack.pop() {
                let col = (idx as u32) % self.cols;
                let row = (idx as u32) / self.cols;
                let block = self.block_bounds(col, row);
                area += block.area() as f64;
                bbox = Some(match bbox {
                    Some(acc) => crate::roi::merge_boxes(&acc, &block),
                    None => block,
                });

                let mut push = |c: u32, r: u32| {
                    let n = (r * self.cols + c) as usize;
                    if mask[n] && !visited[n] {
                        visited[n] = true;
                        stack.push(n);
                    }
                };
                if col > 0 {
                    push(col - 1, row);
                }
                if col + 1 < self.cols {
                    push(col + 1, row);
                }
                if row > 0 {
                    push(col, row - 1);
                }
                if row + 1 < self.rows {
                    push(col, row + 1);
                }
            }

            if let Some(bbox) = bbox {
                blobs.push(ForegroundBlob { bbox, area });
            }
        }

        blobs
    }
}

impl MotionBackend for FrameDiffBackend {
    fn name(&self) -> &'static str {
        "frame-diff"
    }

    fn apply(&mut self, frame: &Frame) -> Result<Vec<ForegroundBlob>> {
        if frame.width != self.frame_width || frame.height != self.frame_height {
            self.reset_for(frame);
        }

        let alpha = self.config.background_alpha;
        let mut mask = vec![false; self.background.len()];

        for row in 0..self.rows {
            for col in 0..self.cols {
                let idx = (row * self.cols + col) as usize;
                let mean = frame.mean_luma(&self.block_bounds(col, row));
                if self.warmed_up {
                    if (mean - self.background[idx]).abs() > self.config.diff_threshold {
                        mask[idx] = true;
                    }
                    self.background[idx] = (1.0 - alpha) * self.background[idx] + alpha * mean;
                } else {
                    self.background[idx] = mean;
                }
            }
        }

        if !self.warmed_up {
            self.warmed_up = true;
            return Ok(Vec::new());
        }

        Ok(self.blobs_from_mask(&mask))
    }
}
