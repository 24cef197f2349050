//! Motion region consolidation.
//!
//! Raw per-contour boxes from the motion primitive are noisy: a single moving
//! object often produces several fragments. `consolidate_boxes` merges
//! overlapping (or near-overlapping, within an `expand` tolerance) boxes into
//! a small set of regions of interest.
//!
//! The clustering is greedy and single-pass per box: each input box is tested
//! against the accumulator in order and merged into the first overlapping
//! entry found. The result is NOT iterated to a fixed point, so a chain of
//! three mutually overlapping boxes processed in an unfavorable order can stay
//! under-merged by one step. Downstream consumers rely on this exact behavior;
//! do not "fix" it by iterating.

use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle in pixel coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl BoundingBox {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// Grow by `pad` pixels on all four sides, then clip to frame bounds.
    ///
    /// Padding can legitimately push a region past the frame edges; the
    /// result is clamped, never rejected.
    pub fn padded_within(&self, pad: u32, frame_width: u32, frame_height: u32) -> Self {
        let x0 = self.x.saturating_sub(pad);
        let y0 = self.y.saturating_sub(pad);
        let x1 = (self.x.saturating_add(self.width).saturating_add(pad)).min(frame_width);
        let y1 = (self.y.saturating_add(self.height).saturating_add(pad)).min(frame_height);
        Self {
            x: x0.min(frame_width),
            y: y0.min(frame_height),
            width: x1.saturating_sub(x0.min(frame_width)),
            height: y1.saturating_sub(y0.min(frame_height)),
        }
    }

    /// Clip to frame bounds without padding.
    pub fn clamped_to(&self, frame_width: u32, frame_height: u32) -> Self {
        self.padded_within(0, frame_width, frame_height)
    }
}

/// Overlap test between `a` expanded by `expand` on all four sides and `b`.
///
/// Separating-axis test on the four half-planes; touching edges count as
/// overlapping. Only `a` is expanded.
pub fn boxes_overlap(a: &BoundingBox, b: &BoundingBox, expand: u32) -> bool {
    let e = expand as i64;
    let ax0 = a.x as i64 - e;
    let ay0 = a.y as i64 - e;
    let ax1 = a.x as i64 + a.width as i64 + e;
    let ay1 = a.y as i64 + a.height as i64 + e;

    let bx0 = b.x as i64;
    let by0 = b.y as i64;
    let bx1 = b.x as i64 + b.width as i64;
    let by1 = b.y as i64 + b.height as i64;

    !(ax1 < bx0 || bx1 < ax0 || ay1 < by0 || by1 < ay0)
}

/// Axis-aligned bounding union of two boxes.
pub fn merge_boxes(a: &BoundingBox, b: &BoundingBox) -> BoundingBox {
    let x = a.x.min(b.x);
    let y = a.y.min(b.y);
    let x1 = (a.x + a.width).max(b.x + b.width);
    let y1 = (a.y + a.height).max(b.y + b.height);
    BoundingBox {
        x,
        y,
        width: x1 - x,
        height: y1 - y,
    }
}

/// Greedy incremental clustering of raw boxes into consolidated regions.
///
/// Each input box (in input order) merges into the first accumulator entry it
/// overlaps (with `expand` tolerance) and scanning stops there; otherwise it
/// is appended unchanged. Output order is the insertion order of the
/// first-seen merge group. O(n^2) over the per-frame contour count.
pub fn consolidate_boxes(boxes: &[BoundingBox], expand: u32) -> Vec<BoundingBox> {
    let mut merged: Vec<BoundingBox> = Vec::with_capacity(boxes.len());

    for bbox in boxes {
        let mut has_merged = false;
        for entry in merged.iter_mut() {
            if boxes_overlap(bbox, entry, expand) {
                *entry = merge_boxes(bbox, entry);
                has_merged = true;
                break;
            }
        }
        if !has_merged {
            merged.push(*bbox);
        }
    }

    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn consolidate_merges_overlapping_boxes() {
        let b1 = BoundingBox::new(10, 10, 20, 20);
        let b2 = BoundingBox::new(25, 15, 20, 20);

        let merged = consolidate_boxes(&[b1, b2], 5);

        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0], BoundingBox::new(10, 10, 35, 25));
    }

    #[test]
    fn consolidate_merge_is_order_independent_for_two_boxes() {
        let b1 = BoundingBox::new(10, 10, 20, 20);
        let b2 = BoundingBox::new(25, 15, 20, 20);

        let forward = consolidate_boxes(&[b1, b2], 5);
        let reverse = consolidate_boxes(&[b2, b1], 5);

        assert_eq!(forward.len(), 1);
        assert_eq!(reverse.len(), 1);
        assert_eq!(forward[0], reverse[0]);
    }

    #[test]
    fn consolidate_keeps_separate_non_overlapping() {
        let b1 = BoundingBox::new(0, 0, 10, 10);
        let b2 = BoundingBox::new(50, 50, 10, 10);

        let merged = consolidate_boxes(&[b1, b2], 5);

        assert_eq!(merged, vec![b1, b2]);
    }

    #[test]
    fn consolidate_preserves_input_order_of_groups() {
        let b1 = BoundingBox::new(200, 200, 10, 10);
        let b2 = BoundingBox::new(0, 0, 10, 10);
        let b3 = BoundingBox::new(205, 205, 10, 10); // merges into b1's group

        let merged = consolidate_boxes(&[b1, b2, b3], 0);

        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0], merge_boxes(&b3, &b1));
        assert_eq!(merged[1], b2);
    }

    #[test]
    fn consolidate_is_single_pass_not_fixed_point() {
        // a and c do not overlap each other; b bridges both. Processing
        // [a, c, b] merges b into a's entry and stops, leaving c separate.
        // This under-merge is load-bearing behavior.
        let a = BoundingBox::new(0, 0, 10, 10);
        let c = BoundingBox::new(30, 0, 10, 10);
        let b = BoundingBox::new(12, 0, 16, 10);

        let merged = consolidate_boxes(&[a, c, b], 0);

        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0], merge_boxes(&b, &a));
        assert_eq!(merged[1], c);
    }

    #[test]
    fn touching_edges_count_as_overlap() {
        let a = BoundingBox::new(0, 0, 10, 10);
        let b = BoundingBox::new(10, 0, 10, 10);

        assert!(boxes_overlap(&a, &b, 0));
        assert_eq!(consolidate_boxes(&[a, b], 0).len(), 1);
    }

    #[test]
    fn expand_only_widens_the_overlap_test() {
        let a = BoundingBox::new(0, 0, 10, 10);
        let b = BoundingBox::new(14, 0, 10, 10);

        assert!(!boxes_overlap(&a, &b, 0));
        assert!(boxes_overlap(&a, &b, 4));

        // The merged output is the union of the raw boxes, not the
        // expanded ones.
        let merged = consolidate_boxes(&[a, b], 4);
        assert_eq!(merged, vec![BoundingBox::new(0, 0, 24, 10)]);
    }

    #[test]
    fn expand_near_origin_does_not_underflow() {
        let a = BoundingBox::new(1, 1, 5, 5);
        let b = BoundingBox::new(100, 100, 5, 5);

        assert!(!boxes_overlap(&a, &b, 50));
    }

    #[test]
    fn padded_within_clamps_to_frame_bounds() {
        let b = BoundingBox::new(5, 5, 20, 20);

        let padded = b.padded_within(10, 100, 100);
        assert_eq!(padded, BoundingBox::new(0, 0, 35, 35));

        let near_edge = BoundingBox::new(90, 90, 20, 20);
        let padded = near_edge.padded_within(10, 100, 100);
        assert_eq!(padded, BoundingBox::new(80, 80, 20, 20));
    }

    #[test]
    fn clamp_handles_region_fully_outside_frame() {
        let b = BoundingBox::new(200, 200, 20, 20);
        let clamped = b.clamped_to(100, 100);
        assert_eq!(clamped.width, 0);
        assert_eq!(clamped.height, 0);
    }
}
