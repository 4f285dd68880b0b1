//! Spatial overlap test between detection bounding boxes.

use super::BoundingBox;

/// Default IoU threshold above which two boxes denote the same span.
pub const DEFAULT_IOU_THRESHOLD: f32 = 0.3;

/// Decides whether two detections refer to the same on-page text region.
#[derive(Debug, Clone, Copy)]
pub struct SpatialMatcher {
    iou_threshold: f32,
}

impl SpatialMatcher {
    pub fn new(iou_threshold: f32) -> Self {
        Self { iou_threshold }
    }

    /// Intersection-over-Union of two rectangles, in [0, 1].
    ///
    /// Degenerate rectangles yield 0.
    pub fn iou(&self, a: &BoundingBox, b: &BoundingBox) -> f32 {
        let x1 = a.x_min.max(b.x_min);
        let y1 = a.y_min.max(b.y_min);
        let x2 = a.x_max.min(b.x_max);
        let y2 = a.y_max.min(b.y_max);

        if x2 <= x1 || y2 <= y1 {
            return 0.0;
        }

        let intersection = (x2 - x1) * (y2 - y1);
        let union = a.area() + b.area() - intersection;

        if union > 0.0 { intersection / union } else { 0.0 }
    }

    /// True when IoU strictly exceeds the configured threshold.
    pub fn overlaps(&self, a: &BoundingBox, b: &BoundingBox) -> bool {
        self.iou(a, b) > self.iou_threshold
    }
}

impl Default for SpatialMatcher {
    fn default() -> Self {
        Self::new(DEFAULT_IOU_THRESHOLD)
    }
}
