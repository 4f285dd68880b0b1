//! Multi-engine detection fusion.
//!
//! Each OCR engine reports its own text detections with bounding boxes
//! and confidences on its own scale. This module merges them into a
//! single reading-order list, resolving spatial overlaps by weighted
//! voting with a consensus boost when engines agree.

mod fuser;
mod matcher;

pub use fuser::DetectionFuser;
pub use matcher::{SpatialMatcher, DEFAULT_IOU_THRESHOLD};

use serde::{Deserialize, Serialize};

use crate::error::FusionError;

/// Axis-aligned rectangle in image coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x_min: f32,
    pub y_min: f32,
    pub x_max: f32,
    pub y_max: f32,
}

impl BoundingBox {
    pub fn new(x_min: f32, y_min: f32, x_max: f32, y_max: f32) -> Self {
        Self {
            x_min,
            y_min,
            x_max,
            y_max,
        }
    }

    pub fn width(&self) -> f32 {
        self.x_max - self.x_min
    }

    pub fn height(&self) -> f32 {
        self.y_max - self.y_min
    }

    pub fn area(&self) -> f32 {
        self.width() * self.height()
    }

    /// A box is valid when it has strictly positive extent on both axes.
    pub fn is_valid(&self) -> bool {
        self.x_max > self.x_min && self.y_max > self.y_min
    }
}

/// One engine's claim about one text region. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    /// Recognized text content.
    pub text: String,

    /// Bounding box of the text span.
    pub bbox: BoundingBox,

    /// Engine-reported confidence in [0, 1].
    pub confidence: f32,

    /// Identifier of the source engine.
    pub engine: String,
}

impl Detection {
    /// Create a detection, rejecting malformed input at ingestion.
    pub fn new(
        text: impl Into<String>,
        bbox: BoundingBox,
        confidence: f32,
        engine: impl Into<String>,
    ) -> Result<Self, FusionError> {
        let detection = Self {
            text: text.into(),
            bbox,
            confidence,
            engine: engine.into(),
        };
        detection.validate()?;
        Ok(detection)
    }

    /// Check the invariants a well-formed detection must satisfy.
    pub fn validate(&self) -> Result<(), FusionError> {
        if !self.bbox.is_valid() {
            return Err(FusionError::InvalidBoundingBox {
                x_min: self.bbox.x_min,
                y_min: self.bbox.y_min,
                x_max: self.bbox.x_max,
                y_max: self.bbox.y_max,
            });
        }
        if !(0.0..=1.0).contains(&self.confidence) {
            return Err(FusionError::ConfidenceOutOfRange(self.confidence));
        }
        if self.text.trim().is_empty() {
            return Err(FusionError::EmptyText);
        }
        Ok(())
    }
}

/// Result of resolving one fusion region to a single detection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FusedDetection {
    /// Winning text for the region.
    pub text: String,

    /// Representative bounding box (the region seed's).
    pub bbox: BoundingBox,

    /// Adjusted confidence after weighted voting and consensus boost.
    pub confidence: f32,

    /// Number of distinct engines that agreed on the winning text.
    pub engines_agreed: usize,
}
