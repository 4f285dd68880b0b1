//! Error types for the danfex-core library.

use thiserror::Error;

/// Main error type for the danfex library.
#[derive(Error, Debug)]
pub enum DanfexError {
    /// Detection fusion error.
    #[error("fusion error: {0}")]
    Fusion(#[from] FusionError),

    /// Field extraction error.
    #[error("extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Errors related to detection fusion.
///
/// Malformed detections are rejected at ingestion; fusion never coerces
/// an invalid bounding box or an out-of-range confidence.
#[derive(Error, Debug)]
pub enum FusionError {
    /// The bounding box is degenerate or inverted.
    #[error("invalid bounding box ({x_min}, {y_min}, {x_max}, {y_max}): x_max must exceed x_min and y_max must exceed y_min")]
    InvalidBoundingBox {
        x_min: f32,
        y_min: f32,
        x_max: f32,
        y_max: f32,
    },

    /// The engine-reported confidence is outside [0, 1].
    #[error("confidence {0} outside [0, 1]")]
    ConfidenceOutOfRange(f32),

    /// A detection carried no recognized text.
    #[error("detection has empty text")]
    EmptyText,
}

/// Errors related to structured field extraction.
///
/// Checksum failures are NOT errors (they surface as `is_valid = false`
/// on the field); these variants cover programmatic misuse only.
#[derive(Error, Debug)]
pub enum ExtractionError {
    /// Field validation failed.
    #[error("validation failed for {field}: {reason}")]
    Validation { field: String, reason: String },

    /// Failed to parse a value.
    #[error("failed to parse {field}: {value}")]
    Parse { field: String, value: String },
}

/// Result type for the danfex library.
pub type Result<T> = std::result::Result<T, DanfexError>;
