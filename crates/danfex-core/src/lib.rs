//! Core library for Brazilian invoice (DANFE / NF-e) OCR fusion.
//!
//! This crate provides:
//! - Multi-engine detection fusion (spatial clustering, weighted voting,
//!   consensus boosting)
//! - OCR text normalization with gated look-alike correction
//! - DANFE field extraction (access key, CNPJ/CPF, dates, amounts) with
//!   check-digit validation
//! - Blended document and per-field confidence scoring

pub mod error;
pub mod extract;
pub mod fusion;
pub mod models;
pub mod normalize;
pub mod pipeline;
pub mod scoring;

pub use error::{DanfexError, ExtractionError, FusionError, Result};
pub use extract::DocumentExtractor;
pub use fusion::{
    BoundingBox, Detection, DetectionFuser, FusedDetection, SpatialMatcher, DEFAULT_IOU_THRESHOLD,
};
pub use models::config::{EngineWeights, ExtractionConfig, FusionConfig, PipelineConfig};
pub use models::record::{DocumentRecord, ExtractedField, FieldName, FieldValue, FIELD_COUNT};
pub use normalize::TextNormalizer;
pub use pipeline::{fuse_and_extract, PageDetections};
pub use scoring::ConfidenceScorer;
