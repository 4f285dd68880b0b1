//! Configuration structures for the fusion and extraction pipeline.
//!
//! All tunables are explicit, caller-supplied values. Nothing in the core
//! reads the environment or keeps process-wide mutable state.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Engine identifier for EasyOCR detections.
pub const ENGINE_EASYOCR: &str = "easyocr";
/// Engine identifier for PaddleOCR detections.
pub const ENGINE_PADDLEOCR: &str = "paddleocr";
/// Engine identifier for Tesseract detections.
pub const ENGINE_TESSERACT: &str = "tesseract";

/// Main configuration for the danfex pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Detection fusion configuration.
    pub fusion: FusionConfig,

    /// Field extraction configuration.
    pub extraction: ExtractionConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            fusion: FusionConfig::default(),
            extraction: ExtractionConfig::default(),
        }
    }
}

/// Detection fusion configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FusionConfig {
    /// Per-engine trust weights.
    pub engine_weights: EngineWeights,

    /// IoU above which two boxes denote the same text span.
    pub iou_threshold: f32,

    /// Confidence added when >= 2 engines agree on a region's text.
    pub consensus_bonus: f32,

    /// Minimum fused confidence for inclusion in the document-level
    /// OCR confidence average.
    pub acceptance_threshold: f32,

    /// Weight applied to detections from engines absent from
    /// `engine_weights`. Such detections are kept, never dropped.
    pub fallback_weight: f32,
}

impl Default for FusionConfig {
    fn default() -> Self {
        Self {
            engine_weights: EngineWeights::default(),
            iou_threshold: 0.3,
            consensus_bonus: 0.1,
            acceptance_threshold: 0.5,
            fallback_weight: 0.3,
        }
    }
}

/// Static mapping from engine identifier to trust weight in (0, 1].
///
/// Fixed at startup and read-only thereafter; the weights need not sum
/// to 1 because they are only used as score multipliers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EngineWeights(BTreeMap<String, f32>);

impl Default for EngineWeights {
    fn default() -> Self {
        let mut weights = BTreeMap::new();
        weights.insert(ENGINE_EASYOCR.to_string(), 0.4);
        weights.insert(ENGINE_PADDLEOCR.to_string(), 0.4);
        weights.insert(ENGINE_TESSERACT.to_string(), 0.2);
        Self(weights)
    }
}

impl EngineWeights {
    /// Create an empty weight table.
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Set the weight for an engine.
    pub fn set(&mut self, engine: impl Into<String>, weight: f32) {
        self.0.insert(engine.into(), weight);
    }

    /// Look up the weight for an engine.
    pub fn get(&self, engine: &str) -> Option<f32> {
        self.0.get(engine).copied()
    }

    /// Iterate over all configured (engine, weight) pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, f32)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Number of configured engines.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no weights are configured.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Field extraction configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Enable CNPJ check-digit validation.
    pub validate_cnpj: bool,

    /// Enable CPF check-digit validation.
    pub validate_cpf: bool,

    /// Enable access-key check-digit validation.
    pub validate_access_key: bool,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            validate_cnpj: true,
            validate_cpf: true,
            validate_access_key: true,
        }
    }
}

impl PipelineConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()))
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()))?;
        std::fs::write(path, content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_weights() {
        let weights = EngineWeights::default();
        assert_eq!(weights.get(ENGINE_EASYOCR), Some(0.4));
        assert_eq!(weights.get(ENGINE_PADDLEOCR), Some(0.4));
        assert_eq!(weights.get(ENGINE_TESSERACT), Some(0.2));
        assert_eq!(weights.get("mystery-engine"), None);
    }

    #[test]
    fn test_config_roundtrip() {
        let config = PipelineConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let back: PipelineConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.fusion.iou_threshold, 0.3);
        assert_eq!(back.fusion.consensus_bonus, 0.1);
        assert_eq!(back.fusion.acceptance_threshold, 0.5);
        assert_eq!(back.fusion.fallback_weight, 0.3);
        assert!(back.extraction.validate_cnpj);
    }
}
