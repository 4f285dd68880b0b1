//! End-to-end pipeline: fusion, normalization, extraction, scoring.
//!
//! The pipeline is a pure, synchronous computation per document; pages
//! are independent and the only serialization point is concatenating
//! per-page text in page order before extraction.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;
use crate::extract::DocumentExtractor;
use crate::fusion::{Detection, DetectionFuser, FusedDetection};
use crate::models::config::PipelineConfig;
use crate::models::record::DocumentRecord;
use crate::normalize::TextNormalizer;
use crate::scoring::ConfidenceScorer;

/// One page's raw detections, keyed by engine identifier.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PageDetections {
    pub engines: BTreeMap<String, Vec<Detection>>,
}

impl PageDetections {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one engine's detection list for this page.
    pub fn insert(&mut self, engine: impl Into<String>, detections: Vec<Detection>) {
        self.engines.insert(engine.into(), detections);
    }

    /// Iterate over every detection on the page, across engines.
    pub fn detections(&self) -> impl Iterator<Item = &Detection> {
        self.engines.values().flatten()
    }

    pub fn is_empty(&self) -> bool {
        self.engines.values().all(|d| d.is_empty())
    }
}

/// Fuse per-engine detections for each page, normalize and concatenate
/// the page texts in order, extract the structured record and score it.
///
/// Malformed detections are rejected here, before any fusion happens.
/// An empty page contributes nothing but is not an error.
pub fn fuse_and_extract(pages: &[PageDetections], config: &PipelineConfig) -> Result<DocumentRecord> {
    for page in pages {
        for detection in page.detections() {
            detection.validate()?;
        }
    }

    let fuser = DetectionFuser::new(&config.fusion);
    let normalizer = TextNormalizer::new();

    let mut page_texts: Vec<String> = Vec::with_capacity(pages.len());
    let mut accepted_confidences: Vec<f32> = Vec::new();

    for (page_index, page) in pages.iter().enumerate() {
        let detections: Vec<Detection> = page.detections().cloned().collect();
        let fused = fuser.fuse(&detections);

        debug!(
            page = page_index,
            detections = detections.len(),
            fused = fused.len(),
            "fused page detections"
        );

        accepted_confidences.extend(
            fused
                .iter()
                .map(|f| f.confidence)
                .filter(|c| *c >= config.fusion.acceptance_threshold),
        );

        page_texts.push(normalizer.normalize(&page_text(&fused)));
    }

    let full_text = page_texts.join("\n");

    let ocr_confidence_avg = if accepted_confidences.is_empty() {
        0.0
    } else {
        accepted_confidences.iter().sum::<f32>() / accepted_confidences.len() as f32
    };

    let extractor = DocumentExtractor::with_config(config.extraction.clone());
    let record = extractor.extract(&full_text);

    Ok(ConfidenceScorer::new().score(record, ocr_confidence_avg))
}

/// Join a page's fused detections (already in reading order) into text.
fn page_text(fused: &[FusedDetection]) -> String {
    fused
        .iter()
        .map(|f| f.text.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{DanfexError, FusionError};
    use crate::fusion::BoundingBox;
    use crate::models::record::FieldValue;

    fn det(text: &str, y: f32, confidence: f32, engine: &str) -> Detection {
        Detection::new(
            text,
            BoundingBox::new(0.0, y, 400.0, y + 10.0),
            confidence,
            engine,
        )
        .unwrap()
    }

    fn page(detections: Vec<(&str, f32, f32, &str)>) -> PageDetections {
        let mut page = PageDetections::new();
        let mut by_engine: BTreeMap<String, Vec<Detection>> = BTreeMap::new();
        for (text, y, conf, engine) in detections {
            by_engine
                .entry(engine.to_string())
                .or_default()
                .push(det(text, y, conf, engine));
        }
        for (engine, dets) in by_engine {
            page.insert(engine, dets);
        }
        page
    }

    #[test]
    fn test_empty_pages_not_an_error() {
        let record = fuse_and_extract(&[], &PipelineConfig::default()).unwrap();
        assert_eq!(record.present_count(), 0);
        assert_eq!(record.extraction_ratio, 0.0);
        assert_eq!(record.confidence_score, 0.0);

        let record =
            fuse_and_extract(&[PageDetections::new()], &PipelineConfig::default()).unwrap();
        assert_eq!(record.present_count(), 0);
    }

    #[test]
    fn test_malformed_detection_rejected() {
        let mut page = PageDetections::new();
        page.insert(
            "easyocr",
            vec![Detection {
                text: "NF".to_string(),
                bbox: BoundingBox::new(10.0, 0.0, 0.0, 5.0),
                confidence: 0.9,
                engine: "easyocr".to_string(),
            }],
        );

        let result = fuse_and_extract(&[page], &PipelineConfig::default());
        assert!(matches!(
            result,
            Err(DanfexError::Fusion(FusionError::InvalidBoundingBox { .. }))
        ));
    }

    #[test]
    fn test_single_engine_document() {
        let page = page(vec![
            ("Nº: 123456", 0.0, 0.9, "easyocr"),
            ("SÉRIE: 1", 20.0, 0.9, "easyocr"),
            ("DATA DE EMISSÃO: 15/03/2024", 40.0, 0.8, "easyocr"),
            ("CNPJ: 11.222.333/0001-81", 60.0, 0.85, "easyocr"),
        ]);

        let record = fuse_and_extract(&[page], &PipelineConfig::default()).unwrap();

        assert_eq!(
            record.invoice_number.value,
            Some(FieldValue::Text("123456".to_string()))
        );
        assert_eq!(record.series.value, Some(FieldValue::Text("1".to_string())));
        assert!(record.issue_date.present);
        assert!(record.issuer_tax_id.present);
        assert!(record.issuer_tax_id.is_valid);

        // Single-engine fusion passes confidences through unchanged:
        // (0.9 + 0.9 + 0.8 + 0.85) / 4
        assert!((record.ocr_confidence_avg - 0.8625).abs() < 1e-6);
    }

    #[test]
    fn test_multi_engine_agreement_feeds_extraction() {
        let mut page = PageDetections::new();
        page.insert(
            "easyocr",
            vec![det("CNPJ: 11.222.333/0001-81", 0.0, 0.9, "easyocr")],
        );
        page.insert(
            "paddleocr",
            vec![det("CNPJ: 11.222.333/0001-81", 0.0, 0.85, "paddleocr")],
        );

        let record = fuse_and_extract(&[page], &PipelineConfig::default()).unwrap();

        assert!(record.issuer_tax_id.present);
        // 0.9 * 0.4 + 0.85 * 0.4 + 0.1 consensus bonus
        assert!((record.ocr_confidence_avg - 0.8).abs() < 1e-6);
    }

    #[test]
    fn test_page_order_preserved() {
        let page_one = page(vec![("RAZÃO SOCIAL: ACME LTDA", 0.0, 0.9, "easyocr")]);
        let page_two = page(vec![("CNPJ: 11.222.333/0001-81", 0.0, 0.9, "easyocr")]);

        let record = fuse_and_extract(&[page_one, page_two], &PipelineConfig::default()).unwrap();

        // The name window ends at the CNPJ label on the following page.
        assert_eq!(
            record.issuer_name.value,
            Some(FieldValue::Text("ACME LTDA".to_string()))
        );
        assert!(record.issuer_tax_id.present);
    }

    #[test]
    fn test_low_confidence_excluded_from_average_but_not_text() {
        let page = page(vec![
            ("CNPJ: 11.222.333/0001-81", 0.0, 0.9, "easyocr"),
            ("SÉRIE: 7", 20.0, 0.3, "easyocr"),
        ]);

        let record = fuse_and_extract(&[page], &PipelineConfig::default()).unwrap();

        // 0.3 is below the acceptance threshold, so only 0.9 counts.
        assert!((record.ocr_confidence_avg - 0.9).abs() < 1e-6);
        // The low-confidence span still feeds extraction.
        assert_eq!(record.series.value, Some(FieldValue::Text("7".to_string())));
    }

    #[test]
    fn test_garbled_key_corrected_then_validated() {
        let page = page(vec![(
            "CHAVE DE ACESSO 1111 1111 1111 1111 1111 1111 1111 1111 1111 1111 111S",
            0.0,
            0.9,
            "easyocr",
        )]);

        let record = fuse_and_extract(&[page], &PipelineConfig::default()).unwrap();

        assert!(record.access_key.present);
        assert_eq!(
            record.access_key.value,
            Some(FieldValue::Text(
                "11111111111111111111111111111111111111111115".to_string()
            ))
        );
    }
}
