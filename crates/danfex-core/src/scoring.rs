//! Document and per-field confidence scoring.
//!
//! The document score blends OCR-side confidence with extraction
//! coverage: `ocr_confidence_avg * 0.7 + extraction_ratio * 0.3`.

use tracing::debug;

use crate::models::record::{DocumentRecord, FieldName};

/// Per-field-class adjustment added to the base confidence, in
/// percentage points. Checksummed identifiers rank highest, free-text
/// names lowest.
fn field_adjustment(name: FieldName) -> f32 {
    match name {
        FieldName::AccessKey => 12.0,
        FieldName::IssuerTaxId | FieldName::RecipientId => 10.0,
        FieldName::InvoiceNumber | FieldName::TotalValue => 8.0,
        FieldName::GoodsValue => 7.0,
        FieldName::IssueDate | FieldName::DepartureDate => 6.0,
        FieldName::FreightValue | FieldName::InsuranceValue | FieldName::TaxValue => 6.0,
        FieldName::Series => 5.0,
        FieldName::StateRegistration => 2.0,
        FieldName::IssuerName | FieldName::RecipientName => -3.0,
    }
}

/// Combines fused-detection confidence with extraction coverage.
pub struct ConfidenceScorer;

impl ConfidenceScorer {
    pub fn new() -> Self {
        Self
    }

    /// Fill in the record's document-level score and per-field
    /// confidences, returning the updated copy.
    pub fn score(&self, mut record: DocumentRecord, ocr_confidence_avg: f32) -> DocumentRecord {
        record.ocr_confidence_avg = ocr_confidence_avg;
        record.extraction_ratio = record.compute_extraction_ratio();
        record.confidence_score =
            (ocr_confidence_avg * 0.7 + record.extraction_ratio * 0.3).clamp(0.0, 1.0);

        // Per-field confidences live in percentage space, anchored to
        // the OCR average and bounded to a plausible band.
        let base = (ocr_confidence_avg * 100.0).clamp(50.0, 95.0);
        for (name, field) in record.fields_mut() {
            if field.present {
                field.confidence = (base + field_adjustment(name)).clamp(0.0, 100.0);
            }
        }

        debug!(
            confidence_score = record.confidence_score,
            extraction_ratio = record.extraction_ratio,
            "scored document"
        );

        record
    }
}

impl Default for ConfidenceScorer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::record::{ExtractedField, FieldValue};

    fn record_with_present(n: usize) -> DocumentRecord {
        let mut record = DocumentRecord::empty();
        for (i, (_, field)) in record.fields_mut().into_iter().enumerate() {
            if i < n {
                *field = ExtractedField::found("x", FieldValue::Text("x".to_string()));
            }
        }
        record
    }

    #[test]
    fn test_document_score_blend() {
        let record = record_with_present(15);
        let scored = ConfidenceScorer::new().score(record, 0.8);

        assert!((scored.confidence_score - (0.8 * 0.7 + 1.0 * 0.3)).abs() < 1e-6);
        assert_eq!(scored.ocr_confidence_avg, 0.8);
        assert_eq!(scored.extraction_ratio, 1.0);
    }

    #[test]
    fn test_score_degrades_to_ocr_term_when_nothing_extracted() {
        let scored = ConfidenceScorer::new().score(DocumentRecord::empty(), 0.6);
        assert!((scored.confidence_score - 0.6 * 0.7).abs() < 1e-6);
        assert_eq!(scored.extraction_ratio, 0.0);
    }

    #[test]
    fn test_score_bounds() {
        let scored = ConfidenceScorer::new().score(record_with_present(15), 1.0);
        assert!(scored.confidence_score <= 1.0);

        let scored = ConfidenceScorer::new().score(DocumentRecord::empty(), 0.0);
        assert_eq!(scored.confidence_score, 0.0);
    }

    #[test]
    fn test_base_confidence_clamped_to_band() {
        // 0.2 -> base clamps up to 50; access key gets +12.
        let mut record = DocumentRecord::empty();
        record.access_key = ExtractedField::found("k", FieldValue::Text("k".to_string()));
        let scored = ConfidenceScorer::new().score(record, 0.2);
        assert_eq!(scored.access_key.confidence, 62.0);

        // 0.99 -> base clamps down to 95, and 95 + 12 hits the 100 cap.
        let mut record = DocumentRecord::empty();
        record.access_key = ExtractedField::found("k", FieldValue::Text("k".to_string()));
        let scored = ConfidenceScorer::new().score(record, 0.99);
        assert_eq!(scored.access_key.confidence, 100.0);
    }

    #[test]
    fn test_field_class_ordering() {
        let record = record_with_present(15);
        let scored = ConfidenceScorer::new().score(record, 0.8);

        // base 80: checksummed ids above numbers above dates above names
        assert_eq!(scored.access_key.confidence, 92.0);
        assert_eq!(scored.issuer_tax_id.confidence, 90.0);
        assert_eq!(scored.recipient_id.confidence, 90.0);
        assert_eq!(scored.invoice_number.confidence, 88.0);
        assert_eq!(scored.total_value.confidence, 88.0);
        assert_eq!(scored.goods_value.confidence, 87.0);
        assert_eq!(scored.issue_date.confidence, 86.0);
        assert_eq!(scored.freight_value.confidence, 86.0);
        assert_eq!(scored.series.confidence, 85.0);
        assert_eq!(scored.state_registration.confidence, 82.0);
        assert_eq!(scored.issuer_name.confidence, 77.0);
    }

    #[test]
    fn test_absent_fields_not_scored() {
        let scored = ConfidenceScorer::new().score(DocumentRecord::empty(), 0.8);
        for (_, field) in scored.fields() {
            assert_eq!(field.confidence, 0.0);
        }
    }
}
