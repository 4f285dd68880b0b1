//! Fixed-order document field extraction.

use tracing::debug;

use crate::models::config::ExtractionConfig;
use crate::models::record::{DocumentRecord, ExtractedField, FieldValue};

use super::rules::{
    access_key::{validate_access_key, AccessKeyRule},
    amounts::extract_amounts,
    cnpj::{format_cnpj, validate_cnpj, CnpjRule},
    cpf::{format_cpf, validate_cpf, CpfRule},
    dates::extract_dates,
    names::{extract_issuer_name, extract_recipient_name},
    patterns::{INVOICE_NUMBER, SERIES},
    registration::extract_state_registration,
    FieldRule, RuleMatch,
};

/// Extracts the fixed 15-field schema from normalized text.
///
/// Extraction order matters: the access key is located before shorter
/// numeric fields, and a recipient CPF is only attempted when no
/// organization CNPJ matched for the recipient. Checksum failures are
/// never fatal; they surface as `is_valid = false` on a present field.
pub struct DocumentExtractor {
    config: ExtractionConfig,
}

impl DocumentExtractor {
    pub fn new() -> Self {
        Self {
            config: ExtractionConfig::default(),
        }
    }

    pub fn with_config(config: ExtractionConfig) -> Self {
        Self { config }
    }

    /// Run all field rules over the text and assemble a record.
    ///
    /// Confidence fields are left at zero for the scorer to fill.
    pub fn extract(&self, text: &str) -> DocumentRecord {
        let mut record = DocumentRecord::empty();

        if text.trim().is_empty() {
            return record;
        }

        // 1. Access key
        if let Some(m) = AccessKeyRule::new().find(text) {
            let valid = !self.config.validate_access_key || validate_access_key(&m.value);
            record.access_key =
                ExtractedField::found(m.raw, FieldValue::Text(m.value)).with_validity(valid);
        }

        // 2. Invoice number and series
        if let Some(caps) = INVOICE_NUMBER.captures(text) {
            record.invoice_number =
                ExtractedField::found(&caps[0], FieldValue::Text(caps[1].to_string()));
        }
        if let Some(caps) = SERIES.captures(text) {
            record.series = ExtractedField::found(&caps[0], FieldValue::Text(caps[1].to_string()));
        }

        // 3. Dates (calendar-validated)
        let dates = extract_dates(text);
        if let Some(m) = dates.issue {
            record.issue_date = ExtractedField::found(m.raw, FieldValue::Date(m.value));
        }
        if let Some(m) = dates.departure {
            record.departure_date = ExtractedField::found(m.raw, FieldValue::Date(m.value));
        }

        // 4. CNPJs: issuer first, recipient second; prefer matches that
        // pass the checksum, keep a failing one rather than lose it.
        let (issuer_cnpj, recipient_cnpj) = self.pick_cnpjs(text);
        if let Some((m, valid)) = issuer_cnpj {
            record.issuer_tax_id =
                ExtractedField::found(m.raw, FieldValue::Text(format_cnpj(&m.value)))
                    .with_validity(valid);
        }
        let recipient_has_cnpj = recipient_cnpj.is_some();
        if let Some((m, valid)) = recipient_cnpj {
            record.recipient_id =
                ExtractedField::found(m.raw, FieldValue::Text(format_cnpj(&m.value)))
                    .with_validity(valid);
        }

        // 5. CPF, only for a recipient without an organization ID
        if !recipient_has_cnpj {
            if let Some((m, valid)) = self.pick_cpf(text) {
                record.recipient_id =
                    ExtractedField::found(m.raw, FieldValue::Text(format_cpf(&m.value)))
                        .with_validity(valid);
            }
        }

        // 6. Monetary amounts
        let amounts = extract_amounts(text);
        let to_field = |m: RuleMatch<rust_decimal::Decimal>| {
            ExtractedField::found(m.raw, FieldValue::Amount(m.value))
        };
        if let Some(m) = amounts.total {
            record.total_value = to_field(m);
        }
        if let Some(m) = amounts.goods {
            record.goods_value = to_field(m);
        }
        if let Some(m) = amounts.freight {
            record.freight_value = to_field(m);
        }
        if let Some(m) = amounts.insurance {
            record.insurance_value = to_field(m);
        }
        if let Some(m) = amounts.tax {
            record.tax_value = to_field(m);
        }

        // 7. Free-text names (no checksum, valid whenever present)
        if let Some(m) = extract_issuer_name(text) {
            record.issuer_name = ExtractedField::found(m.raw, FieldValue::Text(m.value));
        }
        if let Some(m) = extract_recipient_name(text) {
            record.recipient_name = ExtractedField::found(m.raw, FieldValue::Text(m.value));
        }

        // 8. State registration
        if let Some(m) = extract_state_registration(text) {
            record.state_registration = ExtractedField::found(m.raw, FieldValue::Text(m.value));
        }

        record.extraction_ratio = record.compute_extraction_ratio();

        debug!(
            present = record.present_count(),
            ratio = record.extraction_ratio,
            "extracted document fields"
        );

        record
    }

    /// Order CNPJ candidates: checksum-passing matches first, each in
    /// text order, then failing ones. Slots are (issuer, recipient).
    #[allow(clippy::type_complexity)]
    fn pick_cnpjs(
        &self,
        text: &str,
    ) -> (
        Option<(RuleMatch<String>, bool)>,
        Option<(RuleMatch<String>, bool)>,
    ) {
        let matches = CnpjRule::new().find_all(text);

        let mut ordered: Vec<(RuleMatch<String>, bool)> = Vec::new();
        if self.config.validate_cnpj {
            let (valid, invalid): (Vec<_>, Vec<_>) =
                matches.into_iter().partition(|m| validate_cnpj(&m.value));
            ordered.extend(valid.into_iter().map(|m| (m, true)));
            ordered.extend(invalid.into_iter().map(|m| (m, false)));
        } else {
            ordered.extend(matches.into_iter().map(|m| (m, true)));
        }

        let mut iter = ordered.into_iter();
        (iter.next(), iter.next())
    }

    fn pick_cpf(&self, text: &str) -> Option<(RuleMatch<String>, bool)> {
        let matches = CpfRule::new().find_all(text);

        if !self.config.validate_cpf {
            return matches.into_iter().next().map(|m| (m, true));
        }

        let mut first_invalid = None;
        for m in matches {
            if validate_cpf(&m.value) {
                return Some((m, true));
            }
            if first_invalid.is_none() {
                first_invalid = Some((m, false));
            }
        }
        first_invalid
    }
}

impl Default for DocumentExtractor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::record::FieldValue;
    use pretty_assertions::assert_eq;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    const FULL_DANFE: &str = "DANFE DOCUMENTO AUXILIAR DA NOTA FISCAL ELETRONICA \
        Nº: 123456 SÉRIE: 1 \
        DATA DE EMISSÃO: 15/03/2024 DATA DE SAÍDA: 16/03/2024 \
        CHAVE DE ACESSO 1111 1111 1111 1111 1111 1111 1111 1111 1111 1111 1112 \
        RAZÃO SOCIAL: ACME COMERCIO LTDA CNPJ: 11.222.333/0001-81 \
        INSCRIÇÃO ESTADUAL: 110.042.490.114 \
        DESTINATÁRIO: MERCADO CENTRAL LTDA CNPJ: 11.444.777/0001-61 \
        VALOR TOTAL DOS PRODUTOS: R$ 1.000,00 VALOR DO FRETE: R$ 50,00 \
        VALOR DO SEGURO: R$ 10,00 VALOR DO ICMS: R$ 180,00 \
        VALOR TOTAL DA NOTA: R$ 1.060,00";

    #[test]
    fn test_full_document_reaches_ratio_one() {
        let record = DocumentExtractor::new().extract(FULL_DANFE);

        for (name, field) in record.fields() {
            assert!(field.present, "field {} should be present", name.as_str());
            assert!(field.is_valid, "field {} should be valid", name.as_str());
        }
        assert_eq!(record.present_count(), 15);
        assert_eq!(record.extraction_ratio, 1.0);
    }

    #[test]
    fn test_field_values() {
        let record = DocumentExtractor::new().extract(FULL_DANFE);

        assert_eq!(
            record.invoice_number.value,
            Some(FieldValue::Text("123456".to_string()))
        );
        assert_eq!(record.series.value, Some(FieldValue::Text("1".to_string())));
        assert_eq!(
            record.access_key.value,
            Some(FieldValue::Text(
                "11111111111111111111111111111111111111111112".to_string()
            ))
        );
        assert_eq!(
            record.issuer_tax_id.value,
            Some(FieldValue::Text("11.222.333/0001-81".to_string()))
        );
        assert_eq!(
            record.recipient_id.value,
            Some(FieldValue::Text("11.444.777/0001-61".to_string()))
        );
        assert_eq!(
            record.total_value.value,
            Some(FieldValue::Amount(Decimal::from_str("1060.00").unwrap()))
        );
        assert_eq!(
            record.issuer_name.value,
            Some(FieldValue::Text("ACME COMERCIO LTDA".to_string()))
        );
    }

    #[test]
    fn test_empty_text_all_absent() {
        let record = DocumentExtractor::new().extract("");
        assert_eq!(record.present_count(), 0);
        assert_eq!(record.extraction_ratio, 0.0);
    }

    #[test]
    fn test_unrecognizable_text_all_absent() {
        let record = DocumentExtractor::new().extract("lorem ipsum dolor sit amet");
        assert_eq!(record.present_count(), 0);
    }

    #[test]
    fn test_cpf_recipient_when_no_second_cnpj() {
        let text = "RAZÃO SOCIAL: ACME LTDA CNPJ: 11.222.333/0001-81 \
                    DESTINATÁRIO: JOAO DA SILVA CPF: 529.982.247-25";
        let record = DocumentExtractor::new().extract(text);

        assert_eq!(
            record.issuer_tax_id.value,
            Some(FieldValue::Text("11.222.333/0001-81".to_string()))
        );
        assert_eq!(
            record.recipient_id.value,
            Some(FieldValue::Text("529.982.247-25".to_string()))
        );
        assert!(record.recipient_id.is_valid);
    }

    #[test]
    fn test_failing_checksum_kept_as_invalid() {
        // Check digits deliberately wrong.
        let text = "CNPJ: 11.222.333/0001-99";
        let record = DocumentExtractor::new().extract(text);

        assert!(record.issuer_tax_id.present);
        assert!(!record.issuer_tax_id.is_valid);
        assert_eq!(
            record.issuer_tax_id.value,
            Some(FieldValue::Text("11.222.333/0001-99".to_string()))
        );
    }

    #[test]
    fn test_valid_cnpj_preferred_over_invalid() {
        let text = "CNPJ: 11.222.333/0001-99 CNPJ: 11.444.777/0001-61";
        let record = DocumentExtractor::new().extract(text);

        // The checksum-passing match takes the issuer slot.
        assert_eq!(
            record.issuer_tax_id.value,
            Some(FieldValue::Text("11.444.777/0001-61".to_string()))
        );
        assert!(record.issuer_tax_id.is_valid);
        assert!(record.recipient_id.present);
        assert!(!record.recipient_id.is_valid);
    }

    #[test]
    fn test_validation_can_be_disabled() {
        let config = ExtractionConfig {
            validate_cnpj: false,
            ..ExtractionConfig::default()
        };
        let record =
            DocumentExtractor::with_config(config).extract("CNPJ: 11.222.333/0001-99");

        assert!(record.issuer_tax_id.present);
        assert!(record.issuer_tax_id.is_valid);
    }

    #[test]
    fn test_invalid_access_key_kept_as_invalid() {
        let text = "CHAVE 1111 1111 1111 1111 1111 1111 1111 1111 1111 1111 1113";
        let record = DocumentExtractor::new().extract(text);

        assert!(record.access_key.present);
        assert!(!record.access_key.is_valid);
    }
}
