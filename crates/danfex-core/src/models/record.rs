//! Structured document record extracted from a DANFE transcription.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Number of fields in the fixed extraction schema.
pub const FIELD_COUNT: usize = 15;

/// Names of the fixed 15-field DANFE schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldName {
    /// Invoice number (numero da NF).
    InvoiceNumber,
    /// Invoice series.
    Series,
    /// 44-digit NF-e access key.
    AccessKey,
    /// Issue date (data de emissao).
    IssueDate,
    /// Departure date (data de saida).
    DepartureDate,
    /// Issuer CNPJ.
    IssuerTaxId,
    /// Issuer legal name (razao social).
    IssuerName,
    /// Issuer state registration (inscricao estadual).
    StateRegistration,
    /// Recipient CNPJ, or CPF when the recipient is a natural person.
    RecipientId,
    /// Recipient name.
    RecipientName,
    /// Total invoice value.
    TotalValue,
    /// Total goods value.
    GoodsValue,
    /// Freight value.
    FreightValue,
    /// Insurance value.
    InsuranceValue,
    /// ICMS tax value.
    TaxValue,
}

impl FieldName {
    /// All schema fields, in schema order.
    pub const ALL: [FieldName; FIELD_COUNT] = [
        FieldName::InvoiceNumber,
        FieldName::Series,
        FieldName::AccessKey,
        FieldName::IssueDate,
        FieldName::DepartureDate,
        FieldName::IssuerTaxId,
        FieldName::IssuerName,
        FieldName::StateRegistration,
        FieldName::RecipientId,
        FieldName::RecipientName,
        FieldName::TotalValue,
        FieldName::GoodsValue,
        FieldName::FreightValue,
        FieldName::InsuranceValue,
        FieldName::TaxValue,
    ];

    /// Snake-case name used in serialized output.
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldName::InvoiceNumber => "invoice_number",
            FieldName::Series => "series",
            FieldName::AccessKey => "access_key",
            FieldName::IssueDate => "issue_date",
            FieldName::DepartureDate => "departure_date",
            FieldName::IssuerTaxId => "issuer_tax_id",
            FieldName::IssuerName => "issuer_name",
            FieldName::StateRegistration => "state_registration",
            FieldName::RecipientId => "recipient_id",
            FieldName::RecipientName => "recipient_name",
            FieldName::TotalValue => "total_value",
            FieldName::GoodsValue => "goods_value",
            FieldName::FreightValue => "freight_value",
            FieldName::InsuranceValue => "insurance_value",
            FieldName::TaxValue => "tax_value",
        }
    }
}

/// Typed value of an extracted field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldValue {
    /// Free or identifier text.
    Text(String),
    /// Monetary amount.
    Amount(Decimal),
    /// Calendar date.
    Date(NaiveDate),
}

impl FieldValue {
    /// Whether the value carries actual content.
    pub fn is_empty(&self) -> bool {
        match self {
            FieldValue::Text(s) => s.trim().is_empty(),
            FieldValue::Amount(_) | FieldValue::Date(_) => false,
        }
    }

    /// Render the value for display and CSV output.
    pub fn display(&self) -> String {
        match self {
            FieldValue::Text(s) => s.clone(),
            FieldValue::Amount(d) => d.to_string(),
            FieldValue::Date(d) => d.format("%d/%m/%Y").to_string(),
        }
    }
}

/// One extracted field: raw matched substring, normalized value,
/// validation outcome and scorer-assigned confidence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedField {
    /// Substring of the fused text that matched.
    pub raw: String,

    /// Typed, normalized value, if any was found.
    pub value: Option<FieldValue>,

    /// Checksum/pattern validation result. Free-text fields are always
    /// valid when present (there is no checksum for prose).
    pub is_valid: bool,

    /// Whether the normalized value is non-empty.
    pub present: bool,

    /// Per-field confidence in [0, 100], filled by the scorer.
    pub confidence: f32,
}

impl ExtractedField {
    /// A field that was not found.
    pub fn absent() -> Self {
        Self {
            raw: String::new(),
            value: None,
            is_valid: false,
            present: false,
            confidence: 0.0,
        }
    }

    /// A found field, valid until told otherwise.
    pub fn found(raw: impl Into<String>, value: FieldValue) -> Self {
        let present = !value.is_empty();
        Self {
            raw: raw.into(),
            value: Some(value),
            is_valid: present,
            present,
            confidence: 0.0,
        }
    }

    /// Override the validation outcome (e.g. after a checksum failure).
    pub fn with_validity(mut self, valid: bool) -> Self {
        self.is_valid = valid;
        self
    }
}

impl Default for ExtractedField {
    fn default() -> Self {
        Self::absent()
    }
}

/// The complete structured record for one processed document.
///
/// Created once per document and immutable once returned; a re-run
/// produces a new record.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentRecord {
    pub invoice_number: ExtractedField,
    pub series: ExtractedField,
    pub access_key: ExtractedField,
    pub issue_date: ExtractedField,
    pub departure_date: ExtractedField,
    pub issuer_tax_id: ExtractedField,
    pub issuer_name: ExtractedField,
    pub state_registration: ExtractedField,
    pub recipient_id: ExtractedField,
    pub recipient_name: ExtractedField,
    pub total_value: ExtractedField,
    pub goods_value: ExtractedField,
    pub freight_value: ExtractedField,
    pub insurance_value: ExtractedField,
    pub tax_value: ExtractedField,

    /// Mean confidence of fused detections above the acceptance threshold.
    pub ocr_confidence_avg: f32,

    /// Fraction of the 15-field schema that is present.
    pub extraction_ratio: f32,

    /// Document-level blended confidence in [0, 1].
    pub confidence_score: f32,
}

impl DocumentRecord {
    /// A record with every field absent.
    pub fn empty() -> Self {
        Self::default()
    }

    /// All fields in schema order.
    pub fn fields(&self) -> [(FieldName, &ExtractedField); FIELD_COUNT] {
        [
            (FieldName::InvoiceNumber, &self.invoice_number),
            (FieldName::Series, &self.series),
            (FieldName::AccessKey, &self.access_key),
            (FieldName::IssueDate, &self.issue_date),
            (FieldName::DepartureDate, &self.departure_date),
            (FieldName::IssuerTaxId, &self.issuer_tax_id),
            (FieldName::IssuerName, &self.issuer_name),
            (FieldName::StateRegistration, &self.state_registration),
            (FieldName::RecipientId, &self.recipient_id),
            (FieldName::RecipientName, &self.recipient_name),
            (FieldName::TotalValue, &self.total_value),
            (FieldName::GoodsValue, &self.goods_value),
            (FieldName::FreightValue, &self.freight_value),
            (FieldName::InsuranceValue, &self.insurance_value),
            (FieldName::TaxValue, &self.tax_value),
        ]
    }

    /// All fields in schema order, mutably.
    pub fn fields_mut(&mut self) -> [(FieldName, &mut ExtractedField); FIELD_COUNT] {
        [
            (FieldName::InvoiceNumber, &mut self.invoice_number),
            (FieldName::Series, &mut self.series),
            (FieldName::AccessKey, &mut self.access_key),
            (FieldName::IssueDate, &mut self.issue_date),
            (FieldName::DepartureDate, &mut self.departure_date),
            (FieldName::IssuerTaxId, &mut self.issuer_tax_id),
            (FieldName::IssuerName, &mut self.issuer_name),
            (FieldName::StateRegistration, &mut self.state_registration),
            (FieldName::RecipientId, &mut self.recipient_id),
            (FieldName::RecipientName, &mut self.recipient_name),
            (FieldName::TotalValue, &mut self.total_value),
            (FieldName::GoodsValue, &mut self.goods_value),
            (FieldName::FreightValue, &mut self.freight_value),
            (FieldName::InsuranceValue, &mut self.insurance_value),
            (FieldName::TaxValue, &mut self.tax_value),
        ]
    }

    /// Number of present fields.
    pub fn present_count(&self) -> usize {
        self.fields().iter().filter(|(_, f)| f.present).count()
    }

    /// `present_count / 15`, always in [0, 1].
    pub fn compute_extraction_ratio(&self) -> f32 {
        self.present_count() as f32 / FIELD_COUNT as f32
    }
}
