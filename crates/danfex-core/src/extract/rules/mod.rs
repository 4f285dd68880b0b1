//! Rule-based field extractors for Brazilian DANFE documents.

pub mod access_key;
pub mod amounts;
pub mod cnpj;
pub mod cpf;
pub mod dates;
pub mod names;
pub mod patterns;
pub mod registration;

pub use access_key::{extract_access_key, format_access_key, validate_access_key, AccessKeyRule};
pub use amounts::{
    extract_amounts, format_brazilian_amount, parse_brazilian_amount, AmountRule, DocumentAmounts,
};
pub use cnpj::{extract_cnpjs, format_cnpj, validate_cnpj, CnpjRule};
pub use cpf::{extract_cpfs, format_cpf, validate_cpf, CpfRule};
pub use dates::{extract_dates, DateRule, DocumentDates};
pub use names::{extract_issuer_name, extract_recipient_name};
pub use registration::extract_state_registration;

/// Trait for individual field rules.
pub trait FieldRule {
    /// The type of value this rule produces.
    type Output;

    /// Find the first occurrence of the field in text.
    fn find(&self, text: &str) -> Option<RuleMatch<Self::Output>>;

    /// Find all occurrences of the field.
    fn find_all(&self, text: &str) -> Vec<RuleMatch<Self::Output>>;
}

/// A single rule match with its source span.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleMatch<T> {
    /// Extracted, normalized value.
    pub value: T,
    /// Source text that was matched.
    pub raw: String,
    /// Position of the match in the source text.
    pub span: Option<(usize, usize)>,
}

impl<T> RuleMatch<T> {
    pub fn new(value: T, raw: impl Into<String>) -> Self {
        Self {
            value,
            raw: raw.into(),
            span: None,
        }
    }

    pub fn with_span(mut self, start: usize, end: usize) -> Self {
        self.span = Some((start, end));
        self
    }
}
