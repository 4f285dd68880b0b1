//! CNPJ (Brazilian company tax ID) extraction and validation.

use super::patterns::CNPJ_PATTERN;
use super::{FieldRule, RuleMatch};

/// CNPJ field rule. Matches are syntactic; checksum validation is a
/// separate, pure predicate so callers can keep invalid-but-present
/// matches around.
pub struct CnpjRule;

impl CnpjRule {
    pub fn new() -> Self {
        Self
    }
}

impl Default for CnpjRule {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldRule for CnpjRule {
    type Output = String;

    fn find(&self, text: &str) -> Option<RuleMatch<Self::Output>> {
        self.find_all(text).into_iter().next()
    }

    /// All distinct CNPJs in text order, as bare 14-digit strings.
    fn find_all(&self, text: &str) -> Vec<RuleMatch<Self::Output>> {
        let mut results: Vec<RuleMatch<String>> = Vec::new();

        for m in CNPJ_PATTERN.find_iter(text) {
            let digits: String = m.as_str().chars().filter(|c| c.is_ascii_digit()).collect();
            if digits.len() != 14 {
                continue;
            }
            if results.iter().any(|r| r.value == digits) {
                continue;
            }
            results.push(RuleMatch::new(digits, m.as_str()).with_span(m.start(), m.end()));
        }

        results
    }
}

/// Extract all distinct CNPJs from text, in order of appearance.
pub fn extract_cnpjs(text: &str) -> Vec<RuleMatch<String>> {
    CnpjRule::new().find_all(text)
}

/// Validate a CNPJ using its two check digits.
///
/// The first digit is a mod-11 weighted sum over the leading 12 digits
/// (weights 5,4,3,2,9,8,7,6,5,4,3,2), the second over the leading 13
/// (weights 6,5,4,3,2,9,8,7,6,5,4,3,2); a remainder below 2 maps to 0,
/// anything else to 11 minus the remainder. Strings of one repeated
/// digit pass the arithmetic but are rejected as implausible.
pub fn validate_cnpj(cnpj: &str) -> bool {
    let digits: Vec<u32> = cnpj
        .chars()
        .filter(|c| c.is_ascii_digit())
        .filter_map(|c| c.to_digit(10))
        .collect();

    if digits.len() != 14 {
        return false;
    }

    if digits.iter().all(|d| *d == digits[0]) {
        return false;
    }

    let d1 = check_digit(&digits[..12], &[5, 4, 3, 2, 9, 8, 7, 6, 5, 4, 3, 2]);
    let d2 = check_digit(&digits[..13], &[6, 5, 4, 3, 2, 9, 8, 7, 6, 5, 4, 3, 2]);

    digits[12] == d1 && digits[13] == d2
}

fn check_digit(digits: &[u32], weights: &[u32]) -> u32 {
    let sum: u32 = digits.iter().zip(weights.iter()).map(|(d, w)| d * w).sum();
    let remainder = sum % 11;
    if remainder < 2 { 0 } else { 11 - remainder }
}

/// Format a CNPJ as XX.XXX.XXX/XXXX-XX.
pub fn format_cnpj(cnpj: &str) -> String {
    let digits: String = cnpj.chars().filter(|c| c.is_ascii_digit()).collect();

    if digits.len() != 14 {
        return cnpj.to_string();
    }

    format!(
        "{}.{}.{}/{}-{}",
        &digits[0..2],
        &digits[2..5],
        &digits[5..8],
        &digits[8..12],
        &digits[12..14]
    )
}
