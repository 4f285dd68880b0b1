//! CPF (Brazilian personal tax ID) extraction and validation.

use super::patterns::CPF_PATTERN;
use super::{FieldRule, RuleMatch};

/// CPF field rule. Syntactic matches only; see [`validate_cpf`].
pub struct CpfRule;

impl CpfRule {
    pub fn new() -> Self {
        Self
    }
}

impl Default for CpfRule {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldRule for CpfRule {
    type Output = String;

    fn find(&self, text: &str) -> Option<RuleMatch<Self::Output>> {
        self.find_all(text).into_iter().next()
    }

    /// All distinct CPFs in text order, as bare 11-digit strings.
    fn find_all(&self, text: &str) -> Vec<RuleMatch<Self::Output>> {
        let mut results: Vec<RuleMatch<String>> = Vec::new();

        for m in CPF_PATTERN.find_iter(text) {
            let digits: String = m.as_str().chars().filter(|c| c.is_ascii_digit()).collect();
            if digits.len() != 11 {
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

/// Extract all distinct CPFs from text, in order of appearance.
pub fn extract_cpfs(text: &str) -> Vec<RuleMatch<String>> {
    CpfRule::new().find_all(text)
}

/// Validate a CPF using its two check digits.
///
/// First digit: mod-11 sum of the leading 9 digits with weights 10..2;
/// second digit: leading 10 digits with weights 11..2. A remainder
/// below 2 maps to 0, anything else to 11 minus the remainder.
/// Strings of one repeated digit are rejected.
pub fn validate_cpf(cpf: &str) -> bool {
    let digits: Vec<u32> = cpf
        .chars()
        .filter(|c| c.is_ascii_digit())
        .filter_map(|c| c.to_digit(10))
        .collect();

    if digits.len() != 11 {
        return false;
    }

    if digits.iter().all(|d| *d == digits[0]) {
        return false;
    }

    let d1 = check_digit(&digits[..9], 10);
    let d2 = check_digit(&digits[..10], 11);

    digits[9] == d1 && digits[10] == d2
}

fn check_digit(digits: &[u32], start_weight: u32) -> u32 {
    let sum: u32 = digits
        .iter()
        .enumerate()
        .map(|(i, d)| d * (start_weight - i as u32))
        .sum();
    let remainder = sum % 11;
    if remainder < 2 { 0 } else { 11 - remainder }
}

/// Format a CPF as XXX.XXX.XXX-XX.
pub fn format_cpf(cpf: &str) -> String {
    let digits: String = cpf.chars().filter(|c| c.is_ascii_digit()).collect();

    if digits.len() != 11 {
        return cpf.to_string();
    }

    format!(
        "{}.{}.{}-{}",
        &digits[0..3],
        &digits[3..6],
        &digits[6..9],
        &digits[9..11]
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_cpf_valid() {
        assert!(validate_cpf("52998224725"));
        assert!(validate_cpf("529.982.247-25"));
    }

    #[test]
    fn test_validate_cpf_invalid() {
        // Wrong check digits
        assert!(!validate_cpf("52998224726"));
        assert!(!validate_cpf("52998224735"));
        // Single flipped payload digit
        assert!(!validate_cpf("52998224724"));
        assert!(!validate_cpf("62998224725"));
        // Repeated digits
        assert!(!validate_cpf("11111111111"));
        // Wrong length
        assert!(!validate_cpf("5299822472"));
    }

    #[test]
    fn test_extract_cpf() {
        let cpfs = extract_cpfs("CPF: 529.982.247-25");
        assert_eq!(cpfs.len(), 1);
        assert_eq!(cpfs[0].value, "52998224725");
    }

    #[test]
    fn test_format_cpf() {
        assert_eq!(format_cpf("52998224725"), "529.982.247-25");
        assert_eq!(format_cpf("529.982.247-25"), "529.982.247-25");
    }
}
