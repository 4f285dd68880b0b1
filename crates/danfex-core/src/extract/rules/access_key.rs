//! NF-e access key (44 digits) extraction and validation.

use super::patterns::ACCESS_KEY_PATTERN;
use super::{FieldRule, RuleMatch};

/// Access-key field rule.
pub struct AccessKeyRule;

impl AccessKeyRule {
    pub fn new() -> Self {
        Self
    }
}

impl Default for AccessKeyRule {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldRule for AccessKeyRule {
    type Output = String;

    fn find(&self, text: &str) -> Option<RuleMatch<Self::Output>> {
        self.find_all(text).into_iter().next()
    }

    /// All 44-digit keys in text order, with grouping spaces removed.
    fn find_all(&self, text: &str) -> Vec<RuleMatch<Self::Output>> {
        let mut results: Vec<RuleMatch<String>> = Vec::new();

        for m in ACCESS_KEY_PATTERN.find_iter(text) {
            let digits: String = m.as_str().chars().filter(|c| c.is_ascii_digit()).collect();
            if digits.len() != 44 {
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

/// Extract the first access key from text.
pub fn extract_access_key(text: &str) -> Option<RuleMatch<String>> {
    AccessKeyRule::new().find(text)
}

/// Validate the access key's final check digit.
///
/// Mod-11 over the leading 43 digits with weights 2 through 9 cycling
/// from the rightmost digit leftward; a remainder of 0 or 1 yields
/// check digit 0, anything else 11 minus the remainder.
pub fn validate_access_key(key: &str) -> bool {
    let digits: Vec<u32> = key
        .chars()
        .filter(|c| c.is_ascii_digit())
        .filter_map(|c| c.to_digit(10))
        .collect();

    if digits.len() != 44 {
        return false;
    }

    let sum: u32 = digits[..43]
        .iter()
        .rev()
        .enumerate()
        .map(|(i, d)| d * (2 + (i as u32 % 8)))
        .sum();

    let remainder = sum % 11;
    let expected = if remainder < 2 { 0 } else { 11 - remainder };

    digits[43] == expected
}

/// Format a key in the conventional eleven groups of four digits.
pub fn format_access_key(key: &str) -> String {
    let digits: String = key.chars().filter(|c| c.is_ascii_digit()).collect();

    if digits.len() != 44 {
        return key.to_string();
    }

    digits
        .as_bytes()
        .chunks(4)
        .map(|chunk| std::str::from_utf8(chunk).unwrap_or_default())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    // 43 payload digits of '1' carry check digit 2; of '2', check digit 4.
    const VALID_KEY_ONES: &str = "11111111111111111111111111111111111111111112";
    const VALID_KEY_TWOS: &str = "22222222222222222222222222222222222222222224";

    #[test]
    fn test_validate_access_key_valid() {
        assert!(validate_access_key(VALID_KEY_ONES));
        assert!(validate_access_key(VALID_KEY_TWOS));
        assert!(validate_access_key(
            "1111 1111 1111 1111 1111 1111 1111 1111 1111 1111 1112"
        ));
    }

    #[test]
    fn test_validate_access_key_invalid() {
        // Wrong check digit
        assert!(!validate_access_key(
            "11111111111111111111111111111111111111111113"
        ));
        // Flipped payload digit
        assert!(!validate_access_key(
            "21111111111111111111111111111111111111111112"
        ));
        // Wrong length
        assert!(!validate_access_key("1111111111111111111111111111111111111111111"));
    }

    #[test]
    fn test_extract_grouped_key() {
        let text = "CHAVE DE ACESSO 1111 1111 1111 1111 1111 1111 1111 1111 1111 1111 1112 FIM";
        let key = extract_access_key(text).unwrap();
        assert_eq!(key.value, VALID_KEY_ONES);
    }

    #[test]
    fn test_extract_contiguous_key() {
        let text = format!("chave: {}", VALID_KEY_ONES);
        let key = extract_access_key(&text).unwrap();
        assert_eq!(key.value, VALID_KEY_ONES);
    }

    #[test]
    fn test_no_key_in_short_digit_runs() {
        assert!(extract_access_key("CNPJ 11.222.333/0001-81 Nº 123456").is_none());
    }

    #[test]
    fn test_format_access_key() {
        assert_eq!(
            format_access_key(VALID_KEY_ONES),
            "1111 1111 1111 1111 1111 1111 1111 1111 1111 1111 1112"
        );
    }
}
