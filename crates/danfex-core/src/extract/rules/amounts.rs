//! Monetary amount extraction for DANFE documents.
//!
//! Brazilian format: `R$ 1.234,56` with `.` (or space) as thousands
//! separator and `,` as the decimal separator.

use rust_decimal::Decimal;
use std::str::FromStr;

use super::patterns::{
    AMOUNT_PATTERN, FREIGHT_VALUE, GOODS_VALUE, INSURANCE_VALUE, TAX_VALUE, TOTAL_VALUE,
};
use super::{FieldRule, RuleMatch};

/// Monetary amount rule.
pub struct AmountRule;

impl AmountRule {
    pub fn new() -> Self {
        Self
    }
}

impl Default for AmountRule {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldRule for AmountRule {
    type Output = Decimal;

    fn find(&self, text: &str) -> Option<RuleMatch<Self::Output>> {
        self.find_all(text).into_iter().next()
    }

    fn find_all(&self, text: &str) -> Vec<RuleMatch<Self::Output>> {
        let mut results = Vec::new();

        for caps in AMOUNT_PATTERN.captures_iter(text) {
            if let Some(amount) = parse_brazilian_amount(&caps[1]) {
                let full_match = caps.get(0).unwrap();
                results.push(
                    RuleMatch::new(amount, full_match.as_str())
                        .with_span(full_match.start(), full_match.end()),
                );
            }
        }

        results
    }
}

/// Labeled amounts extracted from a document.
#[derive(Debug, Clone, Default)]
pub struct DocumentAmounts {
    /// Total invoice value (valor total da nota).
    pub total: Option<RuleMatch<Decimal>>,
    /// Total goods value (valor dos produtos).
    pub goods: Option<RuleMatch<Decimal>>,
    /// Freight value (valor do frete).
    pub freight: Option<RuleMatch<Decimal>>,
    /// Insurance value (valor do seguro).
    pub insurance: Option<RuleMatch<Decimal>>,
    /// ICMS tax value.
    pub tax: Option<RuleMatch<Decimal>>,
}

/// Extract the labeled amount fields.
pub fn extract_amounts(text: &str) -> DocumentAmounts {
    let labeled = |pattern: &regex::Regex| -> Option<RuleMatch<Decimal>> {
        pattern.captures(text).and_then(|caps| {
            parse_brazilian_amount(&caps[1]).map(|amount| RuleMatch::new(amount, &caps[0]))
        })
    };

    DocumentAmounts {
        total: labeled(&TOTAL_VALUE),
        goods: labeled(&GOODS_VALUE),
        freight: labeled(&FREIGHT_VALUE),
        insurance: labeled(&INSURANCE_VALUE),
        tax: labeled(&TAX_VALUE),
    }
}

/// Parse a Brazilian-formatted amount into a fixed-point decimal.
///
/// Negative values are rejected; amounts on an invoice are magnitudes.
pub fn parse_brazilian_amount(s: &str) -> Option<Decimal> {
    if s.contains('-') {
        return None;
    }

    let cleaned: String = s
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == ',' || *c == '.')
        .collect();

    // With a comma present, periods are thousands separators; without
    // one, a period is taken as the decimal point ("1234.56").
    let normalized = if cleaned.contains(',') {
        cleaned.replace('.', "").replace(',', ".")
    } else {
        cleaned
    };

    let amount = Decimal::from_str(&normalized).ok()?;
    if amount.is_sign_negative() {
        return None;
    }
    Some(amount)
}

/// Format an amount in Brazilian style (1.234,56).
pub fn format_brazilian_amount(amount: Decimal) -> String {
    let s = format!("{:.2}", amount);
    let (integer_part, decimal_part) = s.split_once('.').unwrap_or((s.as_str(), "00"));

    let chars: Vec<char> = integer_part.chars().collect();
    let mut formatted = String::new();

    for (i, c) in chars.iter().enumerate() {
        if i > 0 && (chars.len() - i) % 3 == 0 {
            formatted.push('.');
        }
        formatted.push(*c);
    }

    format!("{},{}", formatted, decimal_part)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_parse_brazilian_amount() {
        assert_eq!(parse_brazilian_amount("1.284,56"), Some(dec("1284.56")));
        assert_eq!(parse_brazilian_amount("R$ 1.284,56"), Some(dec("1284.56")));
        assert_eq!(parse_brazilian_amount("1284,56"), Some(dec("1284.56")));
        assert_eq!(parse_brazilian_amount("1234.56"), Some(dec("1234.56")));
        assert_eq!(
            parse_brazilian_amount("12.345.678,90"),
            Some(dec("12345678.90"))
        );
    }

    #[test]
    fn test_negative_amount_rejected() {
        assert_eq!(parse_brazilian_amount("-10,00"), None);
    }

    #[test]
    fn test_find_all_amounts() {
        let rule = AmountRule::new();
        let text = "FRETE: R$ 50,00 TOTAL: R$ 1.060,00";
        let amounts = rule.find_all(text);

        assert_eq!(amounts.len(), 2);
        assert_eq!(amounts[0].value, dec("50.00"));
        assert_eq!(amounts[1].value, dec("1060.00"));
    }

    #[test]
    fn test_extract_labeled_amounts() {
        let text = "VALOR TOTAL DOS PRODUTOS: R$ 1.000,00 VALOR DO FRETE: R$ 50,00 \
                    VALOR DO SEGURO: R$ 10,00 VALOR DO ICMS: R$ 180,00 \
                    VALOR TOTAL DA NOTA: R$ 1.060,00";
        let amounts = extract_amounts(text);

        assert_eq!(amounts.goods.unwrap().value, dec("1000.00"));
        assert_eq!(amounts.freight.unwrap().value, dec("50.00"));
        assert_eq!(amounts.insurance.unwrap().value, dec("10.00"));
        assert_eq!(amounts.tax.unwrap().value, dec("180.00"));
        assert_eq!(amounts.total.unwrap().value, dec("1060.00"));
    }

    #[test]
    fn test_format_brazilian_amount() {
        assert_eq!(format_brazilian_amount(dec("1234.56")), "1.234,56");
        assert_eq!(format_brazilian_amount(dec("12345678.90")), "12.345.678,90");
        assert_eq!(format_brazilian_amount(dec("50.00")), "50,00");
    }
}
