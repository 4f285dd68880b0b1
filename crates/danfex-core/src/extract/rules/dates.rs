//! Date extraction for DANFE documents.

use chrono::NaiveDate;

use super::patterns::{DATE_DMY, DEPARTURE_DATE, ISSUE_DATE};
use super::{FieldRule, RuleMatch};

/// Day/month/year date rule. Only real calendar dates are produced.
pub struct DateRule;

impl DateRule {
    pub fn new() -> Self {
        Self
    }
}

impl Default for DateRule {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldRule for DateRule {
    type Output = NaiveDate;

    fn find(&self, text: &str) -> Option<RuleMatch<Self::Output>> {
        self.find_all(text).into_iter().next()
    }

    fn find_all(&self, text: &str) -> Vec<RuleMatch<Self::Output>> {
        let mut results = Vec::new();

        for caps in DATE_DMY.captures_iter(text) {
            let day: u32 = caps[1].parse().unwrap_or(0);
            let month: u32 = caps[2].parse().unwrap_or(0);
            let year: i32 = caps[3].parse().unwrap_or(0);

            if let Some(date) = NaiveDate::from_ymd_opt(year, month, day) {
                let full_match = caps.get(0).unwrap();
                results.push(
                    RuleMatch::new(date, full_match.as_str())
                        .with_span(full_match.start(), full_match.end()),
                );
            }
        }

        results
    }
}

/// Labeled dates extracted from a document.
#[derive(Debug, Clone, Default)]
pub struct DocumentDates {
    /// Issue date (data de emissao).
    pub issue: Option<RuleMatch<NaiveDate>>,
    /// Departure date (data de saida).
    pub departure: Option<RuleMatch<NaiveDate>>,
}

/// Extract the labeled issue and departure dates.
///
/// When no labeled issue date exists, the first free-standing date is
/// used; the departure date has no such fallback because any free date
/// is far more likely to be the issue date.
pub fn extract_dates(text: &str) -> DocumentDates {
    let mut result = DocumentDates::default();
    let rule = DateRule::new();

    if let Some(caps) = ISSUE_DATE.captures(text) {
        if let Some(date) = rule.find(&caps[1]) {
            result.issue = Some(RuleMatch::new(date.value, &caps[1]));
        }
    }

    if let Some(caps) = DEPARTURE_DATE.captures(text) {
        if let Some(date) = rule.find(&caps[1]) {
            result.departure = Some(RuleMatch::new(date.value, &caps[1]));
        }
    }

    if result.issue.is_none() {
        result.issue = rule.find(text);
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_date_slash() {
        let rule = DateRule::new();
        let date = rule.find("15/03/2024").unwrap();
        assert_eq!(date.value, NaiveDate::from_ymd_opt(2024, 3, 15).unwrap());
    }

    #[test]
    fn test_find_date_other_separators() {
        let rule = DateRule::new();
        assert_eq!(
            rule.find("15-03-2024").unwrap().value,
            NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()
        );
        assert_eq!(
            rule.find("15.03.2024").unwrap().value,
            NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()
        );
    }

    #[test]
    fn test_impossible_date_rejected() {
        let rule = DateRule::new();
        assert!(rule.find("31/02/2024").is_none());
        assert!(rule.find("00/01/2024").is_none());
        assert!(rule.find("15/13/2024").is_none());
    }

    #[test]
    fn test_labeled_dates() {
        let text = "DATA DE EMISSÃO: 15/03/2024 DATA DE SAÍDA: 16/03/2024";
        let dates = extract_dates(text);

        assert_eq!(
            dates.issue.unwrap().value,
            NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()
        );
        assert_eq!(
            dates.departure.unwrap().value,
            NaiveDate::from_ymd_opt(2024, 3, 16).unwrap()
        );
    }

    #[test]
    fn test_unlabeled_fallback_is_issue_only() {
        let dates = extract_dates("recebido em 01/02/2024");
        assert_eq!(
            dates.issue.unwrap().value,
            NaiveDate::from_ymd_opt(2024, 2, 1).unwrap()
        );
        assert!(dates.departure.is_none());
    }
}
