//! Party name extraction (issuer razao social, recipient name).
//!
//! Names are free text near label anchors; there is no checksum, so
//! these are the lowest-confidence fields in the schema.

use super::patterns::{ISSUER_NAME, RECIPIENT_NAME};
use super::RuleMatch;

/// Extract the issuer's legal name from its razao-social label window.
pub fn extract_issuer_name(text: &str) -> Option<RuleMatch<String>> {
    ISSUER_NAME
        .captures(text)
        .and_then(|caps| clean_name(&caps[1]).map(|name| RuleMatch::new(name, &caps[0])))
}

/// Extract the recipient's name from its destinatario label window.
pub fn extract_recipient_name(text: &str) -> Option<RuleMatch<String>> {
    RECIPIENT_NAME
        .captures(text)
        .and_then(|caps| clean_name(&caps[1]).map(|name| RuleMatch::new(name, &caps[0])))
}

/// Strip trailing separators and reject captures too short to be names.
fn clean_name(raw: &str) -> Option<String> {
    let name = raw.trim().trim_end_matches(['.', '-', ' ']).to_string();
    if name.chars().filter(|c| c.is_alphabetic()).count() < 2 {
        return None;
    }
    Some(name)
}
