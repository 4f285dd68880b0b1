//! State registration (inscricao estadual) extraction.
//!
//! Format varies by state, so this is a labeled regex with no checksum.

use super::patterns::STATE_REGISTRATION;
use super::RuleMatch;

/// Extract the issuer's state registration number.
pub fn extract_state_registration(text: &str) -> Option<RuleMatch<String>> {
    STATE_REGISTRATION
        .captures(text)
        .map(|caps| RuleMatch::new(caps[1].to_string(), &caps[0]))
}
