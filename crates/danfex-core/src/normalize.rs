//! Engine-agnostic text normalization for fused OCR output.
//!
//! Whitespace is collapsed first, then digit/letter look-alike
//! corrections (`O`->`0`, `I`/`l`->`1`, `S`->`5`, `B`->`8`) are applied
//! inside independently gated span classes: tax-ID shapes, monetary
//! values and 44-digit access keys. There is no generic substitution
//! pass; a blanket replace would corrupt free-text fields like names.

use lazy_static::lazy_static;
use regex::{Captures, Regex};

lazy_static! {
    static ref HYPHEN_LINEBREAK: Regex = Regex::new(r"-\s*\n\s*").unwrap();
    static ref MULTI_WHITESPACE: Regex = Regex::new(r"\s+").unwrap();
    static ref SPACE_BEFORE_PUNCT: Regex = Regex::new(r"\s+([,.:;!?])").unwrap();

    // Span gates. Each admits the look-alike letters in digit positions
    // so a partially garbled identifier still matches its shape.
    static ref CNPJ_SHAPE: Regex = Regex::new(
        r"\b[0-9OoIlSB]{2}\.?[0-9OoIlSB]{3}\.?[0-9OoIlSB]{3}/?[0-9OoIlSB]{4}-?[0-9OoIlSB]{2}\b"
    )
    .unwrap();
    static ref CPF_SHAPE: Regex = Regex::new(
        r"\b[0-9OoIlSB]{3}\.?[0-9OoIlSB]{3}\.?[0-9OoIlSB]{3}-?[0-9OoIlSB]{2}\b"
    )
    .unwrap();
    static ref MONEY_SHAPE: Regex = Regex::new(
        r"\b[0-9OoIlSB]{1,3}(?:[.\s][0-9OoIlSB]{3})*,[0-9OoIlSB]{2}\b"
    )
    .unwrap();
    static ref ACCESS_KEY_SHAPE: Regex = Regex::new(
        r"\b(?:[0-9OoIlSB]{4}\s?){10}[0-9OoIlSB]{4}\b"
    )
    .unwrap();
}

/// Cleans up fused OCR text ahead of field extraction.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextNormalizer;

impl TextNormalizer {
    pub fn new() -> Self {
        Self
    }

    /// Collapse whitespace, then correct look-alike characters inside
    /// tax-ID, monetary and access-key spans only.
    pub fn normalize(&self, text: &str) -> String {
        let text = self.collapse_whitespace(text);
        let text = correct_gated(&CNPJ_SHAPE, &text);
        let text = correct_gated(&CPF_SHAPE, &text);
        let text = correct_gated(&MONEY_SHAPE, &text);
        correct_gated(&ACCESS_KEY_SHAPE, &text)
    }

    /// Collapse runs of spaces/newlines to single spaces and repair
    /// hyphenated line breaks.
    pub fn collapse_whitespace(&self, text: &str) -> String {
        let text = HYPHEN_LINEBREAK.replace_all(text, "");
        let text = MULTI_WHITESPACE.replace_all(&text, " ");
        let text = SPACE_BEFORE_PUNCT.replace_all(&text, "$1");
        text.trim().to_string()
    }
}

/// Replace look-alikes inside a matched span, but only when the span is
/// anchored by digits (at least as many digits as look-alike letters);
/// an all-letter match is left untouched.
fn correct_gated(gate: &Regex, text: &str) -> String {
    gate.replace_all(text, |caps: &Captures| {
        let span = &caps[0];
        if digit_anchored(span) {
            map_lookalikes(span)
        } else {
            span.to_string()
        }
    })
    .into_owned()
}

fn digit_anchored(span: &str) -> bool {
    let digits = span.chars().filter(|c| c.is_ascii_digit()).count();
    let lookalikes = span
        .chars()
        .filter(|c| matches!(c, 'O' | 'o' | 'I' | 'l' | 'S' | 'B'))
        .count();
    digits > 0 && digits >= lookalikes
}

fn map_lookalikes(span: &str) -> String {
    span.chars()
        .map(|c| match c {
            'O' | 'o' => '0',
            'I' | 'l' => '1',
            'S' => '5',
            'B' => '8',
            other => other,
        })
        .collect()
}
