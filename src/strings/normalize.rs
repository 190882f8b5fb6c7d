//! Base64 unwrapping of extracted strings.
//!
//! A string is decoded repeatedly while each layer still yields printable
//! text. The innermost printable layer replaces the original only when it is
//! longer than [`MIN_DECODED_LEN`] characters. Every successful decode
//! strictly shrinks its input, so nested or adversarial inputs terminate.

use tracing::trace;

use super::base64;
use crate::core::{StringEncoding, StringLiteral};

/// Decoded text must be longer than this to replace the original.
pub const MIN_DECODED_LEN: usize = 3;

/// Printable text: ASCII 0x20..=0x7e plus any non-ASCII scalar.
pub fn is_printable(s: &str) -> bool {
    s.chars()
        .all(|c| if c.is_ascii() { (' '..='~').contains(&c) } else { !c.is_control() })
}

fn printable_text(bytes: Vec<u8>) -> Option<String> {
    let text = String::from_utf8(bytes).ok()?;
    is_printable(&text).then_some(text)
}

/// Innermost printable decoding of `s`, if any layer decodes.
pub fn decode_nested(s: &str) -> Option<String> {
    let mut best: Option<String> = None;
    loop {
        let current = best.as_deref().unwrap_or(s);
        match base64::decode(current).and_then(printable_text) {
            Some(text) => best = Some(text),
            None => break,
        }
    }
    best
}

/// Rewrite one string in place. Returns `true` if it changed.
pub fn normalize_string(lit: &mut StringLiteral) -> bool {
    match decode_nested(&lit.value) {
        Some(text) if text.chars().count() > MIN_DECODED_LEN => {
            trace!(from = %lit.value, to = %text, "unwrapped base64 string");
            lit.length = text.chars().count() as u32;
            lit.value = text;
            lit.encoding = StringEncoding::Base64;
            true
        }
        _ => false,
    }
}

/// Rewrite every base64 string of a list. Returns how many changed.
pub fn normalize_strings(strings: &mut [StringLiteral]) -> usize {
    strings
        .iter_mut()
        .map(normalize_string)
        .filter(|&changed| changed)
        .count()
}
