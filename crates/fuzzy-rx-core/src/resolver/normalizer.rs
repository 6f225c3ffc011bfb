//! OCR text normalizer.
//!
//! Handles:
//! - Unicode NFC composition (Arabic glyph sequences compare equal)
//! - Noise stripping (keeps word characters, whitespace, Arabic block)
//! - Whitespace collapsing and lower-casing

use serde_json::Value;
use unicode_normalization::UnicodeNormalization;

/// Arabic Unicode block kept verbatim, including its punctuation and marks.
const ARABIC_BLOCK: std::ops::RangeInclusive<char> = '\u{0600}'..='\u{06FF}';

/// Normalizer for mixed Arabic/Latin OCR lines.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextNormalizer;

impl TextNormalizer {
    pub fn new() -> Self {
        Self
    }

    /// Normalize a line of text for matching.
    pub fn normalize(&self, text: &str) -> String {
        let lowered = text.nfc().collect::<String>().to_lowercase();

        let kept: String = lowered.chars().filter(|c| Self::is_kept(*c)).collect();

        // Dropping noise can bring a base letter next to a combining mark,
        // so compose once more to keep the output a fixed point.
        kept.split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .nfc()
            .collect()
    }

    /// Normalize an untyped value; anything but a string yields "".
    pub fn normalize_value(&self, value: &Value) -> String {
        match value {
            Value::String(s) => self.normalize(s),
            _ => String::new(),
        }
    }

    /// Word characters (alphanumerics and `_`), whitespace, Arabic block.
    fn is_kept(c: char) -> bool {
        c.is_alphanumeric() || c == '_' || c.is_whitespace() || ARABIC_BLOCK.contains(&c)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_strips_noise_and_lowercases() {
        let normalizer = TextNormalizer::new();

        assert_eq!(normalizer.normalize("Panadol-Extra (500mg)!"), "panadolextra 500mg");
        assert_eq!(normalizer.normalize("  Brufen   400\t mg  "), "brufen 400 mg");
        assert_eq!(normalizer.normalize("***"), "");
        assert_eq!(normalizer.normalize(""), "");
    }

    #[test]
    fn test_keeps_underscore() {
        let normalizer = TextNormalizer::new();

        assert_eq!(normalizer.normalize("Co_Amoxiclav 625!"), "co_amoxiclav 625");
        assert_eq!(normalizer.normalize("__"), "__");
    }

    #[test]
    fn test_keeps_arabic() {
        let normalizer = TextNormalizer::new();

        assert_eq!(normalizer.normalize("بانادول  اكسترا"), "بانادول اكسترا");
        // Arabic comma lives inside the block and survives
        assert_eq!(normalizer.normalize("كونكور، 5"), "كونكور، 5");
        assert_eq!(normalizer.normalize("Concor كونكور 5mg."), "concor كونكور 5mg");
    }

    #[test]
    fn test_nfc_composition() {
        let normalizer = TextNormalizer::new();

        // alef + madda above composes to alef with madda
        assert_eq!(normalizer.normalize("\u{0627}\u{0653}"), "\u{0622}");
        // decomposed e + acute composes to é
        assert_eq!(normalizer.normalize("Caf\u{0065}\u{0301}"), "café");
    }

    #[test]
    fn test_non_string_value() {
        let normalizer = TextNormalizer::new();

        assert_eq!(normalizer.normalize_value(&Value::Null), "");
        assert_eq!(normalizer.normalize_value(&serde_json::json!(42)), "");
        assert_eq!(normalizer.normalize_value(&serde_json::json!("Dr. X")), "dr x");
    }

    proptest! {
        #[test]
        fn prop_normalize_idempotent(text in "[a-zA-Z0-9 \t\n.,;:!?()\\-\u{0600}-\u{06FF}\u{0300}-\u{0310}]{0,48}") {
            let normalizer = TextNormalizer::new();
            let once = normalizer.normalize(&text);
            prop_assert_eq!(normalizer.normalize(&once), once.clone());
        }

        #[test]
        fn prop_output_is_collapsed(text in "\\PC{0,48}") {
            let normalized = TextNormalizer::new().normalize(&text);
            prop_assert!(!normalized.contains("  "));
            prop_assert_eq!(normalized.trim(), normalized.as_str());
        }
    }
}
