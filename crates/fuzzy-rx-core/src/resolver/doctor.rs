//! Doctor name extraction from prescription headers.
//!
//! A prescription header usually reads `Dr. <name>` or `د. <name>`. Arabic
//! labels are tried before English ones, and for each script a terminated
//! pattern (name ends at newline, period or comma) is tried before the
//! rest-of-line fallback.

use regex::Regex;
use unicode_normalization::UnicodeNormalization;

use crate::config::{ConfigResult, DoctorMarkers};

/// One compiled label pattern and the trailing-noise rule for its script.
#[derive(Debug, Clone)]
struct LabelPattern {
    pattern: Regex,
    trailing_noise: Regex,
}

/// Pattern-based doctor name extractor.
#[derive(Debug, Clone)]
pub struct DoctorNameExtractor {
    patterns: Vec<LabelPattern>,
    arabic_markers: Vec<String>,
    english_markers: Vec<String>,
}

impl DoctorNameExtractor {
    /// Compile patterns for the given marker sets.
    pub fn new(markers: &DoctorMarkers) -> ConfigResult<Self> {
        let arabic = alternation(&markers.arabic);
        let english = alternation(&markers.english);

        let arabic_noise = Regex::new(r"[^\w\s\x{0600}-\x{06FF}]+$")?;
        let english_noise = Regex::new(r"[^\w\s]+$")?;

        let patterns = vec![
            LabelPattern {
                pattern: Regex::new(&format!(r"(?:{arabic})\s*([^\n][^\n.,]*)"))?,
                trailing_noise: arabic_noise.clone(),
            },
            LabelPattern {
                pattern: Regex::new(&format!(r"(?:{arabic})\s*([^\n]+)"))?,
                trailing_noise: arabic_noise,
            },
            LabelPattern {
                pattern: Regex::new(&format!(r"(?i)(?:{english})\s*([^\n][^\n.,]*)"))?,
                trailing_noise: english_noise.clone(),
            },
            LabelPattern {
                pattern: Regex::new(&format!(r"(?i)(?:{english})\s*([^\n]+)"))?,
                trailing_noise: english_noise,
            },
        ];

        Ok(Self {
            patterns,
            arabic_markers: markers.arabic.clone(),
            english_markers: markers.english.iter().map(|m| m.to_lowercase()).collect(),
        })
    }

    /// Extract the doctor's name, or `None` when no label is present.
    pub fn extract(&self, text: &str) -> Option<String> {
        if text.is_empty() {
            return None;
        }

        let text: String = text.nfc().collect();

        for label in &self.patterns {
            if let Some(captures) = label.pattern.captures(&text) {
                let raw = captures.get(1)?.as_str().trim();
                let name = label.trailing_noise.replace(raw, "");
                // "Ahmed Hassan !!" leaves a space before the stripped noise;
                // drop it so the name matches header lines by substring
                let name = name.trim_end();
                return if name.is_empty() {
                    None
                } else {
                    Some(name.to_string())
                };
            }
        }

        None
    }

    /// Whether a line belongs to the header/signature rather than the drug list.
    ///
    /// True when the line contains the detected doctor name or any label
    /// marker. Arabic markers compare case-sensitively, English ones ignore
    /// case.
    pub fn is_header_line(&self, line: &str, doctor_name: Option<&str>) -> bool {
        if let Some(name) = doctor_name {
            if !name.is_empty() && line.contains(name) {
                return true;
            }
        }

        if self.arabic_markers.iter().any(|m| line.contains(m.as_str())) {
            return true;
        }

        let lower = line.to_lowercase();
        self.english_markers.iter().any(|m| lower.contains(m.as_str()))
    }
}

fn alternation(markers: &[String]) -> String {
    markers
        .iter()
        .map(|m| regex::escape(m))
        .collect::<Vec<_>>()
        .join("|")
}
