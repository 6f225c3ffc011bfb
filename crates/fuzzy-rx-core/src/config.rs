//! Extraction configuration.
//!
//! Everything the pipeline would otherwise hard-code (similarity threshold,
//! candidate pool size, doctor label markers) lives here and is passed into
//! the constructors.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Minimum token-sort similarity for a detected drug.
pub const DEFAULT_THRESHOLD: f64 = 50.0;

/// Raw candidates scored per requested match.
pub const DEFAULT_CANDIDATE_MULTIPLIER: usize = 5;

/// Matches kept per OCR line.
pub const DEFAULT_LINE_MATCH_LIMIT: usize = 1;

/// Normalized lines must be longer than this to be matched.
pub const DEFAULT_MIN_LINE_CHARS: usize = 3;

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("Invalid doctor marker pattern: {0}")]
    Pattern(#[from] regex::Error),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Labels that introduce a doctor's name on a prescription header.
///
/// Order matters: earlier markers win when several could match at the same
/// position, so longer forms such as `dr.` precede `dr`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DoctorMarkers {
    /// Matched case-sensitively, checked first
    pub arabic: Vec<String>,
    /// Matched case-insensitively
    pub english: Vec<String>,
}

impl Default for DoctorMarkers {
    fn default() -> Self {
        Self {
            arabic: vec!["دكتور".into(), "الدكتور".into(), "د.".into(), "د".into()],
            english: vec!["dr.".into(), "dr".into(), "doctor".into()],
        }
    }
}

/// Tunables for the extraction pipeline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ExtractorConfig {
    /// Minimum similarity score (0-100) for fuzzy matches
    pub threshold: f64,
    /// Raw candidate pool is `limit * candidate_multiplier`
    pub candidate_multiplier: usize,
    /// Matches requested per OCR line
    pub line_match_limit: usize,
    /// Lines whose normalized length is not above this are ignored
    pub min_line_chars: usize,
    /// Doctor label markers
    pub doctor_markers: DoctorMarkers,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            candidate_multiplier: DEFAULT_CANDIDATE_MULTIPLIER,
            line_match_limit: DEFAULT_LINE_MATCH_LIMIT,
            min_line_chars: DEFAULT_MIN_LINE_CHARS,
            doctor_markers: DoctorMarkers::default(),
        }
    }
}

impl ExtractorConfig {
    /// Check that all values are usable.
    pub fn validate(&self) -> ConfigResult<()> {
        if !(0.0..=100.0).contains(&self.threshold) {
            return Err(ConfigError::InvalidValue {
                field: "threshold",
                reason: format!("{} is outside 0-100", self.threshold),
            });
        }

        if self.candidate_multiplier == 0 {
            return Err(ConfigError::InvalidValue {
                field: "candidate_multiplier",
                reason: "must be at least 1".into(),
            });
        }

        if self.line_match_limit == 0 {
            return Err(ConfigError::InvalidValue {
                field: "line_match_limit",
                reason: "must be at least 1".into(),
            });
        }

        validate_markers("doctor_markers.arabic", &self.doctor_markers.arabic)?;
        validate_markers("doctor_markers.english", &self.doctor_markers.english)?;

        Ok(())
    }
}

fn validate_markers(field: &'static str, markers: &[String]) -> ConfigResult<()> {
    if markers.is_empty() {
        return Err(ConfigError::InvalidValue {
            field,
            reason: "at least one marker is required".into(),
        });
    }
    if markers.iter().any(|m| m.trim().is_empty()) {
        return Err(ConfigError::InvalidValue {
            field,
            reason: "markers must not be blank".into(),
        });
    }
    Ok(())
}
