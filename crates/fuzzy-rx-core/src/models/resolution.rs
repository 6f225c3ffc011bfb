//! Drug resolution models produced by the extraction pipeline.

use serde::{Deserialize, Serialize};

/// Score assigned to confirmed drugs and exact substring matches.
pub const CONFIRMED_SCORE: f64 = 100.0;

/// A drug name with its match confidence.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DrugCandidate {
    /// Canonical drug name
    pub name: String,
    /// Confidence score (0.0 - 100.0); 100.0 means confirmed
    pub score: f64,
}

impl DrugCandidate {
    pub fn new(name: impl Into<String>, score: f64) -> Self {
        Self {
            name: name.into(),
            score,
        }
    }

    /// A drug taken from a labeled source at full confidence.
    pub fn confirmed(name: impl Into<String>) -> Self {
        Self::new(name, CONFIRMED_SCORE)
    }

    pub fn is_confirmed(&self) -> bool {
        self.score == CONFIRMED_SCORE
    }
}

/// How a result was assembled. Not part of the serialized output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Provenance {
    /// Drugs came from the labeled confirmed-drug field
    pub confirmed: bool,
    /// A non-empty OCR text was available
    pub text_extracted: bool,
    /// Detected drugs were dropped in favour of confirmed ones
    pub mixed_resolved: bool,
}

/// Drugs and doctor extracted from one prescription record.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ExtractionResult {
    /// Resolved drugs, best first for detected lines
    pub drugs: Vec<DrugCandidate>,
    /// Prescribing doctor, when a label was found in the text
    pub doctor_name: Option<String>,
    #[serde(skip)]
    pub provenance: Provenance,
}

impl ExtractionResult {
    /// Result for a record nothing could be extracted from.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn has_drugs(&self) -> bool {
        !self.drugs.is_empty()
    }

    /// Drug names joined for display, e.g. "Panadol, Brufen".
    pub fn drug_names(&self) -> String {
        self.drugs
            .iter()
            .map(|d| d.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Keep only confirmed entries when a list mixes confirmed and detected drugs.
///
/// Lists that are uniformly confirmed or uniformly detected come back
/// unchanged. The flag reports whether anything was dropped.
pub fn resolve_mixed_confidence(drugs: Vec<DrugCandidate>) -> (Vec<DrugCandidate>, bool) {
    let has_confirmed = drugs.iter().any(DrugCandidate::is_confirmed);
    let has_detected = drugs.iter().any(|d| d.score < CONFIRMED_SCORE);

    if has_confirmed && has_detected {
        let kept = drugs.into_iter().filter(DrugCandidate::is_confirmed).collect();
        (kept, true)
    } else {
        (drugs, false)
    }
}
