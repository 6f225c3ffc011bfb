//! Drug name resolution for scanned prescriptions.
//!
//! Pipeline: Confirmed drugs → OCR text → Doctor extraction → Line scan → Fuzzy match

mod doctor;
mod fields;
mod literal;
mod matcher;
mod normalizer;

pub use doctor::*;
pub use fields::*;
pub use literal::parse_literal;
pub use matcher::*;
pub use normalizer::*;

use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, trace, warn};

use crate::config::{ConfigError, ExtractorConfig};
use crate::models::{
    resolve_mixed_confidence, DrugCandidate, DrugCatalog, ExtractionResult, PrescriptionRecord,
    Provenance,
};

/// Field decoding errors. Always recovered where they occur.
#[derive(Error, Debug)]
pub enum FieldParseError {
    #[error("JSON decode error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Literal decode error at {position}: {message}")]
    Literal { position: usize, message: String },

    #[error("Expected {expected}, found {found}")]
    UnexpectedShape {
        expected: &'static str,
        found: &'static str,
    },
}

pub type FieldResult<T> = Result<T, FieldParseError>;

/// Pipeline errors.
#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("Invalid record: {0}")]
    InvalidRecord(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

pub type PipelineResult<T> = Result<T, ExtractError>;

/// Per-record extraction over a shared catalog.
///
/// Stateless between records; one instance can serve any number of threads.
#[derive(Debug)]
pub struct ExtractionPipeline {
    config: ExtractorConfig,
    normalizer: TextNormalizer,
    doctor: DoctorNameExtractor,
    matcher: FuzzyMatcher,
    confirmed: ConfirmedDrugExtractor,
    text_fields: TextFieldExtractor,
}

impl ExtractionPipeline {
    /// Create a pipeline, validating `config`.
    pub fn new(catalog: Arc<DrugCatalog>, config: ExtractorConfig) -> PipelineResult<Self> {
        config.validate()?;

        Ok(Self {
            normalizer: TextNormalizer::new(),
            doctor: DoctorNameExtractor::new(&config.doctor_markers)?,
            matcher: FuzzyMatcher::new(catalog, &config),
            confirmed: ConfirmedDrugExtractor::default(),
            text_fields: TextFieldExtractor::default(),
            config,
        })
    }

    /// Create a pipeline with default thresholds and markers.
    pub fn with_defaults(catalog: Arc<DrugCatalog>) -> PipelineResult<Self> {
        Self::new(catalog, ExtractorConfig::default())
    }

    /// Extract drugs and doctor from a typed record.
    pub fn process(&self, record: &PrescriptionRecord) -> ExtractionResult {
        // Step 1: Labeled drugs take precedence over anything in the text
        let confirmed = self.confirmed.extract(&record.confirmed_drugs);
        let from_confirmed = !confirmed.is_empty();

        // Step 2: Prefer whichever OCR field carries more text
        let text = self.working_text(record);

        // Step 3: Doctor header
        let doctor_name = if text.is_empty() {
            None
        } else {
            self.doctor.extract(&text)
        };

        // Step 4: Line scan only when nothing was labeled
        let drugs = if from_confirmed {
            confirmed
        } else {
            self.scan_lines(&text, doctor_name.as_deref())
        };

        // Step 5: Never mix confirmed and detected drugs
        let (drugs, mixed_resolved) = resolve_mixed_confidence(drugs);
        if mixed_resolved {
            warn!(
                record = record.id.as_deref().unwrap_or("-"),
                "record had confirmed and detected drugs; keeping confirmed only"
            );
        }

        ExtractionResult {
            drugs,
            doctor_name,
            provenance: Provenance {
                confirmed: from_confirmed,
                text_extracted: !text.is_empty(),
                mixed_resolved,
            },
        }
    }

    /// Extract from an untyped record; malformed records yield an empty result.
    pub fn process_value(&self, record: &Value) -> ExtractionResult {
        self.recover(self.try_process_value(record))
    }

    /// Extract from a JSON-encoded record; malformed records yield an empty result.
    pub fn process_json(&self, record: &str) -> ExtractionResult {
        self.recover(self.try_process_json(record))
    }

    pub fn try_process_value(&self, record: &Value) -> PipelineResult<ExtractionResult> {
        let record = PrescriptionRecord::deserialize(record)?;
        Ok(self.process(&record))
    }

    pub fn try_process_json(&self, record: &str) -> PipelineResult<ExtractionResult> {
        let record: PrescriptionRecord = serde_json::from_str(record)?;
        Ok(self.process(&record))
    }

    /// Top catalog matches for free text, normalized first.
    pub fn match_text(&self, text: &str, limit: usize) -> Vec<DrugCandidate> {
        self.matcher.top_matches(&self.normalizer.normalize(text), limit)
    }

    fn recover(&self, result: PipelineResult<ExtractionResult>) -> ExtractionResult {
        result.unwrap_or_else(|e| {
            warn!(error = %e, "record extraction failed; returning empty result");
            ExtractionResult::empty()
        })
    }

    fn working_text(&self, record: &PrescriptionRecord) -> String {
        let full_text = self.text_fields.extract_text(&record.full_text_annotation);
        let annotations = self.text_fields.extract_text(&record.text_annotations);

        if full_text.chars().count() > annotations.chars().count() {
            full_text
        } else {
            annotations
        }
    }

    fn scan_lines(&self, text: &str, doctor_name: Option<&str>) -> Vec<DrugCandidate> {
        let mut drugs = Vec::new();

        for line in text.split('\n') {
            if self.doctor.is_header_line(line, doctor_name) {
                trace!(line, "skipping header line");
                continue;
            }

            let clean = self.normalizer.normalize(line);
            if clean.chars().count() <= self.config.min_line_chars {
                continue;
            }

            for candidate in self.matcher.top_matches(&clean, self.config.line_match_limit) {
                if candidate.score >= self.config.threshold {
                    debug!(line = %clean, drug = %candidate.name, score = candidate.score, "matched drug");
                    drugs.push(candidate);
                }
            }
        }

        drugs
    }

    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    pub fn normalizer(&self) -> &TextNormalizer {
        &self.normalizer
    }

    pub fn doctor_extractor(&self) -> &DoctorNameExtractor {
        &self.doctor
    }

    pub fn matcher(&self) -> &FuzzyMatcher {
        &self.matcher
    }
}
