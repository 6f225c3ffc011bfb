//! Fuzzy-Rx Core Library
//!
//! Drug-name resolution for scanned pharmacy prescriptions.
//!
//! # Architecture
//!
//! ```text
//!   confirmedDrugs field ──► Decoder chain (JSON → literal) ──► confirmed drugs (score 100)
//!                                                                       │
//!   fullTextAnnotation ─┐                                               │ none?
//!                       ├─► longer text ─► Doctor extraction            ▼
//!   textAnnotations ────┘                        │               Line scan
//!                                                │          (skip header lines,
//!                                                │           normalize, match)
//!                                                │                      │
//!                                                ▼                      ▼
//!                                         ExtractionResult { drugs, doctor_name }
//! ```
//!
//! # Modules
//!
//! - [`models`]: Domain types (DrugCatalog, DrugCandidate, PrescriptionRecord, ExtractionResult)
//! - [`resolver`]: Normalizer, doctor extractor, fuzzy matcher, field decoders, pipeline
//! - [`batch`]: Batch runs with processing summary and doctor insights
//! - [`config`]: Thresholds and doctor label markers

pub mod batch;
pub mod config;
pub mod models;
pub mod resolver;

// Re-export commonly used types
pub use batch::{BatchOutput, BatchProcessor, BatchReport, DoctorInsight, ProcessingSummary};
pub use config::{DoctorMarkers, ExtractorConfig};
pub use models::{DrugCandidate, DrugCatalog, ExtractionResult, PrescriptionRecord};
pub use resolver::{DoctorNameExtractor, ExtractionPipeline, FuzzyMatcher, TextNormalizer};

// UniFFI setup - using proc macros
uniffi::setup_scaffolding!();

use std::sync::Arc;

// =========================================================================
// FFI Error Type
// =========================================================================

#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum FuzzyRxError {
    #[error("Catalog error: {0}")]
    CatalogError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl From<models::CatalogError> for FuzzyRxError {
    fn from(e: models::CatalogError) -> Self {
        FuzzyRxError::CatalogError(e.to_string())
    }
}

impl From<config::ConfigError> for FuzzyRxError {
    fn from(e: config::ConfigError) -> Self {
        FuzzyRxError::ConfigError(e.to_string())
    }
}

impl From<resolver::ExtractError> for FuzzyRxError {
    fn from(e: resolver::ExtractError) -> Self {
        match e {
            resolver::ExtractError::Config(inner) => inner.into(),
            other => FuzzyRxError::InvalidInput(other.to_string()),
        }
    }
}

// =========================================================================
// Factory Functions (exported to FFI)
// =========================================================================

/// Create an engine over an in-memory list of canonical drug names.
#[uniffi::export]
pub fn create_engine(
    catalog_names: Vec<String>,
    config: Option<FfiExtractorConfig>,
) -> Result<Arc<FuzzyRxEngine>, FuzzyRxError> {
    let catalog = DrugCatalog::new(catalog_names);
    if catalog.is_empty() {
        return Err(models::CatalogError::Empty.into());
    }
    build_engine(catalog, config)
}

/// Create an engine from a CSV catalog file.
#[uniffi::export]
pub fn create_engine_from_csv(
    path: String,
    column: Option<String>,
    config: Option<FfiExtractorConfig>,
) -> Result<Arc<FuzzyRxEngine>, FuzzyRxError> {
    let column = column.unwrap_or_else(|| models::DEFAULT_NAME_COLUMN.to_string());
    let catalog = DrugCatalog::load_csv(&path, &column)?;
    build_engine(catalog, config)
}

fn build_engine(
    catalog: DrugCatalog,
    config: Option<FfiExtractorConfig>,
) -> Result<Arc<FuzzyRxEngine>, FuzzyRxError> {
    let config = config.map(ExtractorConfig::from).unwrap_or_default();
    let pipeline = ExtractionPipeline::new(Arc::new(catalog), config)?;
    Ok(Arc::new(FuzzyRxEngine { pipeline }))
}

// =========================================================================
// Main API Object
// =========================================================================

/// Shareable extraction engine for FFI. Immutable once built.
#[derive(uniffi::Object)]
pub struct FuzzyRxEngine {
    pipeline: ExtractionPipeline,
}

#[uniffi::export]
impl FuzzyRxEngine {
    /// Extract drugs and doctor from a JSON-encoded prescription record.
    ///
    /// Malformed records produce an empty result rather than an error.
    pub fn process_record_json(&self, record_json: String) -> FfiExtractionResult {
        self.pipeline.process_json(&record_json).into()
    }

    /// Extract drugs and doctor from raw OCR text.
    pub fn process_text(&self, text: String) -> FfiExtractionResult {
        self.pipeline
            .process(&PrescriptionRecord::from_text(text))
            .into()
    }

    /// Best catalog matches for free text.
    pub fn top_matches(&self, query: String, limit: u32) -> Vec<FfiDrugCandidate> {
        self.pipeline
            .match_text(&query, limit as usize)
            .into_iter()
            .map(|c| c.into())
            .collect()
    }

    /// Doctor name from a prescription header, if labeled.
    pub fn extract_doctor_name(&self, text: String) -> Option<String> {
        self.pipeline.doctor_extractor().extract(&text)
    }

    /// Normalize text the way the matcher sees it.
    pub fn normalize_text(&self, text: String) -> String {
        self.pipeline.normalizer().normalize(&text)
    }

    /// Number of catalog entries.
    pub fn catalog_len(&self) -> u32 {
        saturating_u32(self.pipeline.matcher().catalog().len())
    }
}

// =========================================================================
// FFI Types
// =========================================================================

/// FFI-safe drug candidate.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiDrugCandidate {
    pub name: String,
    pub score: f64,
    pub confirmed: bool,
}

impl From<DrugCandidate> for FfiDrugCandidate {
    fn from(candidate: DrugCandidate) -> Self {
        Self {
            confirmed: candidate.is_confirmed(),
            name: candidate.name,
            score: candidate.score,
        }
    }
}

/// FFI-safe extraction result.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiExtractionResult {
    pub drugs: Vec<FfiDrugCandidate>,
    pub doctor_name: Option<String>,
}

impl From<ExtractionResult> for FfiExtractionResult {
    fn from(result: ExtractionResult) -> Self {
        Self {
            drugs: result.drugs.into_iter().map(|d| d.into()).collect(),
            doctor_name: result.doctor_name,
        }
    }
}

/// FFI-safe extractor configuration.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiExtractorConfig {
    pub threshold: f64,
    pub candidate_multiplier: u32,
    pub line_match_limit: u32,
    pub min_line_chars: u32,
    pub arabic_markers: Vec<String>,
    pub english_markers: Vec<String>,
}

impl From<FfiExtractorConfig> for ExtractorConfig {
    fn from(config: FfiExtractorConfig) -> Self {
        ExtractorConfig {
            threshold: config.threshold,
            candidate_multiplier: config.candidate_multiplier as usize,
            line_match_limit: config.line_match_limit as usize,
            min_line_chars: config.min_line_chars as usize,
            doctor_markers: DoctorMarkers {
                arabic: config.arabic_markers,
                english: config.english_markers,
            },
        }
    }
}

impl From<ExtractorConfig> for FfiExtractorConfig {
    fn from(config: ExtractorConfig) -> Self {
        Self {
            threshold: config.threshold,
            candidate_multiplier: saturating_u32(config.candidate_multiplier),
            line_match_limit: saturating_u32(config.line_match_limit),
            min_line_chars: saturating_u32(config.min_line_chars),
            arabic_markers: config.doctor_markers.arabic,
            english_markers: config.doctor_markers.english,
        }
    }
}

fn saturating_u32(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}

/// Default configuration, for callers that want to tweak one field.
#[uniffi::export]
pub fn default_extractor_config() -> FfiExtractorConfig {
    ExtractorConfig::default().into()
}
