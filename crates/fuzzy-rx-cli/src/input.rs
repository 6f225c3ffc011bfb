//! Loading the catalog, configuration and prescription records.

use std::fs;
use std::io::BufRead;
use std::path::Path;

use fuzzy_rx_core::config::ConfigError;
use fuzzy_rx_core::models::{CatalogError, DrugCatalog, PrescriptionRecord};
use fuzzy_rx_core::ExtractorConfig;
use thiserror::Error;
use tracing::{info, warn};

/// Input errors.
#[derive(Error, Debug)]
pub enum InputError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    #[error("Config file error: {0}")]
    ConfigFile(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),
}

pub type InputResult<T> = Result<T, InputError>;

/// How a catalog file is laid out, chosen by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogFormat {
    /// Spreadsheet export with a name column
    Csv,
    /// JSON array of names
    Json,
    /// One name per line
    Lines,
}

impl CatalogFormat {
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
            .as_deref()
        {
            Some("csv") => CatalogFormat::Csv,
            Some("json") => CatalogFormat::Json,
            _ => CatalogFormat::Lines,
        }
    }
}

/// Load the drug catalog; `column` applies to CSV files only.
pub fn load_catalog(path: &Path, column: &str) -> InputResult<DrugCatalog> {
    let format = CatalogFormat::from_path(path);
    let catalog = match format {
        CatalogFormat::Csv => DrugCatalog::load_csv(path, column)?,
        CatalogFormat::Json => DrugCatalog::load_json(path)?,
        CatalogFormat::Lines => DrugCatalog::load_lines(path)?,
    };
    info!(path = %path.display(), ?format, entries = catalog.len(), "loaded drug catalog");
    Ok(catalog)
}

/// Read configuration from an optional TOML file, then apply flag overrides.
pub fn load_config(path: Option<&Path>, threshold: Option<f64>) -> InputResult<ExtractorConfig> {
    let mut config = match path {
        Some(path) => toml::from_str(&fs::read_to_string(path)?)?,
        None => ExtractorConfig::default(),
    };

    if let Some(threshold) = threshold {
        config.threshold = threshold;
    }

    config.validate()?;
    Ok(config)
}

/// Read JSON-lines prescription records.
///
/// Blank lines are ignored. A line that is not a record is kept as an empty
/// record so positional ids still line up, and is reported.
pub fn read_records<R: BufRead>(reader: R) -> InputResult<Vec<PrescriptionRecord>> {
    let mut records = Vec::new();

    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        match serde_json::from_str::<PrescriptionRecord>(&line) {
            Ok(record) => records.push(record),
            Err(e) => {
                warn!(line = index + 1, error = %e, "unreadable record; treating as empty");
                records.push(PrescriptionRecord::default());
            }
        }
    }

    Ok(records)
}
