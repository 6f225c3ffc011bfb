//! Batch runner for prescription drug extraction.
//!
//! Loads a drug catalog and a JSON-lines file of scanned prescription
//! records, resolves every record, and writes the included results plus an
//! optional doctor insight table.

pub mod input;
pub mod output;

pub use input::*;
pub use output::*;

use std::fs::File;
use std::io::{self, BufReader, BufWriter};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use fuzzy_rx_core::models::DEFAULT_NAME_COLUMN;
use fuzzy_rx_core::{BatchProcessor, BatchReport, ExtractionPipeline};
use tracing::info;

/// Everything one run needs.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub catalog: PathBuf,
    pub column: String,
    pub records: PathBuf,
    pub output: Option<PathBuf>,
    pub doctors: Option<PathBuf>,
    pub config: Option<PathBuf>,
    pub threshold: Option<f64>,
}

impl RunOptions {
    pub fn new(catalog: impl Into<PathBuf>, records: impl Into<PathBuf>) -> Self {
        Self {
            catalog: catalog.into(),
            column: DEFAULT_NAME_COLUMN.to_string(),
            records: records.into(),
            output: None,
            doctors: None,
            config: None,
            threshold: None,
        }
    }
}

/// Run a batch end to end and return its report.
pub fn run(options: &RunOptions) -> anyhow::Result<BatchReport> {
    let config = load_config(options.config.as_deref(), options.threshold)
        .context("failed to load configuration")?;

    let catalog = load_catalog(&options.catalog, &options.column)
        .with_context(|| format!("failed to load catalog {}", options.catalog.display()))?;

    let pipeline = ExtractionPipeline::new(Arc::new(catalog), config)
        .context("failed to build extraction pipeline")?;

    let file = File::open(&options.records)
        .with_context(|| format!("failed to open records {}", options.records.display()))?;
    let records = read_records(BufReader::new(file)).context("failed to read records")?;

    let report = BatchProcessor::new(&pipeline).run(&records);

    match &options.output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            write_outputs(BufWriter::new(file), &report.outputs)?;
            info!(path = %path.display(), outputs = report.outputs.len(), "wrote results");
        }
        None => write_outputs(io::stdout().lock(), &report.outputs)?,
    }

    if let Some(path) = &options.doctors {
        let file =
            File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
        write_doctor_insights(BufWriter::new(file), &report.doctor_insights())?;
        info!(path = %path.display(), "wrote doctor insights");
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_run_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = dir.path().join("drugs.csv");
        let records = dir.path().join("records.jsonl");
        let output = dir.path().join("out.jsonl");
        let doctors = dir.path().join("doctors.csv");

        fs::write(&catalog, "Name\nParacetamol 500mg\nAugmentin 1g\n").unwrap();
        fs::write(
            &records,
            concat!(
                "{\"id\": \"A1\", \"fullTextAnnotation\": {\"text\": \"Dr. Ahmed Hassan\\nParacetmol 500\\n\"}}\n",
                "{\"confirmedDrugs\": \"[{\\\"name\\\": \\\"Ibuprofen\\\"}]\"}\n",
                "{\"fullTextAnnotation\": \"nothing useful\"}\n",
            ),
        )
        .unwrap();

        let options = RunOptions {
            output: Some(output.clone()),
            doctors: Some(doctors.clone()),
            ..RunOptions::new(&catalog, &records)
        };
        let report = run(&options).unwrap();

        assert_eq!(report.summary.total_records, 3);
        assert_eq!(report.summary.included_records, 2);
        assert_eq!(report.summary.skipped_no_drugs, 1);

        let written = fs::read_to_string(&output).unwrap();
        let lines: Vec<serde_json::Value> = written
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["prescription_id"], "A1");
        assert_eq!(lines[0]["drugs"][0]["name"], "Paracetamol 500mg");
        assert_eq!(lines[1]["prescription_id"], "RX0002");
        assert_eq!(lines[1]["drugs"][0]["score"], 100.0);

        assert_eq!(
            fs::read_to_string(&doctors).unwrap(),
            "doctor_name,prescription_count\nAhmed Hassan,1\n"
        );
    }

    #[test]
    fn test_run_missing_records_file() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = dir.path().join("drugs.txt");
        fs::write(&catalog, "Panadol\n").unwrap();

        let options = RunOptions::new(&catalog, dir.path().join("missing.jsonl"));
        let err = run(&options).unwrap_err();

        assert!(err.to_string().contains("failed to open records"));
    }
}
