//! Batch extraction over many prescription records.
//!
//! Records are independent, so the map over them has no ordering
//! dependency; with the `parallel` feature it runs on the rayon pool.
//! Records that end without drugs are counted and left out of the outputs.

use std::collections::BTreeMap;

#[cfg(feature = "parallel")]
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::models::{ExtractionResult, PrescriptionRecord};
use crate::resolver::ExtractionPipeline;

/// One included prescription.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BatchOutput {
    /// Source id, or `RX0001`-style id from the record's position
    pub prescription_id: String,
    #[serde(flatten)]
    pub result: ExtractionResult,
}

/// Counters over a processed batch.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProcessingSummary {
    pub total_records: usize,
    pub confirmed_records: usize,
    pub text_extracted_records: usize,
    pub mixed_resolved_records: usize,
    pub skipped_no_drugs: usize,
    pub included_records: usize,
    pub doctors_detected: usize,
}

/// Number of included prescriptions per doctor.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DoctorInsight {
    pub doctor_name: String,
    pub prescription_count: usize,
}

/// Outcome of a batch run.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct BatchReport {
    pub outputs: Vec<BatchOutput>,
    pub summary: ProcessingSummary,
}

impl BatchReport {
    /// Doctors by descending prescription count, ties by name.
    pub fn doctor_insights(&self) -> Vec<DoctorInsight> {
        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
        for output in &self.outputs {
            if let Some(name) = output.result.doctor_name.as_deref() {
                *counts.entry(name).or_default() += 1;
            }
        }

        let mut insights: Vec<DoctorInsight> = counts
            .into_iter()
            .map(|(name, count)| DoctorInsight {
                doctor_name: name.to_string(),
                prescription_count: count,
            })
            .collect();
        // BTreeMap order already sorts names; stable sort keeps it for ties
        insights.sort_by(|a, b| b.prescription_count.cmp(&a.prescription_count));
        insights
    }
}

/// Runs the pipeline over a batch of records.
pub struct BatchProcessor<'a> {
    pipeline: &'a ExtractionPipeline,
}

impl<'a> BatchProcessor<'a> {
    pub fn new(pipeline: &'a ExtractionPipeline) -> Self {
        Self { pipeline }
    }

    /// Process all records, preserving their order.
    pub fn run(&self, records: &[PrescriptionRecord]) -> BatchReport {
        info!(records = records.len(), "processing prescription batch");

        let results = self.extract_all(records);

        let mut summary = ProcessingSummary {
            total_records: records.len(),
            ..ProcessingSummary::default()
        };
        let mut outputs = Vec::new();

        for (index, (record, result)) in records.iter().zip(results).enumerate() {
            let provenance = result.provenance;
            summary.confirmed_records += usize::from(provenance.confirmed);
            summary.text_extracted_records += usize::from(provenance.text_extracted);
            summary.mixed_resolved_records += usize::from(provenance.mixed_resolved);

            let prescription_id = record
                .id
                .clone()
                .unwrap_or_else(|| format!("RX{:04}", index + 1));

            if !result.has_drugs() {
                debug!(record = %prescription_id, "no confirmed or detected drugs; skipping");
                summary.skipped_no_drugs += 1;
                continue;
            }

            if result.doctor_name.is_some() {
                summary.doctors_detected += 1;
            }
            summary.included_records += 1;
            outputs.push(BatchOutput {
                prescription_id,
                result,
            });
        }

        info!(
            included = summary.included_records,
            skipped = summary.skipped_no_drugs,
            confirmed = summary.confirmed_records,
            mixed = summary.mixed_resolved_records,
            doctors = summary.doctors_detected,
            "batch complete"
        );

        BatchReport { outputs, summary }
    }

    #[cfg(not(feature = "parallel"))]
    fn extract_all(&self, records: &[PrescriptionRecord]) -> Vec<ExtractionResult> {
        records.iter().map(|r| self.pipeline.process(r)).collect()
    }

    #[cfg(feature = "parallel")]
    fn extract_all(&self, records: &[PrescriptionRecord]) -> Vec<ExtractionResult> {
        records.par_iter().map(|r| self.pipeline.process(r)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DrugCatalog;
    use serde_json::json;
    use std::sync::Arc;

    fn setup_pipeline() -> ExtractionPipeline {
        let catalog = DrugCatalog::new(vec!["Panadol Extra", "Brufen 400mg", "Augmentin 1g"]);
        ExtractionPipeline::with_defaults(Arc::new(catalog)).unwrap()
    }

    fn records() -> Vec<PrescriptionRecord> {
        vec![
            PrescriptionRecord {
                id: Some("A1".into()),
                confirmed_drugs: json!("[{'name': 'Concor 5'}]"),
                full_text_annotation: json!({"text": "Dr. Mona Adel\nsomething"}),
                ..PrescriptionRecord::default()
            },
            PrescriptionRecord::from_text("Dr. Mona Adel\nPanadol Extra\nBrufen 400"),
            PrescriptionRecord::from_text("illegible scribble zzzz"),
            PrescriptionRecord::from_text("Augmentin 1g"),
        ]
    }

    #[test]
    fn test_summary_counts() {
        let pipeline = setup_pipeline();
        let report = BatchProcessor::new(&pipeline).run(&records());

        assert_eq!(
            report.summary,
            ProcessingSummary {
                total_records: 4,
                confirmed_records: 1,
                text_extracted_records: 4,
                mixed_resolved_records: 0,
                skipped_no_drugs: 1,
                included_records: 3,
                doctors_detected: 2,
            }
        );
    }

    #[test]
    fn test_outputs_keep_order_and_ids() {
        let pipeline = setup_pipeline();
        let report = BatchProcessor::new(&pipeline).run(&records());

        let ids: Vec<&str> = report.outputs.iter().map(|o| o.prescription_id.as_str()).collect();
        assert_eq!(ids, vec!["A1", "RX0002", "RX0004"]);
        assert_eq!(report.outputs[1].result.drug_names(), "Panadol Extra, Brufen 400mg");
    }

    #[test]
    fn test_doctor_insights() {
        let pipeline = setup_pipeline();
        let mut batch = records();
        batch.push(PrescriptionRecord::from_text("Dr. Ali Omar\nBrufen 400mg"));

        let report = BatchProcessor::new(&pipeline).run(&batch);

        assert_eq!(
            report.doctor_insights(),
            vec![
                DoctorInsight {
                    doctor_name: "Mona Adel".into(),
                    prescription_count: 2
                },
                DoctorInsight {
                    doctor_name: "Ali Omar".into(),
                    prescription_count: 1
                },
            ]
        );
    }

    #[test]
    fn test_output_serialization_is_flat() {
        let output = BatchOutput {
            prescription_id: "RX0001".into(),
            result: ExtractionResult::empty(),
        };

        assert_eq!(
            serde_json::to_value(&output).unwrap(),
            json!({"prescription_id": "RX0001", "drugs": [], "doctor_name": null})
        );
    }

    #[test]
    fn test_empty_batch() {
        let pipeline = setup_pipeline();
        let report = BatchProcessor::new(&pipeline).run(&[]);

        assert!(report.outputs.is_empty());
        assert_eq!(report.summary, ProcessingSummary::default());
        assert!(report.doctor_insights().is_empty());
    }
}
