//! Writing batch results.

use std::io::Write;

use fuzzy_rx_core::{BatchOutput, DoctorInsight, ProcessingSummary};
use thiserror::Error;

/// Output errors.
#[derive(Error, Debug)]
pub enum OutputError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON encode error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

pub type OutputResult<T> = Result<T, OutputError>;

/// One JSON object per included prescription.
pub fn write_outputs<W: Write>(mut writer: W, outputs: &[BatchOutput]) -> OutputResult<()> {
    for output in outputs {
        serde_json::to_writer(&mut writer, output)?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;
    Ok(())
}

/// Doctor insights as CSV with a header row.
pub fn write_doctor_insights<W: Write>(writer: W, insights: &[DoctorInsight]) -> OutputResult<()> {
    let mut csv = csv::Writer::from_writer(writer);
    for insight in insights {
        csv.serialize(insight)?;
    }
    csv.flush()?;
    Ok(())
}

/// Human-readable run summary.
pub fn format_summary(summary: &ProcessingSummary, insights: &[DoctorInsight]) -> String {
    let mut lines = vec![
        "Processing summary".to_string(),
        format!("  records:              {}", summary.total_records),
        format!("  with confirmed drugs: {}", summary.confirmed_records),
        format!("  with OCR text:        {}", summary.text_extracted_records),
        format!("  mixed confidence:     {}", summary.mixed_resolved_records),
        format!("  skipped (no drugs):   {}", summary.skipped_no_drugs),
        format!("  included:             {}", summary.included_records),
        format!("  doctors detected:     {}", summary.doctors_detected),
    ];

    if !insights.is_empty() {
        lines.push(format!("Doctors ({})", insights.len()));
        for insight in insights.iter().take(10) {
            lines.push(format!(
                "  {:>4}  {}",
                insight.prescription_count, insight.doctor_name
            ));
        }
    }

    lines.join("\n")
}
