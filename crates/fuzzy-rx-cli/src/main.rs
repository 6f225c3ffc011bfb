use std::path::PathBuf;

use clap::Parser;
use fuzzy_rx_cli::{format_summary, run, RunOptions};
use fuzzy_rx_core::models::DEFAULT_NAME_COLUMN;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Resolve drug names in scanned prescription records.
#[derive(Debug, Parser)]
#[command(name = "fuzzy-rx", version, about)]
struct Args {
    /// Drug catalog (.csv, .json array, or one name per line)
    #[arg(long, value_name = "PATH", env = "FUZZY_RX_CATALOG")]
    catalog: PathBuf,

    /// Name column for CSV catalogs
    #[arg(long, default_value = DEFAULT_NAME_COLUMN)]
    column: String,

    /// Prescription records, one JSON object per line
    #[arg(long, value_name = "JSONL")]
    records: PathBuf,

    /// Where to write results (stdout when omitted)
    #[arg(long, short = 'o', value_name = "JSONL")]
    output: Option<PathBuf>,

    /// Write per-doctor prescription counts to this CSV
    #[arg(long, value_name = "CSV")]
    doctors: Option<PathBuf>,

    /// Extractor settings
    #[arg(long, value_name = "TOML", env = "FUZZY_RX_CONFIG")]
    config: Option<PathBuf>,

    /// Minimum similarity score for detected drugs (0-100)
    #[arg(long)]
    threshold: Option<f64>,
}

fn main() -> anyhow::Result<()> {
    // Logs go to stderr so results on stdout stay clean
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("fuzzy_rx_cli=info,fuzzy_rx_core=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    info!(version = env!("CARGO_PKG_VERSION"), "fuzzy-rx starting");

    let options = RunOptions {
        catalog: args.catalog,
        column: args.column,
        records: args.records,
        output: args.output,
        doctors: args.doctors,
        config: args.config,
        threshold: args.threshold,
    };

    let report = run(&options)?;
    eprintln!("{}", format_summary(&report.summary, &report.doctor_insights()));

    Ok(())
}
