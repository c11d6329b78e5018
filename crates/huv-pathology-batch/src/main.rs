//! huv-batch: turn OCR'd pathology reports into the 55-column table.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use huv_pathology_batch::{
    collect_inputs, write_table_to, BatchRunner, ConfigFromPath, DocumentOutcome, OutputFormat,
    SidecarTextSource,
};
use huv_pathology_core::{HospitalConfig, Pipeline};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "huv-batch")]
#[command(about = "Extract pathology report fields into the hospital spreadsheet schema")]
struct Args {
    /// PDF files, text files or directories containing them
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Hospital configuration (JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Output file; stdout when omitted
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "csv")]
    format: OutputFormat,

    /// Append the IHQ biomarker columns
    #[arg(long)]
    biomarkers: bool,

    /// Log each document
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let default_level = if args.verbose { "info" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = match &args.config {
        Some(path) => HospitalConfig::from_path(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => HospitalConfig::default(),
    };

    let documents = collect_inputs(&args.inputs).context("Failed to list input documents")?;
    if documents.is_empty() {
        bail!("No documents found in the given inputs");
    }

    let pipeline = Pipeline::new(config).with_biomarker_columns(args.biomarkers);
    let runner = BatchRunner::new(pipeline, SidecarTextSource::new());
    let report = runner.run(&documents);

    write_table_to(&report.table, args.format, args.output.as_deref())
        .context("Failed to write output table")?;

    for outcome in &report.outcomes {
        if let DocumentOutcome::Failed { path, error } = outcome {
            eprintln!("{}: {}", path.display(), error);
        }
    }
    eprintln!("{}", report.summary());

    if report.processed() == 0 {
        bail!("No document could be processed");
    }
    Ok(())
}
