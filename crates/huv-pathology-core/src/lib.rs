//! HUV Pathology Core Library
//!
//! Turns OCR text of hospital pathology reports into fixed-schema rows for
//! the downstream spreadsheet.
//!
//! # Architecture
//!
//! ```text
//! OCR text → Classifier → Field Extractor → Domain Normalizer
//!                │              │                  │
//!           ReportType   PatternRegistry     CanonicalRecord
//!                                                  │
//!                                        Specimen Segmenter
//!                                                  │
//!                              ┌───────────────────┴──────────────┐
//!                              │                                  │
//!                              ▼                                  ▼
//!                        Schema Mapper                   Biomarker Extractor
//!                     (55 columns / row)                   (IHQ reports)
//!                              │                                  │
//!                              └───────────────┬──────────────────┘
//!                                              ▼
//!                                     RowTable (CSV / JSON)
//! ```
//!
//! # Core Principle
//!
//! **A missing field never aborts a document.** Every extraction step yields
//! an optional value that defaults to an empty string; the only hard failure
//! is a document with no specimens.
//!
//! # Modules
//!
//! - [`classifier`]: Report type from request number prefix or keywords
//! - [`patterns`]: Per-report-type field rules and the vocabulary tables
//! - [`extract`]: Raw field captures
//! - [`normalize`]: Names, dates and business rules
//! - [`specimen`]: Lettered specimen segmentation
//! - [`biomarkers`]: IHQ biomarker panel
//! - [`export`]: Output columns, rows and tables
//! - [`pipeline`]: The coordinator tying the stages together

pub mod biomarkers;
pub mod classifier;
pub mod config;
pub mod export;
pub mod extract;
pub mod models;
pub mod normalize;
pub mod patterns;
pub mod pipeline;
pub mod specimen;
pub mod text;

use thiserror::Error;

// Re-export commonly used types
pub use config::{HospitalConfig, NameSplitPolicy, ProcessingClock};
pub use export::{OutputRow, RowTable, SchemaMapper};
pub use models::{
    BiomarkerPanel, CanonicalRecord, Hospitalization, Malignancy, PatientName, RawExtraction,
    ReportDetails, ReportType, Specimen,
};
pub use pipeline::{Pipeline, ProcessedDocument};

/// Core library errors.
#[derive(Error, Debug)]
pub enum PathologyError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] serde_json::Error),

    #[error("Invalid pattern for field {field}: {source}")]
    Pattern {
        field: String,
        #[source]
        source: regex::Error,
    },

    #[error("No specimens found for request: {0}")]
    NoSpecimens(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Export error: {0}")]
    Export(String),
}

pub type PathologyResult<T> = Result<T, PathologyError>;

/// Classify a report with the default configuration.
pub fn classify_report(text: &str) -> ReportType {
    classifier::ReportClassifier::new().classify(text)
}

/// Extract a canonical record with the default configuration.
pub fn extract_record(text: &str, report_type: ReportType) -> CanonicalRecord {
    Pipeline::default().extract_record(text, report_type)
}

/// Map a record to 55-column rows with the default hospital settings.
pub fn map_to_rows(record: &CanonicalRecord) -> Vec<OutputRow> {
    SchemaMapper::new(&HospitalConfig::default()).map_to_rows(record)
}
