//! Batch processing for OCR'd pathology reports.
//!
//! Reads document text through a [`TextSource`], runs every document
//! through the core [`Pipeline`](huv_pathology_core::Pipeline) in order,
//! and collects the rows into one table.

pub mod config;
pub mod error;
pub mod output;
pub mod runner;
pub mod source;

pub use config::*;
pub use error::*;
pub use output::*;
pub use runner::*;
pub use source::*;
