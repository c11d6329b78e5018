//! Domain models for the pathology extraction pipeline.

mod biomarker;
mod record;
mod report;
mod specimen;

pub use biomarker::*;
pub use record::*;
pub use report::*;
pub use specimen::*;
