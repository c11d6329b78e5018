//! Specimen model: one physical sample within a report.

use serde::{Deserialize, Serialize};

/// A specimen produces exactly one output row.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Specimen {
    /// Request number, suffixed `-<letter>` for lettered specimens
    pub sample_id: String,
    /// Organ or sample description
    pub organ: String,
    /// Diagnosis text for this specimen
    pub diagnosis_text: String,
    /// Microscopic description for this specimen
    pub microscopy_text: String,
    /// Specimen letter (`A`..`J`) when the report lists lettered samples
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub letter: Option<char>,
}

impl Specimen {
    /// Unlettered specimen identified by the bare request number.
    pub fn single(request_number: &str, organ: impl Into<String>) -> Self {
        Self {
            sample_id: request_number.to_string(),
            organ: organ.into(),
            diagnosis_text: String::new(),
            microscopy_text: String::new(),
            letter: None,
        }
    }

    /// Lettered specimen with sample id `<request>-<letter>`.
    pub fn lettered(request_number: &str, letter: char, organ: impl Into<String>) -> Self {
        Self {
            sample_id: format!("{}-{}", request_number, letter),
            organ: organ.into(),
            diagnosis_text: String::new(),
            microscopy_text: String::new(),
            letter: Some(letter),
        }
    }
}
