//! Loading hospital configuration from disk.

use std::fs;
use std::path::Path;

use huv_pathology_core::HospitalConfig;

use crate::BatchResult;

/// File loading for [`HospitalConfig`].
pub trait ConfigFromPath: Sized {
    /// Read a JSON configuration file. Missing keys keep their defaults.
    fn from_path(path: &Path) -> BatchResult<Self>;
}

impl ConfigFromPath for HospitalConfig {
    fn from_path(path: &Path) -> BatchResult<Self> {
        let json = fs::read_to_string(path)?;
        Ok(HospitalConfig::from_json(&json)?)
    }
}
