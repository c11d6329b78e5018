//! Immunohistochemistry biomarker results.

use serde::{Deserialize, Serialize};

/// Column names of the extended biomarker schema, in output order.
pub const BIOMARKER_COLUMNS: [&str; 8] = [
    "IHQ_HER2",
    "IHQ_KI-67",
    "IHQ_RECEPTOR_ESTROGENO",
    "IHQ_RECEPTOR_PROGESTAGENOS",
    "IHQ_PDL-1",
    "IHQ_ESTUDIOS_SOLICITADOS",
    "IHQ_P16_ESTADO",
    "IHQ_P16_PORCENTAJE",
];

/// Biomarker values; an empty string means "not found".
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct BiomarkerPanel {
    /// HER2 score, optionally with ISH result: `"3+"`, `"2+ (NO AMPLIFICADO)"`
    pub her2: String,
    /// Ki-67 index: `"20%"`
    pub ki67: String,
    /// Estrogen receptor: `"POSITIVO 90%"`
    pub estrogen_receptor: String,
    /// Progesterone receptor: `"NEGATIVO"`
    pub progesterone_receptor: String,
    /// PD-L1: `"TPS 50% (CPS 60)"`
    pub pdl1: String,
    /// Requested studies, comma separated
    pub requested_studies: String,
    /// P16 status: `POSITIVO` or `NEGATIVO`
    pub p16_status: String,
    /// P16 percentage: `"70%"`
    pub p16_percentage: String,
}

impl BiomarkerPanel {
    /// Values in the order of [`BIOMARKER_COLUMNS`].
    pub fn values(&self) -> [&str; 8] {
        [
            &self.her2,
            &self.ki67,
            &self.estrogen_receptor,
            &self.progesterone_receptor,
            &self.pdl1,
            &self.requested_studies,
            &self.p16_status,
            &self.p16_percentage,
        ]
    }

    /// True when no biomarker was found.
    pub fn is_empty(&self) -> bool {
        self.values().iter().all(|value| value.is_empty())
    }
}
