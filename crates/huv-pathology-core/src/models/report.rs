//! Report type and per-type detail models.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::BiomarkerPanel;

/// Kind of pathology report, decided from the request number or body text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ReportType {
    #[serde(rename = "AUTOPSIA")]
    Autopsy,
    #[serde(rename = "INMUNOHISTOQUIMICA")]
    Immunohistochemistry,
    #[serde(rename = "BIOPSIA")]
    Biopsy,
    #[serde(rename = "REVISION")]
    Review,
    #[serde(rename = "DESCONOCIDO")]
    Unknown,
}

impl ReportType {
    /// Every report type, in classification priority order.
    pub const ALL: [ReportType; 5] = [
        ReportType::Autopsy,
        ReportType::Immunohistochemistry,
        ReportType::Biopsy,
        ReportType::Review,
        ReportType::Unknown,
    ];

    /// Canonical uppercase Spanish label.
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportType::Autopsy => "AUTOPSIA",
            ReportType::Immunohistochemistry => "INMUNOHISTOQUIMICA",
            ReportType::Biopsy => "BIOPSIA",
            ReportType::Review => "REVISION",
            ReportType::Unknown => "DESCONOCIDO",
        }
    }

    /// Label for the `Tipo de examen` column.
    pub fn exam_label(&self) -> &'static str {
        match self {
            ReportType::Autopsy => "AUTOPSIA",
            ReportType::Immunohistochemistry => "ESTUDIO DE INMUNOHISTOQUIMICA",
            ReportType::Biopsy => "ESTUDIO DE HISTOLOGIA",
            ReportType::Review => "REVISIONES",
            ReportType::Unknown => "DESCONOCIDO",
        }
    }

    /// Parse a canonical label (accent and case insensitive).
    pub fn from_label(label: &str) -> Option<ReportType> {
        let label = crate::text::normalize_for_match(label.trim());
        ReportType::ALL
            .into_iter()
            .find(|report_type| report_type.as_str() == label)
    }
}

impl fmt::Display for ReportType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fields that only exist for one report type.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(tag = "tipo", rename_all = "snake_case")]
pub enum ReportDetails {
    Autopsy {
        /// Date the autopsy was performed
        fecha_autopsia: String,
        /// Death certificate number
        certificado_defuncion: String,
    },
    Biopsy {
        /// Identifier from the "Seguimos Haciendo Historia" footer
        identificador_historia: String,
    },
    Immunohistochemistry {
        /// Sample collection date
        fecha_toma: String,
        /// Diagnosis date
        fecha_diagnostico: String,
        /// Biomarker results found in the report body
        biomarkers: BiomarkerPanel,
    },
    Review {
        /// Pathologist who signed the review comment
        responsable_comentario: String,
        /// Organ listed in the received blocks and slides
        organo_bloques: String,
    },
    #[default]
    Unknown,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exam_labels() {
        assert_eq!(ReportType::Autopsy.exam_label(), "AUTOPSIA");
        assert_eq!(ReportType::Biopsy.exam_label(), "ESTUDIO DE HISTOLOGIA");
        assert_eq!(
            ReportType::Immunohistochemistry.exam_label(),
            "ESTUDIO DE INMUNOHISTOQUIMICA"
        );
        assert_eq!(ReportType::Review.exam_label(), "REVISIONES");
        assert_eq!(ReportType::Unknown.exam_label(), "DESCONOCIDO");
    }

    #[test]
    fn test_from_label() {
        assert_eq!(ReportType::from_label("biopsia"), Some(ReportType::Biopsy));
        assert_eq!(ReportType::from_label("Revisión"), Some(ReportType::Review));
        assert_eq!(ReportType::from_label("CITOLOGIA"), None);
    }

    #[test]
    fn test_serde_uses_spanish_labels() {
        let json = serde_json::to_string(&ReportType::Immunohistochemistry).unwrap();
        assert_eq!(json, "\"INMUNOHISTOQUIMICA\"");
        let parsed: ReportType = serde_json::from_str("\"AUTOPSIA\"").unwrap();
        assert_eq!(parsed, ReportType::Autopsy);
    }
}
