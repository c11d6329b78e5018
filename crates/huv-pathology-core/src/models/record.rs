//! Raw and canonical record models.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{ReportDetails, ReportType, Specimen};

/// Field values captured by the pattern registry, keyed by field name.
///
/// Every registered field is present; a pattern miss is stored as an empty
/// string so downstream code never has to distinguish absent from blank.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct RawExtraction(BTreeMap<String, String>);

impl RawExtraction {
    pub fn new() -> Self {
        Self::default()
    }

    /// Value for `field`, or `""` when the field was not captured.
    pub fn get(&self, field: &str) -> &str {
        self.0.get(field).map(String::as_str).unwrap_or("")
    }

    /// Store a value, replacing any earlier capture.
    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<String>) {
        self.0.insert(field.into(), value.into());
    }

    /// Whether `field` is registered, even if empty.
    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    /// Number of registered fields.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of fields with a non-empty capture.
    pub fn captured_count(&self) -> usize {
        self.0.values().filter(|value| !value.is_empty()).count()
    }

    /// Iterate over `(field, value)` pairs in field-name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Patient name split into the four output components.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PatientName {
    #[serde(rename = "primer_nombre")]
    pub first_name: String,
    #[serde(rename = "segundo_nombre")]
    pub middle_name: String,
    #[serde(rename = "primer_apellido")]
    pub first_surname: String,
    #[serde(rename = "segundo_apellido")]
    pub second_surname: String,
}

/// Hospitalization flag for the `Hospitalizado` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum Hospitalization {
    Si,
    #[default]
    No,
}

impl Hospitalization {
    pub fn as_str(&self) -> &'static str {
        match self {
            Hospitalization::Si => "SI",
            Hospitalization::No => "NO",
        }
    }
}

/// Malignancy flag for the `Malignidad` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum Malignancy {
    Presente,
    #[default]
    Ausente,
}

impl Malignancy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Malignancy::Presente => "PRESENTE",
            Malignancy::Ausente => "AUSENTE",
        }
    }
}

/// Normalized, report-type-aware record ready for row mapping.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CanonicalRecord {
    /// Classified report type
    #[serde(rename = "tipo_informe")]
    pub report_type: ReportType,
    /// Raw captures this record was built from
    pub raw: RawExtraction,

    // Patient and request
    /// Request number (`N. peticion`)
    pub numero_peticion: String,
    /// Full patient name as extracted
    pub nombre_completo: String,
    /// Split patient name
    #[serde(flatten)]
    pub name: PatientName,
    /// Document type (CC, TI, ...)
    pub tipo_documento: String,
    /// Identification number, digits only
    pub identificacion_numero: String,
    pub genero: String,
    /// Age text as written in the report
    pub edad_texto: String,
    /// Age in years (first integer of the age text)
    pub edad: String,
    /// Derived birth date, `DD/MM/YYYY` or empty
    pub fecha_nacimiento: String,
    pub eps: String,

    // Ordering context
    pub medico_tratante: String,
    pub servicio: String,
    #[serde(rename = "especialidad_deducida")]
    pub especialidad: String,
    pub hospitalizado: Hospitalization,
    pub numero_autorizacion: String,
    pub identificador_unico: String,
    /// `SI`/`NO` clinical-data flag
    pub datos_clinicos: String,
    pub fecha_ordenamiento: String,
    pub fecha_ingreso: String,
    pub fecha_informe: String,

    // Study
    pub cups_code: String,
    pub procedimiento: String,
    /// Organ forced for every row, when the report type decides it
    pub organ_final: Option<String>,
    pub descripcion_macroscopica: String,
    pub descripcion_microscopica: String,
    pub diagnostico: String,
    pub comentarios: String,
    pub malignidad: Malignancy,
    /// Pathologist for `Usuario finalizacion`
    pub responsable_final: String,
    /// Pathologist for `Responsable macro`
    pub responsable_macro: String,
    /// Processing timestamp, `YYYY-MM-DD HH:MM:SS`
    pub processed_at: String,

    /// Type-specific fields
    pub details: ReportDetails,
    /// Specimens; each one becomes an output row
    pub specimens: Vec<Specimen>,
}

impl CanonicalRecord {
    /// Empty record of the given type.
    pub fn empty(report_type: ReportType) -> Self {
        Self {
            report_type,
            raw: RawExtraction::new(),
            numero_peticion: String::new(),
            nombre_completo: String::new(),
            name: PatientName::default(),
            tipo_documento: String::new(),
            identificacion_numero: String::new(),
            genero: String::new(),
            edad_texto: String::new(),
            edad: String::new(),
            fecha_nacimiento: String::new(),
            eps: String::new(),
            medico_tratante: String::new(),
            servicio: String::new(),
            especialidad: String::new(),
            hospitalizado: Hospitalization::No,
            numero_autorizacion: String::new(),
            identificador_unico: String::new(),
            datos_clinicos: String::new(),
            fecha_ordenamiento: String::new(),
            fecha_ingreso: String::new(),
            fecha_informe: String::new(),
            cups_code: String::new(),
            procedimiento: String::new(),
            organ_final: None,
            descripcion_macroscopica: String::new(),
            descripcion_microscopica: String::new(),
            diagnostico: String::new(),
            comentarios: String::new(),
            malignidad: Malignancy::Ausente,
            responsable_final: String::new(),
            responsable_macro: String::new(),
            processed_at: String::new(),
            details: ReportDetails::Unknown,
            specimens: Vec::new(),
        }
    }

    /// Biomarker panel, for immunohistochemistry records.
    pub fn biomarkers(&self) -> Option<&super::BiomarkerPanel> {
        match &self.details {
            ReportDetails::Immunohistochemistry { biomarkers, .. } => Some(biomarkers),
            _ => None,
        }
    }
}
