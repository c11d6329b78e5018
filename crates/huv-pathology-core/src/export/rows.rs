//! Schema mapper: canonical record to fixed-column output rows.

use serde::ser::{Serialize, SerializeMap, Serializer};

use super::columns::{self, COLUMNS, EXTENDED_COLUMNS};
use crate::config::HospitalConfig;
use crate::models::{CanonicalRecord, Specimen, BIOMARKER_COLUMNS};

/// One output row: every schema column present, empty when not derived.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputRow {
    columns: &'static [&'static str],
    values: Vec<String>,
}

impl Default for OutputRow {
    fn default() -> Self {
        Self::new()
    }
}

impl OutputRow {
    /// Empty row over the 55 standard columns.
    pub fn new() -> Self {
        Self::with_columns(&COLUMNS)
    }

    /// Empty row over the standard plus biomarker columns.
    pub fn extended() -> Self {
        Self::with_columns(&EXTENDED_COLUMNS)
    }

    /// Empty row over an arbitrary ordered schema.
    pub fn with_columns(columns: &'static [&'static str]) -> Self {
        Self {
            columns,
            values: vec![String::new(); columns.len()],
        }
    }

    /// Value of `column`, `None` when the column is not in the schema.
    pub fn get(&self, column: &str) -> Option<&str> {
        let index = self.index_of(column)?;
        self.values.get(index).map(String::as_str)
    }

    /// Set a column value. Returns false when the column is not in the schema.
    pub fn set(&mut self, column: &str, value: impl Into<String>) -> bool {
        match self.index_of(column) {
            Some(index) => {
                self.values[index] = value.into();
                true
            }
            None => false,
        }
    }

    /// Column names in order.
    pub fn columns(&self) -> &'static [&'static str] {
        self.columns
    }

    /// Values in column order.
    pub fn values(&self) -> &[String] {
        &self.values
    }

    /// `(column, value)` pairs in column order.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> + '_ {
        self.columns
            .iter()
            .copied()
            .zip(self.values.iter().map(String::as_str))
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    fn index_of(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|name| *name == column)
    }
}

impl Serialize for OutputRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.columns.len()))?;
        for (column, value) in self.iter() {
            map.serialize_entry(column, value)?;
        }
        map.end()
    }
}

/// Maps canonical records to rows, one row per specimen.
pub struct SchemaMapper<'a> {
    config: &'a HospitalConfig,
}

impl<'a> SchemaMapper<'a> {
    pub fn new(config: &'a HospitalConfig) -> Self {
        Self { config }
    }

    /// 55-column rows, one per specimen. No specimens means no rows.
    pub fn map_to_rows(&self, record: &CanonicalRecord) -> Vec<OutputRow> {
        record
            .specimens
            .iter()
            .map(|specimen| {
                let mut row = OutputRow::new();
                self.fill_row(&mut row, record, specimen);
                row
            })
            .collect()
    }

    /// 63-column rows: the standard columns plus biomarkers.
    ///
    /// Biomarker cells stay empty for non-IHQ records.
    pub fn map_to_extended_rows(&self, record: &CanonicalRecord) -> Vec<OutputRow> {
        record
            .specimens
            .iter()
            .map(|specimen| {
                let mut row = OutputRow::extended();
                self.fill_row(&mut row, record, specimen);
                if let Some(panel) = record.biomarkers() {
                    for (column, value) in BIOMARKER_COLUMNS.iter().zip(panel.values()) {
                        row.set(column, value);
                    }
                }
                row
            })
            .collect()
    }

    fn fill_row(&self, row: &mut OutputRow, record: &CanonicalRecord, specimen: &Specimen) {
        let config = self.config;
        let organ = record
            .organ_final
            .as_deref()
            .filter(|organ| !organ.is_empty())
            .unwrap_or(&specimen.organ);

        let cells: [(&str, &str); 40] = [
            // Request and ordering context
            (columns::NUMERO_PETICION, &record.numero_peticion),
            (columns::HOSPITALIZADO, record.hospitalizado.as_str()),
            (columns::SEDE, &config.sede),
            (columns::EPS, &record.eps),
            (columns::SERVICIO, &record.servicio),
            (columns::MEDICO_TRATANTE, &record.medico_tratante),
            (columns::ESPECIALIDAD, &record.especialidad),
            (columns::UBICACION, &record.servicio),
            (columns::N_AUTORIZACION, &record.numero_autorizacion),
            (columns::IDENTIFICADOR_UNICO, &record.identificador_unico),
            (columns::DATOS_CLINICOS, &record.datos_clinicos),
            (columns::FECHA_ORDENAMIENTO, &record.fecha_ordenamiento),
            // Patient
            (columns::TIPO_DOCUMENTO, &record.tipo_documento),
            (columns::N_IDENTIFICACION, &record.identificacion_numero),
            (columns::PRIMER_NOMBRE, &record.name.first_name),
            (columns::SEGUNDO_NOMBRE, &record.name.middle_name),
            (columns::PRIMER_APELLIDO, &record.name.first_surname),
            (columns::SEGUNDO_APELLIDO, &record.name.second_surname),
            (columns::FECHA_NACIMIENTO, &record.fecha_nacimiento),
            (columns::EDAD, &record.edad),
            (columns::GENERO, &record.genero),
            (columns::DEPARTAMENTO, &config.departamento),
            (columns::MUNICIPIO, &config.municipio),
            // Specimen and study
            (columns::N_MUESTRA, &specimen.sample_id),
            (columns::CUPS, &record.cups_code),
            (columns::TIPO_EXAMEN, record.report_type.exam_label()),
            (columns::PROCEDIMIENTO, &record.procedimiento),
            (columns::ORGANO, organ),
            (columns::TARIFA, &config.tarifa),
            (columns::VALOR, &config.valor),
            (columns::COPAGO, &config.copago),
            (columns::DESCUENTO, &config.descuento),
            (columns::FECHA_INGRESO, &record.fecha_ingreso),
            (columns::FECHA_FINALIZACION, &record.fecha_informe),
            (columns::USUARIO_FINALIZACION, &record.responsable_final),
            (columns::MALIGNIDAD, record.malignidad.as_str()),
            (columns::DESCRIPCION_MACROSCOPICA, &record.descripcion_macroscopica),
            (columns::DESCRIPCION_MICROSCOPICA, &specimen.microscopy_text),
            (columns::DESCRIPCION_DIAGNOSTICO, &specimen.diagnosis_text),
            (columns::COMENTARIO, &record.comentarios),
        ];

        for (column, value) in cells {
            row.set(column, value);
        }
        row.set(columns::HORA_DESC_MACRO, record.processed_at.as_str());
        row.set(columns::RESPONSABLE_MACRO, record.responsable_macro.as_str());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BiomarkerPanel, ReportDetails, ReportType};

    fn record_with_specimens(report_type: ReportType, specimens: Vec<Specimen>) -> CanonicalRecord {
        let mut record = CanonicalRecord::empty(report_type);
        record.numero_peticion = "M2501234".into();
        record.name.first_name = "ANA".into();
        record.fecha_informe = "20/05/2025".into();
        record.specimens = specimens;
        record
    }

    #[test]
    fn test_output_row_starts_empty() {
        let row = OutputRow::new();
        assert_eq!(row.len(), 55);
        assert!(row.values().iter().all(String::is_empty));
        assert_eq!(row.get(columns::EPS), Some(""));
        assert_eq!(row.get("Columna inexistente"), None);
    }

    #[test]
    fn test_set_unknown_column_is_rejected() {
        let mut row = OutputRow::new();
        assert!(!row.set("IHQ_HER2", "3+"));
        assert!(row.set(columns::SEDE, "NORTE"));
        assert_eq!(row.get(columns::SEDE), Some("NORTE"));
    }

    #[test]
    fn test_one_row_per_specimen() {
        let config = HospitalConfig::default();
        let mapper = SchemaMapper::new(&config);
        let record = record_with_specimens(
            ReportType::Biopsy,
            vec![
                Specimen::lettered("M2501234", 'A', "PIEL"),
                Specimen::lettered("M2501234", 'B', "UÑA"),
                Specimen::lettered("M2501234", 'C', "GANGLIO"),
            ],
        );

        let rows = mapper.map_to_rows(&record);

        assert_eq!(rows.len(), 3);
        for row in &rows {
            assert_eq!(row.columns(), &COLUMNS[..]);
            assert_eq!(row.get(columns::PRIMER_NOMBRE), Some("ANA"));
            assert_eq!(row.get(columns::SEDE), Some("PRINCIPAL"));
            assert_eq!(row.get(columns::TARIFA), Some("GENERAL"));
            assert_eq!(row.get(columns::TIPO_EXAMEN), Some("ESTUDIO DE HISTOLOGIA"));
            assert_eq!(row.get(columns::FECHA_FINALIZACION), Some("20/05/2025"));
        }
        assert_eq!(rows[1].get(columns::N_MUESTRA), Some("M2501234-B"));
        assert_eq!(rows[1].get(columns::ORGANO), Some("UÑA"));
    }

    #[test]
    fn test_organ_final_overrides_specimen_organ() {
        let config = HospitalConfig::default();
        let mapper = SchemaMapper::new(&config);
        let mut record = record_with_specimens(
            ReportType::Autopsy,
            vec![Specimen::single("A123456", "No especificado")],
        );
        record.organ_final = Some("CUERPO HUMANO COMPLETO".into());

        let rows = mapper.map_to_rows(&record);
        assert_eq!(rows[0].get(columns::ORGANO), Some("CUERPO HUMANO COMPLETO"));
    }

    #[test]
    fn test_no_specimens_no_rows() {
        let config = HospitalConfig::default();
        let mapper = SchemaMapper::new(&config);
        let record = record_with_specimens(ReportType::Unknown, Vec::new());
        assert!(mapper.map_to_rows(&record).is_empty());
    }

    #[test]
    fn test_extended_rows_carry_biomarkers() {
        let config = HospitalConfig::default();
        let mapper = SchemaMapper::new(&config);
        let mut record = record_with_specimens(
            ReportType::Immunohistochemistry,
            vec![Specimen::single("IHQ250981", "MAMA")],
        );
        record.details = ReportDetails::Immunohistochemistry {
            fecha_toma: String::new(),
            fecha_diagnostico: String::new(),
            biomarkers: BiomarkerPanel {
                her2: "3+".into(),
                ki67: "20%".into(),
                ..BiomarkerPanel::default()
            },
        };

        let rows = mapper.map_to_extended_rows(&record);

        assert_eq!(rows[0].len(), 63);
        assert_eq!(rows[0].get("IHQ_HER2"), Some("3+"));
        assert_eq!(rows[0].get("IHQ_KI-67"), Some("20%"));
        assert_eq!(rows[0].get("IHQ_PDL-1"), Some(""));
    }

    #[test]
    fn test_row_serializes_in_column_order() {
        let mut row = OutputRow::new();
        row.set(columns::NUMERO_PETICION, "A123456");

        let json = serde_json::to_string(&row).unwrap();
        assert!(json.starts_with(r#"{"N. peticion (0. Numero de biopsia)":"A123456","Hospitalizado":"""#));
        assert!(json.ends_with(r#""Responsable macro":""}"#));
    }
}
