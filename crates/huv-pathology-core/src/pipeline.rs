//! Pipeline coordinator: classify, extract, normalize, segment, map.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::debug;

use crate::biomarkers::BiomarkerExtractor;
use crate::classifier::ReportClassifier;
use crate::config::{HospitalConfig, ProcessingClock};
use crate::export::{OutputRow, SchemaMapper};
use crate::extract::extract_fields;
use crate::models::{CanonicalRecord, ReportDetails, ReportType, Specimen};
use crate::normalize::{DomainNormalizer, WHOLE_BODY_ORGAN};
use crate::patterns::{fields, PatternRegistry};
use crate::specimen::SpecimenSegmenter;
use crate::{PathologyError, PathologyResult};

/// One processed document: the canonical record and its rows.
#[derive(Debug, Clone, Serialize)]
pub struct ProcessedDocument {
    pub record: CanonicalRecord,
    pub rows: Vec<OutputRow>,
}

impl ProcessedDocument {
    pub fn report_type(&self) -> ReportType {
        self.record.report_type
    }

    /// Serialize the canonical record to JSON.
    pub fn record_json(&self) -> PathologyResult<String> {
        serde_json::to_string_pretty(&self.record).map_err(|err| PathologyError::Export(err.to_string()))
    }
}

/// Document pipeline built once from a hospital configuration.
///
/// Holds no per-document state; one instance processes any number of
/// documents.
pub struct Pipeline {
    classifier: ReportClassifier,
    registries: BTreeMap<ReportType, PatternRegistry>,
    normalizer: DomainNormalizer,
    segmenter: SpecimenSegmenter,
    biomarkers: BiomarkerExtractor,
    clock: ProcessingClock,
    extended: bool,
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new(HospitalConfig::default())
    }
}

impl Pipeline {
    pub fn new(config: HospitalConfig) -> Self {
        let registries = ReportType::ALL
            .iter()
            .map(|&report_type| (report_type, PatternRegistry::for_report_type(report_type)))
            .collect();
        let biomarkers = BiomarkerExtractor::new(config.vocabulary.study_corrections.clone());

        Self {
            classifier: ReportClassifier::new(),
            registries,
            normalizer: DomainNormalizer::new(config),
            segmenter: SpecimenSegmenter::new(),
            biomarkers,
            clock: ProcessingClock::default(),
            extended: false,
        }
    }

    /// Use a fixed clock for reference dates and timestamps.
    pub fn with_clock(mut self, clock: ProcessingClock) -> Self {
        self.clock = clock;
        self
    }

    /// Emit the 63-column schema from [`Pipeline::process_text`].
    pub fn with_biomarker_columns(mut self, extended: bool) -> Self {
        self.extended = extended;
        self
    }

    /// Whether rows carry the biomarker columns.
    pub fn emits_biomarker_columns(&self) -> bool {
        self.extended
    }

    pub fn config(&self) -> &HospitalConfig {
        self.normalizer.config()
    }

    /// Pattern registry for a report type, for adding custom field rules.
    pub fn registry_mut(&mut self, report_type: ReportType) -> &mut PatternRegistry {
        self.registries
            .entry(report_type)
            .or_insert_with(|| PatternRegistry::for_report_type(report_type))
    }

    pub fn classify(&self, text: &str) -> ReportType {
        self.classifier.classify(text)
    }

    /// Extract and normalize a report of a known type.
    pub fn extract_record(&self, text: &str, report_type: ReportType) -> CanonicalRecord {
        // Step 1: Raw field captures
        let fallback;
        let registry = match self.registries.get(&report_type) {
            Some(registry) => registry,
            None => {
                fallback = PatternRegistry::for_report_type(report_type);
                &fallback
            }
        };
        let mut raw = extract_fields(text, registry);
        if raw.get(fields::NUMERO_PETICION).is_empty() {
            if let Some(number) = self.classifier.request_number(text) {
                raw.insert(fields::NUMERO_PETICION, number);
            }
        }

        // Step 2: Business normalization
        let mut record = self.normalizer.normalize(report_type, raw, text, &self.clock);

        // Step 3: Specimens with their diagnosis/microscopy slices
        record.specimens = self.segment(&record);
        self.segmenter.attach_sections(
            &mut record.specimens,
            &record.diagnostico,
            &record.descripcion_microscopica,
        );
        debug!(
            request = %record.numero_peticion,
            specimens = record.specimens.len(),
            "Segmented specimens"
        );

        // Step 4: Biomarkers
        if let ReportDetails::Immunohistochemistry { biomarkers, .. } = &mut record.details {
            *biomarkers = self.biomarkers.extract(text);
        }

        record
    }

    /// Standard 55-column rows for a record.
    pub fn map_to_rows(&self, record: &CanonicalRecord) -> Vec<OutputRow> {
        SchemaMapper::new(self.config()).map_to_rows(record)
    }

    /// 55 columns plus the biomarker columns.
    pub fn map_to_extended_rows(&self, record: &CanonicalRecord) -> Vec<OutputRow> {
        SchemaMapper::new(self.config()).map_to_extended_rows(record)
    }

    /// Classify, extract and map one document.
    ///
    /// Fails with [`PathologyError::NoSpecimens`] when nothing segmentable
    /// was found.
    pub fn process_document(&self, text: &str) -> PathologyResult<ProcessedDocument> {
        let report_type = self.classify(text);
        let record = self.extract_record(text, report_type);

        let rows = if self.extended {
            self.map_to_extended_rows(&record)
        } else {
            self.map_to_rows(&record)
        };
        if rows.is_empty() {
            return Err(PathologyError::NoSpecimens(record.numero_peticion));
        }

        Ok(ProcessedDocument { record, rows })
    }

    /// Rows for one document.
    pub fn process_text(&self, text: &str) -> PathologyResult<Vec<OutputRow>> {
        Ok(self.process_document(text)?.rows)
    }

    fn segment(&self, record: &CanonicalRecord) -> Vec<Specimen> {
        let request = record.numero_peticion.as_str();
        let organ = record.raw.get(fields::ORGANO);
        let macro_text = record.raw.get(fields::DESCRIPCION_MACROSCOPICA);

        match record.report_type {
            ReportType::Autopsy => vec![Specimen::single(request, WHOLE_BODY_ORGAN)],
            ReportType::Biopsy => self
                .segmenter
                .segment_sections(macro_text, request)
                .unwrap_or_else(|| self.segmenter.segment_report(organ, macro_text, request)),
            ReportType::Review => {
                let blocks = record.raw.get(fields::ORGANO_BLOQUES);
                let organ = if organ.is_empty() { blocks } else { organ };
                self.segmenter.segment_report(organ, macro_text, request)
            }
            ReportType::Immunohistochemistry | ReportType::Unknown => {
                self.segmenter.segment_report(organ, macro_text, request)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::columns;
    use chrono::NaiveDate;

    fn fixed_pipeline() -> Pipeline {
        let today = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        Pipeline::default().with_clock(ProcessingClock::fixed_date(today))
    }

    const BIOPSY: &str = "\
HOSPITAL UNIVERSITARIO DEL VALLE
INFORME DE ANATOMIA PATOLOGICA
N. peticion : M2501234
Nombre : ANA MARIA LOPEZ
N.Identificacion : CC. 31.456.789
Genero : FEMENINO
Edad : 52 años 3 meses
EPS : EMSSANAR
Medico tratante : CARLOS RUIZ
Servicio : GINECOLOGIA ONCOLOGICA
Fecha Ingreso : 02/05/2025
Fecha Informe : 12/05/2025
DESCRIPCIÓN MACROSCÓPICA
Se reciben tres frascos:
A. \"PIEL DE DORSO\" mide 1 cm.
B. \"UÑA\" fragmento.
C. \"GANGLIO\" mide 2 cm.
DESCRIPCIÓN MICROSCÓPICA
A. Epidermis sin alteraciones.
B. Onicomicosis.
C. Ganglio reactivo.
DIAGNÓSTICO
A. PIEL: QUERATOSIS SEBORREICA.
B. UÑA: ONICOMICOSIS.
C. GANGLIO: LINFADENITIS REACTIVA.
NANCY MEJIA
Responsable del análisis
";

    #[test]
    fn test_biopsy_three_specimens() {
        let pipeline = fixed_pipeline();
        let document = pipeline.process_document(BIOPSY).unwrap();

        assert_eq!(document.report_type(), ReportType::Biopsy);
        assert_eq!(document.rows.len(), 3);

        let samples: Vec<&str> = document
            .rows
            .iter()
            .filter_map(|row| row.get(columns::N_MUESTRA))
            .collect();
        assert_eq!(samples, vec!["M2501234-A", "M2501234-B", "M2501234-C"]);

        let second = &document.rows[1];
        assert_eq!(second.get(columns::ORGANO), Some("UÑA"));
        assert_eq!(second.get(columns::DESCRIPCION_DIAGNOSTICO), Some("B. UÑA: ONICOMICOSIS."));
        assert_eq!(second.get(columns::DESCRIPCION_MICROSCOPICA), Some("B. Onicomicosis."));
        for row in &document.rows {
            assert_eq!(row.get(columns::PRIMER_NOMBRE), Some("ANA"));
            assert_eq!(row.get(columns::PRIMER_APELLIDO), Some("MARIA"));
            assert_eq!(row.get(columns::SEGUNDO_APELLIDO), Some("LOPEZ"));
            assert_eq!(row.get(columns::MALIGNIDAD), Some("AUSENTE"));
            assert_eq!(row.get(columns::CUPS), Some("898201"));
            assert_eq!(row.get(columns::USUARIO_FINALIZACION), Some("NANCY MEJIA"));
        }
    }

    #[test]
    fn test_unreadable_text_yields_one_unknown_row() {
        let pipeline = fixed_pipeline();
        let rows = pipeline.process_text("texto ilegible").unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get(columns::TIPO_EXAMEN), Some("DESCONOCIDO"));
        assert_eq!(rows[0].get(columns::ORGANO), Some("No especificado"));
    }

    #[test]
    fn test_record_json() {
        let document = fixed_pipeline().process_document(BIOPSY).unwrap();

        let json: serde_json::Value = serde_json::from_str(&document.record_json().unwrap()).unwrap();

        assert_eq!(json["tipo_informe"], "BIOPSIA");
        assert_eq!(json["numero_peticion"], "M2501234");
        assert_eq!(json["primer_nombre"], "ANA");
        assert_eq!(json["specimens"].as_array().map(Vec::len), Some(3));
    }

    #[test]
    fn test_biopsy_without_organ_line_uses_macroscopic_text() {
        let pipeline = fixed_pipeline();
        let text = "N. peticion : M2501234\nDESCRIPCIÓN MACROSCÓPICA\nSe recibe fragmento de piel de 1 cm.\nDESCRIPCIÓN MICROSCÓPICA\nNevus intradérmico.\n";

        let rows = pipeline.process_text(text).unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get(columns::ORGANO), Some("Se recibe fragmento de piel de 1 cm."));
    }

    #[test]
    fn test_extended_schema_toggle() {
        let pipeline = fixed_pipeline().with_biomarker_columns(true);
        let rows = pipeline.process_text(BIOPSY).unwrap();
        assert!(rows.iter().all(|row| row.len() == 63));
        assert_eq!(rows[0].get("IHQ_HER2"), Some(""));
    }

    #[test]
    fn test_custom_rule_on_registry() {
        let mut pipeline = fixed_pipeline();
        pipeline
            .registry_mut(ReportType::Biopsy)
            .add_rule(fields::EPS, r"(?-i:ASEGURADORA)\s*:\s*([^\n]+)", crate::patterns::FieldShape::Inline)
            .unwrap();

        let text = BIOPSY.replace("EPS : EMSSANAR", "ASEGURADORA : NUEVA EPS");
        let record = pipeline.extract_record(&text, ReportType::Biopsy);
        assert_eq!(record.eps, "NUEVA EPS");
    }

    #[test]
    fn test_processing_timestamp_uses_clock() {
        let pipeline = fixed_pipeline();
        let record = pipeline.extract_record(BIOPSY, ReportType::Biopsy);
        assert!(record.processed_at.starts_with("2025-06-01"));
    }
}
