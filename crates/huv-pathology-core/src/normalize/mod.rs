//! Domain normalizer: turns raw captures into a canonical record.
//!
//! Handles:
//! - Name splitting and ID cleanup
//! - Date reformatting and birth date derivation from free-text age
//! - Malignancy, specialty and hospitalization inference
//! - Report-type business overrides (autopsy, IHQ, biopsy, review)

mod dates;
mod names;

pub use dates::*;
pub use names::*;

use regex::Regex;
use strsim::jaro_winkler;
use tracing::{debug, warn};

use crate::config::{HospitalConfig, ProcessingClock};
use crate::models::{
    BiomarkerPanel, CanonicalRecord, Hospitalization, Malignancy, RawExtraction, ReportDetails,
    ReportType,
};
use crate::patterns::fields;
use crate::text::{collapse_whitespace, first_integer, normalize_for_match};

/// Organ used for every autopsy row.
pub const WHOLE_BODY_ORGAN: &str = "CUERPO HUMANO COMPLETO";
/// Organ placeholder when nothing usable was found.
pub const UNSPECIFIED_ORGAN: &str = "No especificado";

const IHQ_AUTHORIZATION: &str = "COEX";
const IHQ_IDENTIFIER: &str = "0";

/// Normalizer for raw extractions.
#[derive(Debug, Clone)]
pub struct DomainNormalizer {
    config: HospitalConfig,
    /// Whole-word malignancy matchers, one per keyword
    malignancy: Vec<Regex>,
    /// Organ phrases in IHQ macroscopic text, in priority order
    ihq_organ_phrases: Vec<Regex>,
    /// Data row under the `ALMACENAMIENTO ... ORGANO` table header
    storage_row: Option<Regex>,
    routine_material: Option<Regex>,
    age: AgeParser,
}

impl Default for DomainNormalizer {
    fn default() -> Self {
        Self::new(HospitalConfig::default())
    }
}

impl DomainNormalizer {
    /// Create a normalizer for a hospital configuration.
    pub fn new(config: HospitalConfig) -> Self {
        let malignancy = config
            .vocabulary
            .malignancy_keywords
            .iter()
            .filter_map(|keyword| {
                let keyword = normalize_for_match(keyword);
                let pattern = format!(r"\b{}\b", regex::escape(keyword.trim()).replace(' ', r"\s+"));
                compile("malignancy", &pattern)
            })
            .collect();

        let organ_tail = r#""?\s*(?:[.,;:(]|CON\s+DIAGNOSTICO|\n|$)"#;
        let ihq_organ_phrases = [
            format!(r#"ROTULO\s+CORRESPONDIENTE\s+A\s+"?([A-Z0-9 ]+?){}"#, organ_tail),
            format!(r#"CORRESPONDIENTE\s+A\s+"?([A-Z0-9 ]+?){}"#, organ_tail),
            format!(r#"CORRESPONDE\s+A\s+"?([A-Z0-9 ]+?){}"#, organ_tail),
            r#""([^"\n]+)"\s*CON\s+DIAGNOSTICO"#.to_string(),
        ]
        .iter()
        .filter_map(|pattern| compile("ihq_organ", pattern))
        .collect();

        let storage_row = compile("storage_row", r"ALMACENAMIENTO[^\n]*ORGANO[^\n]*\n([^\n]+)");
        let routine_material = compile("routine_material", r"(?i)material\s+de\s+rutina");

        Self {
            config,
            malignancy,
            ihq_organ_phrases,
            storage_row,
            routine_material,
            age: AgeParser::new(),
        }
    }

    pub fn config(&self) -> &HospitalConfig {
        &self.config
    }

    /// Build a canonical record from raw captures.
    ///
    /// Specimens and biomarkers are left empty; the pipeline fills them.
    pub fn normalize(
        &self,
        report_type: ReportType,
        raw: RawExtraction,
        text: &str,
        clock: &ProcessingClock,
    ) -> CanonicalRecord {
        let vocabulary = &self.config.vocabulary;
        let mut record = CanonicalRecord::empty(report_type);

        // Step 1: Patient identity
        record.numero_peticion = raw.get(fields::NUMERO_PETICION).to_uppercase();
        record.nombre_completo = raw.get(fields::NOMBRE_COMPLETO).to_string();
        record.name = split_full_name(
            &record.nombre_completo,
            self.config.name_policy_for(report_type),
        );
        record.tipo_documento = match raw.get(fields::TIPO_DOCUMENTO) {
            "" => self.config.tipo_documento.clone(),
            value => value.to_uppercase(),
        };
        record.identificacion_numero = clean_identification(raw.get(fields::IDENTIFICACION_NUMERO));
        record.genero = raw.get(fields::GENERO).to_uppercase();
        record.edad_texto = raw.get(fields::EDAD).to_string();
        record.edad = first_integer(&record.edad_texto).unwrap_or("").to_string();
        record.eps = raw.get(fields::EPS).to_string();

        // Step 2: Dates
        record.fecha_ingreso = normalize_date(raw.get(fields::FECHA_INGRESO));
        record.fecha_informe = normalize_date(raw.get(fields::FECHA_INFORME));
        record.fecha_ordenamiento = record.fecha_ingreso.clone();
        let reference = parse_date(&record.fecha_informe)
            .or_else(|| parse_date(&record.fecha_ingreso))
            .unwrap_or_else(|| clock.today());
        record.fecha_nacimiento = self.age.birth_date(&record.edad_texto, reference);
        if record.fecha_nacimiento.is_empty() && !record.edad_texto.is_empty() {
            debug!(age = %record.edad_texto, "Could not derive birth date from age");
        }

        // Step 3: Ordering context
        record.medico_tratante = raw.get(fields::MEDICO_TRATANTE).to_string();
        record.servicio = raw.get(fields::SERVICIO).to_string();
        record.especialidad = self.deduce_specialty(&record.servicio);
        record.hospitalizado = self.infer_hospitalization(&record.servicio, report_type);
        record.numero_autorizacion = raw.get(fields::NUMERO_AUTORIZACION).to_string();
        record.identificador_unico = raw.get(fields::IDENTIFICADOR_UNICO).to_string();

        // Step 4: Study
        record.descripcion_macroscopica = raw.get(fields::DESCRIPCION_MACROSCOPICA).to_string();
        record.descripcion_microscopica = raw.get(fields::DESCRIPCION_MICROSCOPICA).to_string();
        record.diagnostico = raw.get(fields::DIAGNOSTICO).to_string();
        record.comentarios = raw.get(fields::COMENTARIOS).to_string();
        record.datos_clinicos = clinical_data_flag(&record.descripcion_macroscopica).to_string();
        record.cups_code = vocabulary.cups_for(report_type).to_string();
        record.procedimiento = vocabulary.procedure_for(&record.cups_code).to_string();
        record.responsable_final = self.canonical_pathologist(raw.get(fields::RESPONSABLE_ANALISIS));
        record.responsable_macro = record.responsable_final.clone();

        // Step 5: Report-type overrides
        match report_type {
            ReportType::Autopsy => self.apply_autopsy(&mut record, &raw),
            ReportType::Biopsy => self.apply_biopsy(&mut record, &raw),
            ReportType::Immunohistochemistry => self.apply_immunohistochemistry(&mut record, &raw, text),
            ReportType::Review => self.apply_review(&mut record, &raw),
            ReportType::Unknown => {}
        }

        record.fecha_ordenamiento = normalize_date(&record.fecha_ordenamiento);
        record.malignidad = self.detect_malignancy(&[
            record.diagnostico.as_str(),
            record.descripcion_microscopica.as_str(),
            record.comentarios.as_str(),
        ]);
        record.processed_at = clock.timestamp();
        record.raw = raw;

        record
    }

    fn apply_autopsy(&self, record: &mut CanonicalRecord, raw: &RawExtraction) {
        let fecha_autopsia = raw.get(fields::FECHA_AUTOPSIA).to_string();
        let certificado = raw.get(fields::CERTIFICADO_DEFUNCION).to_string();

        record.organ_final = Some(WHOLE_BODY_ORGAN.to_string());
        record.hospitalizado = Hospitalization::Si;
        if !certificado.is_empty() {
            record.identificador_unico = certificado.clone();
        }
        if !fecha_autopsia.is_empty() {
            record.fecha_ordenamiento = fecha_autopsia.clone();
        }

        record.details = ReportDetails::Autopsy {
            fecha_autopsia: normalize_date(&fecha_autopsia),
            certificado_defuncion: certificado,
        };
    }

    fn apply_biopsy(&self, record: &mut CanonicalRecord, raw: &RawExtraction) {
        let historia = raw.get(fields::IDENTIFICADOR_HISTORIA).to_string();
        if !historia.is_empty() {
            record.identificador_unico = historia.clone();
        }
        record.details = ReportDetails::Biopsy {
            identificador_historia: historia,
        };
    }

    fn apply_immunohistochemistry(&self, record: &mut CanonicalRecord, raw: &RawExtraction, text: &str) {
        let fecha_toma = normalize_date(raw.get(fields::FECHA_TOMA));
        let fecha_diagnostico = normalize_date(raw.get(fields::FECHA_DIAGNOSTICO));
        let macro_text = raw.get(fields::DESCRIPCION_MACROSCOPICA);

        record.hospitalizado = Hospitalization::No;
        record.numero_autorizacion = IHQ_AUTHORIZATION.to_string();
        record.identificador_unico = IHQ_IDENTIFIER.to_string();
        record.eps = correct_ihq_eps(&record.eps);
        record.datos_clinicos = if normalize_for_match(macro_text).contains("TUMOR MALIGNO") {
            "NO".to_string()
        } else {
            "SI".to_string()
        };

        let prefix = if normalize_for_match(text).contains("SE RECIBE ORDEN") {
            "Se recibe orden para realización de inmunohistoquímica"
        } else {
            "Informe de Estudios de Inmunohistoquímica"
        };
        record.descripcion_macroscopica = format!("{} {}", prefix, macro_text).trim().to_string();

        let organ = self
            .resolve_ihq_organ(macro_text, text)
            .or_else(|| Some(raw.get(fields::ORGANO).to_string()).filter(|organ| !organ.is_empty()))
            .unwrap_or_else(|| UNSPECIFIED_ORGAN.to_string());
        record.organ_final = Some(organ);

        record.fecha_ordenamiento = [&fecha_diagnostico, &fecha_toma, &record.fecha_ingreso]
            .into_iter()
            .find(|date| !date.is_empty())
            .cloned()
            .unwrap_or_default();

        record.details = ReportDetails::Immunohistochemistry {
            fecha_toma,
            fecha_diagnostico,
            biomarkers: BiomarkerPanel::default(),
        };
    }

    fn apply_review(&self, record: &mut CanonicalRecord, raw: &RawExtraction) {
        let medico = raw.get(fields::MEDICO_TRATANTE_REVISION);
        if !medico.is_empty() {
            record.medico_tratante = medico.to_string();
        }

        let organo_bloques = self.remove_routine_material(raw.get(fields::ORGANO_BLOQUES));
        if !organo_bloques.is_empty() {
            record.organ_final = Some(organo_bloques.clone());
        }

        let responsable_comentario = self.canonical_pathologist(raw.get(fields::RESPONSABLE_COMENTARIO));
        if !responsable_comentario.is_empty() {
            record.responsable_macro = responsable_comentario.clone();
        }

        record.details = ReportDetails::Review {
            responsable_comentario,
            organo_bloques,
        };
    }

    fn remove_routine_material(&self, organ: &str) -> String {
        match &self.routine_material {
            Some(regex) => collapse_whitespace(&regex.replace_all(organ, " ")),
            None => collapse_whitespace(organ),
        }
    }

    /// `PRESENTE` when any malignancy keyword appears as a whole word.
    pub fn detect_malignancy(&self, texts: &[&str]) -> Malignancy {
        let combined = normalize_for_match(&texts.join(" "));
        if self.malignancy.iter().any(|regex| regex.is_match(&combined)) {
            Malignancy::Presente
        } else {
            Malignancy::Ausente
        }
    }

    /// Specialty implied by the service; first matching rule wins.
    pub fn deduce_specialty(&self, service: &str) -> String {
        let vocabulary = &self.config.vocabulary;
        let service = normalize_for_match(service);

        vocabulary
            .specialty_rules
            .iter()
            .find(|rule| {
                let keyword = normalize_for_match(&rule.service_keyword);
                !keyword.is_empty() && service.contains(&keyword)
            })
            .map(|rule| rule.specialty.clone())
            .unwrap_or_else(|| vocabulary.default_specialty.clone())
    }

    /// Hospitalization from service keywords, else the report-type default.
    pub fn infer_hospitalization(&self, service: &str, report_type: ReportType) -> Hospitalization {
        let service = normalize_for_match(service);
        let inpatient_service = self
            .config
            .vocabulary
            .hospitalization_keywords
            .iter()
            .any(|keyword| service.contains(&normalize_for_match(keyword)));

        if inpatient_service {
            return Hospitalization::Si;
        }

        match report_type {
            ReportType::Autopsy | ReportType::Biopsy => Hospitalization::Si,
            ReportType::Immunohistochemistry | ReportType::Review | ReportType::Unknown => {
                Hospitalization::No
            }
        }
    }

    /// Map a signing name to a known pathologist, else return it trimmed.
    pub fn canonical_pathologist(&self, name: &str) -> String {
        let name = collapse_whitespace(name);
        if name.is_empty() {
            return name;
        }

        let vocabulary = &self.config.vocabulary;
        let normalized = normalize_for_match(&name);

        for known in &vocabulary.known_pathologists {
            let known_normalized = normalize_for_match(known);
            if known_normalized.is_empty() {
                continue;
            }
            if normalized.contains(&known_normalized) {
                return known.clone();
            }

            // Compare against the whole name and against its leading part,
            // since signatures append a second surname.
            let prefix = normalized.get(..known_normalized.len()).unwrap_or(&normalized);
            let score = jaro_winkler(&normalized, &known_normalized)
                .max(jaro_winkler(prefix, &known_normalized));
            if score >= vocabulary.pathologist_similarity {
                debug!(name = %name, known = %known, score, "Fuzzy-matched pathologist");
                return known.clone();
            }
        }

        name
    }

    /// Organ named in IHQ macroscopic text or in the storage table.
    pub fn resolve_ihq_organ(&self, macro_text: &str, text: &str) -> Option<String> {
        let macro_normalized = normalize_for_match(macro_text);
        for regex in &self.ihq_organ_phrases {
            if let Some(organ) = first_group(regex, &macro_normalized) {
                return Some(organ);
            }
        }

        // Table cells are separated by runs of two or more spaces
        let text_normalized = normalize_for_match(text);
        let captures = self.storage_row.as_ref()?.captures(&text_normalized)?;
        captures
            .get(1)?
            .as_str()
            .split("  ")
            .map(str::trim)
            .filter(|cell| !cell.is_empty())
            .nth(1)
            .map(str::to_string)
    }
}

/// `SI` when the macroscopic description is longer than 50 characters.
pub fn clinical_data_flag(macro_text: &str) -> &'static str {
    if macro_text.chars().count() > 50 {
        "SI"
    } else {
        "NO"
    }
}

/// OCR misreads "S.O.S" as "5.0.5" or "5.O.5" in IHQ headers.
fn correct_ihq_eps(eps: &str) -> String {
    eps.replace("5.0.5", "S.O.S").replace("5.O.5", "S.O.S")
}

fn first_group(regex: &Regex, text: &str) -> Option<String> {
    let value = collapse_whitespace(regex.captures(text)?.get(1)?.as_str());
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

fn compile(name: &str, pattern: &str) -> Option<Regex> {
    match Regex::new(pattern) {
        Ok(regex) => Some(regex),
        Err(err) => {
            warn!(rule = name, pattern, error = %err, "Invalid normalizer pattern");
            None
        }
    }
}
