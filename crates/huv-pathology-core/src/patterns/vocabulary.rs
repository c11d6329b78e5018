//! Domain vocabularies: keyword tables driving the normalization rules.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::models::ReportType;

/// Maps a service keyword to the specialty it implies.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SpecialtyRule {
    /// Keyword searched in the accent-folded, uppercased service
    pub service_keyword: String,
    /// Specialty emitted on match
    pub specialty: String,
}

impl SpecialtyRule {
    fn new(service_keyword: &str, specialty: &str) -> Self {
        Self {
            service_keyword: service_keyword.into(),
            specialty: specialty.into(),
        }
    }
}

/// Keyword tables, all compared against accent-folded uppercase text.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct Vocabulary {
    /// Whole-word terms marking a report as malignant
    pub malignancy_keywords: Vec<String>,
    /// Ordered specialty rules; first match wins
    pub specialty_rules: Vec<SpecialtyRule>,
    /// Specialty when no rule matches
    pub default_specialty: String,
    /// Service substrings implying an inpatient
    pub hospitalization_keywords: Vec<String>,
    /// CUPS code per report type
    pub cups_codes: BTreeMap<ReportType, String>,
    /// Procedure description per CUPS code
    pub procedures: BTreeMap<String, String>,
    /// OCR corrections for requested-study tokens
    pub study_corrections: BTreeMap<String, String>,
    /// Signing pathologists names are canonicalized to
    pub known_pathologists: Vec<String>,
    /// Minimum Jaro-Winkler similarity for a fuzzy pathologist match
    pub pathologist_similarity: f64,
}

impl Default for Vocabulary {
    fn default() -> Self {
        Self {
            malignancy_keywords: Self::default_malignancy_keywords(),
            specialty_rules: Self::default_specialty_rules(),
            default_specialty: "MEDICINA GENERAL".into(),
            hospitalization_keywords: ["UCI", "URGENCIAS", "ADMISION", "QUIROFANO"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            cups_codes: Self::default_cups_codes(),
            procedures: Self::default_procedures(),
            study_corrections: Self::default_study_corrections(),
            known_pathologists: ["NANCY MEJIA", "ARMANDO CORTES", "BRANDON GOMEZ"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            pathologist_similarity: 0.90,
        }
    }
}

impl Vocabulary {
    /// CUPS code for a report type, empty when unknown.
    pub fn cups_for(&self, report_type: ReportType) -> &str {
        self.cups_codes
            .get(&report_type)
            .map(String::as_str)
            .unwrap_or("")
    }

    /// Procedure description for a CUPS code, empty when unknown.
    pub fn procedure_for(&self, cups_code: &str) -> &str {
        self.procedures
            .get(cups_code)
            .map(String::as_str)
            .unwrap_or("")
    }

    /// Add a malignancy keyword.
    pub fn add_malignancy_keyword(&mut self, keyword: &str) {
        let keyword = crate::text::normalize_for_match(keyword);
        if !self.malignancy_keywords.contains(&keyword) {
            self.malignancy_keywords.push(keyword);
        }
    }

    /// Add a study-token correction.
    pub fn add_study_correction(&mut self, token: &str, corrected: &str) {
        self.study_corrections
            .insert(token.to_uppercase(), corrected.to_uppercase());
    }

    fn default_malignancy_keywords() -> Vec<String> {
        [
            "CARCINOMA",
            "CANCER",
            "MALIGNO",
            "MALIGNIDAD",
            "METASTASIS",
            "METASTASICO",
            "NEOPLASIA MALIGNA",
            "TUMOR MALIGNO",
            "ADENOCARCINOMA",
            "LINFOMA",
            "SARCOMA",
            "MELANOMA",
            "LEUCEMIA",
            "HODGKIN",
            "HODKING",
            "PAGET",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect()
    }

    fn default_specialty_rules() -> Vec<SpecialtyRule> {
        vec![
            SpecialtyRule::new("UCI", "MEDICO INTENSIVISTA"),
            SpecialtyRule::new("GINECOLOGIA ONCOLOGICA", "GINECOLOGIA ONCOLOGICA"),
            SpecialtyRule::new("ALTO RIESGO OBSTETRICO", "GINECOLOGIA ONCOLOGICA"),
            SpecialtyRule::new("GINECOLOGIA", "GINECOLOGIA Y OBSTETRICIA"),
            SpecialtyRule::new("URGENCIAS", "MEDICINA DE URGENCIAS"),
            SpecialtyRule::new("NEONATOLOGIA", "NEONATOLOGIA"),
            SpecialtyRule::new("PEDIATRIA", "PEDIATRA"),
            SpecialtyRule::new("MEDICINA", "MEDICINA GENERAL"),
        ]
    }

    fn default_cups_codes() -> BTreeMap<ReportType, String> {
        let mut map = BTreeMap::new();
        map.insert(ReportType::Autopsy, "898301".into());
        map.insert(ReportType::Immunohistochemistry, "898807".into());
        map.insert(ReportType::Biopsy, "898201".into());
        map.insert(ReportType::Review, "898806".into());
        map
    }

    fn default_procedures() -> BTreeMap<String, String> {
        let mut map = BTreeMap::new();
        map.insert("898301".into(), "898301 Autopsia completa".into());
        map.insert(
            "898807".into(),
            "898807 Estudio anatomopatologico de marcacion inmunohistoquimica basica (especifico)"
                .into(),
        );
        map.insert(
            "898201".into(),
            "898201 Estudio de coloracion basica en especimen de reconocimiento".into(),
        );
        map.insert(
            "898806".into(),
            "898806 Verificacion integral con preparacion de material de rutina".into(),
        );
        // Not produced by the classifier; kept for configured report types
        map.insert(
            "898241".into(),
            "898241 Estudio de coloracion basica en citologia".into(),
        );
        map.insert(
            "898242".into(),
            "898242 Estudio de coloracion basica en biopsia por congelacion".into(),
        );
        map
    }

    fn default_study_corrections() -> BTreeMap<String, String> {
        let mut map = BTreeMap::new();

        // Digit/letter confusions
        map.insert("PL6".into(), "P16".into());
        map.insert("PI6".into(), "P16".into());
        map.insert("P-16".into(), "P16".into());
        map.insert("P4O".into(), "P40".into());
        map.insert("CK2O".into(), "CK20".into());

        // Spelling variants
        map.insert("KI67".into(), "KI-67".into());
        map.insert("K167".into(), "KI-67".into());
        map.insert("KL67".into(), "KI-67".into());
        map.insert("PDL1".into(), "PD-L1".into());
        map.insert("PDL-1".into(), "PD-L1".into());
        map.insert("HER2NEU".into(), "HER2".into());
        map.insert("HER-2".into(), "HER2".into());
        map.insert("CKAE1AE3".into(), "CKAE1/AE3".into());

        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cups_and_procedures() {
        let vocab = Vocabulary::default();
        assert_eq!(vocab.cups_for(ReportType::Autopsy), "898301");
        assert_eq!(vocab.cups_for(ReportType::Unknown), "");
        assert_eq!(vocab.procedure_for("898301"), "898301 Autopsia completa");
        assert_eq!(vocab.procedure_for(""), "");
    }

    #[test]
    fn test_specialty_rules_specific_first() {
        let vocab = Vocabulary::default();
        let position = |keyword: &str| {
            vocab
                .specialty_rules
                .iter()
                .position(|rule| rule.service_keyword == keyword)
                .unwrap()
        };
        assert!(position("GINECOLOGIA ONCOLOGICA") < position("GINECOLOGIA"));
        assert!(position("URGENCIAS") < position("MEDICINA"));
    }

    #[test]
    fn test_add_malignancy_keyword_normalizes() {
        let mut vocab = Vocabulary::default();
        let before = vocab.malignancy_keywords.len();
        vocab.add_malignancy_keyword("mesotelioma");
        vocab.add_malignancy_keyword("Linfoma");
        assert_eq!(vocab.malignancy_keywords.len(), before + 1);
        assert!(vocab.malignancy_keywords.contains(&"MESOTELIOMA".to_string()));
    }

    #[test]
    fn test_add_study_correction_reaches_extractor() {
        let mut vocab = Vocabulary::default();
        vocab.add_study_correction("cd-2o", "cd20");
        assert_eq!(vocab.study_corrections.get("CD-2O").map(String::as_str), Some("CD20"));

        let extractor = crate::biomarkers::BiomarkerExtractor::new(vocab.study_corrections);
        assert_eq!(
            extractor.requested_studies("Estudios solicitados: CD-2O, CD3 y CD20"),
            "CD20, CD3"
        );
    }

    #[test]
    fn test_vocabulary_from_json() {
        let vocab: Vocabulary =
            serde_json::from_str(r#"{"known_pathologists": ["ANA RUIZ"]}"#).unwrap();
        assert_eq!(vocab.known_pathologists, vec!["ANA RUIZ".to_string()]);
        assert_eq!(vocab.default_specialty, "MEDICINA GENERAL");
    }
}
