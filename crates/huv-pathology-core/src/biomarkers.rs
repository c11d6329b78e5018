//! Biomarker extractor for immunohistochemistry reports.
//!
//! Each biomarker has its own tolerant pattern (OCR variants such as
//! "P 16", "KI-67", "HER2/neu"); a biomarker that is not found is an
//! empty string.

use std::collections::BTreeMap;

use regex::{Regex, RegexBuilder};
use tracing::warn;

use crate::models::BiomarkerPanel;

const ESTROGEN_LABEL: &str = r"(?:receptor(?:es)?\s+(?:hormonal(?:es)?\s+)?de\s+estr[oó]genos?|\bER\b)";
const PROGESTERONE_LABEL: &str =
    r"(?:receptor(?:es)?\s+(?:hormonal(?:es)?\s+)?de\s+progesterona|progest[aá]genos?|\bPR\b)";
const PDL1_LABEL: &str = r"\bPD\s*-?\s*L\s*-?\s*1\b";
const P16_LABEL: &str = r"\bP\s*-?\s*16\b";

/// Tokens dropped from the requested-studies list.
const STUDY_STOPWORDS: [&str; 6] = ["Y", "E", "O", "DE", "PARA", "CON"];

/// Status and percentage patterns for one receptor.
#[derive(Debug, Clone)]
struct ReceptorPatterns {
    status: Option<Regex>,
    percentage: Option<Regex>,
}

impl ReceptorPatterns {
    fn new(label: &str) -> Self {
        Self {
            status: compile(&format!(
                r"{}[^\n]*?\b(positiv[oa]s?|negativ[oa]s?)\b",
                label
            )),
            percentage: compile(&format!(r"{}[^\n%]*?(\d{{1,3}})\s*%", label)),
        }
    }
}

/// Extracts the fixed biomarker panel from report text.
#[derive(Debug, Clone)]
pub struct BiomarkerExtractor {
    her2_score: Option<Regex>,
    her2_ish: Option<Regex>,
    ki67: Option<Regex>,
    estrogen: ReceptorPatterns,
    progesterone: ReceptorPatterns,
    pdl1_tps: Option<Regex>,
    pdl1_cps: Option<Regex>,
    p16: ReceptorPatterns,
    p16_diffuse: Option<Regex>,
    requested_studies: Option<Regex>,
    study_separator: Option<Regex>,
    /// OCR corrections for requested-study tokens
    corrections: BTreeMap<String, String>,
}

impl Default for BiomarkerExtractor {
    fn default() -> Self {
        Self::new(crate::patterns::Vocabulary::default().study_corrections)
    }
}

impl BiomarkerExtractor {
    /// Create an extractor with the given study-token corrections.
    pub fn new(corrections: BTreeMap<String, String>) -> Self {
        Self {
            her2_score: compile(r"\bHER\s*-?\s*2(?:\s*/\s*NEU)?\b\s*[:\-]?\s*(?:score\s*)?(0|1\+|2\+|3\+)"),
            her2_ish: compile(r"\b(?:ISH|FISH|SISH)\b[^\n]*?\b(no\s+amplificad[oa]|amplificad[oa])\b"),
            ki67: compile(r"\bK[IL]\s*-?\s*67\b[^\n%]*?(\d{1,3})\s*%"),
            estrogen: ReceptorPatterns::new(ESTROGEN_LABEL),
            progesterone: ReceptorPatterns::new(PROGESTERONE_LABEL),
            pdl1_tps: compile(&format!(r"{}[^\n]*?\bTPS\b[^\n%]*?(\d{{1,3}})\s*%", PDL1_LABEL)),
            pdl1_cps: compile(&format!(r"{}[^\n]*?\bCPS\b[^\n\d]*(\d{{1,3}})", PDL1_LABEL)),
            p16: ReceptorPatterns::new(P16_LABEL),
            p16_diffuse: compile(&format!(r"{}[^\n]*?\b(?:en\s+bloque|difus[oa])\b", P16_LABEL)),
            requested_studies: compile(
                r"estudios\s+solicitados\s*:?\s*(?:se\s+realiz[oó]\s+tinci[oó]n\s+especial\s+para\s*)?([A-Z0-9 ,;+/\.\-]+)",
            ),
            study_separator: compile(r"[\s,;]+"),
            corrections: corrections
                .into_iter()
                .map(|(token, corrected)| (token.to_uppercase(), corrected.to_uppercase()))
                .collect(),
        }
    }

    /// Extract every biomarker from `text`.
    pub fn extract(&self, text: &str) -> BiomarkerPanel {
        BiomarkerPanel {
            her2: self.her2(text),
            ki67: self.ki67(text),
            estrogen_receptor: receptor(&self.estrogen, text),
            progesterone_receptor: receptor(&self.progesterone, text),
            pdl1: self.pdl1(text),
            requested_studies: self.requested_studies(text),
            p16_status: self.p16_status(text),
            p16_percentage: percentage(self.p16.percentage.as_ref(), text)
                .map(|value| format!("{}%", value))
                .unwrap_or_default(),
        }
    }

    /// HER2 score, with the ISH/FISH result appended when reported.
    pub fn her2(&self, text: &str) -> String {
        let Some(score) = first_group(self.her2_score.as_ref(), text) else {
            return String::new();
        };

        match first_group(self.her2_ish.as_ref(), text) {
            Some(ish) if ish.to_uppercase().starts_with("NO") => format!("{} (NO AMPLIFICADO)", score),
            Some(_) => format!("{} (AMPLIFICADO)", score),
            None => score,
        }
    }

    /// Ki-67 proliferation index, e.g. `"20%"`.
    pub fn ki67(&self, text: &str) -> String {
        percentage(self.ki67.as_ref(), text)
            .map(|value| format!("{}%", value))
            .unwrap_or_default()
    }

    /// PD-L1 as `"TPS x% (CPS y)"`, `"TPS x%"` or `"CPS y"`.
    pub fn pdl1(&self, text: &str) -> String {
        let tps = percentage(self.pdl1_tps.as_ref(), text);
        let cps = first_group(self.pdl1_cps.as_ref(), text);

        match (tps, cps) {
            (Some(tps), Some(cps)) => format!("TPS {}% (CPS {})", tps, cps),
            (Some(tps), None) => format!("TPS {}%", tps),
            (None, Some(cps)) => format!("CPS {}", cps),
            (None, None) => String::new(),
        }
    }

    /// P16 status; diffuse or block staining counts as positive.
    pub fn p16_status(&self, text: &str) -> String {
        if let Some(status) = first_group(self.p16.status.as_ref(), text) {
            return normalize_status(&status);
        }
        match &self.p16_diffuse {
            Some(regex) if regex.is_match(text) => "POSITIVO".to_string(),
            _ => String::new(),
        }
    }

    /// Requested studies: tokenized, corrected, deduplicated in order.
    pub fn requested_studies(&self, text: &str) -> String {
        let Some(list) = first_group(self.requested_studies.as_ref(), text) else {
            return String::new();
        };
        let Some(separator) = &self.study_separator else {
            return String::new();
        };

        let mut studies: Vec<String> = Vec::new();
        for token in separator.split(&list) {
            let token = token
                .trim_matches(|c: char| c == '.' || c == '-')
                .to_uppercase();
            if token.is_empty() || STUDY_STOPWORDS.contains(&token.as_str()) {
                continue;
            }

            let corrected = self.corrections.get(&token).cloned().unwrap_or(token);
            if !studies.contains(&corrected) {
                studies.push(corrected);
            }
        }

        studies.join(", ")
    }
}

/// Receptor value: `"POSITIVO 90%"`, `"NEGATIVO"`, `"15%"`, or empty.
fn receptor(patterns: &ReceptorPatterns, text: &str) -> String {
    let status = first_group(patterns.status.as_ref(), text).map(|status| normalize_status(&status));
    let percent = percentage(patterns.percentage.as_ref(), text);

    match (status, percent) {
        (Some(status), Some(percent)) => format!("{} {}%", status, percent),
        (Some(status), None) => status,
        (None, Some(percent)) => format!("{}%", percent),
        (None, None) => String::new(),
    }
}

fn normalize_status(status: &str) -> String {
    if status.to_uppercase().starts_with("POSITIV") {
        "POSITIVO".to_string()
    } else {
        "NEGATIVO".to_string()
    }
}

/// Captured percentage, discarded when outside 0..=100.
fn percentage(regex: Option<&Regex>, text: &str) -> Option<u32> {
    let value: u32 = first_group(regex, text)?.parse().ok()?;
    (value <= 100).then_some(value)
}

fn first_group(regex: Option<&Regex>, text: &str) -> Option<String> {
    let value = regex?.captures(text)?.get(1)?.as_str().trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

fn compile(pattern: &str) -> Option<Regex> {
    match RegexBuilder::new(pattern).case_insensitive(true).build() {
        Ok(regex) => Some(regex),
        Err(err) => {
            warn!(pattern, error = %err, "Invalid biomarker pattern");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BREAST_PANEL: &str = "\
Estudios solicitados: HER2, Ki67, RE, PL6 y HER2
RESULTADO DE INMUNOHISTOQUÍMICA
HER2/neu: 2+ (equívoco)
Estudio FISH: no amplificado
Ki-67: positivo en el 25% de las células tumorales
Receptores de estrógeno: positivo fuerte en el 90% de las células
Receptores de progesterona: negativo
";

    #[test]
    fn test_breast_panel() {
        let extractor = BiomarkerExtractor::default();
        let panel = extractor.extract(BREAST_PANEL);

        assert_eq!(panel.her2, "2+ (NO AMPLIFICADO)");
        assert_eq!(panel.ki67, "25%");
        assert_eq!(panel.estrogen_receptor, "POSITIVO 90%");
        assert_eq!(panel.progesterone_receptor, "NEGATIVO");
        assert_eq!(panel.pdl1, "");
        assert_eq!(panel.p16_status, "");
    }

    #[test]
    fn test_requested_studies_corrected_and_deduplicated() {
        let extractor = BiomarkerExtractor::default();
        let panel = extractor.extract(BREAST_PANEL);

        assert_eq!(panel.requested_studies, "HER2, KI-67, RE, P16");
    }

    #[test]
    fn test_her2_amplified() {
        let extractor = BiomarkerExtractor::default();
        assert_eq!(extractor.her2("HER2: 3+\nSISH: amplificado"), "3+ (AMPLIFICADO)");
        assert_eq!(extractor.her2("HER2 score 0"), "0");
        assert_eq!(extractor.her2("Sin HER2 reportado"), "");
    }

    #[test]
    fn test_pdl1_variants() {
        let extractor = BiomarkerExtractor::default();
        let test_cases = [
            ("PD-L1 (22C3): TPS 50%, CPS 60", "TPS 50% (CPS 60)"),
            ("PDL1 TPS: 5 %", "TPS 5%"),
            ("PD L1 con CPS de 12", "CPS 12"),
            ("PD-L1 no realizado", ""),
        ];

        for (text, expected) in test_cases {
            assert_eq!(extractor.pdl1(text), expected, "Failed for: {}", text);
        }
    }

    #[test]
    fn test_p16_variants() {
        let extractor = BiomarkerExtractor::default();

        let panel = extractor.extract("P 16: positivo en el 70% de las células");
        assert_eq!(panel.p16_status, "POSITIVO");
        assert_eq!(panel.p16_percentage, "70%");

        let panel = extractor.extract("p16 con tinción en bloque");
        assert_eq!(panel.p16_status, "POSITIVO");
        assert_eq!(panel.p16_percentage, "");

        let panel = extractor.extract("P16 negativa");
        assert_eq!(panel.p16_status, "NEGATIVO");
    }

    #[test]
    fn test_out_of_range_percentage_discarded() {
        let extractor = BiomarkerExtractor::default();
        assert_eq!(extractor.ki67("Ki-67: 250%"), "");
        assert_eq!(extractor.ki67("KI 67 100%"), "100%");
    }

    #[test]
    fn test_empty_text() {
        let extractor = BiomarkerExtractor::default();
        assert!(extractor.extract("").is_empty());
    }
}
