//! Report type classifier.
//!
//! Two tiers, first decisive one wins:
//! 1. Request-number prefix (`A` + 6 digits, `IHQ` + 6, `M` + 7, `R` + 6)
//! 2. Keywords anywhere in the accent-folded, uppercased text

use regex::Regex;
use tracing::{debug, warn};

use crate::models::ReportType;
use crate::text::normalize_for_match;

/// Decides the report type of an OCR text.
#[derive(Debug, Clone)]
pub struct ReportClassifier {
    /// Locates the request number in the raw text
    request_number: Option<Regex>,
    /// Prefix rules applied to the uppercased request number, in order
    prefixes: Vec<(Regex, ReportType)>,
    /// Keyword rules applied to normalized text, in order
    keywords: Vec<(Vec<&'static str>, ReportType)>,
}

impl Default for ReportClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportClassifier {
    /// Create a classifier with the hospital's numbering scheme.
    pub fn new() -> Self {
        let request_number = compile(r"(?i)N\.\s*petici[oó]n\s*:\s*([A-Z0-9\-]+)");

        let prefixes = [
            (r"^A\d{6}", ReportType::Autopsy),
            (r"^IHQ\d{6}", ReportType::Immunohistochemistry),
            (r"^M\d{7}", ReportType::Biopsy),
            (r"^R\d{6}", ReportType::Review),
        ]
        .into_iter()
        .filter_map(|(pattern, report_type)| compile(pattern).map(|regex| (regex, report_type)))
        .collect();

        let keywords = vec![
            (vec!["AUTOPSIA"], ReportType::Autopsy),
            (vec!["INMUNOHISTOQUIMICA"], ReportType::Immunohistochemistry),
            (vec!["HISTOLOGIA", "BIOPSIA"], ReportType::Biopsy),
            (vec!["REVISION"], ReportType::Review),
        ];

        Self {
            request_number,
            prefixes,
            keywords,
        }
    }

    /// Classify a report. Never fails: unrecognized text is `Unknown`.
    pub fn classify(&self, text: &str) -> ReportType {
        if let Some(number) = self.request_number(text) {
            if let Some(report_type) = self.classify_request_number(&number) {
                debug!(request_number = %number, %report_type, tier = "prefix", "Classified report");
                return report_type;
            }
        }

        let normalized = normalize_for_match(text);
        for (keywords, report_type) in &self.keywords {
            if keywords.iter().any(|keyword| normalized.contains(keyword)) {
                debug!(%report_type, tier = "keyword", "Classified report");
                return *report_type;
            }
        }

        debug!("Report type not recognized");
        ReportType::Unknown
    }

    /// Uppercased request number, when the text carries one.
    pub fn request_number(&self, text: &str) -> Option<String> {
        let captures = self.request_number.as_ref()?.captures(text)?;
        Some(captures.get(1)?.as_str().to_uppercase())
    }

    /// Report type implied by a request number prefix.
    pub fn classify_request_number(&self, number: &str) -> Option<ReportType> {
        let number = number.trim().to_uppercase();
        self.prefixes
            .iter()
            .find(|(regex, _)| regex.is_match(&number))
            .map(|(_, report_type)| *report_type)
    }
}

fn compile(pattern: &str) -> Option<Regex> {
    match Regex::new(pattern) {
        Ok(regex) => Some(regex),
        Err(err) => {
            warn!(pattern, error = %err, "Invalid classifier pattern");
            None
        }
    }
}
