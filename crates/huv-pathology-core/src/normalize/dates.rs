//! Date normalization and age-based birth date derivation.

use chrono::{Days, Months, NaiveDate};
use regex::Regex;

use crate::text::fold_accents;

/// Output format for every date column.
pub const OUTPUT_DATE_FORMAT: &str = "%d/%m/%Y";

const INPUT_DATE_FORMATS: [&str; 3] = ["%d/%m/%Y", "%Y-%m-%d", "%d-%m-%Y"];

/// Parse `DD/MM/YYYY`, `YYYY-MM-DD` or `DD-MM-YYYY`.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    INPUT_DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(value, format).ok())
}

/// Reformat a date as `DD/MM/YYYY`.
///
/// Empty input stays empty; unparseable input is returned unchanged.
pub fn normalize_date(value: &str) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return String::new();
    }

    match parse_date(trimmed) {
        Some(date) => date.format(OUTPUT_DATE_FORMAT).to_string(),
        None => value.to_string(),
    }
}

/// Age expressed as calendar components, e.g. "33 años 10 meses 27 dias".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AgeSpan {
    pub years: u32,
    pub months: u32,
    pub days: u32,
}

impl AgeSpan {
    /// Subtract this span from `reference` using calendar arithmetic.
    ///
    /// Years and months are subtracted together (day clamped to the end of
    /// the target month), then days.
    pub fn birth_date(&self, reference: NaiveDate) -> Option<NaiveDate> {
        let total_months = self.years.checked_mul(12)?.checked_add(self.months)?;
        reference
            .checked_sub_months(Months::new(total_months))?
            .checked_sub_days(Days::new(u64::from(self.days)))
    }
}

/// Reads free-text ages with one matcher per component.
#[derive(Debug, Clone)]
pub struct AgeParser {
    years: Option<Regex>,
    months: Option<Regex>,
    days: Option<Regex>,
}

impl Default for AgeParser {
    fn default() -> Self {
        Self::new()
    }
}

impl AgeParser {
    pub fn new() -> Self {
        // Matched against accent-folded, lowercased text
        Self {
            years: super::compile("age_years", r"(\d+)\s*anos?\b"),
            months: super::compile("age_months", r"(\d+)\s*mes(?:es)?\b"),
            days: super::compile("age_days", r"(\d+)\s*dias?\b"),
        }
    }

    /// Parse the first years, months and days components of an age text.
    ///
    /// Accepts singular and plural, accented or not ("año", "anos", "mes",
    /// "días"). Returns `None` when no component is present.
    pub fn parse(&self, text: &str) -> Option<AgeSpan> {
        let folded = fold_accents(text).to_ascii_lowercase();
        let years = component(self.years.as_ref(), &folded);
        let months = component(self.months.as_ref(), &folded);
        let days = component(self.days.as_ref(), &folded);

        if years.is_none() && months.is_none() && days.is_none() {
            return None;
        }

        Some(AgeSpan {
            years: years.unwrap_or(0),
            months: months.unwrap_or(0),
            days: days.unwrap_or(0),
        })
    }

    /// Birth date for an age text, formatted `DD/MM/YYYY`, or empty.
    pub fn birth_date(&self, age_text: &str, reference: NaiveDate) -> String {
        self.parse(age_text)
            .and_then(|span| span.birth_date(reference))
            .map(|date| date.format(OUTPUT_DATE_FORMAT).to_string())
            .unwrap_or_default()
    }
}

fn component(regex: Option<&Regex>, text: &str) -> Option<u32> {
    regex?.captures(text)?.get(1)?.as_str().parse().ok()
}
