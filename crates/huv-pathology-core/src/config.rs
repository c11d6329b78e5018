//! Hospital configuration and processing clock.

use std::collections::BTreeMap;

use chrono::{Local, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::models::ReportType;
use crate::patterns::Vocabulary;
use crate::PathologyResult;

/// How a three-token patient name is split.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum NameSplitPolicy {
    /// `first middle surname`
    #[default]
    MiddleName,
    /// `first surname surname`
    TwoSurnames,
}

/// Static hospital values and tunable vocabularies.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct HospitalConfig {
    pub sede: String,
    pub departamento: String,
    pub municipio: String,
    /// Document type used when none is found in the report
    pub tipo_documento: String,
    pub tarifa: String,
    pub valor: String,
    pub copago: String,
    pub descuento: String,
    /// Default three-token name policy
    pub name_policy: NameSplitPolicy,
    /// Per report type policy overrides
    pub name_policy_overrides: BTreeMap<ReportType, NameSplitPolicy>,
    pub vocabulary: Vocabulary,
}

impl Default for HospitalConfig {
    fn default() -> Self {
        let mut name_policy_overrides = BTreeMap::new();
        name_policy_overrides.insert(ReportType::Biopsy, NameSplitPolicy::TwoSurnames);

        Self {
            sede: "PRINCIPAL".into(),
            departamento: "VALLE DEL CAUCA".into(),
            municipio: "CALI".into(),
            tipo_documento: "CC".into(),
            tarifa: "GENERAL".into(),
            valor: "0".into(),
            copago: "0".into(),
            descuento: "0".into(),
            name_policy: NameSplitPolicy::MiddleName,
            name_policy_overrides,
            vocabulary: Vocabulary::default(),
        }
    }
}

impl HospitalConfig {
    /// Parse a JSON configuration; omitted keys keep their defaults.
    pub fn from_json(json: &str) -> PathologyResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Name split policy for a report type.
    pub fn name_policy_for(&self, report_type: ReportType) -> NameSplitPolicy {
        self.name_policy_overrides
            .get(&report_type)
            .copied()
            .unwrap_or(self.name_policy)
    }
}

/// Source of "today" and the processing timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProcessingClock {
    /// Local wall clock
    #[default]
    System,
    /// Fixed instant, for reproducible output
    Fixed(NaiveDateTime),
}

impl ProcessingClock {
    /// Fixed clock at midnight of `date`.
    pub fn fixed_date(date: NaiveDate) -> Self {
        ProcessingClock::Fixed(date.and_time(chrono::NaiveTime::MIN))
    }

    pub fn now(&self) -> NaiveDateTime {
        match self {
            ProcessingClock::System => Local::now().naive_local(),
            ProcessingClock::Fixed(instant) => *instant,
        }
    }

    pub fn today(&self) -> NaiveDate {
        self.now().date()
    }

    /// Timestamp for the `Hora Desc. macro` column.
    pub fn timestamp(&self) -> String {
        self.now().format("%Y-%m-%d %H:%M:%S").to_string()
    }
}
