//! Pattern registry: ordered field-extraction rules per report type.
//!
//! Every report type starts from the shared base rules; type-specific rules
//! replace a base rule with the same field name or append new fields.
//! All patterns are compiled case-insensitive with `.` matching newlines.
//! Section headers that must not match mid-sentence are wrapped in `(?-i:...)`.

pub mod vocabulary;

pub use vocabulary::*;

use regex::{Regex, RegexBuilder};
use tracing::warn;

use crate::models::ReportType;
use crate::{PathologyError, PathologyResult};

/// Field names produced by the built-in rules.
pub mod fields {
    pub const NOMBRE_COMPLETO: &str = "nombre_completo";
    pub const NUMERO_PETICION: &str = "numero_peticion";
    pub const IDENTIFICACION_NUMERO: &str = "identificacion_numero";
    pub const TIPO_DOCUMENTO: &str = "tipo_documento";
    pub const GENERO: &str = "genero";
    pub const EDAD: &str = "edad";
    pub const EPS: &str = "eps";
    pub const MEDICO_TRATANTE: &str = "medico_tratante";
    pub const SERVICIO: &str = "servicio";
    pub const FECHA_INGRESO: &str = "fecha_ingreso";
    pub const FECHA_INFORME: &str = "fecha_informe";
    pub const ORGANO: &str = "organo";
    pub const RESPONSABLE_ANALISIS: &str = "responsable_analisis";
    pub const DESCRIPCION_MACROSCOPICA: &str = "descripcion_macroscopica";
    pub const DESCRIPCION_MICROSCOPICA: &str = "descripcion_microscopica";
    pub const DIAGNOSTICO: &str = "diagnostico";
    pub const COMENTARIOS: &str = "comentarios";
    pub const IDENTIFICADOR_UNICO: &str = "identificador_unico";
    pub const NUMERO_AUTORIZACION: &str = "numero_autorizacion";

    // Autopsy
    pub const FECHA_AUTOPSIA: &str = "fecha_autopsia";
    pub const CERTIFICADO_DEFUNCION: &str = "certificado_defuncion";

    // Biopsy
    pub const IDENTIFICADOR_HISTORIA: &str = "identificador_historia";

    // Immunohistochemistry
    pub const FECHA_TOMA: &str = "fecha_toma";
    pub const FECHA_DIAGNOSTICO: &str = "fecha_diagnostico";

    // Review
    pub const ORGANO_BLOQUES: &str = "organo_bloques";
    pub const MEDICO_TRATANTE_REVISION: &str = "medico_tratante_revision";
    pub const RESPONSABLE_COMENTARIO: &str = "responsable_comentario";
}

/// How a captured value is cleaned up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldShape {
    /// Single-line value: every whitespace run becomes one space
    Inline,
    /// Multi-line section: whitespace collapsed per line, line breaks kept
    Block,
}

/// A named extraction rule. Capture group 1 is the field value.
#[derive(Debug, Clone)]
pub struct FieldRule {
    field: String,
    regex: Option<Regex>,
    shape: FieldShape,
}

impl FieldRule {
    /// Compile a rule; an invalid pattern is reported as [`PathologyError::Pattern`].
    pub fn new(field: &str, pattern: &str, shape: FieldShape) -> PathologyResult<Self> {
        let regex = compile_pattern(pattern).map_err(|source| PathologyError::Pattern {
            field: field.to_string(),
            source,
        })?;
        Ok(Self {
            field: field.to_string(),
            regex: Some(regex),
            shape,
        })
    }

    /// Rule that never matches; keeps the field registered.
    fn never_matching(field: &str, shape: FieldShape) -> Self {
        Self {
            field: field.to_string(),
            regex: None,
            shape,
        }
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    /// Compiled pattern, `None` when the configured pattern was invalid.
    pub fn regex(&self) -> Option<&Regex> {
        self.regex.as_ref()
    }

    pub fn shape(&self) -> FieldShape {
        self.shape
    }
}

/// Compile a pattern with the registry's flags (case-insensitive, dot-all).
pub fn compile_pattern(pattern: &str) -> Result<Regex, regex::Error> {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .dot_matches_new_line(true)
        .build()
}

/// Ordered extraction rules for one report type.
#[derive(Debug, Clone)]
pub struct PatternRegistry {
    report_type: ReportType,
    rules: Vec<FieldRule>,
}

type RuleSpec = (&'static str, &'static str, FieldShape);

impl PatternRegistry {
    /// Registry for `report_type`: base rules plus the type's own rules.
    pub fn for_report_type(report_type: ReportType) -> Self {
        let mut registry = Self {
            report_type,
            rules: Vec::new(),
        };

        registry.install(Self::base_rules());
        match report_type {
            ReportType::Autopsy => registry.install(Self::autopsy_rules()),
            ReportType::Biopsy => registry.install(Self::biopsy_rules()),
            ReportType::Immunohistochemistry => {
                registry.install(Self::immunohistochemistry_rules())
            }
            ReportType::Review => registry.install(Self::review_rules()),
            ReportType::Unknown => {}
        }

        registry
    }

    pub fn report_type(&self) -> ReportType {
        self.report_type
    }

    /// Rules in application order.
    pub fn rules(&self) -> &[FieldRule] {
        &self.rules
    }

    /// Rule registered for `field`.
    pub fn get(&self, field: &str) -> Option<&FieldRule> {
        self.rules.iter().find(|rule| rule.field == field)
    }

    /// Registered field names in application order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.rules.iter().map(|rule| rule.field.as_str())
    }

    /// Add or replace a rule.
    ///
    /// An invalid pattern still registers the field as a permanent miss so
    /// the extraction keeps its shape, and the compile error is returned.
    pub fn add_rule(&mut self, field: &str, pattern: &str, shape: FieldShape) -> PathologyResult<()> {
        match FieldRule::new(field, pattern, shape) {
            Ok(rule) => {
                self.set_rule(rule);
                Ok(())
            }
            Err(err) => {
                warn!(field, report_type = %self.report_type, error = %err, "Invalid extraction pattern");
                self.set_rule(FieldRule::never_matching(field, shape));
                Err(err)
            }
        }
    }

    fn install(&mut self, specs: &[RuleSpec]) {
        for &(field, pattern, shape) in specs {
            // Built-in patterns degrade to a miss; the warning is logged in add_rule
            let _ = self.add_rule(field, pattern, shape);
        }
    }

    fn set_rule(&mut self, rule: FieldRule) {
        match self.rules.iter_mut().find(|existing| existing.field == rule.field) {
            Some(existing) => *existing = rule,
            None => self.rules.push(rule),
        }
    }

    /// Rules shared by every report layout.
    fn base_rules() -> &'static [RuleSpec] {
        use fields::*;
        use FieldShape::*;

        &[
            (
                NOMBRE_COMPLETO,
                r"Nombre\s*:\s*([^\n]+?)\s*(?:N\.\s*petici[oó]n|N\.\s*Identificaci[oó]n|\n|$)",
                Inline,
            ),
            (NUMERO_PETICION, r"N\.\s*petici[oó]n\s*:\s*([A-Z0-9\-]+)", Inline),
            (
                IDENTIFICACION_NUMERO,
                r"N\.\s*Identificaci[oó]n\s*:\s*[A-Z\.]{0,3}\s*([0-9][0-9\.]*)",
                Inline,
            ),
            (TIPO_DOCUMENTO, r"N\.\s*Identificaci[oó]n\s*:\s*([A-Z]{1,3})\.?", Inline),
            (GENERO, r"G[eé]nero\s*:\s*([A-Z]+)", Inline),
            (
                EDAD,
                r"Edad\s*:\s*([^\n]+?)\s*(?:G[eé]nero\s*:|\bEPS\s*:|\n|$)",
                Inline,
            ),
            (
                EPS,
                r"\bEPS\s*:\s*([^\n]+?)\s*(?:M[eé]dico\s+tratante|Servicio\s*:|\n|$)",
                Inline,
            ),
            (
                MEDICO_TRATANTE,
                r"M[eé]dico\s+tratante\s*:\s*([^\n]+?)\s*(?:Servicio|Fecha\s+Ingreso|\n|$)",
                Inline,
            ),
            (
                SERVICIO,
                r"Servicio\s*:\s*([^\n]+?)\s*(?:Fecha\s+(?:de\s+)?Ingreso|\n|$)",
                Inline,
            ),
            (
                FECHA_INGRESO,
                r"Fecha\s+(?:de\s+)?Ingreso[^\d/]*(\d{2}/\d{2}/\d{4})",
                Inline,
            ),
            (
                FECHA_INFORME,
                r"Fecha\s+(?:de\s+)?Informe[^\d/]*(\d{2}/\d{2}/\d{4})",
                Inline,
            ),
            (
                ORGANO,
                r"(?:^|\n)[ \t]*[OÓ]rgano[ \t]*(?:\(1\.[^)\n]*\))?[ \t]*:?[ \t]*([^\n]+?)(?:[ \t]{2,}(?-i:[A-ZÁÉÍÓÚÑ]{2,})[^\n]*)?(?:\n|$)",
                Inline,
            ),
            (
                RESPONSABLE_ANALISIS,
                r"(?m)^[ \t]*(?-i:([A-ZÁÉÍÓÚÑ][A-ZÁÉÍÓÚÑ ]*[A-ZÁÉÍÓÚÑ]))[ \t]*\n[ \t]*(?:Responsable\s+del\s+an[aá]lisis|M[eé]dic[oa]\s+Pat[oó]log[oa])",
                Inline,
            ),
            (
                DESCRIPCION_MACROSCOPICA,
                r"(?-i:DESCRIPCI[OÓ]N\s+MACROSC[OÓ]PICA)[ \t]*\n?(.+?)(?:(?-i:DESCRIPCI[OÓ]N\s+MICROSC[OÓ]PICA)|(?-i:PROTOCOLO\s+MICROSC[OÓ]PICO)|\n[ \t]*(?-i:DIAGN[OÓ]STICO)[ \t]*\n|$)",
                Block,
            ),
            (
                DESCRIPCION_MICROSCOPICA,
                r"(?:(?-i:DESCRIPCI[OÓ]N\s+MICROSC[OÓ]PICA)|(?-i:PROTOCOLO\s+MICROSC[OÓ]PICO))[ \t]*\n?(.+?)(?:\n[ \t]*(?-i:DIAGN[OÓ]STICO)|$)",
                Block,
            ),
            (
                DIAGNOSTICO,
                r"(?:^|\n)[ \t]*(?-i:DIAGN[OÓ]STICO)[ \t]*:?[ \t]*\n(?:[ \t]*Diagn[oó]sticos\s+anatomopatol[oó]gicos\s*:)?\s*(.+?)(?:\n[ \t]*(?-i:COMENTARIOS?)|\n[ \t]*(?-i:[A-ZÁÉÍÓÚÑ][A-ZÁÉÍÓÚÑ ]+)[ \t]*\n[ \t]*(?:Responsable\s+del\s+an[aá]lisis|M[eé]dic[oa]\s+Pat[oó]log[oa])|Nota\s*:\s*Este\s+informe|Todos\s+los\s+an[aá]lisis\s+son\s+avalados|$)",
                Block,
            ),
            (
                COMENTARIOS,
                r"(?:^|\n)[ \t]*(?-i:COMENTARIOS?)[ \t]*:?[ \t]*\n(.+?)(?:\n[ \t]*(?-i:[A-ZÁÉÍÓÚÑ][A-ZÁÉÍÓÚÑ ]+)[ \t]*\n[ \t]*(?:Responsable\s+del\s+an[aá]lisis|M[eé]dic[oa]\s+Pat[oó]log[oa])|Responsable\s+del\s+an[aá]lisis|Todos\s+los\s+an[aá]lisis\s+son\s+avalados|FIRMADO\s+ELECTR[OÓ]NICAMENTE|$)",
                Block,
            ),
            (
                IDENTIFICADOR_UNICO,
                r"Identificador\s+[UÚ]nico[^:\n]*:\s*(\d+)",
                Inline,
            ),
            (
                NUMERO_AUTORIZACION,
                r"N\.\s*Autorizaci[oó]n[^:\n]*:\s*([A-Z0-9]+)",
                Inline,
            ),
        ]
    }

    fn autopsy_rules() -> &'static [RuleSpec] {
        use fields::*;
        use FieldShape::*;

        &[
            (
                FECHA_AUTOPSIA,
                r"Fecha\s+y\s+hora\s+de\s+la\s+autopsia\s*:?\s*(\d{2}/\d{2}/\d{4})",
                Inline,
            ),
            (
                CERTIFICADO_DEFUNCION,
                r"No\.?\s*Certificado\s+de\s+defunci[oó]n\s*:?\s*(\d+)",
                Inline,
            ),
            (
                DESCRIPCION_MACROSCOPICA,
                r"Resumen\s+de\s+historia\s+cl[ií]nica\.?(.+?)(?:(?-i:DESCRIPCI[OÓ]N\s+MICROSC[OÓ]PICA)|(?-i:PROTOCOLO\s+MICROSC[OÓ]PICO)|\n[ \t]*(?-i:DIAGN[OÓ]STICO)[ \t]*\n|$)",
                Block,
            ),
        ]
    }

    fn biopsy_rules() -> &'static [RuleSpec] {
        &[(
            fields::IDENTIFICADOR_HISTORIA,
            r"Seguimos\s+Haciendo\s+Historia\s*(\d+)",
            FieldShape::Inline,
        )]
    }

    fn immunohistochemistry_rules() -> &'static [RuleSpec] {
        use fields::*;
        use FieldShape::*;

        &[
            (
                FECHA_TOMA,
                r"Fecha\s+(?:de\s+)?toma\s*:?\s*(\d{4}-\d{2}-\d{2}|\d{2}/\d{2}/\d{4})",
                Inline,
            ),
            (
                FECHA_DIAGNOSTICO,
                r"Fecha\s+de\s+diagn[oó]stico\s*:?\s*(\d[\d\-/]*\d)",
                Inline,
            ),
            (ORGANO, r"(?:^|\n)[ \t]*[OÓ]rgano[ \t]*:?[ \t]*([^\n]+)", Inline),
            (
                DESCRIPCION_MACROSCOPICA,
                r"(?-i:DESCRIPCI[OÓ]N\s+MACROSC[OÓ]PICA)(.+?)(?:(?-i:DESCRIPCI[OÓ]N\s+MICROSC[OÓ]PICA)|(?-i:RESULTADO\s+DE\s+INMUNOHISTOQU[IÍ]MICA)|$)",
                Block,
            ),
            (
                DESCRIPCION_MICROSCOPICA,
                r"(?:(?-i:DESCRIPCI[OÓ]N\s+MICROSC[OÓ]PICA)|(?-i:RESULTADO\s+DE\s+INMUNOHISTOQU[IÍ]MICA)\.?)(.+?)(?:\n[ \t]*(?-i:DIAGN[OÓ]STICO)[ \t]*\n|$)",
                Block,
            ),
        ]
    }

    fn review_rules() -> &'static [RuleSpec] {
        use fields::*;
        use FieldShape::*;

        &[
            (
                DESCRIPCION_MACROSCOPICA,
                r"(Se\s+recibe\s+orden\s+para\s+revisi[oó]n\s+de\s+material\s+institucional.+?)(?:(?-i:DESCRIPCI[OÓ]N\s+MICROSC[OÓ]PICA)|$)",
                Block,
            ),
            (
                DIAGNOSTICO,
                r"(?:^|\n)[ \t]*(?-i:DIAGN[OÓ]STICO)[ \t]*:?[ \t]*\n?(.+?)(?:\n[ \t]*(?-i:COMENTARIOS?)|$)",
                Block,
            ),
            (
                COMENTARIOS,
                r"(?:^|\n)[ \t]*(?-i:COMENTARIOS?)[ \t]*:?[ \t]*\n?(.+?)(?:\n[ \t]*\d{2}/\d{2}/\d{4}\s+\d{2}:\d{2}|Todos\s+los\s+an[aá]lisis\s+son\s+avalados|FIRMADO\s+ELECTR[OÓ]NICAMENTE|$)",
                Block,
            ),
            (
                ORGANO_BLOQUES,
                r"Bloques\s+y\s+l[aá]minas\s*(.+?)(?:(?-i:INFORME\s+DE\s+ANATOM[IÍ]A\s+PATOL[OÓ]GICA)|\n[ \t]*\n|$)",
                Inline,
            ),
            (
                MEDICO_TRATANTE_REVISION,
                r"M[eé]dico\s+tratante\s*[—–:\-]\s*([^\n]+?)\s*Servicio",
                Inline,
            ),
            (
                RESPONSABLE_COMENTARIO,
                r"\d{2}/\d{2}/\d{4}\s+\d{2}:\d{2},?[ \t]*(?-i:([A-ZÁÉÍÓÚÑ][A-ZÁÉÍÓÚÑ ]*[A-ZÁÉÍÓÚÑ]))",
                Inline,
            ),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_builtin_patterns_compile() {
        for report_type in ReportType::ALL {
            let registry = PatternRegistry::for_report_type(report_type);
            for rule in registry.rules() {
                assert!(
                    rule.regex().is_some(),
                    "{} pattern for {} failed to compile",
                    rule.field(),
                    report_type
                );
            }
        }
    }

    #[test]
    fn test_type_rules_extend_base() {
        let base = PatternRegistry::for_report_type(ReportType::Unknown);
        let autopsy = PatternRegistry::for_report_type(ReportType::Autopsy);

        assert!(base.get(fields::FECHA_AUTOPSIA).is_none());
        assert!(autopsy.get(fields::FECHA_AUTOPSIA).is_some());
        assert!(autopsy.get(fields::NOMBRE_COMPLETO).is_some());
        // Overridden rules keep their position
        assert_eq!(
            autopsy.rules().len(),
            base.rules().len() + 2,
            "autopsy adds two fields and replaces the macroscopic rule"
        );
    }

    #[test]
    fn test_add_rule_replaces_existing() {
        let mut registry = PatternRegistry::for_report_type(ReportType::Biopsy);
        let count = registry.rules().len();

        registry
            .add_rule(fields::EPS, r"Aseguradora\s*:\s*([^\n]+)", FieldShape::Inline)
            .unwrap();

        assert_eq!(registry.rules().len(), count);
        let rule = registry.get(fields::EPS).unwrap();
        assert!(rule.regex().unwrap().is_match("Aseguradora: SURA"));
    }

    #[test]
    fn test_field_names_follow_rule_order() {
        let mut registry = PatternRegistry::for_report_type(ReportType::Unknown);
        let names: Vec<&str> = registry.field_names().collect();
        assert_eq!(names.first(), Some(&fields::NOMBRE_COMPLETO));
        assert!(names.contains(&fields::NUMERO_PETICION));
        assert_eq!(names.len(), registry.rules().len());

        registry
            .add_rule("lote", r"Lote\s*:\s*(\d+)", FieldShape::Inline)
            .unwrap();
        assert_eq!(registry.field_names().last(), Some("lote"));
    }

    #[test]
    fn test_invalid_pattern_registers_miss() {
        let mut registry = PatternRegistry::for_report_type(ReportType::Review);
        let result = registry.add_rule("lote", r"Lote\s*:\s*([0-9+", FieldShape::Inline);

        assert!(matches!(result, Err(PathologyError::Pattern { ref field, .. }) if field == "lote"));
        let rule = registry.get("lote").unwrap();
        assert!(rule.regex().is_none());
    }

    #[test]
    fn test_section_headers_are_case_sensitive() {
        let registry = PatternRegistry::for_report_type(ReportType::Unknown);
        let rule = registry.get(fields::DIAGNOSTICO).unwrap();
        let regex = rule.regex().unwrap();

        assert!(!regex.is_match("el diagnóstico\nse confirma"));
        assert!(regex.is_match("DIAGNÓSTICO\nCARCINOMA"));
    }
}
