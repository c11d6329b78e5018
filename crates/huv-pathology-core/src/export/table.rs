//! Row tables and their CSV/JSON serializations.

use std::io;

use serde::Serialize;

use super::columns::{COLUMNS, EXTENDED_COLUMNS};
use super::OutputRow;
use crate::{PathologyError, PathologyResult};

/// Rows sharing one column schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct RowTable {
    #[serde(skip)]
    columns: &'static [&'static str],
    rows: Vec<OutputRow>,
}

impl Default for RowTable {
    fn default() -> Self {
        Self::new()
    }
}

impl RowTable {
    /// Empty table over the 55 standard columns.
    pub fn new() -> Self {
        Self::with_columns(&COLUMNS)
    }

    /// Empty table over the standard plus biomarker columns.
    pub fn extended() -> Self {
        Self::with_columns(&EXTENDED_COLUMNS)
    }

    pub fn with_columns(columns: &'static [&'static str]) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn columns(&self) -> &'static [&'static str] {
        self.columns
    }

    pub fn rows(&self) -> &[OutputRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Append a row. Rows built over a different schema are rejected.
    pub fn push(&mut self, row: OutputRow) -> PathologyResult<()> {
        if row.columns() != self.columns {
            return Err(PathologyError::Export(format!(
                "row has {} columns, table expects {}",
                row.len(),
                self.columns.len()
            )));
        }
        self.rows.push(row);
        Ok(())
    }

    /// Append every row, stopping at the first schema mismatch.
    pub fn extend(&mut self, rows: impl IntoIterator<Item = OutputRow>) -> PathologyResult<()> {
        for row in rows {
            self.push(row)?;
        }
        Ok(())
    }

    /// Write the header and every row as CSV.
    pub fn write_csv<W: io::Write>(&self, writer: W) -> PathologyResult<()> {
        let mut csv_writer = csv::Writer::from_writer(writer);
        csv_writer.write_record(self.columns)?;
        for row in &self.rows {
            csv_writer.write_record(row.values())?;
        }
        csv_writer.flush()?;
        Ok(())
    }

    /// CSV text with a header line.
    pub fn to_csv(&self) -> PathologyResult<String> {
        let mut buffer = Vec::new();
        self.write_csv(&mut buffer)?;
        String::from_utf8(buffer).map_err(|err| PathologyError::Export(err.to_string()))
    }

    /// JSON array of objects, keys in column order.
    pub fn to_json(&self) -> PathologyResult<String> {
        serde_json::to_string_pretty(self).map_err(|err| PathologyError::Export(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::columns;

    fn sample_row(request: &str, organ: &str) -> OutputRow {
        let mut row = OutputRow::new();
        row.set(columns::NUMERO_PETICION, request);
        row.set(columns::ORGANO, organ);
        row
    }

    #[test]
    fn test_csv_header_and_rows() {
        let mut table = RowTable::new();
        table.push(sample_row("M2501234", "PIEL")).unwrap();
        table.push(sample_row("M2501235", "GANGLIO, AXILAR")).unwrap();

        let csv = table.to_csv().unwrap();
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("N. peticion (0. Numero de biopsia),Hospitalizado,Sede"));
        assert!(lines[1].starts_with("M2501234,"));
        assert!(lines[2].contains("\"GANGLIO, AXILAR\""));
    }

    #[test]
    fn test_csv_round_trips_through_reader() {
        let mut table = RowTable::new();
        table.push(sample_row("A123456", "CUERPO HUMANO COMPLETO")).unwrap();

        let csv = table.to_csv().unwrap();
        let mut reader = csv::Reader::from_reader(csv.as_bytes());
        let headers = reader.headers().unwrap().clone();
        assert_eq!(headers.len(), 55);

        let record = reader.records().next().unwrap().unwrap();
        assert_eq!(&record[0], "A123456");
        assert_eq!(&record[32], "CUERPO HUMANO COMPLETO");
    }

    #[test]
    fn test_json_is_array_of_ordered_objects() {
        let mut table = RowTable::new();
        table.push(sample_row("A123456", "CUERPO HUMANO COMPLETO")).unwrap();

        let json = table.to_json().unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();

        let rows = parsed.as_array().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].as_object().unwrap().len(), 55);
        assert_eq!(rows[0]["N. muestra"], "");
        let first_key = json.find("N. peticion").unwrap();
        let last_key = json.find("Responsable macro").unwrap();
        assert!(first_key < last_key);
    }

    #[test]
    fn test_schema_mismatch_rejected() {
        let mut table = RowTable::new();
        let result = table.push(OutputRow::extended());
        assert!(matches!(result, Err(PathologyError::Export(_))));
        assert!(table.is_empty());
    }

    #[test]
    fn test_extend_stops_at_schema_mismatch() {
        let mut table = RowTable::new();
        table
            .extend(vec![sample_row("M2501234", "PIEL"), sample_row("M2501235", "UÑA")])
            .unwrap();
        assert_eq!(table.len(), 2);

        let result = table.extend(vec![sample_row("M2501236", "GANGLIO"), OutputRow::extended()]);
        assert!(matches!(result, Err(PathologyError::Export(_))));
        assert_eq!(table.len(), 3);
    }

    #[test]
    fn test_empty_table_has_header_only() {
        let csv = RowTable::extended().to_csv().unwrap();
        assert_eq!(csv.lines().count(), 1);
        assert!(csv.trim_end().ends_with("IHQ_P16_PORCENTAJE"));
    }
}
