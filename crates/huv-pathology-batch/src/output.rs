//! Writing the combined row table.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use clap::ValueEnum;
use huv_pathology_core::RowTable;
use serde::{Deserialize, Serialize};

use crate::BatchResult;

/// Output serialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Csv,
    Json,
}

/// Write `table` to `writer` in `format`.
pub fn write_table<W: Write>(table: &RowTable, format: OutputFormat, mut writer: W) -> BatchResult<()> {
    match format {
        OutputFormat::Csv => table.write_csv(&mut writer)?,
        OutputFormat::Json => {
            writer.write_all(table.to_json()?.as_bytes())?;
            writer.write_all(b"\n")?;
        }
    }
    writer.flush()?;
    Ok(())
}

/// Write `table` to a file, or to stdout when `path` is `None`.
pub fn write_table_to(table: &RowTable, format: OutputFormat, path: Option<&Path>) -> BatchResult<()> {
    match path {
        Some(path) => write_table(table, format, File::create(path)?),
        None => write_table(table, format, io::stdout().lock()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use huv_pathology_core::export::columns;
    use huv_pathology_core::OutputRow;
    use tempfile::TempDir;

    fn table() -> RowTable {
        let mut row = OutputRow::new();
        row.set(columns::N_MUESTRA, "A123456");
        let mut table = RowTable::new();
        table.push(row).unwrap();
        table
    }

    #[test]
    fn test_write_csv_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("salida.csv");

        write_table_to(&table(), OutputFormat::Csv, Some(&path)).unwrap();

        let mut reader = csv::Reader::from_path(&path).unwrap();
        assert_eq!(reader.headers().unwrap().len(), 55);
        let record = reader.records().next().unwrap().unwrap();
        assert_eq!(&record[28], "A123456");
    }

    #[test]
    fn test_write_json() {
        let mut buffer = Vec::new();
        write_table(&table(), OutputFormat::Json, &mut buffer).unwrap();

        let parsed: serde_json::Value = serde_json::from_slice(&buffer).unwrap();
        assert_eq!(parsed[0]["N. muestra"], "A123456");
    }
}
