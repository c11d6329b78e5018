//! Batch runs over documents on disk.

use std::fs;

use huv_pathology_batch::{
    collect_inputs, write_table_to, BatchRunner, DocumentOutcome, OutputFormat, SidecarTextSource,
};
use huv_pathology_core::{Pipeline, ReportType};
use tempfile::TempDir;

const AUTOPSY: &str = "\
N. peticion : A123456
Nombre : JUAN CARLOS PEREZ GOMEZ
Edad : 45 años
Fecha Informe : 10/03/2024
DIAGNÓSTICO
CARCINOMA ESCAMOCELULAR INVASIVO.
";

const IMMUNOHISTOCHEMISTRY: &str = "\
N. peticion : IHQ250981
Nombre : MARTHA LUCIA CASTRO
Fecha Informe : 16/05/2025
DESCRIPCIÓN MACROSCÓPICA
Bloque de parafina correspondiente a \"MAMA DERECHA\" con diagnóstico de carcinoma.
RESULTADO DE INMUNOHISTOQUÍMICA
HER2: 2+
Estudio FISH: amplificado
Ki-67: 15%
";

#[test]
fn test_directory_batch_to_csv() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("01.pdf"), b"%PDF-1.4").unwrap();
    fs::write(dir.path().join("01.pdf.txt"), AUTOPSY).unwrap();
    fs::write(dir.path().join("02.pdf"), b"%PDF-1.4").unwrap();
    fs::write(dir.path().join("02.pdf.txt"), IMMUNOHISTOCHEMISTRY).unwrap();
    // Scanned PDF whose OCR produced nothing
    fs::write(dir.path().join("03.pdf"), b"%PDF-1.4").unwrap();

    let documents = collect_inputs(&[dir.path().to_path_buf()]).unwrap();
    assert_eq!(documents.len(), 3);

    let pipeline = Pipeline::default().with_biomarker_columns(true);
    let runner = BatchRunner::new(pipeline, SidecarTextSource::new());
    let report = runner.run(&documents);

    assert_eq!(report.processed(), 2);
    assert_eq!(report.failed(), 1);
    let types: Vec<ReportType> = report
        .outcomes
        .iter()
        .filter_map(|outcome| match outcome {
            DocumentOutcome::Processed { report_type, .. } => Some(*report_type),
            _ => None,
        })
        .collect();
    assert_eq!(types, vec![ReportType::Autopsy, ReportType::Immunohistochemistry]);

    let output = dir.path().join("salida.csv");
    write_table_to(&report.table, OutputFormat::Csv, Some(&output)).unwrap();

    let mut reader = csv::Reader::from_path(&output).unwrap();
    let headers = reader.headers().unwrap().clone();
    assert_eq!(headers.len(), 63);
    let her2_index = headers.iter().position(|header| header == "IHQ_HER2").unwrap();
    let organ_index = headers
        .iter()
        .position(|header| header == "Organo (1. Muestra enviada a patología)")
        .unwrap();

    let records: Vec<csv::StringRecord> = reader.records().map(|record| record.unwrap()).collect();
    assert_eq!(records.len(), 2);
    assert_eq!(&records[0][organ_index], "CUERPO HUMANO COMPLETO");
    assert_eq!(&records[0][her2_index], "");
    assert_eq!(&records[1][organ_index], "MAMA DERECHA");
    assert_eq!(&records[1][her2_index], "2+ (AMPLIFICADO)");
}

#[test]
fn test_json_output() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("autopsia.txt");
    fs::write(&input, AUTOPSY).unwrap();

    let runner = BatchRunner::new(Pipeline::default(), SidecarTextSource::new());
    let report = runner.run(&[input]);

    let output = dir.path().join("salida.json");
    write_table_to(&report.table, OutputFormat::Json, Some(&output)).unwrap();

    let parsed: serde_json::Value = serde_json::from_str(&fs::read_to_string(&output).unwrap()).unwrap();
    let rows = parsed.as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["Primer nombre"], "JUAN");
    assert_eq!(rows[0]["Malignidad"], "PRESENTE");
    assert_eq!(rows[0].as_object().unwrap().len(), 55);
}
