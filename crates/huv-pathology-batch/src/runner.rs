//! Sequential batch runner.
//!
//! Documents are processed one at a time. A failed document is recorded
//! and the batch moves on; cancellation is checked between documents.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use huv_pathology_core::export::columns;
use huv_pathology_core::{Pipeline, ProcessedDocument, ReportType, RowTable};
use tracing::{debug, info, warn};

use crate::source::TextSource;
use crate::{BatchError, BatchResult};

/// Shared flag that stops a batch before its next document.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// What happened to one document.
#[derive(Debug)]
pub enum DocumentOutcome {
    Processed {
        path: PathBuf,
        report_type: ReportType,
        /// Rows added to the table
        rows: usize,
        /// Rows dropped because their sample number was already emitted
        duplicates: usize,
    },
    Failed {
        path: PathBuf,
        error: BatchError,
    },
    /// Not attempted because the batch was cancelled.
    Skipped { path: PathBuf },
}

impl DocumentOutcome {
    pub fn path(&self) -> &Path {
        match self {
            DocumentOutcome::Processed { path, .. }
            | DocumentOutcome::Failed { path, .. }
            | DocumentOutcome::Skipped { path } => path,
        }
    }
}

/// Outcomes of a batch and the combined row table.
#[derive(Debug)]
pub struct BatchReport {
    pub outcomes: Vec<DocumentOutcome>,
    pub table: RowTable,
}

impl BatchReport {
    pub fn processed(&self) -> usize {
        self.count(|outcome| matches!(outcome, DocumentOutcome::Processed { .. }))
    }

    pub fn failed(&self) -> usize {
        self.count(|outcome| matches!(outcome, DocumentOutcome::Failed { .. }))
    }

    pub fn skipped(&self) -> usize {
        self.count(|outcome| matches!(outcome, DocumentOutcome::Skipped { .. }))
    }

    pub fn rows(&self) -> usize {
        self.table.len()
    }

    pub fn was_cancelled(&self) -> bool {
        self.skipped() > 0
    }

    /// One-line summary, e.g. `3 processed, 1 failed, 0 skipped, 5 rows`.
    pub fn summary(&self) -> String {
        format!(
            "{} processed, {} failed, {} skipped, {} rows",
            self.processed(),
            self.failed(),
            self.skipped(),
            self.rows()
        )
    }

    fn count(&self, predicate: impl Fn(&DocumentOutcome) -> bool) -> usize {
        self.outcomes.iter().filter(|outcome| predicate(outcome)).count()
    }
}

/// Runs the pipeline over many documents.
pub struct BatchRunner<S> {
    pipeline: Pipeline,
    source: S,
    cancellation: CancellationToken,
}

impl<S: TextSource> BatchRunner<S> {
    pub fn new(pipeline: Pipeline, source: S) -> Self {
        Self {
            pipeline,
            source,
            cancellation: CancellationToken::new(),
        }
    }

    /// Share an existing cancellation token.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    /// Token that cancels this runner.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancellation.clone()
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    /// Process every document in order.
    pub fn run(&self, paths: &[PathBuf]) -> BatchReport {
        let mut table = if self.pipeline.emits_biomarker_columns() {
            RowTable::extended()
        } else {
            RowTable::new()
        };
        let mut seen_samples: HashSet<String> = HashSet::new();
        let mut outcomes = Vec::with_capacity(paths.len());

        for (index, path) in paths.iter().enumerate() {
            if self.cancellation.is_cancelled() {
                info!(remaining = paths.len() - index, "Batch cancelled");
                outcomes.extend(
                    paths[index..]
                        .iter()
                        .map(|path| DocumentOutcome::Skipped { path: path.clone() }),
                );
                break;
            }

            info!(document = index + 1, total = paths.len(), path = %path.display(), "Processing document");
            let outcome = match self.process_document(path) {
                Ok(document) => {
                    let report_type = document.report_type();
                    match append_rows(&mut table, &mut seen_samples, document) {
                        Ok((rows, duplicates)) => {
                            info!(path = %path.display(), %report_type, rows, duplicates, "Document processed");
                            DocumentOutcome::Processed {
                                path: path.clone(),
                                report_type,
                                rows,
                                duplicates,
                            }
                        }
                        Err(error) => failed(path, error),
                    }
                }
                Err(error) => failed(path, error),
            };
            outcomes.push(outcome);
        }

        BatchReport { outcomes, table }
    }

    /// Read and process a single document.
    ///
    /// A cancelled runner returns [`BatchError::Cancelled`] without reading it.
    pub fn process_document(&self, path: &Path) -> BatchResult<ProcessedDocument> {
        if self.cancellation.is_cancelled() {
            return Err(BatchError::Cancelled);
        }
        let text = self.source.text_from_pdf(path)?;
        Ok(self.pipeline.process_document(&text)?)
    }
}

fn failed(path: &Path, error: BatchError) -> DocumentOutcome {
    warn!(path = %path.display(), error = %error, "Document failed");
    DocumentOutcome::Failed {
        path: path.to_path_buf(),
        error,
    }
}

/// Append rows whose sample number was not emitted before.
///
/// Returns `(added, duplicates)`.
fn append_rows(
    table: &mut RowTable,
    seen_samples: &mut HashSet<String>,
    document: ProcessedDocument,
) -> BatchResult<(usize, usize)> {
    let mut added = 0;
    let mut duplicates = 0;

    for row in document.rows {
        let sample = row.get(columns::N_MUESTRA).unwrap_or("").to_string();
        if !sample.is_empty() && !seen_samples.insert(sample.clone()) {
            debug!(sample = %sample, "Skipping duplicate sample");
            duplicates += 1;
            continue;
        }
        table.push(row)?;
        added += 1;
    }

    Ok((added, duplicates))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::InMemoryTextSource;

    const AUTOPSY: &str = "N. peticion : A123456\nNombre : JUAN CARLOS PEREZ GOMEZ\nEdad : 45 años\n";
    const BIOPSY: &str = "\
N. peticion : M2501234
Nombre : ANA LOPEZ
DESCRIPCIÓN MACROSCÓPICA
A. \"PIEL\" fragmento.
B. \"UÑA\" fragmento.
DESCRIPCIÓN MICROSCÓPICA
Sin alteraciones.
";

    fn source() -> InMemoryTextSource {
        let mut source = InMemoryTextSource::new();
        source.insert("autopsia.pdf", AUTOPSY);
        source.insert("biopsia.pdf", BIOPSY);
        source.insert("repetida.pdf", AUTOPSY);
        source
    }

    #[test]
    fn test_failed_document_does_not_stop_batch() {
        let runner = BatchRunner::new(Pipeline::default(), source());
        let paths = vec![
            PathBuf::from("autopsia.pdf"),
            PathBuf::from("ilegible.pdf"),
            PathBuf::from("biopsia.pdf"),
        ];

        let report = runner.run(&paths);

        assert_eq!(report.processed(), 2);
        assert_eq!(report.failed(), 1);
        assert_eq!(report.rows(), 3);
        assert!(matches!(
            &report.outcomes[1],
            DocumentOutcome::Failed { error: BatchError::Source { .. }, .. }
        ));
        assert_eq!(report.summary(), "2 processed, 1 failed, 0 skipped, 3 rows");
    }

    #[test]
    fn test_duplicate_samples_skipped() {
        let runner = BatchRunner::new(Pipeline::default(), source());
        let paths = vec![PathBuf::from("autopsia.pdf"), PathBuf::from("repetida.pdf")];

        let report = runner.run(&paths);

        assert_eq!(report.rows(), 1);
        match &report.outcomes[1] {
            DocumentOutcome::Processed { rows, duplicates, .. } => {
                assert_eq!(*rows, 0);
                assert_eq!(*duplicates, 1);
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[test]
    fn test_cancelled_batch_skips_remaining() {
        let runner = BatchRunner::new(Pipeline::default(), source());
        runner.cancellation_token().cancel();

        let report = runner.run(&[PathBuf::from("autopsia.pdf"), PathBuf::from("biopsia.pdf")]);

        assert_eq!(report.skipped(), 2);
        assert!(report.was_cancelled());
        assert!(report.table.is_empty());
        assert_eq!(report.outcomes[1].path(), Path::new("biopsia.pdf"));
    }

    #[test]
    fn test_process_document_after_cancel() {
        let token = CancellationToken::new();
        let runner = BatchRunner::new(Pipeline::default(), source()).with_cancellation(token.clone());

        assert!(runner.process_document(Path::new("autopsia.pdf")).is_ok());

        token.cancel();
        let result = runner.process_document(Path::new("autopsia.pdf"));
        assert!(matches!(result, Err(BatchError::Cancelled)));
    }

    #[test]
    fn test_biomarker_table_schema() {
        let pipeline = Pipeline::default().with_biomarker_columns(true);
        let runner = BatchRunner::new(pipeline, source());

        let report = runner.run(&[PathBuf::from("biopsia.pdf")]);

        assert_eq!(report.table.columns().len(), 63);
        assert_eq!(report.rows(), 2);
    }
}
