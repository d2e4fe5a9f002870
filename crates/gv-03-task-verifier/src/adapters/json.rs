//! # JSON File Adapters
//!
//! Evidence is read from a JSON workbook, one file per participant:
//!
//! ```json
//! {"sheets": [
//!   {"name": "Info", "rows": [["Team", "i", "s", "j", "u", "o"], ["gon", "iaa1..", ...]]},
//!   {"name": "A1", "rows": [["TxHash", "ClassId"], ["8C1E..", "gonClass"]]}
//! ]}
//! ```
//!
//! Outcomes are written to `taskpoint.json` next to the evidence file,
//! sorted by task id.

use crate::domain::{task_no_cmp, VerificationOutcome};
use crate::ports::{EvidenceError, EvidenceSource, OutcomeSink, Workbook};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::info;

/// File name of the outcome file.
pub const TASK_POINT_FILE: &str = "taskpoint.json";

/// Evidence workbook stored as JSON.
#[derive(Clone, Debug)]
pub struct JsonEvidence {
    path: PathBuf,
}

impl JsonEvidence {
    /// Evidence at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Evidence file path.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl EvidenceSource for JsonEvidence {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    async fn load(&self) -> Result<Workbook, EvidenceError> {
        let content = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| EvidenceError::Io {
                path: self.describe(),
                error: e.to_string(),
            })?;
        let book: Workbook = serde_json::from_str(&content)
            .map_err(|e| EvidenceError::Format(format!("{}: {e}", self.describe())))?;
        if let Some(name) = book.duplicate_sheet() {
            return Err(EvidenceError::Format(format!(
                "{}: sheet {name} appears more than once",
                self.describe()
            )));
        }
        Ok(book)
    }
}

/// Writes outcomes as a JSON array.
#[derive(Clone, Debug)]
pub struct JsonOutcomeWriter {
    path: PathBuf,
}

impl JsonOutcomeWriter {
    /// Writer for `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Writer for `taskpoint.json` in the directory of `evidence`.
    pub fn next_to(evidence: &Path) -> Self {
        let dir = evidence.parent().unwrap_or_else(|| Path::new("."));
        Self::new(dir.join(TASK_POINT_FILE))
    }

    /// Output file path.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl OutcomeSink for JsonOutcomeWriter {
    async fn save(&self, outcomes: &[VerificationOutcome]) -> Result<(), EvidenceError> {
        let mut sorted = outcomes.to_vec();
        sorted.sort_by(|a, b| task_no_cmp(&a.task_no, &b.task_no));
        let body = serde_json::to_string_pretty(&sorted).map_err(|e| EvidenceError::Format(e.to_string()))?;
        tokio::fs::write(&self.path, body)
            .await
            .map_err(|e| EvidenceError::Io {
                path: self.path.display().to_string(),
                error: e.to_string(),
            })?;
        info!("[gv-03] {} outcome(s) written to {}", sorted.len(), self.path.display());
        Ok(())
    }
}
