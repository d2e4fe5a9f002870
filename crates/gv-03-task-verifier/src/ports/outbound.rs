//! # Outbound Ports
//!
//! Evidence input and outcome output. The pipeline treats both as
//! collaborators; spreadsheet formats live behind these traits.

use crate::domain::VerificationOutcome;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

/// Sheet holding the participant's team name and addresses.
pub const INFO_SHEET: &str = "Info";

/// Evidence and outcome I/O errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvidenceError {
    /// File I/O error.
    #[error("Failed to access {path}: {error}")]
    Io {
        /// Path involved.
        path: String,
        /// Error message from the I/O operation.
        error: String,
    },

    /// Content is not a workbook.
    #[error("Malformed evidence: {0}")]
    Format(String),
}

/// One named sheet of rows of cells.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sheet {
    /// Sheet name; a task id, or [`INFO_SHEET`].
    pub name: String,
    /// Rows including the header row.
    #[serde(default)]
    pub rows: Vec<Vec<String>>,
}

/// All evidence sheets of one participant.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workbook {
    /// Sheets in file order.
    #[serde(default)]
    pub sheets: Vec<Sheet>,
}

impl Workbook {
    /// Add a sheet, replacing the rows of a sheet with the same name.
    pub fn with_sheet(mut self, name: impl Into<String>, rows: Vec<Vec<String>>) -> Self {
        let name = name.into();
        match self.sheets.iter_mut().find(|s| s.name == name) {
            Some(sheet) => sheet.rows = rows,
            None => self.sheets.push(Sheet { name, rows }),
        }
        self
    }

    /// First sheet name that appears more than once.
    pub fn duplicate_sheet(&self) -> Option<&str> {
        let mut seen = HashSet::new();
        self.sheets
            .iter()
            .map(|s| s.name.as_str())
            .find(|name| !seen.insert(*name))
    }

    /// Sheet named `name`.
    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|s| s.name == name)
    }

    /// Names of every task sheet, in file order.
    pub fn task_sheet_names(&self) -> Vec<String> {
        self.sheets
            .iter()
            .filter(|s| s.name != INFO_SHEET)
            .map(|s| s.name.clone())
            .collect()
    }
}

/// Source of a participant's evidence - outbound port.
#[async_trait]
pub trait EvidenceSource: Send + Sync {
    /// Where the evidence comes from, for logs.
    fn describe(&self) -> String;

    /// Read the whole workbook.
    async fn load(&self) -> Result<Workbook, EvidenceError>;
}

/// Destination of a run's outcomes - outbound port.
#[async_trait]
pub trait OutcomeSink: Send + Sync {
    /// Persist the outcomes of one run, in arrival order.
    async fn save(&self, outcomes: &[VerificationOutcome]) -> Result<(), EvidenceError>;
}
