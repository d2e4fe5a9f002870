//! In-memory evidence and outcome adapters.

use crate::domain::VerificationOutcome;
use crate::ports::{EvidenceError, EvidenceSource, OutcomeSink, Workbook};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

/// Evidence held in memory.
#[derive(Clone, Debug, Default)]
pub struct MemoryEvidence {
    workbook: Workbook,
}

impl MemoryEvidence {
    /// Serve `workbook`.
    pub fn new(workbook: Workbook) -> Self {
        Self { workbook }
    }
}

#[async_trait]
impl EvidenceSource for MemoryEvidence {
    fn describe(&self) -> String {
        "memory".to_string()
    }

    async fn load(&self) -> Result<Workbook, EvidenceError> {
        Ok(self.workbook.clone())
    }
}

/// Collects saved outcomes.
#[derive(Debug, Default)]
pub struct MemorySink {
    outcomes: RwLock<Vec<VerificationOutcome>>,
    saves: AtomicU32,
    /// Fail every save.
    pub should_fail: AtomicBool,
}

impl MemorySink {
    /// Empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Outcomes of the last save.
    pub fn outcomes(&self) -> Vec<VerificationOutcome> {
        self.outcomes.read().clone()
    }

    /// Number of saves so far.
    pub fn save_count(&self) -> u32 {
        self.saves.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl OutcomeSink for MemorySink {
    async fn save(&self, outcomes: &[VerificationOutcome]) -> Result<(), EvidenceError> {
        self.saves.fetch_add(1, Ordering::SeqCst);
        if self.should_fail.load(Ordering::SeqCst) {
            return Err(EvidenceError::Io {
                path: "memory".to_string(),
                error: "sink failure".to_string(),
            });
        }
        *self.outcomes.write() = outcomes.to_vec();
        Ok(())
    }
}
