//! # GV-03 Task Verifier
//!
//! Decides, per participant and per task, whether the on-chain evidence a
//! participant submitted proves the task was done.
//!
//! **Subsystem ID:** 03
//! **Architecture:** Hexagonal (DDD)
//!
//! ## Purpose
//!
//! - Bind every configured task id to a verifier (simple, flow, race)
//! - Decode each task's evidence rows into typed parameters
//! - Run all tasks of one participant concurrently, one outcome per task
//! - Save the outcomes once every task has reported
//!
//! ## Module Structure
//!
//! ```text
//! gv-03-task-verifier/
//! ├── domain/          # ReasonKind, TaskParams, Participant, VerificationOutcome
//! ├── verifiers/       # SimpleVerifier, FlowVerifier, RaceVerifier
//! ├── ports/           # EvidenceSource, OutcomeSink, Workbook
//! ├── adapters/        # JSON files, in-memory
//! ├── pipeline/        # TaskManager (load, dispatch, collect, save)
//! ├── config           # EventConfig (chains, channels, flows, tasks)
//! └── registry         # VerifierRegistry
//! ```
//!
//! A task failing never stops the others: every failure becomes an outcome
//! with zero points and a reason kind.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod adapters;
pub mod config;
pub mod domain;
pub mod pipeline;
pub mod ports;
pub mod registry;
pub mod verifiers;

// Re-exports
pub use adapters::{JsonEvidence, JsonOutcomeWriter, MemoryEvidence, MemorySink, TASK_POINT_FILE};
pub use config::{ConfigError, EventConfig, TaskConfig, TaskKind};
pub use domain::{
    task_no_cmp, MintClaim, Participant, ReasonKind, TaskParams, VerificationOutcome,
    VerifyRequest,
};
pub use pipeline::{PipelineError, RunState, TaskManager};
pub use ports::{EvidenceError, EvidenceSource, OutcomeSink, Sheet, Workbook, INFO_SHEET};
pub use registry::{RegisteredTask, VerifierRegistry};
pub use verifiers::{FlowVerifier, RaceVerifier, SimpleTask, SimpleVerifier, Verifier};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    #[test]
    #[allow(clippy::const_is_empty)]
    fn test_version() {
        assert!(!super::VERSION.is_empty());
    }
}
