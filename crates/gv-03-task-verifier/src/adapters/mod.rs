//! Adapters for the evidence and outcome ports.

pub mod json;
pub mod memory;

pub use json::{JsonEvidence, JsonOutcomeWriter, TASK_POINT_FILE};
pub use memory::{MemoryEvidence, MemorySink};
