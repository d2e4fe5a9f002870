//! Verification pipeline.

pub mod task_manager;

pub use task_manager::{PipelineError, RunState, Task, TaskManager};
