//! # Task Manager
//!
//! Runs every requested task of one participant concurrently and hands
//! the outcomes to a sink.
//!
//! ```text
//! Loaded ──spawn all──→ Dispatched ──join all──→ Collecting ──save──→ Saved
//! ```
//!
//! One tokio task per task id writes exactly one outcome into a shared
//! channel. A collector drains the channel until every sender is gone,
//! saves, and answers a handshake; `process` returns only after that.

use crate::domain::{Participant, ReasonKind, TaskParams, VerificationOutcome, VerifyRequest};
use crate::ports::{EvidenceError, EvidenceSource, OutcomeSink, Workbook, INFO_SHEET};
use crate::registry::VerifierRegistry;
use crate::verifiers::Verifier;
use gv_01_channel_flow::ChainId;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info, warn};

/// Failures that abort a whole run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PipelineError {
    /// Evidence could not be read.
    #[error("Evidence unreadable: {0}")]
    Evidence(#[from] EvidenceError),

    /// The info sheet is missing or has no participant row.
    #[error("Info sheet missing or empty in {0}")]
    InfoMissing(String),

    /// A requested task has no evidence sheet.
    #[error("No evidence sheet for task {0}")]
    SheetMissing(String),

    /// A requested task sheet has no rows at all.
    #[error("Evidence sheet {0} is empty")]
    SheetEmpty(String),

    /// A requested task has no verifier.
    #[error("No verifier for task {0}")]
    UnknownTask(String),

    /// Outcomes could not be saved.
    #[error("Saving outcomes failed: {0}")]
    Save(EvidenceError),

    /// The collector stopped before answering the handshake.
    #[error("Outcome collector stopped unexpectedly")]
    CollectorLost,

    /// `process` was called on a run that already left `Loaded`.
    #[error("Run already {0}")]
    AlreadyRun(RunState),
}

/// Where a run is in its life cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunState {
    /// Evidence parsed, tasks built.
    Loaded,
    /// Every task spawned.
    Dispatched,
    /// Every task joined; the collector is draining.
    Collecting,
    /// Outcomes saved.
    Saved,
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Loaded => "loaded",
            Self::Dispatched => "dispatched",
            Self::Collecting => "collecting",
            Self::Saved => "saved",
        };
        f.write_str(name)
    }
}

/// One task of a run.
pub struct Task {
    /// Task id.
    pub task_no: String,
    /// Points on success.
    pub points: u32,
    /// Decoded evidence, or why it could not be decoded.
    pub params: Result<TaskParams, ReasonKind>,
    /// Bound verifier.
    pub verifier: Arc<Verifier>,
}

/// Verification run for one participant.
pub struct TaskManager {
    source: String,
    participant: Arc<Participant>,
    tasks: Vec<Task>,
    state: RunState,
}

impl TaskManager {
    /// Read evidence and build one task per requested id.
    ///
    /// An empty `requested` list means every task sheet in the evidence.
    ///
    /// # Errors
    ///
    /// Evidence unreadable, info sheet missing, a requested sheet missing
    /// or empty, or a requested task without a verifier. Nothing has been
    /// dispatched when this fails.
    pub async fn load(
        source: &dyn EvidenceSource,
        registry: &VerifierRegistry,
        requested: &[String],
    ) -> Result<Self, PipelineError> {
        let describe = source.describe();
        let workbook = source.load().await?;
        let participant = Arc::new(read_participant(
            &workbook,
            registry.chains().chain_ids(),
            &describe,
        )?);

        let task_ids = if requested.is_empty() {
            workbook.task_sheet_names()
        } else {
            requested.to_vec()
        };

        let mut tasks = Vec::with_capacity(task_ids.len());
        for task_no in task_ids {
            let registered = registry
                .get(&task_no)
                .ok_or_else(|| PipelineError::UnknownTask(task_no.clone()))?;
            let sheet = workbook
                .sheet(&task_no)
                .ok_or_else(|| PipelineError::SheetMissing(task_no.clone()))?;
            if sheet.rows.is_empty() {
                return Err(PipelineError::SheetEmpty(task_no));
            }
            let params = registered.verifier.build_params(&sheet.rows[1..]);
            if let Err(reason) = &params {
                debug!(task = %task_no, "[gv-03] params rejected: {}", reason);
            }
            tasks.push(Task {
                task_no,
                points: registered.points,
                params,
                verifier: registered.verifier.clone(),
            });
        }

        info!(
            team = %participant.team_name,
            "[gv-03] loaded {} task(s) from {}",
            tasks.len(),
            describe
        );
        Ok(Self {
            source: describe,
            participant,
            tasks,
            state: RunState::Loaded,
        })
    }

    /// Current state.
    pub fn state(&self) -> RunState {
        self.state
    }

    /// Participant of this run.
    pub fn participant(&self) -> &Participant {
        &self.participant
    }

    /// Tasks still waiting to be dispatched.
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    /// Run every task, save the outcomes through `sink` and return them in
    /// arrival order.
    pub async fn process(
        &mut self,
        sink: Arc<dyn OutcomeSink>,
    ) -> Result<Vec<VerificationOutcome>, PipelineError> {
        if self.state != RunState::Loaded {
            return Err(PipelineError::AlreadyRun(self.state));
        }
        let tasks = std::mem::take(&mut self.tasks);
        let (results_tx, results_rx) = mpsc::channel(tasks.len().max(1));
        let (done_tx, done_rx) = oneshot::channel();

        let collector = tokio::spawn(collect(results_rx, sink, done_tx));

        let mut running = Vec::with_capacity(tasks.len());
        for task in tasks {
            let request = VerifyRequest {
                task_no: task.task_no,
                point: task.points,
                participant: self.participant.clone(),
                params: task.params,
            };
            let fallback = request.failed(ReasonKind::Internal);
            let verifier = task.verifier;
            let results = results_tx.clone();
            let handle = tokio::spawn(async move { verifier.verify(request, results).await });
            running.push((fallback, handle));
        }
        self.state = RunState::Dispatched;
        debug!(team = %self.participant.team_name, "[gv-03] {} task(s) dispatched", running.len());

        for (fallback, handle) in running {
            if let Err(e) = handle.await {
                error!(task = %fallback.task_no, "[gv-03] task aborted: {}", e);
                if results_tx.send(fallback).await.is_err() {
                    warn!("[gv-03] collector gone before abort could be reported");
                }
            }
        }
        drop(results_tx);
        self.state = RunState::Collecting;

        let saved = done_rx.await.map_err(|_| PipelineError::CollectorLost)?;
        if let Err(e) = collector.await {
            warn!("[gv-03] collector did not finish cleanly: {}", e);
        }
        let outcomes = saved.map_err(PipelineError::Save)?;
        self.state = RunState::Saved;

        let passed = outcomes.iter().filter(|o| o.is_passed()).count();
        info!(
            team = %self.participant.team_name,
            "[gv-03] {} passed of {} task(s) from {}",
            passed,
            outcomes.len(),
            self.source
        );
        Ok(outcomes)
    }
}

/// Drain `results` until every sender is dropped, save, then answer the
/// handshake.
async fn collect(
    mut results: mpsc::Receiver<VerificationOutcome>,
    sink: Arc<dyn OutcomeSink>,
    done: oneshot::Sender<Result<Vec<VerificationOutcome>, EvidenceError>>,
) {
    let mut outcomes = Vec::new();
    while let Some(outcome) = results.recv().await {
        outcomes.push(outcome);
    }
    let saved = sink.save(&outcomes).await.map(|()| outcomes);
    if done.send(saved).is_err() {
        warn!("[gv-03] run gone before save handshake");
    }
}

/// Participant from the info sheet: header row, then
/// `[team, address per chain in configuration order]`.
fn read_participant(
    workbook: &Workbook,
    chain_order: &[ChainId],
    describe: &str,
) -> Result<Participant, PipelineError> {
    let row = workbook
        .sheet(INFO_SHEET)
        .and_then(|sheet| sheet.rows.get(1))
        .ok_or_else(|| PipelineError::InfoMissing(describe.to_string()))?;
    let team = row
        .first()
        .map(|t| t.trim())
        .filter(|t| !t.is_empty())
        .ok_or_else(|| PipelineError::InfoMissing(describe.to_string()))?;

    let mut participant = Participant::new(team);
    for (chain, address) in chain_order.iter().zip(row.iter().skip(1)) {
        let address = address.trim();
        if !address.is_empty() {
            participant = participant.with_address(chain.clone(), address);
        }
    }
    Ok(participant)
}
