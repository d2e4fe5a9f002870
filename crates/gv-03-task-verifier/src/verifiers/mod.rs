//! # Verifiers
//!
//! One verifier per task family. Every verifier offers the same two
//! operations: decode evidence rows into [`TaskParams`] and verify a
//! request, emitting exactly one [`VerificationOutcome`].
//!
//! Checks run in a fixed order and the first failure wins:
//!
//! ```text
//! params -> tx fetch/decode -> tx code -> sender -> counterpart exists
//!        -> counterpart fields -> cross references
//! ```
//!
//! Gateway and flow errors never leave a verifier; they are mapped to a
//! [`ReasonKind`] on the spot.

pub mod flow;
pub mod race;
pub mod simple;

pub use flow::FlowVerifier;
pub use race::RaceVerifier;
pub use simple::{SimpleTask, SimpleVerifier};

use crate::domain::{ReasonKind, TaskParams, VerificationOutcome, VerifyRequest};
use gv_02_chain_gateway::{ChainQuery, TxKind, TxOutcome};
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Result of the checks of one task: ranking detail on success.
pub type CheckResult = Result<String, ReasonKind>;

/// A task verifier.
pub enum Verifier {
    /// Single-transaction tasks.
    Simple(SimpleVerifier),
    /// Multi-hop flow tasks.
    Flow(FlowVerifier),
    /// Timed race tasks.
    Race(RaceVerifier),
}

impl Verifier {
    /// Short name of the verifier family.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Simple(_) => "simple",
            Self::Flow(_) => "flow",
            Self::Race(_) => "race",
        }
    }

    /// Decode the evidence rows of a task sheet (header removed).
    pub fn build_params(&self, rows: &[Vec<String>]) -> Result<TaskParams, ReasonKind> {
        match self {
            Self::Simple(v) => v.build_params(rows),
            Self::Flow(v) => v.build_params(rows),
            Self::Race(v) => v.build_params(rows),
        }
    }

    /// Verify `request` and send its outcome to `results`.
    pub async fn verify(&self, request: VerifyRequest, results: mpsc::Sender<VerificationOutcome>) {
        let outcome = match self.check(&request).await {
            Ok(detail) => request.passed(detail),
            Err(reason) => request.failed(reason),
        };
        debug!(
            task = %outcome.task_no,
            team = %outcome.team_name,
            point = outcome.point,
            "[gv-03] {} verifier done: {}",
            self.kind(),
            if outcome.reason.is_empty() { "ok" } else { outcome.reason.as_str() }
        );
        if results.send(outcome).await.is_err() {
            warn!(task = %request.task_no, "[gv-03] collector gone, outcome dropped");
        }
    }

    async fn check(&self, request: &VerifyRequest) -> CheckResult {
        let params = request.params.as_ref().map_err(|reason| *reason)?;
        let participant = &request.participant;
        match self {
            Self::Simple(v) => v.check(params, participant).await.map(|()| String::new()),
            Self::Flow(v) => v.check(params, participant).await.map(|()| String::new()),
            Self::Race(v) => v.check(params, participant).await,
        }
    }
}

/// Fetch and decode a transaction, mapping failures to reasons.
pub(crate) async fn fetch_tx(
    chain: &dyn ChainQuery,
    hash: &str,
    kind: TxKind,
) -> Result<TxOutcome, ReasonKind> {
    chain.get_transaction(hash, kind).await.map_err(|e| {
        debug!(chain = %chain.chain(), "[gv-03] tx {} ({}) failed: {}", hash, kind, e);
        ReasonKind::from_tx_error(&e)
    })
}

/// `Ok(())` if `holds`, else `Err(reason)`.
pub(crate) fn ensure(holds: bool, reason: ReasonKind) -> Result<(), ReasonKind> {
    if holds {
        Ok(())
    } else {
        Err(reason)
    }
}
