//! # Outcomes and Requests
//!
//! What goes into a verifier and what comes out of it.

use super::params::TaskParams;
use super::reason::ReasonKind;
use gv_01_channel_flow::ChainId;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;

/// A registered participant (team) and its address on every chain.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Participant {
    /// Team name, copied into every outcome.
    pub team_name: String,
    /// Registered address per chain abbreviation.
    pub addresses: HashMap<ChainId, String>,
}

impl Participant {
    /// Participant without addresses.
    pub fn new(team_name: impl Into<String>) -> Self {
        Self {
            team_name: team_name.into(),
            addresses: HashMap::new(),
        }
    }

    /// Register `address` on `chain`.
    pub fn with_address(mut self, chain: impl Into<ChainId>, address: impl Into<String>) -> Self {
        self.addresses.insert(chain.into(), address.into());
        self
    }

    /// Registered address on `chain`, if one was given.
    pub fn address(&self, chain: &ChainId) -> Option<&str> {
        self.addresses
            .get(chain)
            .map(String::as_str)
            .filter(|a| !a.is_empty())
    }

    /// True if `address` is the non-empty address registered on `chain`.
    pub fn owns(&self, chain: &ChainId, address: &str) -> bool {
        self.address(chain) == Some(address)
    }
}

/// One task to verify for one participant.
#[derive(Clone, Debug)]
pub struct VerifyRequest {
    /// Task id (`A1`, `B5`).
    pub task_no: String,
    /// Points awarded on success.
    pub point: u32,
    /// Who claims the task.
    pub participant: Arc<Participant>,
    /// Parameters built from the evidence, or why they could not be.
    pub params: Result<TaskParams, ReasonKind>,
}

impl VerifyRequest {
    /// Outcome awarding this request's points.
    pub fn passed(&self, reason: impl Into<String>) -> VerificationOutcome {
        VerificationOutcome {
            task_no: self.task_no.clone(),
            team_name: self.participant.team_name.clone(),
            point: self.point,
            reason: reason.into(),
        }
    }

    /// Outcome with no points.
    pub fn failed(&self, reason: ReasonKind) -> VerificationOutcome {
        VerificationOutcome {
            task_no: self.task_no.clone(),
            team_name: self.participant.team_name.clone(),
            point: 0,
            reason: reason.to_string(),
        }
    }
}

/// Result of one task. Never mutated after it is sent to the collector.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct VerificationOutcome {
    /// Task id.
    pub task_no: String,
    /// Team name.
    pub team_name: String,
    /// Points awarded, 0 on failure.
    pub point: u32,
    /// Failure reason, or extra ranking detail on success.
    pub reason: String,
}

impl VerificationOutcome {
    /// True if points were awarded.
    pub fn is_passed(&self) -> bool {
        self.point > 0
    }
}

/// Natural order of task ids: letter prefix, then number (`A2 < A10 < B1`).
pub fn task_no_cmp(a: &str, b: &str) -> Ordering {
    fn split(s: &str) -> (&str, Option<u64>) {
        let digits = s.trim_start_matches(|c: char| !c.is_ascii_digit());
        let prefix = &s[..s.len() - digits.len()];
        let number = digits
            .split(|c: char| !c.is_ascii_digit())
            .next()
            .and_then(|n| n.parse::<u64>().ok());
        (prefix, number)
    }
    let (pa, na) = split(a);
    let (pb, nb) = split(b);
    pa.cmp(pb).then(na.cmp(&nb)).then_with(|| a.cmp(b))
}
