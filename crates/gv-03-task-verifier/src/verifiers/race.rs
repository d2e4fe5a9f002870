//! # Race Verifier
//!
//! Timed tasks: move an asset of a given class along any catalog flow,
//! then hand it to a designated owner on the home chain.
//!
//! The first transfer names its flow in the packet memo, either as
//! `{"flow":"b01"}` or as the bare id. The last transfer is a native
//! `transfer_nft` on the home chain.

use super::{ensure, fetch_tx, CheckResult};
use crate::domain::params::{cell, expect_rows};
use crate::domain::{Participant, ReasonKind, TaskParams};
use gv_01_channel_flow::FlowCatalog;
use gv_02_chain_gateway::domain::response::EVENT_TRANSFER_NFT;
use gv_02_chain_gateway::{ChainSet, TxKind, TxResponse};
use serde::Deserialize;
use std::sync::Arc;
use tracing::debug;

/// Verifier for one race.
pub struct RaceVerifier {
    class_id: String,
    final_owner: String,
    start_height: u64,
    end_height: u64,
    catalog: Arc<FlowCatalog>,
    chains: Arc<ChainSet>,
}

#[derive(Deserialize)]
struct RaceMemo {
    flow: String,
}

/// The `transfer_nft` event of the last transfer.
#[derive(Debug, PartialEq, Eq)]
struct NativeTransfer {
    class_id: String,
    token_id: String,
    sender: String,
    recipient: String,
}

impl NativeTransfer {
    fn from_response(tx: &TxResponse) -> Option<Self> {
        let attr = |key: &str| tx.event_attribute(EVENT_TRANSFER_NFT, key);
        Some(Self {
            class_id: attr("denom_id")?,
            token_id: attr("token_id")?,
            sender: attr("sender")?,
            recipient: attr("recipient")?,
        })
    }
}

impl RaceVerifier {
    /// Create a verifier for races of `class_id` ending with `final_owner`
    /// inside the `[start_height, end_height]` window.
    pub fn new(
        class_id: impl Into<String>,
        final_owner: impl Into<String>,
        start_height: u64,
        end_height: u64,
        catalog: Arc<FlowCatalog>,
        chains: Arc<ChainSet>,
    ) -> Self {
        Self {
            class_id: class_id.into(),
            final_owner: final_owner.into(),
            start_height,
            end_height,
            catalog,
            chains,
        }
    }

    /// Original class id raced.
    pub fn class_id(&self) -> &str {
        &self.class_id
    }

    pub(crate) fn build_params(&self, rows: &[Vec<String>]) -> Result<TaskParams, ReasonKind> {
        expect_rows(rows, 2)?;
        Ok(TaskParams::Race {
            first_tx: cell(&rows[0], 0)?,
            last_tx: cell(&rows[1], 0)?,
        })
    }

    pub(crate) async fn check(&self, params: &TaskParams, participant: &Participant) -> CheckResult {
        let TaskParams::Race { first_tx, last_tx } = params else {
            return Err(ReasonKind::ParamsFormatInvalid);
        };
        let home = self.chains.home();

        let first = fetch_tx(home.as_ref(), first_tx, TxKind::Raw)
            .await?
            .into_raw()
            .map_err(|_| ReasonKind::TxResultUnexpected)?;
        let packet = first
            .send_packet()
            .map_err(|_| ReasonKind::FlowPathUnexpected)?;
        let flow_id = memo_flow_id(&packet.data.memo).ok_or(ReasonKind::FlowPathUnexpected)?;
        let flow = self
            .catalog
            .flow(&flow_id)
            .map_err(|_| ReasonKind::FlowPathUnexpected)?;

        let last = fetch_tx(home.as_ref(), last_tx, TxKind::Raw)
            .await?
            .into_raw()
            .map_err(|_| ReasonKind::TxResultUnexpected)?;
        let handover = NativeTransfer::from_response(&last).ok_or(ReasonKind::TxResultUnexpected)?;

        ensure(packet.data.sender == handover.sender, ReasonKind::SenderMismatch)?;
        ensure(
            participant.owns(home.chain(), &packet.data.sender),
            ReasonKind::SenderMismatch,
        )?;

        let asset = home
            .get_asset(&handover.class_id, &handover.token_id)
            .await
            .map_err(|_| ReasonKind::AssetNotFound)?;
        ensure(asset.owner == self.final_owner, ReasonKind::AssetOwnerMismatch)?;

        let expected = flow
            .final_class_id(&self.class_id)
            .map_err(|e| ReasonKind::from(&e))?;
        ensure(expected == handover.class_id, ReasonKind::FlowPathUnexpected)?;

        let first_height = parse_height(first.height())?;
        let last_height = parse_height(last.height())?;
        ensure(first_height >= self.start_height, ReasonKind::StartTooEarly)?;

        debug!(
            flow = %flow_id,
            "[gv-03] race {} -> {} handed to {}",
            first_height,
            last_height,
            handover.recipient
        );
        if last_height <= self.end_height {
            Ok(race_detail(first_height, last_height))
        } else {
            Ok(String::new())
        }
    }
}

/// Flow id carried by a race memo.
fn memo_flow_id(memo: &str) -> Option<String> {
    let memo = memo.trim();
    if memo.is_empty() {
        return None;
    }
    if memo.starts_with('{') {
        return serde_json::from_str::<RaceMemo>(memo)
            .ok()
            .map(|m| m.flow.trim().to_string())
            .filter(|f| !f.is_empty());
    }
    Some(memo.to_string())
}

fn parse_height(height: &str) -> Result<u64, ReasonKind> {
    height
        .trim()
        .parse::<u64>()
        .map_err(|_| ReasonKind::TxResultUnexpected)
}

/// `race/<first>/<last>/<diff>`, used to rank finishers.
fn race_detail(first: u64, last: u64) -> String {
    let diff = i128::from(last) - i128::from(first);
    format!("race/{first}/{last}/{diff}")
}
