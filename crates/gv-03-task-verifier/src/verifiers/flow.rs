//! # Flow Verifier
//!
//! Multi-hop transfers along a named flow.
//!
//! A regular flow task names one transaction per hop and every hop is
//! replayed against the flow's channel pairs. A never-go-back task names
//! only the class id the asset ended up with: hops are not replayed, the
//! claim is checked against the flow's trace hash and the final owner.
//!
//! A task may accept alternate routes. The primary flow is tried first and
//! the first route that passes wins; when none does, the reason of the first
//! route tried is reported. Hop replays only try routes with as many hops as
//! the evidence has rows.

use super::{ensure, fetch_tx};
use crate::domain::params::{cell, expect_rows};
use crate::domain::{Participant, ReasonKind, TaskParams};
use gv_01_channel_flow::FlowCatalog;
use gv_02_chain_gateway::{ChainSet, TxIbcTransfer, TxKind};
use std::sync::Arc;
use tracing::debug;

/// Verifier for one flow id and its alternates.
pub struct FlowVerifier {
    /// Primary flow first, never empty.
    routes: Vec<String>,
    never_go_back: bool,
    catalog: Arc<FlowCatalog>,
    chains: Arc<ChainSet>,
}

impl FlowVerifier {
    /// Create a verifier. `flow_id` must be in `catalog`.
    pub fn new(
        flow_id: impl Into<String>,
        never_go_back: bool,
        catalog: Arc<FlowCatalog>,
        chains: Arc<ChainSet>,
    ) -> Self {
        Self {
            routes: vec![flow_id.into()],
            never_go_back,
            catalog,
            chains,
        }
    }

    /// Also accept the given flows. Each must be in the catalog.
    pub fn with_alternates<I, S>(mut self, alternates: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for alternate in alternates {
            let alternate = alternate.into();
            if !self.routes.contains(&alternate) {
                self.routes.push(alternate);
            }
        }
        self
    }

    /// Primary flow id.
    pub fn flow_id(&self) -> &str {
        &self.routes[0]
    }

    /// Every accepted flow id, primary first.
    pub fn routes(&self) -> &[String] {
        &self.routes
    }

    /// True for final-state-only tasks.
    pub fn never_go_back(&self) -> bool {
        self.never_go_back
    }

    pub(crate) fn build_params(&self, rows: &[Vec<String>]) -> Result<TaskParams, ReasonKind> {
        if self.never_go_back {
            expect_rows(rows, 1)?;
            return Ok(TaskParams::FlowFinal {
                ibc_class_id: cell(&rows[0], 0)?,
                token_id: cell(&rows[0], 1)?,
            });
        }

        let mut hop_counts = Vec::with_capacity(self.routes.len());
        for id in &self.routes {
            let flow = self.catalog.flow(id).map_err(|e| ReasonKind::from(&e))?;
            hop_counts.push(flow.hop_count());
        }
        let matched = hop_counts.iter().find(|&&count| count == rows.len());
        expect_rows(rows, matched.copied().unwrap_or(hop_counts[0]))?;
        let tx_hashes = rows
            .iter()
            .map(|row| cell(row, 0))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(TaskParams::FlowHops { tx_hashes })
    }

    pub(crate) async fn check(
        &self,
        params: &TaskParams,
        participant: &Participant,
    ) -> Result<(), ReasonKind> {
        let mut primary = None;
        for flow_id in &self.routes {
            let result = match (self.never_go_back, params) {
                (false, TaskParams::FlowHops { tx_hashes }) => {
                    if !self.fits(flow_id, tx_hashes.len()) {
                        continue;
                    }
                    self.check_hops(flow_id, tx_hashes, participant).await
                }
                (
                    true,
                    TaskParams::FlowFinal {
                        ibc_class_id,
                        token_id,
                    },
                ) => {
                    self.check_final(flow_id, ibc_class_id, token_id, participant)
                        .await
                }
                _ => return Err(ReasonKind::ParamsFormatInvalid),
            };
            match result {
                Ok(()) => {
                    if flow_id != self.flow_id() {
                        debug!(flow = %self.flow_id(), "[gv-03] passed over alternate {}", flow_id);
                    }
                    return Ok(());
                }
                Err(reason) => {
                    primary.get_or_insert(reason);
                }
            }
        }
        Err(primary.unwrap_or(ReasonKind::ParamsFormatInvalid))
    }

    /// True if `flow_id` has exactly `hops` hops.
    fn fits(&self, flow_id: &str, hops: usize) -> bool {
        self.catalog
            .flow(flow_id)
            .is_ok_and(|flow| flow.hop_count() == hops)
    }

    async fn check_hops(
        &self,
        flow_id: &str,
        tx_hashes: &[String],
        participant: &Participant,
    ) -> Result<(), ReasonKind> {
        let mut flow = self
            .catalog
            .flow(flow_id)
            .map_err(|e| ReasonKind::from(&e))?;
        ensure(tx_hashes.len() == flow.hop_count(), ReasonKind::ParamsFormatInvalid)?;

        let mut first: Option<TxIbcTransfer> = None;
        let mut hashes = tx_hashes.iter();
        for (hop, pair) in flow.by_ref().enumerate() {
            let hash = hashes.next().ok_or(ReasonKind::ParamsFormatInvalid)?;
            let src = self
                .chains
                .get(&pair.src.chain)
                .map_err(|_| ReasonKind::ChainIdUnresolved)?;

            let tx = fetch_tx(src.as_ref(), hash, TxKind::IbcTransfer)
                .await?
                .into_ibc_transfer()
                .map_err(|_| ReasonKind::TxResultUnexpected)?;
            ensure(
                participant.owns(&pair.src.chain, &tx.sender),
                ReasonKind::SenderMismatch,
            )?;
            ensure(
                participant.owns(&pair.dest.chain, &tx.receiver),
                ReasonKind::RecipientMismatch,
            )?;
            ensure(
                tx.dest_port == pair.dest.port && tx.dest_channel == pair.dest.channel,
                ReasonKind::PortOrChannelMismatch,
            )?;
            ensure(
                first
                    .as_ref()
                    .is_none_or(|origin| origin.token_id == tx.token_id),
                ReasonKind::TokenIdMismatch,
            )?;
            first.get_or_insert(tx);
            debug!(flow = %flow_id, "[gv-03] hop {} ok over {}", hop + 1, pair);
        }
        if !flow.is_done() {
            return Err(ReasonKind::PairNotFound);
        }
        let origin = first.ok_or(ReasonKind::ParamsFormatInvalid)?;

        let final_chain = flow.final_chain().clone();
        let class_id = flow
            .final_class_id(origin.original_class())
            .map_err(|e| ReasonKind::from(&e))?;
        let dest = self
            .chains
            .get(&final_chain)
            .map_err(|_| ReasonKind::ChainIdUnresolved)?;
        let asset = dest
            .get_asset(&class_id, &origin.token_id)
            .await
            .map_err(|_| ReasonKind::AssetNotFound)?;
        ensure(
            participant.owns(&final_chain, &asset.owner),
            ReasonKind::AssetOwnerMismatch,
        )
    }

    async fn check_final(
        &self,
        flow_id: &str,
        ibc_class_id: &str,
        token_id: &str,
        participant: &Participant,
    ) -> Result<(), ReasonKind> {
        let flow = self
            .catalog
            .flow(flow_id)
            .map_err(|e| ReasonKind::from(&e))?;
        let final_chain = flow.final_chain();
        let dest = self
            .chains
            .get(final_chain)
            .map_err(|_| ReasonKind::ChainIdUnresolved)?;

        let trace = dest
            .get_class_trace(ibc_class_id)
            .await
            .map_err(|_| ReasonKind::ClassNotFound)?;
        let expected = flow
            .final_class_id(&trace.base_class_id)
            .map_err(|e| ReasonKind::from(&e))?;
        ensure(expected == ibc_class_id, ReasonKind::TraceHashMismatch)?;

        let asset = dest
            .get_asset(ibc_class_id, token_id)
            .await
            .map_err(|_| ReasonKind::AssetNotFound)?;
        ensure(
            participant.owns(final_chain, &asset.owner),
            ReasonKind::AssetOwnerMismatch,
        )
    }
}
