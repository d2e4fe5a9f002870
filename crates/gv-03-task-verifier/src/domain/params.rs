//! # Task Parameters
//!
//! Evidence rows decoded into what each verifier checks. Rows arrive with
//! the sheet header already removed; cells are trimmed here.

use super::reason::ReasonKind;
use gv_01_channel_flow::ChainId;

/// One minted asset claimed by a mint task.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MintClaim {
    /// Mint transaction hash.
    pub tx_hash: String,
    /// Class the asset was minted in.
    pub class_id: String,
    /// Token id.
    pub token_id: String,
}

/// Decoded evidence of one task.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TaskParams {
    /// Class issued on the home chain.
    IssueClass {
        /// Issue transaction hash.
        tx_hash: String,
        /// Issued class id.
        class_id: String,
    },
    /// Assets minted on the home chain.
    MintAsset {
        /// One claim per evidence row.
        claims: Vec<MintClaim>,
    },
    /// One-hop transfer between the home chain and `chain`, either way.
    Transfer {
        /// Transfer transaction hash.
        tx_hash: String,
        /// Class id on the non-home side.
        class_id: String,
        /// Token id.
        token_id: String,
        /// Non-home chain, resolved from its network id.
        chain: ChainId,
    },
    /// Every hop transaction of a flow, in hop order.
    FlowHops {
        /// Transaction hashes.
        tx_hashes: Vec<String>,
    },
    /// Final resting state of a never-go-back flow.
    FlowFinal {
        /// `ibc/<HEX>` class id on the home chain.
        ibc_class_id: String,
        /// Token id.
        token_id: String,
    },
    /// First and last transfer of a race.
    Race {
        /// Transfer that started the race.
        first_tx: String,
        /// Transfer that handed the asset to the final owner.
        last_tx: String,
    },
}

/// Cell `col` of `row`, trimmed.
pub(crate) fn cell(row: &[String], col: usize) -> Result<String, ReasonKind> {
    row.get(col)
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
        .ok_or(ReasonKind::ParamsFormatInvalid)
}

/// Reject anything other than exactly `count` rows.
pub(crate) fn expect_rows(rows: &[Vec<String>], count: usize) -> Result<(), ReasonKind> {
    if rows.len() == count {
        Ok(())
    } else {
        Err(ReasonKind::ParamsFormatInvalid)
    }
}
