//! # Transaction Kinds
//!
//! A caller asks for a transaction by hash together with the kind it
//! expects; the response is decoded into the matching payload.

use super::errors::GatewayError;
use super::response::TxResponse;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Semantic type requested for a transaction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TxKind {
    /// Sender and result code only.
    Basic,
    /// Class (denom) issuance.
    IssueClass,
    /// Asset mint.
    MintAsset,
    /// Outbound ICS-721 transfer.
    IbcTransfer,
    /// Undecoded response.
    Raw,
}

impl fmt::Display for TxKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Basic => "basic",
            Self::IssueClass => "issue_class",
            Self::MintAsset => "mint_asset",
            Self::IbcTransfer => "ibc_transfer",
            Self::Raw => "raw",
        };
        f.write_str(name)
    }
}

/// Basic payload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TxBasic {
    /// Message sender.
    pub sender: String,
    /// Result code.
    pub code: u32,
}

/// Class issuance payload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TxIssueClass {
    /// Message sender.
    pub sender: String,
    /// Creator recorded on the class.
    pub creator: String,
    /// Issued class id.
    pub class_id: String,
    /// Result code.
    pub code: u32,
}

/// Asset mint payload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TxMintAsset {
    /// Message sender.
    pub sender: String,
    /// Class the asset was minted in.
    pub class_id: String,
    /// Minted token id.
    pub token_id: String,
    /// Initial owner.
    pub recipient: String,
    /// Result code.
    pub code: u32,
}

/// Outbound ICS-721 transfer payload, read from the sent packet.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TxIbcTransfer {
    /// Sender on the source chain.
    pub sender: String,
    /// Receiver on the destination chain.
    pub receiver: String,
    /// Destination port.
    pub dest_port: String,
    /// Destination channel.
    pub dest_channel: String,
    /// Class id as sent, with any trace prefix.
    pub class_id: String,
    /// First token id in the packet.
    pub token_id: String,
    /// Packet memo.
    pub memo: String,
    /// Inclusion height.
    pub height: String,
    /// Result code.
    pub code: u32,
}

impl TxIbcTransfer {
    /// Class id without its trace prefix.
    pub fn original_class(&self) -> &str {
        self.class_id.rsplit('/').next().unwrap_or(&self.class_id)
    }
}

/// Decoded transaction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TxOutcome {
    /// See [`TxBasic`].
    Basic(TxBasic),
    /// See [`TxIssueClass`].
    IssueClass(TxIssueClass),
    /// See [`TxMintAsset`].
    MintAsset(TxMintAsset),
    /// See [`TxIbcTransfer`].
    IbcTransfer(TxIbcTransfer),
    /// Full response for callers that read events themselves.
    Raw(TxResponse),
}

impl TxOutcome {
    /// Kind this outcome was decoded as.
    pub fn kind(&self) -> TxKind {
        match self {
            Self::Basic(_) => TxKind::Basic,
            Self::IssueClass(_) => TxKind::IssueClass,
            Self::MintAsset(_) => TxKind::MintAsset,
            Self::IbcTransfer(_) => TxKind::IbcTransfer,
            Self::Raw(_) => TxKind::Raw,
        }
    }

    /// Result code.
    pub fn code(&self) -> u32 {
        match self {
            Self::Basic(tx) => tx.code,
            Self::IssueClass(tx) => tx.code,
            Self::MintAsset(tx) => tx.code,
            Self::IbcTransfer(tx) => tx.code,
            Self::Raw(tx) => tx.code(),
        }
    }
}

macro_rules! into_variant {
    ($name:ident, $variant:ident, $ty:ty) => {
        impl TxOutcome {
            #[doc = concat!("Unwrap a [`TxOutcome::", stringify!($variant), "`] or report the mismatch.")]
            pub fn $name(self) -> Result<$ty, GatewayError> {
                match self {
                    Self::$variant(tx) => Ok(tx),
                    other => Err(GatewayError::UnexpectedResult {
                        kind: TxKind::$variant.to_string(),
                        reason: format!("decoded as {}", other.kind()),
                    }),
                }
            }
        }
    };
}

into_variant!(into_basic, Basic, TxBasic);
into_variant!(into_issue_class, IssueClass, TxIssueClass);
into_variant!(into_mint_asset, MintAsset, TxMintAsset);
into_variant!(into_ibc_transfer, IbcTransfer, TxIbcTransfer);
into_variant!(into_raw, Raw, TxResponse);

/// Decode a response as `kind`.
///
/// A non-zero result code is reported before any payload is read, since
/// failed transactions carry no module events.
pub fn decode_tx(response: TxResponse, kind: TxKind) -> Result<TxOutcome, GatewayError> {
    let code = response.code();
    if code != 0 {
        return Err(GatewayError::Unsuccessful { code });
    }

    let missing = |what: &str| GatewayError::UnexpectedResult {
        kind: kind.to_string(),
        reason: format!("missing {what}"),
    };
    let sender = || response.attribute("sender").ok_or_else(|| missing("sender"));

    let outcome = match kind {
        TxKind::Basic => TxOutcome::Basic(TxBasic {
            sender: sender()?,
            code,
        }),
        TxKind::IssueClass => {
            let attr = |key: &str| {
                response
                    .event_attribute("issue_denom", key)
                    .ok_or_else(|| missing(&format!("issue_denom.{key}")))
            };
            TxOutcome::IssueClass(TxIssueClass {
                sender: sender()?,
                creator: attr("creator")?,
                class_id: attr("denom_id")?,
                code,
            })
        }
        TxKind::MintAsset => {
            let attr = |key: &str| {
                response
                    .event_attribute("mint_nft", key)
                    .ok_or_else(|| missing(&format!("mint_nft.{key}")))
            };
            TxOutcome::MintAsset(TxMintAsset {
                sender: sender()?,
                class_id: attr("denom_id")?,
                token_id: attr("token_id")?,
                recipient: attr("recipient")?,
                code,
            })
        }
        TxKind::IbcTransfer => {
            let packet = response
                .send_packet()
                .map_err(|reason| GatewayError::UnexpectedResult {
                    kind: kind.to_string(),
                    reason,
                })?;
            let token_id = packet
                .data
                .token_ids
                .first()
                .cloned()
                .ok_or_else(|| missing("token id"))?;
            TxOutcome::IbcTransfer(TxIbcTransfer {
                sender: packet.data.sender,
                receiver: packet.data.receiver,
                dest_port: packet.dest_port,
                dest_channel: packet.dest_channel,
                class_id: packet.data.class_id,
                token_id,
                memo: packet.data.memo,
                height: response.height.clone(),
                code,
            })
        }
        TxKind::Raw => TxOutcome::Raw(response),
    };
    Ok(outcome)
}
