//! # Failure Reasons
//!
//! The reason a task was not awarded points. Participants see the name of
//! the kind, never a transport or decoding error.

use gv_01_channel_flow::FlowError;
use gv_02_chain_gateway::GatewayError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Why a verification check failed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReasonKind {
    /// Evidence rows have the wrong shape.
    ParamsFormatInvalid,
    /// The chain id named in the evidence is not one the task accepts.
    ChainIdUnresolved,
    /// The transaction could not be fetched after retries.
    TxUnachievable,
    /// The transaction does not carry what the task needs.
    TxResultUnexpected,
    /// The transaction was included with a non-zero code.
    TxUnsuccessful,
    /// The signer is not the registered address.
    SenderMismatch,
    /// The receiver is not the registered address.
    RecipientMismatch,
    /// The class does not exist.
    ClassNotFound,
    /// The class was created by someone else.
    ClassCreatorMismatch,
    /// The class uri is empty or its data is not a JSON object.
    ClassDataInvalid,
    /// The asset does not exist.
    AssetNotFound,
    /// The asset is owned by someone else.
    AssetOwnerMismatch,
    /// A hop went over a port/channel other than the flow's.
    PortOrChannelMismatch,
    /// The class id is not the hash the flow produces.
    TraceHashMismatch,
    /// The transfers do not follow the claimed flow.
    FlowPathUnexpected,
    /// The race started before the window opened.
    StartTooEarly,
    /// A hop of the flow has no registered channel pair.
    PairNotFound,
    /// A hop moved a different token.
    TokenIdMismatch,
    /// The asset uri or data is empty.
    AssetDataInvalid,
    /// The task aborted before producing an outcome.
    Internal,
}

impl ReasonKind {
    /// Name shown to participants.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ParamsFormatInvalid => "ParamsFormatInvalid",
            Self::ChainIdUnresolved => "ChainIdUnresolved",
            Self::TxUnachievable => "TxUnachievable",
            Self::TxResultUnexpected => "TxResultUnexpected",
            Self::TxUnsuccessful => "TxUnsuccessful",
            Self::SenderMismatch => "SenderMismatch",
            Self::RecipientMismatch => "RecipientMismatch",
            Self::ClassNotFound => "ClassNotFound",
            Self::ClassCreatorMismatch => "ClassCreatorMismatch",
            Self::ClassDataInvalid => "ClassDataInvalid",
            Self::AssetNotFound => "AssetNotFound",
            Self::AssetOwnerMismatch => "AssetOwnerMismatch",
            Self::PortOrChannelMismatch => "PortOrChannelMismatch",
            Self::TraceHashMismatch => "TraceHashMismatch",
            Self::FlowPathUnexpected => "FlowPathUnexpected",
            Self::StartTooEarly => "StartTooEarly",
            Self::PairNotFound => "PairNotFound",
            Self::TokenIdMismatch => "TokenIdMismatch",
            Self::AssetDataInvalid => "AssetDataInvalid",
            Self::Internal => "Internal",
        }
    }

    /// Reason for a failed transaction lookup.
    pub fn from_tx_error(err: &GatewayError) -> Self {
        match err {
            GatewayError::UnexpectedResult { .. } => Self::TxResultUnexpected,
            GatewayError::Unsuccessful { .. } => Self::TxUnsuccessful,
            GatewayError::Unachievable { .. }
            | GatewayError::NotFound(_)
            | GatewayError::Rejected { .. }
            | GatewayError::Closed(_)
            | GatewayError::UnknownChain(_)
            | GatewayError::InvalidEndpoint { .. } => Self::TxUnachievable,
        }
    }
}

impl From<&FlowError> for ReasonKind {
    fn from(err: &FlowError) -> Self {
        match err {
            FlowError::PairNotFound { .. } => Self::PairNotFound,
            FlowError::MalformedFlow { .. }
            | FlowError::UnknownFlow(_)
            | FlowError::InvalidChannelEntry { .. } => Self::FlowPathUnexpected,
        }
    }
}

impl fmt::Display for ReasonKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gv_01_channel_flow::ChainId;

    #[test]
    fn test_display_is_kind_name() {
        assert_eq!(ReasonKind::SenderMismatch.to_string(), "SenderMismatch");
        assert_eq!(ReasonKind::TraceHashMismatch.to_string(), "TraceHashMismatch");
    }

    #[test]
    fn test_tx_error_mapping() {
        let unreachable = GatewayError::Unachievable {
            chain: ChainId::from('i'),
            attempts: 3,
            reason: "timeout".to_string(),
        };
        assert_eq!(ReasonKind::from_tx_error(&unreachable), ReasonKind::TxUnachievable);
        assert_eq!(
            ReasonKind::from_tx_error(&GatewayError::Unsuccessful { code: 5 }),
            ReasonKind::TxUnsuccessful
        );
        assert_eq!(
            ReasonKind::from_tx_error(&GatewayError::Closed(ChainId::from('i'))),
            ReasonKind::TxUnachievable
        );
    }

    #[test]
    fn test_flow_error_mapping() {
        let err = FlowError::PairNotFound {
            key: "is-9".to_string(),
        };
        assert_eq!(ReasonKind::from(&err), ReasonKind::PairNotFound);
        assert_eq!(
            ReasonKind::from(&FlowError::UnknownFlow("z01".to_string())),
            ReasonKind::FlowPathUnexpected
        );
    }
}
