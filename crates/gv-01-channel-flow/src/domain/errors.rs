//! # Domain Errors
//!
//! Error types for the channel flow subsystem.

use thiserror::Error;

/// Hash type (32-byte SHA-256).
pub type Hash = [u8; 32];

/// Channel flow error types.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FlowError {
    /// Neither ordering of the chain pair is registered.
    #[error("Unknown port/channel pair: {key}")]
    PairNotFound {
        /// Lookup key in the queried order, e.g. `is-1`
        key: String,
    },

    /// Flow expression does not describe a chain of hops.
    #[error("Malformed flow `{expression}`: {chains} chain(s) for {hops} hop(s)")]
    MalformedFlow {
        /// Offending expression
        expression: String,
        /// Chain letters found
        chains: usize,
        /// Pair indices found
        hops: usize,
    },

    /// Registry entry could not be parsed.
    #[error("Invalid channel entry `{key}`: {reason}")]
    InvalidChannelEntry {
        /// Entry key
        key: String,
        /// What is wrong with it
        reason: String,
    },

    /// Flow id not present in the catalog.
    #[error("Unknown flow id: {0}")]
    UnknownFlow(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pair_not_found_error() {
        let err = FlowError::PairNotFound {
            key: "is-9".to_string(),
        };
        assert!(err.to_string().contains("is-9"));
    }

    #[test]
    fn test_malformed_flow_error() {
        let err = FlowError::MalformedFlow {
            expression: "i --(1)-->".to_string(),
            chains: 1,
            hops: 1,
        };
        assert!(err.to_string().contains("1 chain(s) for 1 hop(s)"));
    }

    #[test]
    fn test_unknown_flow_error() {
        let err = FlowError::UnknownFlow("z99".to_string());
        assert!(err.to_string().contains("z99"));
    }
}
