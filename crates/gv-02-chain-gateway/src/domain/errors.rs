//! # Domain Errors
//!
//! Error types for chain queries.

use gv_01_channel_flow::ChainId;
use std::fmt;
use thiserror::Error;

/// Status class of a failed query, modelled on gRPC status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryCode {
    /// Endpoint unreachable or overloaded (14).
    Unavailable,
    /// Endpoint did not answer in time (4).
    DeadlineExceeded,
    /// Requested object does not exist (5).
    NotFound,
    /// Request rejected as malformed (3).
    InvalidArgument,
    /// Any other status, by numeric code.
    Other(i64),
}

impl QueryCode {
    /// Map a numeric gRPC status code.
    pub fn from_grpc(code: i64) -> Self {
        match code {
            3 => Self::InvalidArgument,
            4 => Self::DeadlineExceeded,
            5 => Self::NotFound,
            14 => Self::Unavailable,
            other => Self::Other(other),
        }
    }

    /// Map an HTTP status returned by a gRPC-gateway route.
    pub fn from_http_status(status: u16) -> Self {
        match status {
            400 => Self::InvalidArgument,
            404 => Self::NotFound,
            429 | 502 | 503 => Self::Unavailable,
            504 => Self::DeadlineExceeded,
            other => Self::Other(i64::from(other)),
        }
    }

    /// Only these are worth another attempt.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Unavailable | Self::DeadlineExceeded)
    }
}

impl fmt::Display for QueryCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unavailable => f.write_str("Unavailable"),
            Self::DeadlineExceeded => f.write_str("DeadlineExceeded"),
            Self::NotFound => f.write_str("NotFound"),
            Self::InvalidArgument => f.write_str("InvalidArgument"),
            Self::Other(code) => write!(f, "Code({code})"),
        }
    }
}

/// Chain gateway error types.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    /// The call failed on every attempt, or the answer could not be read.
    #[error("Chain {chain} unreachable after {attempts} attempt(s): {reason}")]
    Unachievable {
        /// Queried chain
        chain: ChainId,
        /// Attempts made
        attempts: u32,
        /// Last failure seen
        reason: String,
    },

    /// The transaction does not decode into the requested kind.
    #[error("Unexpected {kind} result: {reason}")]
    UnexpectedResult {
        /// Requested transaction kind
        kind: String,
        /// What was missing or malformed
        reason: String,
    },

    /// The transaction was included with a non-zero result code.
    #[error("Transaction failed with code {code}")]
    Unsuccessful {
        /// Result code
        code: u32,
    },

    /// Class, asset or class trace does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The query was refused with a non-transient status.
    #[error("Query rejected ({code}): {message}")]
    Rejected {
        /// Status class
        code: QueryCode,
        /// Message from the endpoint
        message: String,
    },

    /// The connection was released.
    #[error("Chain {0} connection closed")]
    Closed(ChainId),

    /// No adapter is configured for the chain.
    #[error("Unknown chain: {0}")]
    UnknownChain(String),

    /// Endpoint configuration is unusable.
    #[error("Invalid endpoint for chain {chain}: {reason}")]
    InvalidEndpoint {
        /// Chain abbreviation
        chain: ChainId,
        /// What is wrong with it
        reason: String,
    },
}
