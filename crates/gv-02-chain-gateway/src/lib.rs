//! # GV-02 Chain Gateway
//!
//! Uniform, retrying read access to every chain taking part in the event.
//!
//! **Subsystem ID:** 02
//! **Architecture:** Hexagonal (DDD)
//!
//! ## Purpose
//!
//! - Fetch a transaction by hash and decode it into the payload a verifier
//!   asked for (basic, class issuance, mint, ICS-721 transfer, raw)
//! - Look up NFT classes, assets and class traces
//! - Hide per-chain differences (native NFT module vs CW-721 contracts)
//! - Retry transient failures with linear backoff; surface only exhaustion
//!
//! ## Module Structure
//!
//! ```text
//! gv-02-chain-gateway/
//! ├── domain/          # TxResponse, TxKind/TxOutcome, AssetClass, Asset, ClassTrace, errors
//! ├── ports/           # ChainQuery trait + MockChainQuery
//! ├── adapters/        # CosmosChain (Tendermint RPC + gRPC-gateway), abci query messages
//! ├── retry            # RetryPolicy, retry_http, retry_query
//! └── chain_set        # ChainSet (all chains of one run)
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod adapters;
pub mod chain_set;
pub mod domain;
pub mod ports;
pub mod retry;

// Re-exports
pub use adapters::CosmosChain;
pub use chain_set::ChainSet;
pub use domain::{
    decode_tx, Asset, AssetClass, ChainEndpoint, ClassTrace, GatewayError, ModuleKind,
    NftPacketData, PacketEvent, QueryCode, TxBasic, TxIbcTransfer, TxIssueClass, TxKind,
    TxMintAsset, TxOutcome, TxResponse,
};
pub use ports::{ChainQuery, MockChainQuery};
pub use retry::{retry_http, retry_query, HttpFailure, QueryFailure, RetryPolicy};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
