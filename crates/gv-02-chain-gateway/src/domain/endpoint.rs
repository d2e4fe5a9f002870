//! # Chain Endpoints
//!
//! Where and how to reach one chain.

use gv_01_channel_flow::ChainId;
use serde::{Deserialize, Serialize};

/// Route prefix of the irismod NFT module.
pub const DEFAULT_NFT_ROUTE: &str = "/irismod/nft";

fn default_nft_route() -> String {
    DEFAULT_NFT_ROUTE.to_string()
}

/// Which NFT implementation the chain runs.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModuleKind {
    /// Native NFT module with denom/nft query routes.
    #[default]
    Nft,
    /// CW-721 contracts behind an ICS-721 wasm port.
    Wasm,
}

/// Endpoint configuration for one chain.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainEndpoint {
    /// Abbreviation used in flows and evidence (`i`).
    pub abbr: ChainId,
    /// Network id (`gon-irishub-1`).
    pub chain_id: String,
    /// Tendermint RPC base URL.
    pub rpc: String,
    /// gRPC-gateway (REST) base URL.
    pub query: String,
    /// NFT implementation.
    #[serde(default)]
    pub module: ModuleKind,
    /// Route prefix of the native NFT module.
    #[serde(default = "default_nft_route")]
    pub nft_route: String,
}

impl ChainEndpoint {
    /// Endpoint with default module settings.
    pub fn new(
        abbr: impl Into<ChainId>,
        chain_id: impl Into<String>,
        rpc: impl Into<String>,
        query: impl Into<String>,
    ) -> Self {
        Self {
            abbr: abbr.into(),
            chain_id: chain_id.into(),
            rpc: rpc.into(),
            query: query.into(),
            module: ModuleKind::Nft,
            nft_route: default_nft_route(),
        }
    }

    /// Switch the module kind.
    pub fn with_module(mut self, module: ModuleKind) -> Self {
        self.module = module;
        self
    }
}
