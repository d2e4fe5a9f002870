//! # ABCI Queries
//!
//! Class and asset lookups for ids the gRPC-gateway cannot route. An IBC
//! class id (`ibc/<HASH>`) carries a `/`, and the gateway matches routes
//! against the decoded path, so the request goes straight to the chain's
//! gRPC query service through the Tendermint RPC `abci_query` endpoint.
//!
//! Messages follow the irismod NFT query service; forks of it (the uptick
//! collection module) share the same field layout.

use crate::domain::{Asset, AssetClass, QueryCode};
use crate::retry::QueryFailure;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::Deserialize;

/// Fully qualified gRPC method for an NFT route prefix.
///
/// `/irismod/nft` + `NFT` gives `/irismod.nft.Query/NFT`.
pub fn method_path(nft_route: &str, method: &str) -> String {
    let package: Vec<&str> = nft_route.split('/').filter(|s| !s.is_empty()).collect();
    format!("/{}.Query/{method}", package.join("."))
}

/// `Query/Denom` request.
#[derive(Clone, PartialEq, prost::Message)]
pub struct QueryDenomRequest {
    /// Class id.
    #[prost(string, tag = "1")]
    pub denom_id: String,
}

/// `Query/Denom` response.
#[derive(Clone, PartialEq, prost::Message)]
pub struct QueryDenomResponse {
    /// The class, absent if unknown.
    #[prost(message, optional, tag = "1")]
    pub denom: Option<Denom>,
}

/// A class as stored by the NFT module.
#[derive(Clone, PartialEq, prost::Message)]
pub struct Denom {
    /// Class id.
    #[prost(string, tag = "1")]
    pub id: String,
    /// Display name.
    #[prost(string, tag = "2")]
    pub name: String,
    /// Metadata schema.
    #[prost(string, tag = "3")]
    pub schema: String,
    /// Creator address.
    #[prost(string, tag = "4")]
    pub creator: String,
    /// Ticker symbol.
    #[prost(string, tag = "5")]
    pub symbol: String,
    /// Only the creator may mint.
    #[prost(bool, tag = "6")]
    pub mint_restricted: bool,
    /// Only the owner may edit.
    #[prost(bool, tag = "7")]
    pub update_restricted: bool,
    /// Free-form description.
    #[prost(string, tag = "8")]
    pub description: String,
    /// Metadata uri.
    #[prost(string, tag = "9")]
    pub uri: String,
    /// Hash of the uri content.
    #[prost(string, tag = "10")]
    pub uri_hash: String,
    /// Arbitrary class data.
    #[prost(string, tag = "11")]
    pub data: String,
}

/// `Query/NFT` request.
#[derive(Clone, PartialEq, prost::Message)]
pub struct QueryNftRequest {
    /// Class id.
    #[prost(string, tag = "1")]
    pub denom_id: String,
    /// Token id.
    #[prost(string, tag = "2")]
    pub token_id: String,
}

/// `Query/NFT` response.
#[derive(Clone, PartialEq, prost::Message)]
pub struct QueryNftResponse {
    /// The asset, absent if unknown.
    #[prost(message, optional, tag = "1")]
    pub nft: Option<BaseNft>,
}

/// An asset as stored by the NFT module.
#[derive(Clone, PartialEq, prost::Message)]
pub struct BaseNft {
    /// Token id.
    #[prost(string, tag = "1")]
    pub id: String,
    /// Display name.
    #[prost(string, tag = "2")]
    pub name: String,
    /// Metadata uri.
    #[prost(string, tag = "3")]
    pub uri: String,
    /// Arbitrary token data.
    #[prost(string, tag = "4")]
    pub data: String,
    /// Current owner.
    #[prost(string, tag = "5")]
    pub owner: String,
    /// Hash of the uri content.
    #[prost(string, tag = "6")]
    pub uri_hash: String,
}

impl From<Denom> for AssetClass {
    fn from(denom: Denom) -> Self {
        Self {
            id: denom.id,
            name: denom.name,
            schema: denom.schema,
            creator: denom.creator,
            uri: denom.uri,
            uri_hash: denom.uri_hash,
            data: denom.data,
        }
    }
}

impl BaseNft {
    /// Asset of class `class_id`.
    pub fn into_asset(self, class_id: &str) -> Asset {
        Asset {
            class_id: class_id.to_string(),
            id: self.id,
            name: self.name,
            uri: self.uri,
            uri_hash: self.uri_hash,
            data: self.data,
            owner: self.owner,
        }
    }
}

/// JSON-RPC envelope of an `abci_query` answer.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct AbciEnvelope {
    result: Option<AbciResult>,
    error: Option<AbciRpcError>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct AbciResult {
    response: AbciResponse,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct AbciRpcError {
    code: i64,
    message: String,
    data: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct AbciResponse {
    code: u32,
    log: String,
    codespace: String,
    value: Option<String>,
}

impl AbciEnvelope {
    /// Raw response bytes, or the failure the node reported.
    pub(crate) fn into_value(self) -> Result<Vec<u8>, QueryFailure> {
        if let Some(error) = self.error {
            return Err(QueryFailure::new(
                QueryCode::Other(error.code),
                format!("rpc error: {} {}", error.message, error.data),
            ));
        }
        let response = self
            .result
            .ok_or_else(|| QueryFailure::new(QueryCode::Other(13), "missing result"))?
            .response;
        if response.code != 0 {
            let log = response.log.to_lowercase();
            let code = if ["not found", "not exist", "unknown"]
                .iter()
                .any(|m| log.contains(m))
            {
                QueryCode::NotFound
            } else {
                QueryCode::Other(i64::from(response.code))
            };
            return Err(QueryFailure::new(
                code,
                format!("{} {}: {}", response.codespace, response.code, response.log),
            ));
        }
        match response.value {
            Some(value) => STANDARD
                .decode(value.trim())
                .map_err(|e| QueryFailure::new(QueryCode::Other(13), format!("value: {e}"))),
            None => Ok(Vec::new()),
        }
    }
}
