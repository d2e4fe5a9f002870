//! Cosmos Chain Adapter
//!
//! Implements the `ChainQuery` port over HTTP:
//! - transactions from the Tendermint RPC `/tx` endpoint
//! - classes, assets and class traces from gRPC-gateway routes, either the
//!   native NFT module or CW-721 smart queries on wasm chains
//! - native classes and assets whose id holds a `/` (`ibc/<HASH>`) from the
//!   NFT query service over Tendermint RPC `abci_query`

use super::abci::{self, AbciEnvelope};
use crate::domain::{
    decode_tx, Asset, AssetClass, ChainEndpoint, ClassTrace, GatewayError, ModuleKind, QueryCode,
    TxKind, TxOutcome, TxResponse,
};
use crate::ports::outbound::ChainQuery;
use crate::retry::{retry_http, retry_query, HttpFailure, QueryFailure, RetryPolicy};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use gv_01_channel_flow::{ChainId, IBC_CLASS_PREFIX};
use reqwest::{Client, StatusCode, Url};
use serde::Deserialize;
use prost::Message;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::{debug, info};

const REQUEST_TIMEOUT_SECS: u64 = 15;
const CONNECT_TIMEOUT_SECS: u64 = 5;
const WASM_PORT_PREFIX: &str = "wasm.";

/// JSON-RPC envelope of a `/tx` answer.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RpcEnvelope {
    result: Option<TxResponse>,
    error: Option<RpcError>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RpcError {
    code: i64,
    message: String,
    data: String,
}

/// Error body of a gRPC-gateway route.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct StatusBody {
    code: Option<i64>,
    message: String,
}

/// HTTP adapter for one Cosmos SDK chain.
pub struct CosmosChain {
    endpoint: ChainEndpoint,
    policy: RetryPolicy,
    client: Client,
    rpc: Url,
    query: Url,
    closed: AtomicBool,
}

impl CosmosChain {
    /// Create an adapter. No connection is made until the first call.
    pub fn new(endpoint: ChainEndpoint, policy: RetryPolicy) -> Result<Self, GatewayError> {
        let invalid = |reason: String| GatewayError::InvalidEndpoint {
            chain: endpoint.abbr.clone(),
            reason,
        };
        let rpc = parse_base(&endpoint.rpc).map_err(|e| invalid(format!("rpc: {e}")))?;
        let query = parse_base(&endpoint.query).map_err(|e| invalid(format!("query: {e}")))?;
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .build()
            .map_err(|e| invalid(e.to_string()))?;

        info!(
            "[gv-02] chain {} ({}) via {} / {}",
            endpoint.abbr, endpoint.chain_id, rpc, query
        );
        Ok(Self {
            endpoint,
            policy,
            client,
            rpc,
            query,
            closed: AtomicBool::new(false),
        })
    }

    /// Endpoint configuration.
    pub fn endpoint(&self) -> &ChainEndpoint {
        &self.endpoint
    }

    /// `{rpc}/tx?hash=0x<HASH>&prove=true`.
    pub fn tx_url(&self, hash: &str) -> Result<Url, GatewayError> {
        let hash = hash.trim().trim_start_matches("0x");
        let mut url = self.join(&self.rpc, &["tx"])?;
        url.query_pairs_mut()
            .append_pair("hash", &format!("0x{hash}"))
            .append_pair("prove", "true");
        Ok(url)
    }

    /// `{rpc}/abci_query?path="<method>"&data=0x<HEX>`.
    pub fn abci_url(&self, method: &str, data: &[u8]) -> Result<Url, GatewayError> {
        let mut url = self.join(&self.rpc, &["abci_query"])?;
        url.query_pairs_mut()
            .append_pair("path", &format!("\"{method}\""))
            .append_pair("data", &format!("0x{}", hex::encode(data)));
        Ok(url)
    }

    fn ensure_open(&self) -> Result<(), GatewayError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(GatewayError::Closed(self.endpoint.abbr.clone()));
        }
        Ok(())
    }

    fn join(&self, base: &Url, segments: &[&str]) -> Result<Url, GatewayError> {
        let mut url = base.clone();
        url.path_segments_mut()
            .map_err(|_| GatewayError::InvalidEndpoint {
                chain: self.endpoint.abbr.clone(),
                reason: format!("{base} cannot be a base URL"),
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn nft_url(&self, tail: &[&str]) -> Result<Url, GatewayError> {
        let mut segments: Vec<&str> = self
            .endpoint
            .nft_route
            .split('/')
            .filter(|s| !s.is_empty())
            .collect();
        segments.extend_from_slice(tail);
        self.join(&self.query, &segments)
    }

    async fn fetch_tx(&self, url: Url) -> Result<TxResponse, HttpFailure> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| HttpFailure::Transport(e.to_string()))?;
        if response.status() != StatusCode::OK {
            return Err(HttpFailure::Status(response.status().as_u16()));
        }
        let envelope: RpcEnvelope = response
            .json()
            .await
            .map_err(|e| HttpFailure::Body(e.to_string()))?;
        if let Some(error) = envelope.error {
            return Err(HttpFailure::Body(format!(
                "rpc error {}: {} {}",
                error.code, error.message, error.data
            )));
        }
        envelope
            .result
            .ok_or_else(|| HttpFailure::Body("missing result".to_string()))
    }

    async fn fetch_query(&self, url: Url) -> Result<Value, QueryFailure> {
        let response = self.client.get(url).send().await.map_err(|e| {
            let code = if e.is_timeout() {
                QueryCode::DeadlineExceeded
            } else {
                QueryCode::Unavailable
            };
            QueryFailure::new(code, e.to_string())
        })?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| QueryFailure::new(QueryCode::Unavailable, e.to_string()))?;
        if status == 200 {
            return serde_json::from_str(&body)
                .map_err(|e| QueryFailure::new(QueryCode::Other(13), e.to_string()));
        }
        Err(classify_failure(status, &body))
    }

    async fn query_json(&self, url: Url, what: &str) -> Result<Value, GatewayError> {
        self.ensure_open()?;
        debug!("[gv-02] chain {} query {}", self.endpoint.abbr, url);
        retry_query(&self.policy, &self.endpoint.abbr, what, move || {
            self.fetch_query(url.clone())
        })
        .await
    }

    async fn fetch_abci(&self, url: Url) -> Result<Vec<u8>, QueryFailure> {
        let response = self.client.get(url).send().await.map_err(|e| {
            let code = if e.is_timeout() {
                QueryCode::DeadlineExceeded
            } else {
                QueryCode::Unavailable
            };
            QueryFailure::new(code, e.to_string())
        })?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| QueryFailure::new(QueryCode::Unavailable, e.to_string()))?;
        if status != 200 {
            return Err(QueryFailure::new(
                QueryCode::from_http_status(status),
                body.chars().take(200).collect::<String>(),
            ));
        }
        let envelope: AbciEnvelope = serde_json::from_str(&body)
            .map_err(|e| QueryFailure::new(QueryCode::Other(13), e.to_string()))?;
        envelope.into_value()
    }

    /// Call `method` of the NFT query service through `abci_query`.
    async fn abci_query<Req, Resp>(&self, method: &str, request: &Req, what: &str) -> Result<Resp, GatewayError>
    where
        Req: Message,
        Resp: Message + Default,
    {
        self.ensure_open()?;
        let path = abci::method_path(&self.endpoint.nft_route, method);
        let url = self.abci_url(&path, &request.encode_to_vec())?;
        debug!("[gv-02] chain {} abci query {} for {}", self.endpoint.abbr, path, what);
        let bytes = retry_query(&self.policy, &self.endpoint.abbr, what, move || {
            self.fetch_abci(url.clone())
        })
        .await?;
        Resp::decode(bytes.as_slice()).map_err(|e| unexpected("abci_query", e.to_string()))
    }

    async fn smart_query(&self, class_id: &str, msg: Value, what: &str) -> Result<Value, GatewayError> {
        let contract = class_id.strip_prefix(WASM_PORT_PREFIX).unwrap_or(class_id);
        let encoded = STANDARD.encode(msg.to_string());
        let url = self.join(
            &self.query,
            &["cosmwasm", "wasm", "v1", "contract", contract, "smart", &encoded],
        )?;
        let value = self.query_json(url, what).await?;
        value
            .get("data")
            .filter(|d| !d.is_null())
            .cloned()
            .ok_or_else(|| GatewayError::NotFound(what.to_string()))
    }
}

fn parse_base(raw: &str) -> Result<Url, String> {
    let url = Url::parse(raw.trim()).map_err(|e| e.to_string())?;
    if url.cannot_be_a_base() {
        return Err(format!("{raw} cannot be a base URL"));
    }
    Ok(url)
}

/// Map a failed gRPC-gateway answer to a status class.
///
/// The body's gRPC `code` wins over the HTTP status. Contract and keeper
/// errors often arrive as `Unknown`; their message decides `NotFound`.
fn classify_failure(status: u16, body: &str) -> QueryFailure {
    let parsed: StatusBody = serde_json::from_str(body).unwrap_or_default();
    let code = parsed
        .code
        .map(QueryCode::from_grpc)
        .unwrap_or_else(|| QueryCode::from_http_status(status));
    let message = if parsed.message.is_empty() {
        body.chars().take(200).collect()
    } else {
        parsed.message
    };
    let code = match code {
        QueryCode::Other(_) if message.to_lowercase().contains("not found") => QueryCode::NotFound,
        other => other,
    };
    QueryFailure::new(code, message)
}

/// Ids the gRPC-gateway cannot carry in a single path segment.
fn needs_abci(class_id: &str) -> bool {
    class_id.contains('/')
}

fn supports(module: ModuleKind, kind: TxKind) -> bool {
    match module {
        ModuleKind::Nft => true,
        ModuleKind::Wasm => matches!(kind, TxKind::Basic | TxKind::IbcTransfer | TxKind::Raw),
    }
}

fn unexpected(kind: &str, reason: impl Into<String>) -> GatewayError {
    GatewayError::UnexpectedResult {
        kind: kind.to_string(),
        reason: reason.into(),
    }
}

#[async_trait]
impl ChainQuery for CosmosChain {
    fn chain(&self) -> &ChainId {
        &self.endpoint.abbr
    }

    fn network_id(&self) -> &str {
        &self.endpoint.chain_id
    }

    async fn get_transaction(&self, hash: &str, kind: TxKind) -> Result<TxOutcome, GatewayError> {
        self.ensure_open()?;
        if !supports(self.endpoint.module, kind) {
            return Err(unexpected(
                &kind.to_string(),
                format!("not available on {}", self.endpoint.chain_id),
            ));
        }
        let url = self.tx_url(hash)?;
        debug!("[gv-02] chain {} fetch tx {}", self.endpoint.abbr, url);
        let response = retry_http(&self.policy, &self.endpoint.abbr, move || {
            self.fetch_tx(url.clone())
        })
        .await?;
        decode_tx(response, kind)
    }

    async fn get_asset_class(&self, class_id: &str) -> Result<AssetClass, GatewayError> {
        let what = format!("class {class_id}");
        match self.endpoint.module {
            ModuleKind::Nft if needs_abci(class_id) => {
                let request = abci::QueryDenomRequest {
                    denom_id: class_id.to_string(),
                };
                let response: abci::QueryDenomResponse =
                    self.abci_query("Denom", &request, &what).await?;
                response
                    .denom
                    .map(AssetClass::from)
                    .ok_or(GatewayError::NotFound(what))
            }
            ModuleKind::Nft => {
                let url = self.nft_url(&["denoms", class_id])?;
                let value = self.query_json(url, &what).await?;
                let body = ["denom", "class", "collection"]
                    .iter()
                    .find_map(|key| value.get(*key).filter(|v| !v.is_null()))
                    .ok_or_else(|| GatewayError::NotFound(what.clone()))?;
                serde_json::from_value(body.clone()).map_err(|e| unexpected("class", e.to_string()))
            }
            ModuleKind::Wasm => {
                let data = self
                    .smart_query(class_id, json!({ "num_tokens": {} }), &what)
                    .await?;
                Ok(AssetClass {
                    id: class_id.to_string(),
                    data: data.to_string(),
                    ..Default::default()
                })
            }
        }
    }

    async fn get_asset(&self, class_id: &str, token_id: &str) -> Result<Asset, GatewayError> {
        let what = format!("asset {class_id}/{token_id}");
        match self.endpoint.module {
            ModuleKind::Nft if needs_abci(class_id) => {
                let request = abci::QueryNftRequest {
                    denom_id: class_id.to_string(),
                    token_id: token_id.to_string(),
                };
                let response: abci::QueryNftResponse =
                    self.abci_query("NFT", &request, &what).await?;
                response
                    .nft
                    .map(|nft| nft.into_asset(class_id))
                    .ok_or(GatewayError::NotFound(what))
            }
            ModuleKind::Nft => {
                let url = self.nft_url(&["nfts", class_id, token_id])?;
                let value = self.query_json(url, &what).await?;
                let body = ["nft", "onft"]
                    .iter()
                    .find_map(|key| value.get(*key).filter(|v| !v.is_null()))
                    .ok_or_else(|| GatewayError::NotFound(what.clone()))?;
                let mut asset: Asset = serde_json::from_value(body.clone())
                    .map_err(|e| unexpected("asset", e.to_string()))?;
                asset.class_id = class_id.to_string();
                Ok(asset)
            }
            ModuleKind::Wasm => {
                let info = self
                    .smart_query(class_id, json!({ "nft_info": { "token_id": token_id } }), &what)
                    .await?;
                let owner = self
                    .smart_query(class_id, json!({ "owner_of": { "token_id": token_id } }), &what)
                    .await?;
                let text = |v: Option<&Value>| match v {
                    Some(Value::String(s)) => s.clone(),
                    Some(Value::Null) | None => String::new(),
                    Some(other) => other.to_string(),
                };
                Ok(Asset {
                    class_id: class_id.to_string(),
                    id: token_id.to_string(),
                    uri: text(info.get("token_uri")),
                    data: text(info.get("extension")),
                    owner: text(owner.get("owner")),
                    ..Default::default()
                })
            }
        }
    }

    async fn get_class_trace(&self, ibc_class_id: &str) -> Result<ClassTrace, GatewayError> {
        if self.endpoint.module == ModuleKind::Wasm {
            return Err(unexpected(
                "class_trace",
                format!("not available on {}", self.endpoint.chain_id),
            ));
        }
        let hash = ibc_class_id
            .strip_prefix(IBC_CLASS_PREFIX)
            .unwrap_or(ibc_class_id);
        let what = format!("class trace {ibc_class_id}");
        let url = self.join(
            &self.query,
            &["ibc", "apps", "nft_transfer", "v1", "class_traces", hash],
        )?;
        let value = self.query_json(url, &what).await?;
        let body = value
            .get("class_trace")
            .filter(|v| !v.is_null())
            .ok_or_else(|| GatewayError::NotFound(what.clone()))?;
        serde_json::from_value(body.clone()).map_err(|e| unexpected("class_trace", e.to_string()))
    }

    fn close(&self) {
        if !self.closed.swap(true, Ordering::SeqCst) {
            info!("[gv-02] chain {} connection closed", self.endpoint.abbr);
        }
    }
}
