//! # Outbound Ports
//!
//! The capability set every chain adapter offers to verifiers.

use crate::domain::{
    decode_tx, Asset, AssetClass, ClassTrace, GatewayError, TxKind, TxOutcome, TxResponse,
};
use async_trait::async_trait;
use gv_01_channel_flow::ChainId;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

/// Read-only query access to one chain - outbound port.
///
/// Implementations retry internally; an error returned here is final.
#[async_trait]
pub trait ChainQuery: Send + Sync {
    /// Abbreviation of the chain served.
    fn chain(&self) -> &ChainId;

    /// Network id (`gon-irishub-1`).
    fn network_id(&self) -> &str;

    /// Fetch a transaction by hex hash and decode it as `kind`.
    async fn get_transaction(&self, hash: &str, kind: TxKind) -> Result<TxOutcome, GatewayError>;

    /// Fetch class metadata.
    async fn get_asset_class(&self, class_id: &str) -> Result<AssetClass, GatewayError>;

    /// True if the class can be fetched.
    async fn has_asset_class(&self, class_id: &str) -> bool {
        self.get_asset_class(class_id).await.is_ok()
    }

    /// Fetch one asset.
    async fn get_asset(&self, class_id: &str, token_id: &str) -> Result<Asset, GatewayError>;

    /// True if the asset can be fetched.
    async fn has_asset(&self, class_id: &str, token_id: &str) -> bool {
        self.get_asset(class_id, token_id).await.is_ok()
    }

    /// Resolve an `ibc/<HEX>` class id to its trace.
    async fn get_class_trace(&self, ibc_class_id: &str) -> Result<ClassTrace, GatewayError>;

    /// Release the connection. Later calls fail with [`GatewayError::Closed`].
    fn close(&self);
}

// =============================================================================
// Mock Implementation for Testing
// =============================================================================

/// In-memory chain for tests.
///
/// Transactions are stored as raw responses and decoded on lookup the same
/// way a real adapter decodes them.
pub struct MockChainQuery {
    chain: ChainId,
    network_id: String,
    txs: RwLock<HashMap<String, TxResponse>>,
    classes: RwLock<HashMap<String, AssetClass>>,
    assets: RwLock<HashMap<(String, String), Asset>>,
    traces: RwLock<HashMap<String, ClassTrace>>,
    /// Fail every call as if the chain were unreachable.
    pub should_fail: AtomicBool,
    closed: AtomicBool,
    calls: AtomicU32,
}

impl MockChainQuery {
    /// Empty chain.
    pub fn new(chain: impl Into<ChainId>, network_id: impl Into<String>) -> Self {
        Self {
            chain: chain.into(),
            network_id: network_id.into(),
            txs: RwLock::new(HashMap::new()),
            classes: RwLock::new(HashMap::new()),
            assets: RwLock::new(HashMap::new()),
            traces: RwLock::new(HashMap::new()),
            should_fail: AtomicBool::new(false),
            closed: AtomicBool::new(false),
            calls: AtomicU32::new(0),
        }
    }

    /// Add a transaction.
    pub fn with_tx(self, hash: &str, response: TxResponse) -> Self {
        self.txs.write().insert(normalize_hash(hash), response);
        self
    }

    /// Add a class.
    pub fn with_class(self, class: AssetClass) -> Self {
        self.classes.write().insert(class.id.clone(), class);
        self
    }

    /// Add an asset.
    pub fn with_asset(self, asset: Asset) -> Self {
        self.assets
            .write()
            .insert((asset.class_id.clone(), asset.id.clone()), asset);
        self
    }

    /// Add a class trace for `ibc/<HEX>`.
    pub fn with_class_trace(self, trace: ClassTrace) -> Self {
        self.traces.write().insert(trace.ibc_class_id(), trace);
        self
    }

    /// Fail every call.
    pub fn failing(self) -> Self {
        self.should_fail.store(true, Ordering::SeqCst);
        self
    }

    /// Calls served so far.
    pub fn call_count(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    /// True once closed.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn enter(&self) -> Result<(), GatewayError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.is_closed() {
            return Err(GatewayError::Closed(self.chain.clone()));
        }
        if self.should_fail.load(Ordering::SeqCst) {
            return Err(self.unreachable("mock failure"));
        }
        Ok(())
    }

    fn unreachable(&self, reason: &str) -> GatewayError {
        GatewayError::Unachievable {
            chain: self.chain.clone(),
            attempts: 3,
            reason: reason.to_string(),
        }
    }
}

fn normalize_hash(hash: &str) -> String {
    hash.trim().trim_start_matches("0x").to_uppercase()
}

#[async_trait]
impl ChainQuery for MockChainQuery {
    fn chain(&self) -> &ChainId {
        &self.chain
    }

    fn network_id(&self) -> &str {
        &self.network_id
    }

    async fn get_transaction(&self, hash: &str, kind: TxKind) -> Result<TxOutcome, GatewayError> {
        self.enter()?;
        let response = self
            .txs
            .read()
            .get(&normalize_hash(hash))
            .cloned()
            .ok_or_else(|| self.unreachable("tx not found"))?;
        decode_tx(response, kind)
    }

    async fn get_asset_class(&self, class_id: &str) -> Result<AssetClass, GatewayError> {
        self.enter()?;
        self.classes
            .read()
            .get(class_id)
            .cloned()
            .ok_or_else(|| GatewayError::NotFound(format!("class {class_id}")))
    }

    async fn get_asset(&self, class_id: &str, token_id: &str) -> Result<Asset, GatewayError> {
        self.enter()?;
        self.assets
            .read()
            .get(&(class_id.to_string(), token_id.to_string()))
            .cloned()
            .ok_or_else(|| GatewayError::NotFound(format!("asset {class_id}/{token_id}")))
    }

    async fn get_class_trace(&self, ibc_class_id: &str) -> Result<ClassTrace, GatewayError> {
        self.enter()?;
        self.traces
            .read()
            .get(ibc_class_id)
            .cloned()
            .ok_or_else(|| GatewayError::NotFound(format!("class trace {ibc_class_id}")))
    }

    fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mock() -> MockChainQuery {
        MockChainQuery::new('i', "gon-irishub-1")
            .with_tx(
                "abcd",
                TxResponse::new(5, 0).with_event("message", &[("sender", "iaa1alice")]),
            )
            .with_class(AssetClass {
                id: "gonClass".to_string(),
                creator: "iaa1alice".to_string(),
                ..Default::default()
            })
            .with_asset(Asset {
                class_id: "gonClass".to_string(),
                id: "nft1".to_string(),
                owner: "iaa1alice".to_string(),
                ..Default::default()
            })
    }

    #[tokio::test]
    async fn test_mock_get_transaction() {
        let chain = mock();
        let tx = chain
            .get_transaction("0xABCD", TxKind::Basic)
            .await
            .unwrap()
            .into_basic()
            .unwrap();
        assert_eq!(tx.sender, "iaa1alice");
        assert!(chain.get_transaction("ffff", TxKind::Basic).await.is_err());
    }

    #[tokio::test]
    async fn test_mock_existence() {
        let chain = mock();
        assert!(chain.has_asset_class("gonClass").await);
        assert!(!chain.has_asset_class("other").await);
        assert!(chain.has_asset("gonClass", "nft1").await);
        assert!(!chain.has_asset("gonClass", "nft2").await);
    }

    #[tokio::test]
    async fn test_mock_class_trace() {
        let trace = ClassTrace::new("nft-transfer/channel-3", "gonClass");
        let id = trace.ibc_class_id();
        let chain = mock().with_class_trace(trace.clone());
        assert_eq!(chain.get_class_trace(&id).await.unwrap(), trace);
    }

    #[tokio::test]
    async fn test_mock_failure() {
        let chain = mock().failing();
        assert!(matches!(
            chain.get_asset_class("gonClass").await,
            Err(GatewayError::Unachievable { .. })
        ));
    }

    #[tokio::test]
    async fn test_mock_closed() {
        let chain = mock();
        chain.close();
        assert!(matches!(
            chain.get_asset("gonClass", "nft1").await,
            Err(GatewayError::Closed(_))
        ));
        assert_eq!(chain.call_count(), 1);
    }
}
