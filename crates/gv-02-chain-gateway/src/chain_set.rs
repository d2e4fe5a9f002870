//! # Chain Set
//!
//! Every chain adapter of one verification run, plus which one is home.
//!
//! Built once per run and shared read-only. Closing is idempotent and also
//! happens when the set is dropped.

use crate::adapters::CosmosChain;
use crate::domain::{ChainEndpoint, GatewayError};
use crate::ports::outbound::ChainQuery;
use crate::retry::RetryPolicy;
use gv_01_channel_flow::ChainId;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::info;

/// Chain adapters keyed by abbreviation.
pub struct ChainSet {
    home: Arc<dyn ChainQuery>,
    chains: HashMap<ChainId, Arc<dyn ChainQuery>>,
    order: Vec<ChainId>,
    closed: AtomicBool,
}

impl ChainSet {
    /// Assemble a set from ready adapters, in configuration order.
    pub fn new<I>(home: &ChainId, adapters: I) -> Result<Self, GatewayError>
    where
        I: IntoIterator<Item = Arc<dyn ChainQuery>>,
    {
        let mut chains = HashMap::new();
        let mut order = Vec::new();
        for adapter in adapters {
            let abbr = adapter.chain().clone();
            if chains.insert(abbr.clone(), adapter).is_none() {
                order.push(abbr);
            }
        }
        let home = chains
            .get(home)
            .cloned()
            .ok_or_else(|| GatewayError::UnknownChain(home.to_string()))?;
        Ok(Self {
            home,
            chains,
            order,
            closed: AtomicBool::new(false),
        })
    }

    /// Build a [`CosmosChain`] for every endpoint.
    pub fn connect(
        home: &ChainId,
        endpoints: &[ChainEndpoint],
        policy: &RetryPolicy,
    ) -> Result<Self, GatewayError> {
        let adapters = endpoints
            .iter()
            .map(|e| {
                CosmosChain::new(e.clone(), policy.clone()).map(|c| Arc::new(c) as Arc<dyn ChainQuery>)
            })
            .collect::<Result<Vec<_>, _>>()?;
        info!("[gv-02] {} chain(s) configured, home {}", adapters.len(), home);
        Self::new(home, adapters)
    }

    /// Adapter for `chain`.
    pub fn get(&self, chain: &ChainId) -> Result<Arc<dyn ChainQuery>, GatewayError> {
        self.chains
            .get(chain)
            .cloned()
            .ok_or_else(|| GatewayError::UnknownChain(chain.to_string()))
    }

    /// Home chain adapter.
    pub fn home(&self) -> Arc<dyn ChainQuery> {
        self.home.clone()
    }

    /// Home chain abbreviation.
    pub fn home_id(&self) -> &ChainId {
        self.home.chain()
    }

    /// Abbreviations in configuration order.
    pub fn chain_ids(&self) -> &[ChainId] {
        &self.order
    }

    /// Abbreviation of the chain whose network id is `network_id`.
    pub fn resolve_network_id(&self, network_id: &str) -> Option<ChainId> {
        let network_id = network_id.trim();
        self.order
            .iter()
            .find(|abbr| {
                self.chains
                    .get(*abbr)
                    .is_some_and(|c| c.network_id() == network_id)
            })
            .cloned()
    }

    /// Release every connection. Safe to call more than once.
    pub fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        for chain in self.chains.values() {
            chain.close();
        }
        info!("[gv-02] chain set closed");
    }

    /// True once closed.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

impl Drop for ChainSet {
    fn drop(&mut self) {
        self.close();
    }
}
