//! # Flow Catalog
//!
//! Named flows (`a01`, `b04`, ...) configured for an event.

use crate::domain::{Flow, FlowError};
use crate::registry::ChannelRegistry;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Flow id to expression table, sharing one channel registry.
#[derive(Clone, Debug)]
pub struct FlowCatalog {
    flows: BTreeMap<String, String>,
    registry: Arc<ChannelRegistry>,
}

impl FlowCatalog {
    /// Build a catalog. Every expression is parsed once up front so a
    /// malformed one is reported at load time rather than mid-run.
    pub fn new<I, K, V>(flows: I, registry: Arc<ChannelRegistry>) -> Result<Self, FlowError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let flows: BTreeMap<String, String> = flows
            .into_iter()
            .map(|(id, expr)| (id.into(), expr.into()))
            .collect();
        for expr in flows.values() {
            Flow::parse(expr, registry.clone())?;
        }
        Ok(Self { flows, registry })
    }

    /// A fresh flow (cursor at hop 0) for `id`.
    pub fn flow(&self, id: &str) -> Result<Flow, FlowError> {
        let expr = self
            .flows
            .get(id)
            .ok_or_else(|| FlowError::UnknownFlow(id.to_string()))?;
        Flow::parse(expr, self.registry.clone())
    }

    /// Expression registered for `id`.
    pub fn expression(&self, id: &str) -> Option<&str> {
        self.flows.get(id).map(String::as_str)
    }

    /// True if `id` is registered.
    pub fn contains(&self, id: &str) -> bool {
        self.flows.contains_key(id)
    }

    /// Registered flow ids, sorted.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.flows.keys().map(String::as_str)
    }

    /// Shared channel registry.
    pub fn registry(&self) -> &Arc<ChannelRegistry> {
        &self.registry
    }
}
