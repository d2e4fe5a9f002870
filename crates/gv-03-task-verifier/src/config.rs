//! # Event Configuration
//!
//! Everything static about one event: chains, channel pairs, flows and
//! tasks. Loaded from TOML once per run.
//!
//! # Config File Format
//!
//! ```toml
//! home_chain = "i"
//!
//! [retry]
//! max_attempts = 3
//! base_delay_ms = 1000
//! jitter_ms = 1000
//!
//! [[chains]]
//! abbr = "i"
//! chain_id = "gon-irishub-1"
//! rpc = "http://34.80.93.133:26657/"
//! query = "http://34.80.93.133:1317/"
//!
//! [channels]
//! is-1 = "nft-transfer/channel-22 <> wasm.stars1ics721/channel-207"
//!
//! [flows]
//! a01 = "i --(1)--> s --(1)--> j --(1)--> i"
//! a01b = "i --(1)--> s --(2)--> j --(1)--> i"
//!
//! [[tasks]]
//! id = "A7"
//! points = 20
//! kind = "flow"
//! flow = "a01"
//! alternates = ["a01b"]
//! never_go_back = true
//! ```

use gv_01_channel_flow::{ChainId, ChannelRegistry, FlowCatalog, FlowError};
use gv_02_chain_gateway::{ChainEndpoint, RetryPolicy};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

/// Errors that can occur during config loading.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// File I/O error.
    #[error("Failed to read {path}: {error}")]
    Io {
        /// Path of the file that failed to load.
        path: String,
        /// Error message from the I/O operation.
        error: String,
    },

    /// TOML syntax or shape error.
    #[error("Failed to parse config: {0}")]
    Parse(String),

    /// Well-formed but inconsistent configuration.
    #[error("Invalid config: {0}")]
    Invalid(String),

    /// Channel or flow table error.
    #[error("Flow config: {0}")]
    Flow(#[from] FlowError),
}

/// What a task checks, with its kind-specific parameters.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TaskKind {
    /// Issue a class on the home chain.
    IssueClass,
    /// Mint assets on the home chain.
    MintAsset,
    /// One hop out of the home chain.
    TransferOut {
        /// Accepted destination chains.
        dest_chains: Vec<ChainId>,
    },
    /// One hop back to the home chain.
    TransferBack {
        /// Accepted source chains.
        src_chains: Vec<ChainId>,
    },
    /// A named multi-hop flow.
    Flow {
        /// Flow id in `[flows]`.
        flow: String,
        /// Other flow ids that also complete the task.
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        alternates: Vec<String>,
        /// Check the final state only.
        #[serde(default)]
        never_go_back: bool,
    },
    /// A timed race along any configured flow.
    Race {
        /// Original class id raced.
        class_id: String,
        /// Address that must hold the asset at the end.
        final_owner: String,
        /// First block a race may start in.
        start_height: u64,
        /// Last block that still ranks.
        end_height: u64,
    },
}

/// One task of the event.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskConfig {
    /// Task id; also the evidence sheet name (`A1`).
    pub id: String,
    /// Points awarded on success.
    #[serde(default)]
    pub points: u32,
    /// Kind and parameters.
    #[serde(flatten)]
    pub kind: TaskKind,
}

/// Static configuration of one event.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EventConfig {
    /// Abbreviation of the chain classes originate on.
    pub home_chain: ChainId,
    /// Chain endpoints, in the order addresses appear in the info sheet.
    #[serde(default)]
    pub chains: Vec<ChainEndpoint>,
    /// Channel pairs keyed `<a><b>-<index>`.
    #[serde(default)]
    pub channels: BTreeMap<String, String>,
    /// Flow expressions keyed by flow id.
    #[serde(default)]
    pub flows: BTreeMap<String, String>,
    /// Tasks of the event.
    #[serde(default)]
    pub tasks: Vec<TaskConfig>,
    /// Retry policy of every chain query.
    #[serde(default)]
    pub retry: RetryPolicy,
}

impl EventConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read, parsed or validated.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| ConfigError::Io {
            path: path.as_ref().display().to_string(),
            error: e.to_string(),
        })?;
        let config = Self::parse(&content)?;
        info!(
            "[gv-03] loaded {} chain(s), {} flow(s), {} task(s) from {}",
            config.chains.len(),
            config.flows.len(),
            config.tasks.len(),
            path.as_ref().display()
        );
        Ok(config)
    }

    /// Parse and validate configuration from a TOML string.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Cross-check chains, flows and tasks.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut abbrs = HashSet::new();
        for chain in &self.chains {
            if !abbrs.insert(&chain.abbr) {
                return Err(ConfigError::Invalid(format!("chain {} listed twice", chain.abbr)));
            }
        }
        if !abbrs.contains(&self.home_chain) {
            return Err(ConfigError::Invalid(format!(
                "home chain {} has no endpoint",
                self.home_chain
            )));
        }

        let catalog = self.flow_catalog()?;

        let mut ids = HashSet::new();
        for task in &self.tasks {
            if !ids.insert(task.id.as_str()) {
                return Err(ConfigError::Invalid(format!("task {} listed twice", task.id)));
            }
            let known = |chains: &[ChainId]| {
                chains.iter().all(|c| abbrs.contains(c) && c != &self.home_chain)
            };
            let invalid = |what: &str| ConfigError::Invalid(format!("task {}: {what}", task.id));
            match &task.kind {
                TaskKind::IssueClass | TaskKind::MintAsset => {}
                TaskKind::TransferOut { dest_chains: chains }
                | TaskKind::TransferBack { src_chains: chains } => {
                    if chains.is_empty() || !known(chains) {
                        return Err(invalid("transfer chains must be configured non-home chains"));
                    }
                }
                TaskKind::Flow {
                    flow, alternates, ..
                } => {
                    if let Some(unknown) = std::iter::once(flow)
                        .chain(alternates)
                        .find(|id| !catalog.contains(id))
                    {
                        return Err(FlowError::UnknownFlow(unknown.clone()).into());
                    }
                }
                TaskKind::Race {
                    start_height,
                    end_height,
                    ..
                } => {
                    if start_height > end_height {
                        return Err(invalid("race window ends before it starts"));
                    }
                }
            }
        }
        Ok(())
    }

    /// Channel registry built from `[channels]`.
    pub fn channel_registry(&self) -> Result<ChannelRegistry, ConfigError> {
        Ok(ChannelRegistry::from_entries(&self.channels)?)
    }

    /// Flow catalog built from `[flows]` over the channel registry.
    pub fn flow_catalog(&self) -> Result<FlowCatalog, ConfigError> {
        let registry = Arc::new(self.channel_registry()?);
        Ok(FlowCatalog::new(self.flows.clone(), registry)?)
    }

    /// Abbreviations in configuration order.
    pub fn chain_order(&self) -> Vec<ChainId> {
        self.chains.iter().map(|c| c.abbr.clone()).collect()
    }
}
