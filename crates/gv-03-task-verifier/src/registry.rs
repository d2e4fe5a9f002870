//! # Verifier Registry
//!
//! Task id -> verifier and points, built once per run from the event
//! configuration and shared by every participant run.

use crate::config::{ConfigError, TaskConfig, TaskKind};
use crate::domain::task_no_cmp;
use crate::verifiers::{FlowVerifier, RaceVerifier, SimpleTask, SimpleVerifier, Verifier};
use gv_01_channel_flow::{ChainId, FlowCatalog};
use gv_02_chain_gateway::ChainSet;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

/// A verifier bound to a task id.
#[derive(Clone)]
pub struct RegisteredTask {
    /// Verifier for the task.
    pub verifier: Arc<Verifier>,
    /// Points awarded on success.
    pub points: u32,
}

/// All verifiers of an event.
pub struct VerifierRegistry {
    tasks: HashMap<String, RegisteredTask>,
    chains: Arc<ChainSet>,
}

impl VerifierRegistry {
    /// Build one verifier per configured task.
    ///
    /// # Errors
    ///
    /// A task listed twice, a flow id missing from `catalog`, or a transfer
    /// chain without an adapter in `chains`.
    pub fn from_config(
        tasks: &[TaskConfig],
        chains: Arc<ChainSet>,
        catalog: Arc<FlowCatalog>,
    ) -> Result<Self, ConfigError> {
        let mut registered = HashMap::new();
        for task in tasks {
            let verifier = match &task.kind {
                TaskKind::IssueClass => {
                    Verifier::Simple(SimpleVerifier::new(SimpleTask::IssueClass, chains.clone()))
                }
                TaskKind::MintAsset => {
                    Verifier::Simple(SimpleVerifier::new(SimpleTask::MintAsset, chains.clone()))
                }
                TaskKind::TransferOut { dest_chains } => {
                    Self::check_chains(&chains, &task.id, dest_chains)?;
                    Verifier::Simple(SimpleVerifier::new(
                        SimpleTask::TransferOut {
                            dest_chains: dest_chains.clone(),
                        },
                        chains.clone(),
                    ))
                }
                TaskKind::TransferBack { src_chains } => {
                    Self::check_chains(&chains, &task.id, src_chains)?;
                    Verifier::Simple(SimpleVerifier::new(
                        SimpleTask::TransferBack {
                            src_chains: src_chains.clone(),
                        },
                        chains.clone(),
                    ))
                }
                TaskKind::Flow {
                    flow,
                    alternates,
                    never_go_back,
                } => {
                    for id in std::iter::once(flow).chain(alternates) {
                        Self::check_route(&chains, &catalog, &task.id, id)?;
                    }
                    Verifier::Flow(
                        FlowVerifier::new(flow.clone(), *never_go_back, catalog.clone(), chains.clone())
                            .with_alternates(alternates.iter().cloned()),
                    )
                }
                TaskKind::Race {
                    class_id,
                    final_owner,
                    start_height,
                    end_height,
                } => Verifier::Race(RaceVerifier::new(
                    class_id.clone(),
                    final_owner.clone(),
                    *start_height,
                    *end_height,
                    catalog.clone(),
                    chains.clone(),
                )),
            };
            let entry = RegisteredTask {
                verifier: Arc::new(verifier),
                points: task.points,
            };
            if registered.insert(task.id.clone(), entry).is_some() {
                return Err(ConfigError::Invalid(format!("task {} listed twice", task.id)));
            }
        }
        info!("[gv-03] verifier registry built with {} task(s)", registered.len());
        Ok(Self {
            tasks: registered,
            chains,
        })
    }

    /// Every chain on the route needs an adapter. A hop over a pair the
    /// channel table lacks only fails once a participant claims the route.
    fn check_route(
        chains: &ChainSet,
        catalog: &FlowCatalog,
        task: &str,
        flow_id: &str,
    ) -> Result<(), ConfigError> {
        let parsed = catalog.flow(flow_id)?;
        let mut route: Vec<ChainId> = parsed.hops().iter().map(|h| h.src.clone()).collect();
        route.push(parsed.final_chain().clone());
        Self::check_chains(chains, task, &route)?;
        if let Err(e) = parsed.build_trace() {
            warn!("[gv-03] task {} route {} cannot be resolved yet: {}", task, flow_id, e);
        }
        Ok(())
    }

    fn check_chains(
        chains: &ChainSet,
        task: &str,
        wanted: &[ChainId],
    ) -> Result<(), ConfigError> {
        match wanted.iter().find(|c| chains.get(c).is_err()) {
            Some(missing) => Err(ConfigError::Invalid(format!(
                "task {task}: no endpoint for chain {missing}"
            ))),
            None => Ok(()),
        }
    }

    /// Verifier and points of `task_no`.
    pub fn get(&self, task_no: &str) -> Option<&RegisteredTask> {
        self.tasks.get(task_no)
    }

    /// True if `task_no` has a verifier.
    pub fn contains(&self, task_no: &str) -> bool {
        self.tasks.contains_key(task_no)
    }

    /// Registered task ids in natural order.
    pub fn task_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.tasks.keys().cloned().collect();
        ids.sort_by(|a, b| task_no_cmp(a, b));
        ids
    }

    /// Number of registered tasks.
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// True if no task is registered.
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Chains every verifier queries.
    pub fn chains(&self) -> &Arc<ChainSet> {
        &self.chains
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gv_01_channel_flow::{ChannelRegistry, FlowError};
    use gv_02_chain_gateway::{ChainQuery, MockChainQuery};

    fn chains() -> Arc<ChainSet> {
        let adapters = [
            MockChainQuery::new('i', "gon-irishub-1"),
            MockChainQuery::new('s', "elgafar-1"),
        ]
        .into_iter()
        .map(|c| Arc::new(c) as Arc<dyn ChainQuery>);
        Arc::new(ChainSet::new(&ChainId::from('i'), adapters).unwrap())
    }

    fn catalog() -> Arc<FlowCatalog> {
        let registry = ChannelRegistry::from_entries([
            ("is-1", "nft-transfer/channel-22 <> wasm.stars1ics721/channel-207"),
            ("iu-1", "nft-transfer/channel-19 <> nft-transfer/channel-1"),
        ])
        .unwrap();
        Arc::new(
            FlowCatalog::new(
                [
                    ("z01", "i --(1)--> s --(1)--> i"),
                    ("z01b", "i --(1)--> s --(2)--> i"),
                    ("z02", "i --(1)--> u --(1)--> i"),
                ],
                Arc::new(registry),
            )
            .unwrap(),
        )
    }

    fn task(id: &str, kind: TaskKind) -> TaskConfig {
        TaskConfig {
            id: id.to_string(),
            points: 10,
            kind,
        }
    }

    #[test]
    fn test_build_registry() {
        let tasks = vec![
            task("A1", TaskKind::IssueClass),
            task(
                "A10",
                TaskKind::Flow {
                    flow: "z01".to_string(),
                    alternates: Vec::new(),
                    never_go_back: false,
                },
            ),
            task("A2", TaskKind::MintAsset),
        ];
        let registry = VerifierRegistry::from_config(&tasks, chains(), catalog()).unwrap();
        assert_eq!(registry.len(), 3);
        assert_eq!(registry.task_ids(), vec!["A1", "A2", "A10"]);
        assert_eq!(registry.get("A10").unwrap().verifier.kind(), "flow");
        assert!(registry.get("B1").is_none());
    }

    #[test]
    fn test_unknown_flow() {
        let tasks = vec![task(
            "A7",
            TaskKind::Flow {
                flow: "z99".to_string(),
                alternates: Vec::new(),
                never_go_back: true,
            },
        )];
        assert!(matches!(
            VerifierRegistry::from_config(&tasks, chains(), catalog()),
            Err(ConfigError::Flow(FlowError::UnknownFlow(_)))
        ));
    }

    #[test]
    fn test_flow_over_unconfigured_chain() {
        let tasks = vec![task(
            "A8",
            TaskKind::Flow {
                flow: "z02".to_string(),
                alternates: Vec::new(),
                never_go_back: false,
            },
        )];
        assert!(matches!(
            VerifierRegistry::from_config(&tasks, chains(), catalog()),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn test_flow_alternates_registered() {
        let tasks = vec![task(
            "A7",
            TaskKind::Flow {
                flow: "z01".to_string(),
                alternates: vec!["z01b".to_string()],
                never_go_back: true,
            },
        )];
        let registry = VerifierRegistry::from_config(&tasks, chains(), catalog()).unwrap();
        let Verifier::Flow(flow) = registry.get("A7").unwrap().verifier.as_ref() else {
            panic!("A7 is not a flow task");
        };
        assert_eq!(flow.routes(), ["z01".to_string(), "z01b".to_string()]);
    }

    #[test]
    fn test_alternate_over_unconfigured_chain() {
        let tasks = vec![task(
            "A7",
            TaskKind::Flow {
                flow: "z01".to_string(),
                alternates: vec!["z02".to_string()],
                never_go_back: true,
            },
        )];
        assert!(matches!(
            VerifierRegistry::from_config(&tasks, chains(), catalog()),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn test_duplicate_task() {
        let tasks = vec![task("A1", TaskKind::IssueClass), task("A1", TaskKind::MintAsset)];
        assert!(VerifierRegistry::from_config(&tasks, chains(), catalog()).is_err());
    }
}
