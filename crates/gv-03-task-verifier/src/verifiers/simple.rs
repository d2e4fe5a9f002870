//! # Simple Verifiers
//!
//! Tasks proven by a single transaction and the state it left behind:
//! issuing a class, minting assets, and one-hop transfers to or from the
//! home chain.

use super::{ensure, fetch_tx};
use crate::domain::params::{cell, expect_rows};
use crate::domain::{MintClaim, Participant, ReasonKind, TaskParams};
use gv_01_channel_flow::ChainId;
use gv_02_chain_gateway::{ChainSet, TxKind};
use std::sync::Arc;

/// Most assets a mint task reads from its evidence.
pub const MAX_MINT_CLAIMS: usize = 2;

/// Which single-transaction task is verified.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SimpleTask {
    /// Issue a class on the home chain.
    IssueClass,
    /// Mint assets on the home chain.
    MintAsset,
    /// Transfer from the home chain to one of `dest_chains`.
    TransferOut {
        /// Accepted destinations.
        dest_chains: Vec<ChainId>,
    },
    /// Transfer from one of `src_chains` back to the home chain.
    TransferBack {
        /// Accepted sources.
        src_chains: Vec<ChainId>,
    },
}

/// Verifier for a [`SimpleTask`].
pub struct SimpleVerifier {
    task: SimpleTask,
    chains: Arc<ChainSet>,
}

impl SimpleVerifier {
    /// Create a verifier.
    pub fn new(task: SimpleTask, chains: Arc<ChainSet>) -> Self {
        Self { task, chains }
    }

    /// Task verified.
    pub fn task(&self) -> &SimpleTask {
        &self.task
    }

    pub(crate) fn build_params(&self, rows: &[Vec<String>]) -> Result<TaskParams, ReasonKind> {
        match &self.task {
            SimpleTask::IssueClass => {
                expect_rows(rows, 1)?;
                Ok(TaskParams::IssueClass {
                    tx_hash: cell(&rows[0], 0)?,
                    class_id: cell(&rows[0], 1)?,
                })
            }
            SimpleTask::MintAsset => {
                if rows.is_empty() || rows.len() > MAX_MINT_CLAIMS {
                    return Err(ReasonKind::ParamsFormatInvalid);
                }
                let claims = rows
                    .iter()
                    .map(|row| -> Result<MintClaim, ReasonKind> {
                        Ok(MintClaim {
                            tx_hash: cell(row, 0)?,
                            class_id: cell(row, 1)?,
                            token_id: cell(row, 2)?,
                        })
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(TaskParams::MintAsset { claims })
            }
            SimpleTask::TransferOut { dest_chains: allowed }
            | SimpleTask::TransferBack { src_chains: allowed } => {
                expect_rows(rows, 1)?;
                let row = &rows[0];
                let network_id = cell(row, 3)?;
                let chain = self
                    .chains
                    .resolve_network_id(&network_id)
                    .filter(|c| allowed.contains(c))
                    .ok_or(ReasonKind::ChainIdUnresolved)?;
                Ok(TaskParams::Transfer {
                    tx_hash: cell(row, 0)?,
                    class_id: cell(row, 1)?,
                    token_id: cell(row, 2)?,
                    chain,
                })
            }
        }
    }

    pub(crate) async fn check(
        &self,
        params: &TaskParams,
        participant: &Participant,
    ) -> Result<(), ReasonKind> {
        match (&self.task, params) {
            (SimpleTask::IssueClass, TaskParams::IssueClass { tx_hash, class_id }) => {
                self.check_issue(tx_hash, class_id, participant).await
            }
            (SimpleTask::MintAsset, TaskParams::MintAsset { claims }) => {
                for claim in claims {
                    self.check_mint(claim, participant).await?;
                }
                Ok(())
            }
            (
                SimpleTask::TransferOut { .. },
                TaskParams::Transfer {
                    tx_hash,
                    class_id,
                    token_id,
                    chain,
                },
            ) => {
                self.check_out(tx_hash, class_id, token_id, chain, participant)
                    .await
            }
            (
                SimpleTask::TransferBack { .. },
                TaskParams::Transfer {
                    tx_hash,
                    class_id,
                    token_id,
                    chain,
                },
            ) => {
                self.check_back(tx_hash, class_id, token_id, chain, participant)
                    .await
            }
            _ => Err(ReasonKind::ParamsFormatInvalid),
        }
    }

    async fn check_issue(
        &self,
        tx_hash: &str,
        class_id: &str,
        participant: &Participant,
    ) -> Result<(), ReasonKind> {
        let home = self.chains.home();
        let tx = fetch_tx(home.as_ref(), tx_hash, TxKind::IssueClass)
            .await?
            .into_issue_class()
            .map_err(|_| ReasonKind::TxResultUnexpected)?;
        ensure(
            participant.owns(home.chain(), &tx.sender),
            ReasonKind::SenderMismatch,
        )?;

        let class = home
            .get_asset_class(class_id)
            .await
            .map_err(|_| ReasonKind::ClassNotFound)?;
        ensure(
            participant.owns(home.chain(), &class.creator),
            ReasonKind::ClassCreatorMismatch,
        )?;
        ensure(
            !class.uri.is_empty() && is_json_object(&class.data),
            ReasonKind::ClassDataInvalid,
        )
    }

    async fn check_mint(&self, claim: &MintClaim, participant: &Participant) -> Result<(), ReasonKind> {
        let home = self.chains.home();
        let owns = |address: &str| participant.owns(home.chain(), address);

        let tx = fetch_tx(home.as_ref(), &claim.tx_hash, TxKind::MintAsset)
            .await?
            .into_mint_asset()
            .map_err(|_| ReasonKind::TxResultUnexpected)?;
        ensure(owns(&tx.sender), ReasonKind::SenderMismatch)?;
        ensure(owns(&tx.recipient), ReasonKind::RecipientMismatch)?;

        let class = home
            .get_asset_class(&claim.class_id)
            .await
            .map_err(|_| ReasonKind::ClassNotFound)?;
        ensure(owns(&class.creator), ReasonKind::ClassCreatorMismatch)?;

        let asset = home
            .get_asset(&claim.class_id, &claim.token_id)
            .await
            .map_err(|_| ReasonKind::AssetNotFound)?;
        ensure(
            !asset.uri.is_empty() && !asset.data.is_empty(),
            ReasonKind::AssetDataInvalid,
        )
    }

    async fn check_out(
        &self,
        tx_hash: &str,
        class_id: &str,
        token_id: &str,
        dest: &ChainId,
        participant: &Participant,
    ) -> Result<(), ReasonKind> {
        let home = self.chains.home();
        let dest_chain = self
            .chains
            .get(dest)
            .map_err(|_| ReasonKind::ChainIdUnresolved)?;

        let tx = fetch_tx(home.as_ref(), tx_hash, TxKind::IbcTransfer)
            .await?
            .into_ibc_transfer()
            .map_err(|_| ReasonKind::TxResultUnexpected)?;
        ensure(
            participant.owns(home.chain(), &tx.sender),
            ReasonKind::SenderMismatch,
        )?;
        ensure(
            participant.owns(dest, &tx.receiver),
            ReasonKind::RecipientMismatch,
        )?;
        ensure(
            dest_chain.has_asset_class(class_id).await,
            ReasonKind::ClassNotFound,
        )?;
        ensure(tx.token_id == token_id, ReasonKind::TokenIdMismatch)
    }

    async fn check_back(
        &self,
        tx_hash: &str,
        class_id: &str,
        token_id: &str,
        src: &ChainId,
        participant: &Participant,
    ) -> Result<(), ReasonKind> {
        let home = self.chains.home();
        let src_chain = self
            .chains
            .get(src)
            .map_err(|_| ReasonKind::ChainIdUnresolved)?;

        let tx = fetch_tx(src_chain.as_ref(), tx_hash, TxKind::IbcTransfer)
            .await?
            .into_ibc_transfer()
            .map_err(|_| ReasonKind::TxResultUnexpected)?;
        ensure(
            participant.owns(src, &tx.sender),
            ReasonKind::SenderMismatch,
        )?;
        ensure(
            participant.owns(home.chain(), &tx.receiver),
            ReasonKind::RecipientMismatch,
        )?;
        ensure(
            src_chain.has_asset_class(class_id).await,
            ReasonKind::ClassNotFound,
        )?;
        ensure(
            home.has_asset(tx.original_class(), token_id).await,
            ReasonKind::AssetNotFound,
        )
    }
}

fn is_json_object(data: &str) -> bool {
    matches!(
        serde_json::from_str::<serde_json::Value>(data),
        Ok(serde_json::Value::Object(_))
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::verifiers::test_support::*;
    use crate::verifiers::Verifier;
    use gv_02_chain_gateway::{Asset, AssetClass, MockChainQuery, TxResponse};

    fn issue_tx(sender: &str) -> TxResponse {
        TxResponse::new(100, 0)
            .with_event("message", &[("sender", sender)])
            .with_event(
                "issue_denom",
                &[("denom_id", "gonClass"), ("creator", sender)],
            )
    }

    fn gon_class(creator: &str, data: &str) -> AssetClass {
        AssetClass {
            id: "gonClass".to_string(),
            creator: creator.to_string(),
            uri: "ipfs://class".to_string(),
            data: data.to_string(),
            ..Default::default()
        }
    }

    fn issue_verifier(home: MockChainQuery) -> Verifier {
        Verifier::Simple(SimpleVerifier::new(SimpleTask::IssueClass, chain_set(vec![home])))
    }

    fn issue_params() -> TaskParams {
        TaskParams::IssueClass {
            tx_hash: "AAAA".to_string(),
            class_id: "gonClass".to_string(),
        }
    }

    #[tokio::test]
    async fn test_issue_class_passes() {
        let home = MockChainQuery::new('i', "gon-irishub-1")
            .with_tx("AAAA", issue_tx(ALICE_I))
            .with_class(gon_class(ALICE_I, r#"{"team":"gon"}"#));
        let outcome = run(&issue_verifier(home), issue_params()).await;
        assert_eq!(outcome.point, 10);
        assert_eq!(outcome.reason, "");
    }

    #[tokio::test]
    async fn test_issue_class_sender_checked_before_class() {
        let home = MockChainQuery::new('i', "gon-irishub-1").with_tx("AAAA", issue_tx("iaa1mallory"));
        let outcome = run(&issue_verifier(home), issue_params()).await;
        assert_eq!(outcome.reason, "SenderMismatch");
    }

    #[tokio::test]
    async fn test_issue_class_data_must_be_object() {
        let home = MockChainQuery::new('i', "gon-irishub-1")
            .with_tx("AAAA", issue_tx(ALICE_I))
            .with_class(gon_class(ALICE_I, "plain text"));
        let outcome = run(&issue_verifier(home), issue_params()).await;
        assert_eq!(outcome.reason, "ClassDataInvalid");
    }

    #[tokio::test]
    async fn test_issue_class_failed_tx() {
        let home = MockChainQuery::new('i', "gon-irishub-1").with_tx("AAAA", TxResponse::new(100, 7));
        let outcome = run(&issue_verifier(home), issue_params()).await;
        assert_eq!(outcome.reason, "TxUnsuccessful");
    }

    #[tokio::test]
    async fn test_issue_class_unreachable_tx() {
        let home = MockChainQuery::new('i', "gon-irishub-1");
        let outcome = run(&issue_verifier(home), issue_params()).await;
        assert_eq!(outcome.reason, "TxUnachievable");
    }

    #[tokio::test]
    async fn test_mint_asset_requires_data() {
        let mint = TxResponse::new(101, 0)
            .with_event("message", &[("sender", ALICE_I)])
            .with_event(
                "mint_nft",
                &[
                    ("denom_id", "gonClass"),
                    ("token_id", "nft1"),
                    ("recipient", ALICE_I),
                ],
            );
        let home = MockChainQuery::new('i', "gon-irishub-1")
            .with_tx("BBBB", mint)
            .with_class(gon_class(ALICE_I, "{}"))
            .with_asset(Asset {
                class_id: "gonClass".to_string(),
                id: "nft1".to_string(),
                uri: "ipfs://nft1".to_string(),
                owner: ALICE_I.to_string(),
                ..Default::default()
            });
        let verifier = Verifier::Simple(SimpleVerifier::new(SimpleTask::MintAsset, chain_set(vec![home])));
        let params = verifier
            .build_params(&[row(&["BBBB", "gonClass", "nft1"])])
            .unwrap();
        let outcome = run(&verifier, params).await;
        assert_eq!(outcome.reason, "AssetDataInvalid");
    }

    #[test]
    fn test_mint_params_row_bounds() {
        let verifier = Verifier::Simple(SimpleVerifier::new(
            SimpleTask::MintAsset,
            chain_set(vec![MockChainQuery::new('i', "gon-irishub-1")]),
        ));
        let r = row(&["BBBB", "gonClass", "nft1"]);
        assert!(verifier.build_params(&[r.clone(), r.clone()]).is_ok());
        assert_eq!(
            verifier.build_params(&[r.clone(), r.clone(), r]),
            Err(ReasonKind::ParamsFormatInvalid)
        );
        assert_eq!(verifier.build_params(&[]), Err(ReasonKind::ParamsFormatInvalid));
    }

    fn transfer_verifier(task: SimpleTask, chains: Vec<MockChainQuery>) -> Verifier {
        Verifier::Simple(SimpleVerifier::new(task, chain_set(chains)))
    }

    fn ibc_send(sender: &str, receiver: &str, class_id: &str, token: &str) -> TxResponse {
        let data = format!(
            r#"{{"classId":"{class_id}","tokenIds":["{token}"],"sender":"{sender}","receiver":"{receiver}"}}"#
        );
        TxResponse::new(200, 0).with_event(
            "send_packet",
            &[
                ("packet_data", data.as_str()),
                ("packet_dst_port", "wasm.stars1ics721"),
                ("packet_dst_channel", "channel-207"),
            ],
        )
    }

    #[test]
    fn test_transfer_params_resolve_chain() {
        let verifier = transfer_verifier(
            SimpleTask::TransferOut {
                dest_chains: vec![ChainId::from('s')],
            },
            vec![
                MockChainQuery::new('i', "gon-irishub-1"),
                MockChainQuery::new('s', "elgafar-1"),
                MockChainQuery::new('u', "uptick_7000-2"),
            ],
        );
        let params = verifier
            .build_params(&[row(&["CCCC", "wasm.stars1class", "nft1", "elgafar-1"])])
            .unwrap();
        assert!(matches!(params, TaskParams::Transfer { ref chain, .. } if chain == &ChainId::from('s')));
        assert_eq!(
            verifier.build_params(&[row(&["CCCC", "c", "nft1", "uptick_7000-2"])]),
            Err(ReasonKind::ChainIdUnresolved)
        );
    }

    #[tokio::test]
    async fn test_transfer_out_token_checked_last() {
        let home = MockChainQuery::new('i', "gon-irishub-1")
            .with_tx("CCCC", ibc_send(ALICE_I, ALICE_S, "gonClass", "nft2"));
        let dest = MockChainQuery::new('s', "elgafar-1").with_class(AssetClass {
            id: "wasm.stars1class".to_string(),
            ..Default::default()
        });
        let verifier = transfer_verifier(
            SimpleTask::TransferOut {
                dest_chains: vec![ChainId::from('s')],
            },
            vec![home, dest],
        );
        let params = TaskParams::Transfer {
            tx_hash: "CCCC".to_string(),
            class_id: "wasm.stars1class".to_string(),
            token_id: "nft1".to_string(),
            chain: ChainId::from('s'),
        };
        assert_eq!(run(&verifier, params).await.reason, "TokenIdMismatch");
    }

    #[tokio::test]
    async fn test_transfer_back_checks_original_class_at_home() {
        let src = MockChainQuery::new('s', "elgafar-1")
            .with_tx(
                "DDDD",
                ibc_send(ALICE_S, ALICE_I, "nft-transfer/channel-22/gonClass", "nft1"),
            )
            .with_class(AssetClass {
                id: "wasm.stars1class".to_string(),
                ..Default::default()
            });
        let home = MockChainQuery::new('i', "gon-irishub-1").with_asset(Asset {
            class_id: "gonClass".to_string(),
            id: "nft1".to_string(),
            owner: ALICE_I.to_string(),
            ..Default::default()
        });
        let verifier = transfer_verifier(
            SimpleTask::TransferBack {
                src_chains: vec![ChainId::from('s')],
            },
            vec![home, src],
        );
        let params = TaskParams::Transfer {
            tx_hash: "DDDD".to_string(),
            class_id: "wasm.stars1class".to_string(),
            token_id: "nft1".to_string(),
            chain: ChainId::from('s'),
        };
        let outcome = run(&verifier, params).await;
        assert_eq!(outcome.reason, "");
        assert_eq!(outcome.point, 10);
    }

    #[tokio::test]
    async fn test_transfer_out_blank_receiver_needs_registered_address() {
        // Packet without a receiver; the participant registered nothing on s.
        let data = r#"{"classId":"gonClass","tokenIds":["nft1"],"sender":"iaa1alice"}"#;
        let send = TxResponse::new(200, 0).with_event(
            "send_packet",
            &[
                ("packet_data", data),
                ("packet_dst_port", "wasm.stars1ics721"),
                ("packet_dst_channel", "channel-207"),
            ],
        );
        let home = MockChainQuery::new('i', "gon-irishub-1").with_tx("CCCC", send);
        let dest = MockChainQuery::new('s', "elgafar-1").with_class(AssetClass {
            id: "wasm.stars1class".to_string(),
            ..Default::default()
        });
        let verifier = transfer_verifier(
            SimpleTask::TransferOut {
                dest_chains: vec![ChainId::from('s')],
            },
            vec![home, dest],
        );
        let params = TaskParams::Transfer {
            tx_hash: "CCCC".to_string(),
            class_id: "wasm.stars1class".to_string(),
            token_id: "nft1".to_string(),
            chain: ChainId::from('s'),
        };
        let home_only = Arc::new(Participant::new("gon").with_address('i', ALICE_I));
        let outcome = run_as(&verifier, params, home_only).await;
        assert_eq!(outcome.reason, "RecipientMismatch");
        assert_eq!(outcome.point, 0);
    }
}
