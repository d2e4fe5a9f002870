//! # Pipeline Runs (gv-03)
//!
//! Whole participant runs against mock chains: evidence in, one outcome
//! per task out, saved exactly once.
//!
//! ## Test Categories
//!
//! 1. **Isolation** - one broken or panicking task never affects the others
//! 2. **Never-go-back** - class trace hash must match the configured flow
//! 3. **Structural failures** - abort before anything is dispatched
//! 4. **Files** - JSON evidence in, sorted taskpoint.json out

use gv_01_channel_flow::ChainId;
use async_trait::async_trait;
use gv_02_chain_gateway::{
    Asset, AssetClass, ChainQuery, ChainSet, ClassTrace, GatewayError, MockChainQuery, TxKind,
    TxOutcome, TxResponse,
};
use gv_03_task_verifier::{
    EventConfig, JsonEvidence, JsonOutcomeWriter, MemoryEvidence, MemorySink, OutcomeSink,
    PipelineError, RunState, TaskManager, VerificationOutcome, VerifierRegistry, Workbook,
    INFO_SHEET, TASK_POINT_FILE,
};
use std::sync::atomic::Ordering;
use std::sync::Arc;

// =============================================================================
// TEST HELPERS
// =============================================================================

const ALICE_I: &str = "iaa1alice";
const ALICE_S: &str = "stars1alice";
const ALICE_J: &str = "juno1alice";

const EVENT: &str = r#"
home_chain = "i"

[[chains]]
abbr = "i"
chain_id = "gon-irishub-1"
rpc = "http://127.0.0.1:26657/"
query = "http://127.0.0.1:1317/"

[[chains]]
abbr = "s"
chain_id = "elgafar-1"
rpc = "http://127.0.0.1:26658/"
query = "http://127.0.0.1:1318/"
module = "wasm"

[[chains]]
abbr = "j"
chain_id = "uni-6"
rpc = "http://127.0.0.1:26659/"
query = "http://127.0.0.1:1319/"
module = "wasm"

[channels]
is-1 = "nft-transfer/channel-22 <> wasm.stars1ics721/channel-207"
sj-1 = "wasm.stars1ics721/channel-211 <> wasm.juno1ics721/channel-93"
ji-1 = "wasm.juno1ics721/channel-89 <> nft-transfer/channel-17"

[flows]
a01 = "i --(1)--> s --(1)--> j --(1)--> i"

[[tasks]]
id = "A1"
points = 10
kind = "issue_class"

[[tasks]]
id = "A2"
points = 10
kind = "mint_asset"

[[tasks]]
id = "A7"
points = 20
kind = "flow"
flow = "a01"
never_go_back = true
"#;

const A01_TRACE: &str =
    "nft-transfer/channel-17/wasm.juno1ics721/channel-93/wasm.stars1ics721/channel-207";

fn row(cells: &[&str]) -> Vec<String> {
    cells.iter().map(|c| c.to_string()).collect()
}

fn issue_tx(sender: &str) -> TxResponse {
    TxResponse::new(100, 0)
        .with_event("message", &[("sender", sender)])
        .with_event("issue_denom", &[("denom_id", "gonClass"), ("creator", sender)])
}

/// Home chain holding A1's evidence and the asset a01 ends with.
fn home(a1_sender: &str, trace: ClassTrace) -> MockChainQuery {
    let final_class = trace.ibc_class_id();
    MockChainQuery::new('i', "gon-irishub-1")
        .with_tx("AAAA", issue_tx(a1_sender))
        .with_class(AssetClass {
            id: "gonClass".to_string(),
            creator: ALICE_I.to_string(),
            uri: "ipfs://class".to_string(),
            data: r#"{"team":"gon"}"#.to_string(),
            ..Default::default()
        })
        .with_class_trace(trace)
        .with_asset(Asset {
            class_id: final_class,
            id: "nft1".to_string(),
            owner: ALICE_I.to_string(),
            ..Default::default()
        })
}

fn registry(home: MockChainQuery) -> VerifierRegistry {
    registry_over(Arc::new(home))
}

fn registry_over(home: Arc<dyn ChainQuery>) -> VerifierRegistry {
    let config = EventConfig::parse(EVENT).unwrap();
    let adapters = [
        home,
        Arc::new(MockChainQuery::new('s', "elgafar-1")) as Arc<dyn ChainQuery>,
        Arc::new(MockChainQuery::new('j', "uni-6")),
    ];
    let chains = Arc::new(ChainSet::new(&config.home_chain, adapters).unwrap());
    let catalog = Arc::new(config.flow_catalog().unwrap());
    VerifierRegistry::from_config(&config.tasks, chains, catalog).unwrap()
}

/// Evidence of a diligent participant: A1 and A7 filled, A2 left blank.
fn workbook(a7_class: &str) -> Workbook {
    Workbook::default()
        .with_sheet(
            INFO_SHEET,
            vec![
                row(&["Team", "i", "s", "j"]),
                row(&["gon", ALICE_I, ALICE_S, ALICE_J]),
            ],
        )
        .with_sheet("A1", vec![row(&["TxHash", "ClassId"]), row(&["AAAA", "gonClass"])])
        .with_sheet("A2", vec![row(&["TxHash", "ClassId", "TokenId"])])
        .with_sheet("A7", vec![row(&["ClassId", "TokenId"]), row(&[a7_class, "nft1"])])
}

/// Home chain whose transaction lookups blow up; everything else is served
/// by the wrapped mock.
struct PanickingTxLookup(MockChainQuery);

#[async_trait]
impl ChainQuery for PanickingTxLookup {
    fn chain(&self) -> &ChainId {
        self.0.chain()
    }

    fn network_id(&self) -> &str {
        self.0.network_id()
    }

    async fn get_transaction(&self, hash: &str, _kind: TxKind) -> Result<TxOutcome, GatewayError> {
        panic!("transaction lookup of {hash} exploded");
    }

    async fn get_asset_class(&self, class_id: &str) -> Result<AssetClass, GatewayError> {
        self.0.get_asset_class(class_id).await
    }

    async fn get_asset(&self, class_id: &str, token_id: &str) -> Result<Asset, GatewayError> {
        self.0.get_asset(class_id, token_id).await
    }

    async fn get_class_trace(&self, ibc_class_id: &str) -> Result<ClassTrace, GatewayError> {
        self.0.get_class_trace(ibc_class_id).await
    }

    fn close(&self) {}
}

fn sorted(mut outcomes: Vec<VerificationOutcome>) -> Vec<(String, u32, String)> {
    outcomes.sort_by(|a, b| a.task_no.cmp(&b.task_no));
    outcomes
        .into_iter()
        .map(|o| (o.task_no, o.point, o.reason))
        .collect()
}

fn expected(task_no: &str, point: u32, reason: &str) -> (String, u32, String) {
    (task_no.to_string(), point, reason.to_string())
}

// =============================================================================
// ISOLATION
// =============================================================================

#[tokio::test]
async fn test_every_task_reports_exactly_once() {
    let trace = ClassTrace::new(A01_TRACE, "gonClass");
    let a7_class = trace.ibc_class_id();
    let registry = registry(home(ALICE_I, trace));
    let sink = Arc::new(MemorySink::new());

    let mut run = TaskManager::load(&MemoryEvidence::new(workbook(&a7_class)), &registry, &[])
        .await
        .unwrap();
    assert_eq!(run.state(), RunState::Loaded);
    assert_eq!(run.tasks().len(), 3);
    assert_eq!(run.participant().address(&ChainId::from('j')), Some(ALICE_J));

    let outcomes = run.process(sink.clone()).await.unwrap();
    assert_eq!(run.state(), RunState::Saved);
    assert_eq!(sink.save_count(), 1);
    assert_eq!(sink.outcomes(), outcomes);
    assert_eq!(
        sorted(outcomes),
        vec![
            expected("A1", 10, ""),
            expected("A2", 0, "ParamsFormatInvalid"),
            expected("A7", 20, ""),
        ]
    );
}

#[tokio::test]
async fn test_wrong_sender_fails_only_its_task() {
    let trace = ClassTrace::new(A01_TRACE, "gonClass");
    let a7_class = trace.ibc_class_id();
    let registry = registry(home("iaa1mallory", trace));

    let requested = vec!["A1".to_string(), "A7".to_string()];
    let mut run = TaskManager::load(&MemoryEvidence::new(workbook(&a7_class)), &registry, &requested)
        .await
        .unwrap();
    let outcomes = run.process(Arc::new(MemorySink::new())).await.unwrap();
    assert_eq!(
        sorted(outcomes),
        vec![expected("A1", 0, "SenderMismatch"), expected("A7", 20, "")]
    );
}

#[tokio::test]
async fn test_panicking_task_reports_internal() {
    let trace = ClassTrace::new(A01_TRACE, "gonClass");
    let a7_class = trace.ibc_class_id();
    let registry = registry_over(Arc::new(PanickingTxLookup(home(ALICE_I, trace))));
    let sink = Arc::new(MemorySink::new());

    let mut run = TaskManager::load(&MemoryEvidence::new(workbook(&a7_class)), &registry, &[])
        .await
        .unwrap();
    let outcomes = run.process(sink.clone()).await.unwrap();
    assert_eq!(run.state(), RunState::Saved);
    assert_eq!(sink.save_count(), 1);
    assert_eq!(
        sorted(outcomes),
        vec![
            expected("A1", 0, "Internal"),
            expected("A2", 0, "ParamsFormatInvalid"),
            expected("A7", 20, ""),
        ]
    );
}

#[tokio::test]
async fn test_process_runs_once() {
    let trace = ClassTrace::new(A01_TRACE, "gonClass");
    let a7_class = trace.ibc_class_id();
    let registry = registry(home(ALICE_I, trace));

    let mut run = TaskManager::load(&MemoryEvidence::new(workbook(&a7_class)), &registry, &[])
        .await
        .unwrap();
    run.process(Arc::new(MemorySink::new())).await.unwrap();
    assert_eq!(
        run.process(Arc::new(MemorySink::new())).await.unwrap_err(),
        PipelineError::AlreadyRun(RunState::Saved)
    );
}

// =============================================================================
// NEVER-GO-BACK
// =============================================================================

#[tokio::test]
async fn test_never_go_back_other_route_is_rejected() {
    // The NFT reached home over a single hop, not over a01.
    let trace = ClassTrace::new("nft-transfer/channel-22", "gonClass");
    let claimed = trace.ibc_class_id();
    let registry = registry(home(ALICE_I, trace));

    let requested = vec!["A7".to_string()];
    let mut run = TaskManager::load(&MemoryEvidence::new(workbook(&claimed)), &registry, &requested)
        .await
        .unwrap();
    let outcomes = run.process(Arc::new(MemorySink::new())).await.unwrap();
    assert_eq!(sorted(outcomes), vec![expected("A7", 0, "TraceHashMismatch")]);
}

// =============================================================================
// STRUCTURAL FAILURES
// =============================================================================

#[tokio::test]
async fn test_structural_errors_abort_load() {
    let registry = registry(home(ALICE_I, ClassTrace::new(A01_TRACE, "gonClass")));
    let book = workbook("ibc/00");

    let unknown = vec!["Z9".to_string()];
    assert_eq!(
        TaskManager::load(&MemoryEvidence::new(book.clone()), &registry, &unknown)
            .await
            .err(),
        Some(PipelineError::UnknownTask("Z9".to_string()))
    );

    let without_a1 = Workbook {
        sheets: book.sheets.iter().filter(|s| s.name != "A1").cloned().collect(),
    };
    let a1 = vec!["A1".to_string()];
    assert_eq!(
        TaskManager::load(&MemoryEvidence::new(without_a1), &registry, &a1)
            .await
            .err(),
        Some(PipelineError::SheetMissing("A1".to_string()))
    );

    let empty_a1 = book.clone().with_sheet("A1", Vec::new());
    assert!(matches!(
        TaskManager::load(&MemoryEvidence::new(empty_a1), &registry, &a1).await,
        Err(PipelineError::SheetEmpty(_))
    ));

    let no_info = Workbook::default().with_sheet("A1", vec![row(&["TxHash", "ClassId"])]);
    assert!(matches!(
        TaskManager::load(&MemoryEvidence::new(no_info), &registry, &[]).await,
        Err(PipelineError::InfoMissing(_))
    ));
}

#[tokio::test]
async fn test_sink_failure_is_reported() {
    let trace = ClassTrace::new(A01_TRACE, "gonClass");
    let a7_class = trace.ibc_class_id();
    let registry = registry(home(ALICE_I, trace));
    let sink = Arc::new(MemorySink::new());
    sink.should_fail.store(true, Ordering::SeqCst);

    let mut run = TaskManager::load(&MemoryEvidence::new(workbook(&a7_class)), &registry, &[])
        .await
        .unwrap();
    assert!(matches!(
        run.process(sink.clone()).await,
        Err(PipelineError::Save(_))
    ));
    assert_eq!(sink.save_count(), 1);
    assert_eq!(run.state(), RunState::Collecting);
}

// =============================================================================
// FILES
// =============================================================================

#[tokio::test]
async fn test_json_evidence_to_task_point_file() {
    let trace = ClassTrace::new(A01_TRACE, "gonClass");
    let a7_class = trace.ibc_class_id();
    let registry = registry(home(ALICE_I, trace));

    let dir = tempfile::tempdir().unwrap();
    let evidence_path = dir.path().join("gon.json");
    std::fs::write(&evidence_path, serde_json::to_string(&workbook(&a7_class)).unwrap()).unwrap();

    let evidence = JsonEvidence::new(&evidence_path);
    let writer = JsonOutcomeWriter::next_to(&evidence_path);
    let mut run = TaskManager::load(&evidence, &registry, &[]).await.unwrap();
    run.process(Arc::new(writer) as Arc<dyn OutcomeSink>)
        .await
        .unwrap();

    let written = std::fs::read_to_string(dir.path().join(TASK_POINT_FILE)).unwrap();
    let outcomes: Vec<serde_json::Value> = serde_json::from_str(&written).unwrap();
    let order: Vec<&str> = outcomes
        .iter()
        .map(|o| o["TaskNo"].as_str().unwrap())
        .collect();
    assert_eq!(order, vec!["A1", "A2", "A7"]);
    assert_eq!(outcomes[2]["Point"], 20);
    assert_eq!(outcomes[1]["Reason"], "ParamsFormatInvalid");
}
