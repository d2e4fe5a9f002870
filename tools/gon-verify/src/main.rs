//! # GoN Verify
//!
//! Verifies participant evidence files against the event chains and writes
//! a `taskpoint.json` next to each one.
//!
//! ## Startup Sequence
//!
//! 1. Load the event configuration (chains, channels, flows, tasks)
//! 2. Build one chain adapter per configured chain
//! 3. Build the verifier registry
//! 4. Run every evidence file through its own task manager
//! 5. Close the chain adapters

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use gv_02_chain_gateway::ChainSet;
use gv_03_task_verifier::{
    EventConfig, JsonEvidence, JsonOutcomeWriter, OutcomeSink, TaskManager, VerifierRegistry,
};

/// GoN Verify: cross-chain NFT task verifier
#[derive(Parser, Debug)]
#[command(name = "gon-verify", version)]
#[command(about = "Verify cross-chain NFT task evidence and write task points")]
struct Args {
    /// Event configuration file
    #[arg(short, long, default_value = "config/gon-testnet.toml")]
    config: PathBuf,

    /// Evidence files, one per participant
    #[arg(short, long, required = true, num_args = 1..)]
    evidence: Vec<PathBuf>,

    /// Task ids to verify (comma separated); every task sheet when omitted
    #[arg(short, long, value_delimiter = ',')]
    tasks: Vec<String>,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&args.log_level))
        .context("invalid log filter")?;
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = EventConfig::load(&args.config)
        .with_context(|| format!("loading {}", args.config.display()))?;
    let chains = Arc::new(
        ChainSet::connect(&config.home_chain, &config.chains, &config.retry)
            .context("building chain adapters")?,
    );
    let catalog = Arc::new(config.flow_catalog().context("building flow catalog")?);
    let registry = VerifierRegistry::from_config(&config.tasks, chains.clone(), catalog)
        .context("building verifier registry")?;
    info!(
        "[gon-verify] {} task(s) over {} chain(s), home {}",
        registry.len(),
        chains.chain_ids().len(),
        chains.home_id()
    );

    let mut failed = 0usize;
    for path in &args.evidence {
        if let Err(e) = verify_file(path, &registry, &args.tasks).await {
            error!("[gon-verify] {}: {:#}", path.display(), e);
            failed += 1;
        }
    }
    chains.close();

    if failed > 0 {
        bail!("{} of {} evidence file(s) could not be verified", failed, args.evidence.len());
    }
    Ok(())
}

async fn verify_file(
    path: &Path,
    registry: &VerifierRegistry,
    tasks: &[String],
) -> Result<()> {
    let evidence = JsonEvidence::new(path);
    let sink: Arc<dyn OutcomeSink> = Arc::new(JsonOutcomeWriter::next_to(path));

    let mut run = TaskManager::load(&evidence, registry, tasks)
        .await
        .context("loading evidence")?;
    let team = run.participant().team_name.clone();
    let outcomes = run.process(sink).await.context("verifying tasks")?;

    let points: u32 = outcomes.iter().map(|o| o.point).sum();
    info!(team = %team, "[gon-verify] {} point(s) over {} task(s)", points, outcomes.len());
    Ok(())
}
