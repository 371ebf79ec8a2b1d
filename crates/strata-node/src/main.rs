#![forbid(unsafe_code)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

mod host;
mod put_tx;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use serde_json::json;
use strata_chain::{Block, Chain, ChainError, Clock, Genesis, SystemClock};
use strata_state::SledStore;

use host::DevHost;
use put_tx::PutTx;

/// Fixed devnet genesis timestamp (2024-01-01T00:00:00Z) so the genesis
/// identity is stable across runs.
const DEVNET_GENESIS_TS: u64 = 1_704_067_200;

/// Node configuration resolved from CLI/defaults.
#[derive(Parser, Debug)]
#[command(name = "strata-node", version)]
struct Config {
    /// Path to the state database (sled)
    #[arg(long = "db", default_value = "strata-db")]
    db: PathBuf,
    /// Number of devnet blocks to produce
    #[arg(long = "blocks", default_value_t = 5)]
    blocks: u64,
}

fn main() -> ExitCode {
    let cfg = Config::parse();
    match run(cfg) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("strata-node: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cfg: Config) -> Result<(), ChainError> {
    println!("Starting Strata devnet driver");

    let store = SledStore::open(&cfg.db)?;
    let genesis: Block<PutTx> = Block::genesis(Genesis::default(), DEVNET_GENESIS_TS);
    let host = DevHost::new(store, genesis.clone())?;
    let clock = SystemClock;
    let mut chain = Chain::initialize(host, clock, genesis)?;

    let genesis_id = chain.genesis_id();
    println!("genesis   | id={genesis_id}");

    // Resume from the committed tip when this host still knows its body;
    // block bodies are not persisted here, so a restarted devnet forks
    // from genesis.
    let mut parent_id = match chain.last_accepted()? {
        Some(tip) if chain.block(tip).is_ok() => tip,
        _ => genesis_id,
    };

    let params = chain.vm().params().clone();
    for _ in 0..cfg.blocks {
        let parent = chain.block(parent_id)?.clone();
        let height = parent.height + 1;
        let timestamp = SystemClock.now_unix().max(parent.timestamp);

        // Two writes, each 50 over the floor: exactly the surplus the
        // minimum cost demands.
        let tx_difficulty = params.min_difficulty + 50;
        let txs = vec![
            PutTx {
                key: format!("note/{height}/a").into_bytes(),
                value: format!("payload-{height}-a").into_bytes(),
                difficulty: tx_difficulty,
            },
            PutTx {
                key: format!("note/{height}/b").into_bytes(),
                value: format!("payload-{height}-b").into_bytes(),
                difficulty: tx_difficulty,
            },
        ];

        let block = Block {
            parent: parent_id,
            timestamp,
            height,
            difficulty: params.min_difficulty,
            cost: params.min_block_cost,
            txs,
            genesis: None,
            beneficiary: None,
        };

        let id = chain.insert(block)?;
        chain.verify(id)?;
        chain.accept(id)?;
        parent_id = id;
    }

    let tip = chain.last_accepted()?;
    let summary = json!({
        "genesis": genesis_id.to_string(),
        "tip": tip.map(|id| id.to_string()),
        "blocks_produced": cfg.blocks,
    });
    println!("{summary}");

    Ok(())
}
