#![forbid(unsafe_code)]
//! Local driver for BranchLedger: builds a genesis block, grows a short chain
//! with a competing fork, and reports the resulting best tip.

use branchledger::blockchain::{Block, Blockchain, Utxo};
use branchledger::config::load_config;
use branchledger::crypto::KeyPair;
use branchledger::logging;
use branchledger::transaction::Transaction;
use clap::Parser;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(long, default_value = "config.toml")]
    config: PathBuf,
    /// Blocks to add on the main branch after genesis
    #[arg(long, default_value_t = 12)]
    blocks: usize,
    /// Height of the block the side fork is built on (genesis is 1)
    #[arg(long, default_value_t = 1)]
    fork_from: u64,
    /// Print the best block as JSON
    #[arg(long)]
    json: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = load_config(&cli.config)?;
    logging::init(&config.logging)?;

    let alice = KeyPair::generate()?;
    let bob = KeyPair::generate()?;
    let genesis = Block::genesis(Transaction::coinbase(100, alice.identity()));
    let mut chain = Blockchain::with_config(genesis.clone(), &config.ledger);

    // Alice pays Bob 40 and keeps 50; the remaining 10 is the implicit fee.
    let mut payment = Transaction::new();
    payment.add_input(genesis.coinbase().hash(), 0);
    payment.add_output(bob.identity(), 40);
    payment.add_output(alice.identity(), 50);
    payment.sign_input_with(0, &alice)?;
    chain.submit_transaction(payment.clone());

    let mut tips = vec![genesis.hash()];
    for height in 0..cli.blocks {
        let mut block = Block::new(tips.last().copied(), alice.identity());
        if height == 0 {
            block.add_transaction(payment.clone());
        }
        tips.push(chain.try_add_block(block)?);
    }
    info!(height = chain.max_height(), pending = chain.transaction_pool().len(), "main branch built");

    // A side fork grown from an early block: accepted while inside the cut-off window.
    let fork_parent = tips
        .get(cli.fork_from.saturating_sub(1) as usize)
        .copied()
        .unwrap_or_else(|| genesis.hash());
    let side = Block::new(Some(fork_parent), bob.identity());
    let side_accepted = chain.add_block(side);
    info!(accepted = side_accepted, "side fork offered");

    let snapshot = chain.best_snapshot();
    let payment_output = Utxo::new(payment.hash(), 0);
    println!("Best height:       {}", chain.max_height());
    println!("Best block:        {}", chain.best_block().hash_str());
    println!("Blocks accepted:   {}", chain.len());
    println!("Side fork:         {}", if side_accepted { "accepted" } else { "rejected (stale)" });
    println!("Unspent outputs:   {}", snapshot.len());
    println!(
        "Bob ({}): {} (payment unspent: {})",
        &hex::encode(bob.identity())[..16],
        snapshot.balance_of(&bob.identity()),
        snapshot.contains(&payment_output)
    );

    if cli.json {
        println!("{}", serde_json::to_string_pretty(chain.best_block())?);
    }

    Ok(())
}
