use anyhow::{Context, Result};
use log::{info, warn};

use vote_ledger::blockchain::{Blockchain, LedgerConfig, Transaction, Wallet};

/// Hex-encoded ed25519 secret key used as the voter's wallet
const SECRET_KEY_ENV: &str = "LEDGER_SECRET_KEY";

// Load the voter's wallet, or create a throwaway one
fn load_wallet() -> Result<Wallet> {
    match std::env::var(SECRET_KEY_ENV) {
        Ok(secret) => {
            let wallet = Wallet::from_secret_hex(&secret)
                .with_context(|| format!("{} is not a valid secret key", SECRET_KEY_ENV))?;
            info!("Loaded wallet {} from {}", wallet.address(), SECRET_KEY_ENV);
            Ok(wallet)
        }
        Err(_) => {
            let wallet = Wallet::new();
            warn!("{} not set, generated wallet {}", SECRET_KEY_ENV, wallet.address());
            Ok(wallet)
        }
    }
}

fn main() -> Result<()> {
    // Initialize logger
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config = LedgerConfig::from_env()?;
    info!(
        "Starting ledger with difficulty {} and reward {}",
        config.difficulty, config.mining_reward
    );
    let mut voting_process = Blockchain::with_config(config)?;

    let voter = load_wallet()?;
    let candidate = Wallet::new();

    let mut vote = Transaction::new(voter.address().clone(), candidate.address().clone(), 10);
    vote.sign(voter.signing_key())?;
    voting_process.add_transaction(vote)?;

    println!("\nStarting the miner...");
    voting_process.mine_pending_transactions(voter.address().clone());

    println!(
        "\nBalance of voter is {}",
        voting_process.get_balance_of_address(voter.address())
    );
    println!(
        "Balance of candidate is {}",
        voting_process.get_balance_of_address(candidate.address())
    );
    println!("Is chain valid? {}", voting_process.is_chain_valid());

    println!("\nTampering with the first vote...");
    if let Some(block) = voting_process.force_block_mut(1) {
        block.transactions[0].amount = 1000;
    }
    match voting_process.validate() {
        Ok(()) => println!("Is chain valid? true"),
        Err(violation) => println!("Is chain valid? false ({})", violation),
    }

    Ok(())
}
