use log::info;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::transaction::Transaction;

/// Previous-hash sentinel carried by the genesis block
pub const GENESIS_PREVIOUS_HASH: &str = "0";

/// Hex digits in a SHA-256 block hash; no difficulty above this can be met
pub const MAX_DIFFICULTY: usize = 64;

/// 2017-01-01T00:00:00Z in Unix milliseconds
pub const GENESIS_TIMESTAMP_MS: i64 = 1_483_228_800_000;

/// A batch of transactions linked to its predecessor by hash
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    /// Creation time in Unix milliseconds
    pub timestamp: i64,

    /// Transactions in inclusion order; the last one is the mining reward
    pub transactions: Vec<Transaction>,

    /// Hash of the previous block
    pub previous_hash: String,

    /// Cached result of `compute_hash()`
    pub hash: String,

    /// Proof-of-work counter
    pub nonce: u64,
}

impl Block {
    /// Creates an unmined block
    ///
    /// # Arguments
    ///
    /// * `timestamp` - Creation time in Unix milliseconds
    /// * `transactions` - The transactions to include, in order
    /// * `previous_hash` - The hash of the previous block
    ///
    /// # Returns
    ///
    /// A new Block with nonce 0 and its hash already filled in
    pub fn new(timestamp: i64, transactions: Vec<Transaction>, previous_hash: String) -> Self {
        let mut block = Block {
            timestamp,
            transactions,
            previous_hash,
            hash: String::new(),
            nonce: 0,
        };
        block.hash = block.compute_hash();
        block
    }

    /// The fixed first block of every ledger
    pub fn genesis() -> Self {
        Block::new(
            GENESIS_TIMESTAMP_MS,
            Vec::new(),
            GENESIS_PREVIOUS_HASH.to_string(),
        )
    }

    /// SHA-256 over `previous_hash ‖ timestamp ‖ json(transactions) ‖ nonce`, hex encoded
    pub fn compute_hash(&self) -> String {
        let transactions = serde_json::to_string(&self.transactions)
            .expect("transactions always serialize to JSON");

        let mut hasher = Sha256::new();
        hasher.update(self.previous_hash.as_bytes());
        hasher.update(self.timestamp.to_string().as_bytes());
        hasher.update(transactions.as_bytes());
        hasher.update(self.nonce.to_string().as_bytes());
        hex::encode(hasher.finalize())
    }

    /// Overwrites the cached hash with a fresh recomputation.
    ///
    /// Only needed after editing fields of a block directly.
    pub fn recompute_hash(&mut self) {
        self.hash = self.compute_hash();
    }

    /// Whether `hash` starts with `difficulty` hexadecimal zeros
    pub fn meets_difficulty(hash: &str, difficulty: usize) -> bool {
        hash.len() >= difficulty && hash.bytes().take(difficulty).all(|b| b == b'0')
    }

    /// Bumps the nonce until the hash meets `difficulty`. Blocks until found.
    pub fn mine(&mut self, difficulty: usize) {
        while !Self::meets_difficulty(&self.hash, difficulty) {
            self.nonce += 1;
            self.hash = self.compute_hash();
        }

        info!("Block mined: {} (nonce {})", self.hash, self.nonce);
    }

    /// Every transaction verifies; a missing signature counts as invalid
    pub fn has_valid_transactions(&self) -> bool {
        self.transactions
            .iter()
            .all(|tx| matches!(tx.verify(), Ok(true)))
    }
}
