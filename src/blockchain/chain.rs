use chrono::Utc;
use log::{debug, info, warn};
use thiserror::Error;

use super::block::Block;
use super::config::{ConfigError, LedgerConfig};
use super::crypto::Address;
use super::transaction::{Amount, Transaction, TransactionError};

/// Signed running total of an address; senders are not checked for funds
pub type Balance = i128;

/// Errors that can occur during blockchain operations
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LedgerError {
    #[error("Invalid transaction: {0}")]
    InvalidTransaction(String),

    #[error("Transaction error: {0}")]
    Transaction(#[from] TransactionError),
}

/// The first check `Blockchain::validate` found broken
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum ChainViolation {
    #[error("block {index} contains an invalid transaction")]
    InvalidTransactions { index: usize },

    #[error("block {index} hash does not match its contents")]
    HashMismatch { index: usize },

    #[error("block {index} does not link to the hash of its predecessor")]
    BrokenLink { index: usize },
}

/// The ledger: a genesis-rooted chain of blocks plus the pool of
/// transactions waiting to be mined
#[derive(Debug, Clone)]
pub struct Blockchain {
    /// The chain of blocks, genesis first
    chain: Vec<Block>,

    /// Accepted transactions not yet in a block
    pending_transactions: Vec<Transaction>,

    /// Mining difficulty (number of leading zeros required in hash)
    difficulty: usize,

    /// Mining reward
    mining_reward: Amount,
}

impl Blockchain {
    /// Creates a ledger with default parameters
    ///
    /// # Returns
    ///
    /// A new Blockchain holding only the genesis block
    pub fn new() -> Self {
        Self::from_config(LedgerConfig::default())
    }

    /// Creates a ledger with the given difficulty and mining reward
    ///
    /// # Arguments
    ///
    /// * `config` - Mining parameters, checked with `LedgerConfig::validate`
    ///
    /// # Returns
    ///
    /// A new Blockchain holding only the genesis block, or `DifficultyTooHigh`
    /// when no block could ever be mined
    pub fn with_config(config: LedgerConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::from_config(config))
    }

    fn from_config(config: LedgerConfig) -> Self {
        Blockchain {
            chain: vec![Self::create_genesis_block()],
            pending_transactions: Vec::new(),
            difficulty: config.difficulty,
            mining_reward: config.mining_reward,
        }
    }

    fn create_genesis_block() -> Block {
        Block::genesis()
    }

    /// All blocks, genesis first
    pub fn chain(&self) -> &[Block] {
        &self.chain
    }

    /// Transactions accepted but not yet mined
    pub fn pending_transactions(&self) -> &[Transaction] {
        &self.pending_transactions
    }

    /// Leading zero hex digits required of each mined block
    pub fn difficulty(&self) -> usize {
        self.difficulty
    }

    /// Amount credited to the miner of each block
    pub fn mining_reward(&self) -> Amount {
        self.mining_reward
    }

    /// The block new blocks are linked to
    pub fn get_latest_block(&self) -> &Block {
        self.chain
            .last()
            .expect("chain always contains the genesis block")
    }

    /// Queues a signed transaction for the next block.
    ///
    /// Rewards cannot be submitted: both addresses must be present.
    pub fn add_transaction(&mut self, transaction: Transaction) -> Result<(), LedgerError> {
        let has_sender = transaction
            .from_address
            .as_ref()
            .is_some_and(|from| !from.is_empty());
        if !has_sender || transaction.to_address.is_empty() {
            warn!("Rejected transaction without sender or recipient");
            return Err(LedgerError::InvalidTransaction(
                "Transaction must include from and to address".to_string(),
            ));
        }

        if !transaction.verify()? {
            warn!("Rejected transaction {} with a bad signature", transaction.compute_hash());
            return Err(LedgerError::InvalidTransaction(
                "Cannot add invalid transaction to chain".to_string(),
            ));
        }

        debug!("Accepted transaction {}", transaction.compute_hash());
        self.pending_transactions.push(transaction);

        Ok(())
    }

    /// Pays the miner, mines every pending transaction into a new block and
    /// appends it. Blocks until the proof of work is found.
    pub fn mine_pending_transactions(&mut self, mining_reward_address: Address) -> &Block {
        self.pending_transactions
            .push(Transaction::reward(mining_reward_address, self.mining_reward));

        let transactions = std::mem::take(&mut self.pending_transactions);
        let previous_hash = self.get_latest_block().hash.clone();

        let mut block = Block::new(Utc::now().timestamp_millis(), transactions, previous_hash);
        block.mine(self.difficulty);

        info!(
            "Block {} appended with {} transactions",
            self.chain.len(),
            block.transactions.len()
        );
        self.chain.push(block);

        self.get_latest_block()
    }

    /// Credits minus debits over every mined transaction; the pool is ignored
    pub fn get_balance_of_address(&self, address: &Address) -> Balance {
        let mut balance: Balance = 0;

        for block in &self.chain {
            for tx in &block.transactions {
                if tx.from_address.as_ref() == Some(address) {
                    balance -= Balance::from(tx.amount);
                }
                if &tx.to_address == address {
                    balance += Balance::from(tx.amount);
                }
            }
        }

        balance
    }

    /// Re-checks every block after genesis: its transactions, its own hash
    /// and its link to the predecessor, in that order.
    pub fn validate(&self) -> Result<(), ChainViolation> {
        for index in 1..self.chain.len() {
            let current = &self.chain[index];
            let previous = &self.chain[index - 1];

            let violation = if !current.has_valid_transactions() {
                Some(ChainViolation::InvalidTransactions { index })
            } else if current.hash != current.compute_hash() {
                Some(ChainViolation::HashMismatch { index })
            } else if current.previous_hash != previous.hash {
                Some(ChainViolation::BrokenLink { index })
            } else {
                None
            };

            if let Some(violation) = violation {
                warn!("Chain is invalid: {}", violation);
                return Err(violation);
            }
        }

        Ok(())
    }

    /// Whether `validate` finds no violation
    pub fn is_chain_valid(&self) -> bool {
        self.validate().is_ok()
    }

    /// Mutable access to a mined block, bypassing every ledger invariant.
    ///
    /// Exists only to demonstrate and test tamper detection; nothing the
    /// ledger does itself goes through here. The genesis block is never
    /// handed out, so index 0 yields `None`.
    pub fn force_block_mut(&mut self, index: usize) -> Option<&mut Block> {
        if index == 0 {
            return None;
        }
        self.chain.get_mut(index)
    }
}

impl Default for Blockchain {
    fn default() -> Self {
        Self::new()
    }
}
