use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::block::Block;
use super::chain::{Balance, Blockchain, ChainViolation, LedgerError};
use super::crypto::Address;
use super::transaction::Transaction;

/// A cloneable handle to one ledger shared between threads.
///
/// A single lock covers both the chain and the pending pool, so submissions
/// never interleave with the pool reset and two miners never build on the
/// same latest block.
#[derive(Debug, Clone, Default)]
pub struct SharedLedger {
    inner: Arc<Mutex<Blockchain>>,
}

impl SharedLedger {
    /// Wraps a ledger for sharing
    ///
    /// # Arguments
    ///
    /// * `blockchain` - The ledger every clone of the handle will operate on
    ///
    /// # Returns
    ///
    /// A new SharedLedger
    pub fn new(blockchain: Blockchain) -> Self {
        SharedLedger {
            inner: Arc::new(Mutex::new(blockchain)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Blockchain> {
        // A panic mid-mine leaves the chain untouched: the block is pushed last.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Queues a signed transaction; see `Blockchain::add_transaction`
    pub fn add_transaction(&self, transaction: Transaction) -> Result<(), LedgerError> {
        self.lock().add_transaction(transaction)
    }

    /// Mines while holding the lock; every other caller waits
    pub fn mine_pending_transactions(&self, mining_reward_address: Address) -> Block {
        self.lock()
            .mine_pending_transactions(mining_reward_address)
            .clone()
    }

    /// Credits minus debits of `address` across the chain
    pub fn get_balance_of_address(&self, address: &Address) -> Balance {
        self.lock().get_balance_of_address(address)
    }

    /// Finds the first broken block, if any
    pub fn validate(&self) -> Result<(), ChainViolation> {
        self.lock().validate()
    }

    /// Whether the chain passes every check
    pub fn is_chain_valid(&self) -> bool {
        self.lock().is_chain_valid()
    }

    /// Snapshot of the chain
    pub fn chain(&self) -> Vec<Block> {
        self.lock().chain().to_vec()
    }

    /// Snapshot of the pending pool
    pub fn pending_transactions(&self) -> Vec<Transaction> {
        self.lock().pending_transactions().to_vec()
    }

    /// Runs `f` with exclusive access to the ledger
    pub fn with_ledger<R>(&self, f: impl FnOnce(&mut Blockchain) -> R) -> R {
        f(&mut *self.lock())
    }
}

impl From<Blockchain> for SharedLedger {
    fn from(blockchain: Blockchain) -> Self {
        Self::new(blockchain)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::config::LedgerConfig;
    use crate::blockchain::crypto::Wallet;
    use std::thread;

    fn shared() -> SharedLedger {
        SharedLedger::new(Blockchain::with_config(LedgerConfig {
            difficulty: 1,
            mining_reward: 100,
        })
        .unwrap())
    }

    #[test]
    fn test_concurrent_miners_keep_links_intact() {
        let ledger = shared();
        let miners: Vec<Wallet> = (0..4).map(|_| Wallet::new()).collect();

        let handles: Vec<_> = miners
            .iter()
            .map(|miner| {
                let ledger = ledger.clone();
                let address = miner.address().clone();
                thread::spawn(move || {
                    for _ in 0..3 {
                        ledger.mine_pending_transactions(address.clone());
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(ledger.chain().len(), 13);
        assert_eq!(ledger.validate(), Ok(()));
        for miner in &miners {
            assert_eq!(ledger.get_balance_of_address(miner.address()), 300);
        }
    }

    #[test]
    fn test_submissions_and_mining_do_not_lose_transactions() {
        let ledger = shared();
        let alice = Wallet::new();
        let bob = Wallet::new();
        let miner = Wallet::new();

        let submitter = {
            let ledger = ledger.clone();
            let alice = alice.clone();
            let bob = bob.clone();
            thread::spawn(move || {
                for _ in 0..20 {
                    let mut tx = Transaction::new(alice.address().clone(), bob.address().clone(), 1);
                    tx.sign(alice.signing_key()).unwrap();
                    ledger.add_transaction(tx).unwrap();
                }
            })
        };
        for _ in 0..5 {
            ledger.mine_pending_transactions(miner.address().clone());
        }
        submitter.join().unwrap();
        ledger.mine_pending_transactions(miner.address().clone());

        assert!(ledger.pending_transactions().is_empty());
        assert_eq!(ledger.get_balance_of_address(bob.address()), 20);
        assert_eq!(ledger.get_balance_of_address(alice.address()), -20);
        assert!(ledger.is_chain_valid());
    }

    #[test]
    fn test_with_ledger_gives_exclusive_access() {
        let ledger = shared();
        let miner = Wallet::new();
        ledger.mine_pending_transactions(miner.address().clone());

        ledger.with_ledger(|chain| {
            chain.force_block_mut(1).unwrap().transactions[0].amount = 1;
        });

        assert_eq!(
            ledger.validate(),
            Err(ChainViolation::HashMismatch { index: 1 })
        );
    }
}
