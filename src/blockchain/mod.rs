// Blockchain module
//
// This module contains the ledger engine:
// - Transaction signing and verification
// - Block hashing and proof of work
// - The chain itself: submission, mining, balances and validation
// - Ledger parameters and a thread-safe handle

pub mod block;
pub mod chain;
pub mod config;
pub mod crypto;
pub mod shared;
pub mod transaction;

// Re-export main components for easier access
pub use block::Block;
pub use chain::{Balance, Blockchain, ChainViolation, LedgerError};
pub use config::{ConfigError, LedgerConfig};
pub use crypto::{Address, CryptoError, DigitalSignature, Wallet};
pub use shared::SharedLedger;
pub use transaction::{Amount, Transaction, TransactionError};
