//! An in-memory ledger of signed value transfers ("votes"), grouped into
//! proof-of-work blocks and chained by SHA-256 hashes.

pub mod blockchain;

pub use blockchain::{
    Address, Block, Blockchain, ChainViolation, LedgerConfig, LedgerError, SharedLedger,
    Transaction, TransactionError, Wallet,
};
