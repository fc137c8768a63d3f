use ed25519_dalek::SigningKey;
use log::debug;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

use super::crypto::{sign_message, verify_signature, Address, DigitalSignature};

/// Units of value moved by a transaction
pub type Amount = u64;

/// Errors that can occur during transaction operations
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransactionError {
    #[error("Cannot sign transactions for other wallets")]
    UnauthorizedSigner,

    #[error("No signature in this transaction")]
    MissingSignature,
}

/// A transfer of value (a vote) between two addresses
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Sender's address, `None` for rewards issued by the ledger
    pub from_address: Option<Address>,

    /// Recipient's address
    pub to_address: Address,

    /// Amount being transferred
    pub amount: Amount,

    /// Sender's signature over `compute_hash()`
    pub signature: Option<DigitalSignature>,
}

impl Transaction {
    /// Creates a new unsigned transaction
    ///
    /// # Arguments
    ///
    /// * `from_address` - The sender, who must sign before submitting
    /// * `to_address` - The recipient
    /// * `amount` - The amount to transfer
    ///
    /// # Returns
    ///
    /// A new Transaction with no signature
    pub fn new(from_address: Address, to_address: Address, amount: Amount) -> Self {
        Transaction {
            from_address: Some(from_address),
            to_address,
            amount,
            signature: None,
        }
    }

    /// Creates a reward transaction with no sender
    pub fn reward(to_address: Address, amount: Amount) -> Self {
        Transaction {
            from_address: None,
            to_address,
            amount,
            signature: None,
        }
    }

    /// Whether the ledger issued this transaction as a mining reward
    pub fn is_reward(&self) -> bool {
        self.from_address.is_none()
    }

    /// SHA-256 over `from ‖ to ‖ amount`, hex encoded.
    ///
    /// The signature is not covered, so the hash is stable across signing.
    pub fn compute_hash(&self) -> String {
        let mut hasher = Sha256::new();
        if let Some(from) = &self.from_address {
            hasher.update(from.as_str().as_bytes());
        }
        hasher.update(self.to_address.as_str().as_bytes());
        hasher.update(self.amount.to_string().as_bytes());
        hex::encode(hasher.finalize())
    }

    /// Signs the transaction with the sender's private key.
    ///
    /// Fails with `UnauthorizedSigner`, leaving the transaction unsigned, when
    /// the key does not belong to `from_address`.
    pub fn sign(&mut self, signing_key: &SigningKey) -> Result<(), TransactionError> {
        let signer = Address::from_public_key(&signing_key.verifying_key());
        if self.from_address.as_ref() != Some(&signer) {
            return Err(TransactionError::UnauthorizedSigner);
        }

        let hash = self.compute_hash();
        self.signature = Some(sign_message(signing_key, hash.as_bytes()));

        Ok(())
    }

    /// Checks the signature against the sender's public key.
    ///
    /// Rewards are always valid. An undecodable address or signature is
    /// reported as `Ok(false)`.
    pub fn verify(&self) -> Result<bool, TransactionError> {
        let from = match &self.from_address {
            Some(from) => from,
            None => return Ok(true),
        };

        let signature = self
            .signature
            .as_ref()
            .ok_or(TransactionError::MissingSignature)?;

        let public_key = match from.to_public_key() {
            Ok(key) => key,
            Err(err) => {
                debug!("Sender {} is not a valid public key: {}", from, err);
                return Ok(false);
            }
        };

        let hash = self.compute_hash();
        match verify_signature(hash.as_bytes(), signature, &public_key) {
            Ok(valid) => Ok(valid),
            Err(err) => {
                debug!("Malformed signature from {}: {}", from, err);
                Ok(false)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::crypto::Wallet;

    #[test]
    fn test_new_transaction() {
        let sender = Wallet::new();
        let recipient = Wallet::new();

        let transaction = Transaction::new(sender.address().clone(), recipient.address().clone(), 10);

        assert_eq!(transaction.from_address.as_ref(), Some(sender.address()));
        assert_eq!(&transaction.to_address, recipient.address());
        assert_eq!(transaction.amount, 10);
        assert!(transaction.signature.is_none());
        assert!(!transaction.is_reward());
    }

    #[test]
    fn test_hash_is_deterministic_and_covers_amount() {
        let sender = Wallet::new();
        let recipient = Wallet::new();
        let tx = Transaction::new(sender.address().clone(), recipient.address().clone(), 10);

        assert_eq!(tx.compute_hash(), tx.clone().compute_hash());
        assert_eq!(tx.compute_hash().len(), 64);

        let mut changed = tx.clone();
        changed.amount = 11;
        assert_ne!(tx.compute_hash(), changed.compute_hash());
    }

    #[test]
    fn test_sign_transaction() {
        let sender = Wallet::new();
        let recipient = Wallet::new();
        let mut tx = Transaction::new(sender.address().clone(), recipient.address().clone(), 10);

        tx.sign(sender.signing_key()).unwrap();

        assert!(tx.signature.is_some());
        assert_eq!(tx.verify(), Ok(true));
    }

    #[test]
    fn test_sign_with_other_key_is_unauthorized() {
        let sender = Wallet::new();
        let intruder = Wallet::new();
        let mut tx = Transaction::new(sender.address().clone(), intruder.address().clone(), 10);

        assert_eq!(
            tx.sign(intruder.signing_key()),
            Err(TransactionError::UnauthorizedSigner)
        );
        assert!(tx.signature.is_none());
    }

    #[test]
    fn test_reward_cannot_be_signed() {
        let miner = Wallet::new();
        let mut tx = Transaction::reward(miner.address().clone(), 100);

        assert_eq!(
            tx.sign(miner.signing_key()),
            Err(TransactionError::UnauthorizedSigner)
        );
    }

    #[test]
    fn test_verify_unsigned_transaction() {
        let sender = Wallet::new();
        let recipient = Wallet::new();
        let tx = Transaction::new(sender.address().clone(), recipient.address().clone(), 10);

        assert_eq!(tx.verify(), Err(TransactionError::MissingSignature));
    }

    #[test]
    fn test_reward_transaction_is_trusted() {
        let miner = Wallet::new();
        let tx = Transaction::reward(miner.address().clone(), 100);

        assert!(tx.is_reward());
        assert_eq!(tx.verify(), Ok(true));
    }

    #[test]
    fn test_amount_change_invalidates_signature() {
        let sender = Wallet::new();
        let recipient = Wallet::new();
        let mut tx = Transaction::new(sender.address().clone(), recipient.address().clone(), 10);
        tx.sign(sender.signing_key()).unwrap();

        tx.amount = 1000;

        assert_eq!(tx.verify(), Ok(false));
    }

    #[test]
    fn test_undecodable_sender_verifies_false() {
        let recipient = Wallet::new();
        let mut tx = Transaction::new(Address("0OIl".to_string()), recipient.address().clone(), 1);
        tx.signature = Some(DigitalSignature("abc".to_string()));

        assert_eq!(tx.verify(), Ok(false));
    }
}
