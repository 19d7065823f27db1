use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::TransactionError;

/// A transfer of value from `sender` to `receiver`, signed by `sender`.
///
/// The canonical form — a sorted-key JSON object over exactly
/// `{sender, receiver, amount, fee, timestamp}` — is both the message a
/// node signs and the leaf value hashed into a block's Merkle tree. The
/// signature itself, and `fee` a second time, ride alongside on the wire
/// but are not part of that canonical text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub sender: String,
    pub receiver: String,
    pub amount: u64,
    pub fee: u64,
    /// Unix timestamp (seconds, fractional) at creation time.
    pub timestamp: f64,
    /// Present once `sender` has signed the canonical form.
    pub signature: Option<String>,
}

/// The over-the-wire representation: the canonical text plus a duplicated
/// `fee` (so a receiver can apply fee-based routing decisions without
/// re-parsing `serialized`) plus the signature.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionWire {
    pub serialized: String,
    pub fee: u64,
    pub signature: String,
}

impl Transaction {
    pub fn new(sender: String, receiver: String, amount: u64, fee: u64, timestamp: f64) -> Self {
        Self {
            sender,
            receiver,
            amount,
            fee,
            timestamp,
            signature: None,
        }
    }

    /// Sorted-key JSON text over `{sender, receiver, amount, fee,
    /// timestamp}` — the signing message and Merkle leaf input.
    pub fn canonical(&self) -> String {
        serde_json::json!({
            "amount": self.amount,
            "fee": self.fee,
            "receiver": self.receiver,
            "sender": self.sender,
            "timestamp": self.timestamp,
        })
        .to_string()
    }

    /// Hex SHA-256 digest of the canonical form — the Merkle leaf hash.
    pub fn leaf_hash(&self) -> String {
        hex::encode(Sha256::digest(self.canonical().as_bytes()))
    }

    /// Attach `signature` (hex-encoded) after checking it verifies against
    /// the canonical form under `sender`'s public key. `sender` doubles as
    /// its own public key string, so no separate key is supplied.
    pub fn add_signature(&mut self, signature: String) -> Result<(), TransactionError> {
        if !ln_crypto::verify(&self.canonical(), &signature, &self.sender) {
            return Err(TransactionError::BadTransaction);
        }
        self.signature = Some(signature);
        Ok(())
    }

    pub fn is_signed(&self) -> bool {
        self.signature.is_some()
    }

    /// Re-check the attached signature against the canonical form. Used by
    /// a receiving node before admitting a transaction it didn't sign
    /// itself.
    pub fn has_valid_signature(&self) -> bool {
        match &self.signature {
            Some(sig) => ln_crypto::verify(&self.canonical(), sig, &self.sender),
            None => false,
        }
    }

    pub fn to_wire(&self) -> TransactionWire {
        TransactionWire {
            serialized: self.canonical(),
            fee: self.fee,
            signature: self.signature.clone().unwrap_or_default(),
        }
    }

    /// Reconstruct a `Transaction` from its wire form, re-running signature
    /// verification against the reconstructed canonical form. Fails with
    /// `BadTransaction` if the signature does not verify.
    pub fn from_wire(wire: &TransactionWire) -> Result<Self, TransactionError> {
        let fields: serde_json::Value = serde_json::from_str(&wire.serialized)?;

        let field_str = |name: &str| -> Result<String, TransactionError> {
            fields
                .get(name)
                .and_then(|v| v.as_str())
                .map(str::to_string)
                .ok_or(TransactionError::BadTransaction)
        };
        let field_u64 = |name: &str| -> Result<u64, TransactionError> {
            fields
                .get(name)
                .and_then(|v| v.as_u64())
                .ok_or(TransactionError::BadTransaction)
        };
        let field_f64 = |name: &str| -> Result<f64, TransactionError> {
            fields
                .get(name)
                .and_then(|v| v.as_f64())
                .ok_or(TransactionError::BadTransaction)
        };

        let tx = Self {
            sender: field_str("sender")?,
            receiver: field_str("receiver")?,
            amount: field_u64("amount")?,
            fee: wire.fee,
            timestamp: field_f64("timestamp")?,
            signature: Some(wire.signature.clone()),
        };

        if !ln_crypto::verify(&wire.serialized, &wire.signature, &tx.sender) {
            return Err(TransactionError::BadTransaction);
        }

        Ok(tx)
    }
}
