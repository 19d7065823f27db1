use chrono::{DateTime, Utc};
use ln_merkle::MerkleTree;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use ln_transaction::Transaction;

use crate::config::ChainConfig;

/// Render `unix_timestamp` the way a block's human-readable `timestamp`
/// field is derived: a UTC `DateTime`'s default `Display` form.
fn human_timestamp(unix_timestamp: f64) -> String {
    let secs = unix_timestamp.trunc() as i64;
    let nanos = (unix_timestamp.fract() * 1_000_000_000.0).round().clamp(0.0, 999_999_999.0) as u32;
    DateTime::<Utc>::from_timestamp(secs, nanos)
        .map(|dt| dt.to_string())
        .unwrap_or_default()
}

/// A single block: a batch of transactions committed behind a
/// proof-of-work hash that chains to the previous block.
///
/// `hashcode` is set once, by [`Block::mine`], and is never recomputed
/// automatically afterwards — [`Block::is_valid`] always recomputes the
/// hash fresh from the current field values rather than trusting the
/// stored one, so a tampered `hashcode` alone does not make a block
/// invalid; only a hash that no longer meets the difficulty target does.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Block {
    pub index: u64,
    pub transactions: Vec<Transaction>,
    pub previous_hash: String,
    /// Human-readable creation time, derived from `unix_timestamp`.
    pub timestamp: String,
    /// Real-valued Unix timestamp (seconds) at creation.
    pub unix_timestamp: f64,
    pub nonce: u64,
    pub miner: String,
    pub hashcode: String,
}

impl Block {
    /// Build an unmined block. Callers must call [`Block::mine`] before the
    /// block is valid.
    pub fn new(
        index: u64,
        transactions: Vec<Transaction>,
        previous_hash: String,
        miner: String,
        unix_timestamp: f64,
    ) -> Self {
        Self {
            index,
            transactions,
            previous_hash,
            timestamp: human_timestamp(unix_timestamp),
            unix_timestamp,
            nonce: 0,
            miner,
            hashcode: String::new(),
        }
    }

    /// Sorted-key JSON over every field except `hashcode`. Transactions are
    /// represented by their own canonical form, not the wire form, so a
    /// signature re-encoding never perturbs the block hash.
    fn pre_hash_json(&self) -> String {
        let transactions: Vec<String> = self.transactions.iter().map(Transaction::canonical).collect();
        serde_json::json!({
            "index": self.index,
            "miner": self.miner,
            "nonce": self.nonce,
            "previous_hash": self.previous_hash,
            "timestamp": self.timestamp,
            "transactions": transactions,
            "unix_timestamp": self.unix_timestamp,
        })
        .to_string()
    }

    /// Recompute this block's hash from its current fields. Does not read
    /// `hashcode`.
    pub fn compute_hash(&self) -> String {
        hex::encode(Sha256::digest(self.pre_hash_json().as_bytes()))
    }

    /// Proof-of-work: increment `nonce` until `compute_hash` has
    /// `difficulty` leading zero characters, then store the result in
    /// `hashcode`.
    ///
    /// CPU-bound and unbounded in the worst case — callers must run this
    /// without holding any shared lock.
    pub fn mine(&mut self, difficulty: usize) {
        let target = "0".repeat(difficulty);
        loop {
            let hash = self.compute_hash();
            if hash.starts_with(&target) {
                self.hashcode = hash;
                return;
            }
            self.nonce += 1;
        }
    }

    /// A block is valid when its freshly recomputed hash meets the
    /// difficulty target and it does not exceed the transaction cap. The
    /// stored `hashcode` field is never consulted here.
    pub fn is_valid(&self, config: &ChainConfig) -> bool {
        if self.transactions.len() > config.max_block_transactions {
            return false;
        }
        let target = "0".repeat(config.block_difficulty);
        self.compute_hash().starts_with(&target)
    }

    /// The Merkle root over this block's transactions, keyed by each
    /// transaction's canonical-form leaf hash. `None` for an (otherwise
    /// disallowed) block with zero transactions.
    pub fn merkle_root(&self) -> Option<String> {
        let leaves: Vec<String> = self.transactions.iter().map(Transaction::leaf_hash).collect();
        MerkleTree::new(&leaves).root().map(str::to_string)
    }

    /// The genesis block: a single mint transaction from the all-zero
    /// address (as long as `miner`'s own address string) to `miner`,
    /// for `config.initial_currency_supply`.
    pub fn genesis(config: &ChainConfig, miner: String, unix_timestamp: f64) -> Self {
        let zero_sender = "0".repeat(miner.len());
        let mint = Transaction::new(
            zero_sender,
            miner.clone(),
            config.initial_currency_supply,
            config.genesis_block_fee,
            unix_timestamp,
        );

        let mut block = Self::new(0, vec![mint], "0".to_string(), miner, unix_timestamp);
        block.mine(config.block_difficulty);
        block
    }
}
