use std::collections::HashMap;
use std::time::{SystemTime, UNIX_EPOCH};

use ln_transaction::Transaction;

fn now_unix_seconds() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock before 1970")
        .as_secs_f64()
}

fn seconds_to_days(seconds: f64) -> f64 {
    seconds / 60.0 / 60.0 / 24.0
}

/// Pending, unconfirmed transactions, keyed by their wire-form JSON text so
/// that resubmitting byte-identical wire bytes is a no-op.
#[derive(Debug, Default)]
pub struct Mempool {
    entries: HashMap<String, Transaction>,
}

impl Mempool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `tx` keyed by its wire-form text. Returns `true` if this
    /// wire form was not already present.
    pub fn insert(&mut self, tx: Transaction) -> bool {
        let key = serde_json::to_string(&tx.to_wire()).expect("wire form always serializes");
        let is_new = !self.entries.contains_key(&key);
        self.entries.insert(key, tx);
        is_new
    }

    pub fn transactions(&self) -> Vec<Transaction> {
        self.entries.values().cloned().collect()
    }

    pub fn remove_all(&mut self, txs: &[Transaction]) {
        for tx in txs {
            let key = serde_json::to_string(&tx.to_wire()).expect("wire form always serializes");
            self.entries.remove(&key);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop transactions older than `max_days`, and — when `new_chain` is
    /// set, after a chain replacement — transactions already present in
    /// any non-genesis block, per `is_executed`.
    pub fn cleanup(&mut self, max_days: f64, new_chain: bool, is_executed: impl Fn(&Transaction) -> bool) {
        let now = now_unix_seconds();
        self.entries.retain(|_, tx| {
            let age_days = seconds_to_days(now - tx.timestamp);
            if age_days > max_days {
                return false;
            }
            if new_chain && is_executed(tx) {
                return false;
            }
            true
        });
    }
}
