use std::collections::HashMap;

use ln_transaction::Transaction;

use crate::{account, block::Block, config::ChainConfig, error::BlockchainError};

/// The append-only chain of [`Block`]s, plus the admission-filter and
/// replacement logic that governs which blocks ever get appended.
///
/// A `Chain` never holds a lock itself — callers (`ln-node`) wrap a `Chain`
/// in a `Mutex` and are responsible for never running [`Block::mine`] while
/// that lock is held.
#[derive(Debug, Clone)]
pub struct Chain {
    config: ChainConfig,
    chain: Vec<Block>,
}

impl Chain {
    /// Create a fresh chain with a mined genesis block minting
    /// `config.initial_currency_supply` to `miner`.
    pub fn new(config: ChainConfig, miner: String, timestamp: f64) -> Self {
        let genesis = Block::genesis(&config, miner, timestamp);
        Self {
            config,
            chain: vec![genesis],
        }
    }

    pub fn config(&self) -> &ChainConfig {
        &self.config
    }

    pub fn len(&self) -> usize {
        self.chain.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chain.is_empty()
    }

    pub fn tip(&self) -> &Block {
        self.chain.last().expect("chain always has a genesis block")
    }

    pub fn blocks(&self) -> &[Block] {
        &self.chain
    }

    pub fn get_block(&self, index: u64) -> Option<&Block> {
        self.chain.get(index as usize)
    }

    pub fn balance_of(&self, address: &str) -> i64 {
        account::balance_of(&self.chain, address)
    }

    /// Build an inclusion proof for the transaction at `tx_index` within
    /// the block at `block_index`. `None` if either index is out of range.
    pub fn generate_inclusion_proof(&self, block_index: u64, tx_index: usize) -> Option<account::InclusionProof> {
        let block = self.get_block(block_index)?;
        let transaction = block.transactions.get(tx_index)?.clone();
        let proof = account::generate_inclusion_proof(block, tx_index)?;
        Some(account::InclusionProof {
            transaction,
            tx_index,
            proof,
        })
    }

    /// Recompute `transaction`'s leaf hash and check it is included, at
    /// `tx_index`, under `chain[block_index]`'s Merkle root, per `proof`.
    pub fn verify_inclusion(&self, block_index: u64, tx_index: usize, transaction: &Transaction, proof: &[String]) -> bool {
        let Some(block) = self.get_block(block_index) else {
            return false;
        };
        let Some(root) = block.merkle_root() else {
            return false;
        };
        account::verify_inclusion(&transaction.leaf_hash(), tx_index, proof, &root)
    }

    /// A block is individually well-formed: recomputed hash meets the
    /// difficulty target and the transaction count is within bounds. Does
    /// not check chain linkage — see [`Chain::is_chain_valid`].
    pub fn is_block_valid(&self, block: &Block) -> bool {
        block.is_valid(&self.config)
    }

    /// Fee-descending admission filter. Repeatedly takes the top
    /// `max_block_transactions` candidates by fee, simulates applying them
    /// against current chain balances, and drops whichever senders would go
    /// negative — restarting until a full pass removes nothing.
    ///
    /// A receiver's running balance is only tracked (and credited) if that
    /// receiver already appears as a sender earlier in the same batch; a
    /// receiver who sends nothing in this batch is not credited until the
    /// block actually lands on the chain. This mirrors the reference
    /// implementation exactly rather than "fixing" what looks like a bias
    /// toward senders who are also receivers within the batch.
    pub fn create_block_transactions(&self, transactions: &[Transaction]) -> Vec<Transaction> {
        let mut sorted: Vec<Transaction> = transactions.to_vec();
        sorted.sort_by(|a, b| b.fee.cmp(&a.fee));
        self.top_possible_transactions(sorted)
    }

    fn top_possible_transactions(&self, mut sorted_transactions: Vec<Transaction>) -> Vec<Transaction> {
        loop {
            let possible: Vec<Transaction> = sorted_transactions
                .iter()
                .take(self.config.max_block_transactions)
                .cloned()
                .collect();

            let mut balances: HashMap<String, i64> = HashMap::new();
            for t in &possible {
                balances
                    .entry(t.sender.clone())
                    .or_insert_with(|| self.balance_of(&t.sender));
            }

            let mut bad_indices = Vec::new();
            for (i, t) in possible.iter().enumerate() {
                if let Some(bal) = balances.get_mut(&t.receiver) {
                    *bal += t.amount as i64;
                }
                let sender_balance = balances.get_mut(&t.sender).expect("seeded above");
                *sender_balance -= (t.amount + t.fee) as i64;
                if *sender_balance < 0 {
                    *sender_balance += (t.amount + t.fee) as i64;
                    bad_indices.push(i);
                }
            }

            if bad_indices.is_empty() {
                return possible;
            }

            for i in bad_indices.into_iter().rev() {
                let bad = possible[i].clone();
                if let Some(pos) = sorted_transactions.iter().position(|t| *t == bad) {
                    sorted_transactions.remove(pos);
                }
            }
        }
    }

    /// Assemble an unmined candidate block over the admission-filtered
    /// subset of `candidates`. The caller mines it (outside any lock) and
    /// then calls [`Chain::add_block`].
    pub fn build_block(&self, miner: String, candidates: &[Transaction], timestamp: f64) -> (Block, Vec<Transaction>) {
        let selected = self.create_block_transactions(candidates);
        let block = Block::new(
            self.tip().index + 1,
            selected.clone(),
            self.tip().hashcode.clone(),
            miner,
            timestamp,
        );
        (block, selected)
    }

    /// Append an already-mined `block`. Rejects it (without mutating
    /// anything) if it does not extend the current tip or fails
    /// [`Chain::is_block_valid`].
    pub fn add_block(&mut self, block: Block) -> Result<(), BlockchainError> {
        if block.index != self.tip().index + 1 || block.previous_hash != self.tip().hashcode {
            return Err(BlockchainError::BadChain);
        }
        if !self.is_block_valid(&block) {
            return Err(BlockchainError::BlockTooLarge);
        }
        self.chain.push(block);
        Ok(())
    }

    /// Validate chain linkage and each non-genesis block: `previous_hash`
    /// must equal the *stored* `hashcode` of the prior block (the genesis
    /// block itself is never re-validated, only used as the first link).
    pub fn is_chain_valid(&self, chain: &[Block]) -> bool {
        if chain.is_empty() {
            return false;
        }
        let mut previous = &chain[0];
        for block in &chain[1..] {
            if block.previous_hash != previous.hashcode {
                return false;
            }
            if !self.is_block_valid(block) {
                return false;
            }
            previous = block;
        }
        true
    }

    /// Replace the local chain with `candidate` if it is strictly longer
    /// (ties are rejected) and structurally valid.
    pub fn replace_chain(&mut self, candidate: Vec<Block>) -> Result<bool, BlockchainError> {
        if candidate.len() <= self.chain.len() {
            return Ok(false);
        }
        if !self.is_chain_valid(&candidate) {
            return Err(BlockchainError::BadChain);
        }
        self.chain = candidate;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ChainConfig {
        ChainConfig {
            block_difficulty: 1,
            max_block_transactions: 2,
            initial_currency_supply: 1000,
            genesis_block_fee: 0,
        }
    }

    #[test]
    fn new_chain_has_a_valid_genesis_block() {
        let chain = Chain::new(config(), "miner".to_string(), 0.0);
        assert_eq!(chain.len(), 1);
        assert_eq!(chain.balance_of("miner"), 1000);
    }

    #[test]
    fn add_block_extends_and_updates_balances() {
        let mut chain = Chain::new(config(), "miner".to_string(), 0.0);
        let tx = Transaction::new("miner".into(), "alice".into(), 100, 1, 1.0);
        let (mut block, selected) = chain.build_block("miner".to_string(), &[tx], 1.0);
        assert_eq!(selected.len(), 1);
        block.mine(chain.config().block_difficulty);
        chain.add_block(block).unwrap();

        assert_eq!(chain.len(), 2);
        assert_eq!(chain.balance_of("alice"), 100);
        assert_eq!(chain.balance_of("miner"), 1000 - 101 + 1);
    }

    #[test]
    fn admission_filter_drops_a_transaction_that_would_overdraw() {
        let chain = Chain::new(config(), "miner".to_string(), 0.0);
        let impossible = Transaction::new("nobody".into(), "alice".into(), 999_999, 5, 0.0);
        let affordable = Transaction::new("miner".into(), "bob".into(), 10, 1, 1.0);
        let selected = chain.create_block_transactions(&[impossible.clone(), affordable.clone()]);
        assert_eq!(selected, vec![affordable]);
    }

    #[test]
    fn admission_filter_respects_the_block_size_cap() {
        let chain = Chain::new(config(), "miner".to_string(), 0.0);
        let txs: Vec<Transaction> = (0..5)
            .map(|i| Transaction::new("miner".into(), format!("r{i}"), 1, i as u64, i as f64))
            .collect();
        let selected = chain.create_block_transactions(&txs);
        assert!(selected.len() <= config().max_block_transactions);
    }

    #[test]
    fn replace_chain_rejects_equal_length() {
        let mut chain = Chain::new(config(), "miner".to_string(), 0.0);
        let same_length = chain.blocks().to_vec();
        assert_eq!(chain.replace_chain(same_length).unwrap(), false);
    }

    #[test]
    fn replace_chain_accepts_a_longer_valid_chain() {
        let mut chain = Chain::new(config(), "miner".to_string(), 0.0);
        let tx = Transaction::new("miner".into(), "alice".into(), 10, 1, 1.0);
        let (mut block, _) = chain.build_block("miner".to_string(), &[tx], 1.0);
        block.mine(chain.config().block_difficulty);

        let mut longer = chain.blocks().to_vec();
        longer.push(block);

        assert!(chain.replace_chain(longer.clone()).unwrap());
        assert_eq!(chain.len(), 2);
    }

    #[test]
    fn replace_chain_rejects_a_chain_with_a_broken_link() {
        let mut chain = Chain::new(config(), "miner".to_string(), 0.0);
        let tx = Transaction::new("miner".into(), "alice".into(), 10, 1, 1.0);
        let (mut block, _) = chain.build_block("miner".to_string(), &[tx], 1.0);
        block.mine(chain.config().block_difficulty);
        block.previous_hash = "tampered".to_string();

        let mut longer = chain.blocks().to_vec();
        longer.push(block);

        assert!(chain.replace_chain(longer).is_err());
    }

    #[test]
    fn generate_and_verify_inclusion_by_block_index() {
        let mut chain = Chain::new(config(), "miner".to_string(), 0.0);
        let tx = Transaction::new("miner".into(), "alice".into(), 10, 1, 1.0);
        let (mut block, _) = chain.build_block("miner".to_string(), &[tx], 1.0);
        block.mine(chain.config().block_difficulty);
        chain.add_block(block).unwrap();

        let proof = chain.generate_inclusion_proof(1, 0).unwrap();
        assert!(chain.verify_inclusion(1, proof.tx_index, &proof.transaction, &proof.proof));
    }

    #[test]
    fn verify_inclusion_rejects_a_mutated_transaction() {
        let mut chain = Chain::new(config(), "miner".to_string(), 0.0);
        let tx = Transaction::new("miner".into(), "alice".into(), 10, 1, 1.0);
        let (mut block, _) = chain.build_block("miner".to_string(), &[tx], 1.0);
        block.mine(chain.config().block_difficulty);
        chain.add_block(block).unwrap();

        let mut proof = chain.generate_inclusion_proof(1, 0).unwrap();
        proof.transaction.amount += 1;
        assert!(!chain.verify_inclusion(1, proof.tx_index, &proof.transaction, &proof.proof));
    }
}
