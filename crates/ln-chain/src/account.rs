use ln_merkle::{verify_proof, MerkleTree};
use ln_transaction::Transaction;

use crate::block::Block;

/// The result of [`crate::Chain::generate_inclusion_proof`]: the
/// transaction itself, its index within the block, and the Merkle proof
/// tying it to that block's root.
#[derive(Debug, Clone)]
pub struct InclusionProof {
    pub transaction: Transaction,
    pub tx_index: usize,
    pub proof: Vec<String>,
}

/// The balance of `address` as observed across `chain`: debited
/// `amount + fee` on every transaction it sent, credited `amount` on every
/// transaction it received, and credited the summed `fee` of every
/// transaction in any block it mined.
pub fn balance_of(chain: &[Block], address: &str) -> i64 {
    let mut balance: i64 = 0;

    for block in chain {
        for tx in &block.transactions {
            if tx.sender == address {
                balance -= (tx.amount + tx.fee) as i64;
            }
            if tx.receiver == address {
                balance += tx.amount as i64;
            }
            if block.miner == address {
                balance += tx.fee as i64;
            }
        }
    }

    balance
}

/// Build an inclusion proof for the transaction at `index` within `block`.
pub fn generate_inclusion_proof(block: &Block, index: usize) -> Option<Vec<String>> {
    let leaves: Vec<String> = block.transactions.iter().map(|t| t.leaf_hash()).collect();
    let tree = MerkleTree::new(&leaves);
    tree.proof(index).ok()
}

/// Verify that `leaf_hash` at `index` is included under `root` per `proof`.
pub fn verify_inclusion(leaf_hash: &str, index: usize, proof: &[String], root: &str) -> bool {
    match proof.last() {
        Some(claimed_root) if claimed_root == root => verify_proof(leaf_hash, index, proof),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ChainConfig;
    use ln_transaction::Transaction;

    #[test]
    fn genesis_mint_credits_the_miner() {
        let config = ChainConfig {
            block_difficulty: 1,
            ..ChainConfig::default()
        };
        let genesis = Block::genesis(&config, "alice".to_string(), 0.0);
        assert_eq!(balance_of(&[genesis], "alice"), config.initial_currency_supply as i64);
    }

    #[test]
    fn sender_is_debited_amount_plus_fee_receiver_credited_amount() {
        let mut block = Block::new(
            1,
            vec![Transaction::new("alice".into(), "bob".into(), 100, 5, 0.0)],
            "0".into(),
            "miner".into(),
            0.0,
        );
        block.mine(1);
        assert_eq!(balance_of(&[block.clone()], "alice"), -105);
        assert_eq!(balance_of(&[block.clone()], "bob"), 100);
        assert_eq!(balance_of(&[block], "miner"), 5);
    }

    #[test]
    fn inclusion_proof_verifies_against_the_block_root() {
        let mut block = Block::new(
            1,
            vec![
                Transaction::new("alice".into(), "bob".into(), 10, 1, 0.0),
                Transaction::new("bob".into(), "carol".into(), 5, 1, 1.0),
            ],
            "0".into(),
            "miner".into(),
            0.0,
        );
        block.mine(1);

        let leaves: Vec<String> = block.transactions.iter().map(|t| t.leaf_hash()).collect();
        let root = MerkleTree::new(&leaves).root().unwrap().to_string();

        let proof = generate_inclusion_proof(&block, 0).unwrap();
        assert!(verify_inclusion(&leaves[0], 0, &proof, &root));
    }

    #[test]
    fn tampered_leaf_fails_inclusion() {
        let mut block = Block::new(
            1,
            vec![
                Transaction::new("alice".into(), "bob".into(), 10, 1, 0.0),
                Transaction::new("bob".into(), "carol".into(), 5, 1, 1.0),
            ],
            "0".into(),
            "miner".into(),
            0.0,
        );
        block.mine(1);

        let leaves: Vec<String> = block.transactions.iter().map(|t| t.leaf_hash()).collect();
        let root = MerkleTree::new(&leaves).root().unwrap().to_string();
        let proof = generate_inclusion_proof(&block, 0).unwrap();

        assert!(!verify_inclusion("deadbeef", 0, &proof, &root));
    }
}
