use sha2::{Digest, Sha256};

use crate::error::MerkleError;

/// A Merkle tree over hex-ASCII leaf hashes.
///
/// Unlike a byte-oriented Merkle tree, pairing hashes the *textual hex
/// representation* of each sibling: `sha256(left_hex_string ++
/// right_hex_string)`, re-encoded to hex for the parent. This matches how
/// the reference ledger builds its transaction root, and lets a proof be
/// verified with nothing but string concatenation.
///
/// When the leaf count at a level is odd, the last leaf is paired with
/// itself rather than dropped.
#[derive(Debug, Clone)]
pub struct MerkleTree {
    /// `levels[0]` are the leaf hashes, `levels.last()` is the root (a
    /// single-element level). Empty when built from zero leaves.
    levels: Vec<Vec<String>>,
}

fn hash_pair(left: &str, right: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(left.as_bytes());
    hasher.update(right.as_bytes());
    hex::encode(hasher.finalize())
}

impl MerkleTree {
    /// Build a tree from already-hashed leaves (hex-ASCII strings).
    ///
    /// An empty slice yields a tree with zero layers; callers must check
    /// [`MerkleTree::root`] for `None` rather than treat this as an error —
    /// an empty block has no Merkle root, which is a valid (if degenerate)
    /// state.
    pub fn new(leaf_hashes: &[String]) -> Self {
        if leaf_hashes.is_empty() {
            return Self { levels: Vec::new() };
        }

        let mut levels = vec![leaf_hashes.to_vec()];
        let mut current = leaf_hashes.to_vec();

        while current.len() > 1 {
            if current.len() % 2 != 0 {
                current.push(current.last().unwrap().clone());
            }
            let next: Vec<String> = current
                .chunks(2)
                .map(|pair| hash_pair(&pair[0], &pair[1]))
                .collect();
            levels.push(next.clone());
            current = next;
        }

        Self { levels }
    }

    /// Number of layers, including the leaf layer and the root layer.
    /// Zero leaves yields zero layers; one leaf yields one layer (the leaf
    /// doubles as the root).
    pub fn layer_count(&self) -> usize {
        self.levels.len()
    }

    pub fn root(&self) -> Option<&str> {
        self.levels.last().and_then(|l| l.first()).map(String::as_str)
    }

    /// Build an inclusion proof for the leaf at `index`: a flat list of
    /// sibling hashes from leaf to root, with the root appended as the
    /// final element. Fold direction at verification time is derived from
    /// the leaf index's parity at each level, not stored here.
    pub fn proof(&self, index: usize) -> Result<Vec<String>, MerkleError> {
        let leaves = self.levels.first().ok_or(MerkleError::Empty)?;
        if index >= leaves.len() {
            return Err(MerkleError::NotFound);
        }

        let mut path = Vec::new();
        let mut idx = index;

        for level in &self.levels[..self.levels.len() - 1] {
            let mut padded = level.clone();
            if padded.len() % 2 != 0 {
                padded.push(padded.last().unwrap().clone());
            }
            let sibling_index = if idx % 2 == 0 { idx + 1 } else { idx - 1 };
            path.push(padded[sibling_index].clone());
            idx /= 2;
        }

        path.push(self.root().expect("non-empty tree has a root").to_string());
        Ok(path)
    }
}

/// Verify a proof produced by [`MerkleTree::proof`] against `leaf_hash` and
/// its original `index`. The last element of `proof` is taken as the
/// expected root; every earlier element is a sibling hash folded in at the
/// side determined by `index`'s parity at that level.
pub fn verify_proof(leaf_hash: &str, index: usize, proof: &[String]) -> bool {
    let Some((root, siblings)) = proof.split_last() else {
        return false;
    };

    let mut current = leaf_hash.to_string();
    let mut idx = index;
    for sibling in siblings {
        current = if idx % 2 == 0 {
            hash_pair(&current, sibling)
        } else {
            hash_pair(sibling, &current)
        };
        idx /= 2;
    }

    &current == root
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaves(n: usize) -> Vec<String> {
        (0..n).map(|i| hex::encode(Sha256::digest([i as u8]))).collect()
    }

    #[test]
    fn zero_leaves_has_zero_layers_and_no_root() {
        let tree = MerkleTree::new(&[]);
        assert_eq!(tree.layer_count(), 0);
        assert_eq!(tree.root(), None);
    }

    #[test]
    fn single_leaf_is_its_own_root() {
        let leaf = leaves(1);
        let tree = MerkleTree::new(&leaf);
        assert_eq!(tree.layer_count(), 1);
        assert_eq!(tree.root(), Some(leaf[0].as_str()));
    }

    #[test]
    fn layer_count_matches_the_expected_formula() {
        // ceil(log2(max(k, 2))) + 1 for k >= 2.
        let cases = [(2, 2), (3, 3), (4, 3), (5, 4), (8, 4), (9, 5)];
        for (k, expected) in cases {
            let tree = MerkleTree::new(&leaves(k));
            assert_eq!(tree.layer_count(), expected, "k={k}");
        }
    }

    #[test]
    fn proof_verifies_for_every_leaf_even_count() {
        let ls = leaves(4);
        let tree = MerkleTree::new(&ls);
        for (i, leaf) in ls.iter().enumerate() {
            let proof = tree.proof(i).unwrap();
            assert!(verify_proof(leaf, i, &proof), "leaf {i} failed to verify");
        }
    }

    #[test]
    fn proof_verifies_for_every_leaf_odd_count() {
        let ls = leaves(5);
        let tree = MerkleTree::new(&ls);
        for (i, leaf) in ls.iter().enumerate() {
            let proof = tree.proof(i).unwrap();
            assert!(verify_proof(leaf, i, &proof), "leaf {i} failed to verify");
        }
    }

    #[test]
    fn tampered_proof_fails_verification() {
        let ls = leaves(4);
        let tree = MerkleTree::new(&ls);
        let mut proof = tree.proof(0).unwrap();
        let last = proof.len() - 1;
        proof[last] = format!("{}ff", &proof[last][..proof[last].len() - 2]);
        assert!(!verify_proof(&ls[0], 0, &proof));
    }

    #[test]
    fn proof_on_out_of_bounds_index_is_an_error() {
        let tree = MerkleTree::new(&leaves(3));
        assert!(matches!(tree.proof(99), Err(MerkleError::NotFound)));
    }

    #[test]
    fn proof_on_empty_tree_is_an_error() {
        let tree = MerkleTree::new(&[]);
        assert!(matches!(tree.proof(0), Err(MerkleError::Empty)));
    }
}
