use rayon::prelude::*;

use crate::{CommitmentError, MerkleHash};

/// Every level of a grant tree, leaves first.
#[derive(Debug, Clone)]
pub struct GrantMerkleTree {
    merkle_layers: Vec<Vec<MerkleHash>>,
}

impl GrantMerkleTree {
    pub fn try_from(leaves: Vec<MerkleHash>) -> Result<GrantMerkleTree, CommitmentError> {
        if leaves.is_empty() {
            return Err(CommitmentError::EmptyGrantList);
        }
        let mut merkle_layers = vec![leaves];
        while let Some(merkle_layer) = merkle_layers.last().filter(|layer| layer.len() > 1) {
            let merkle_parents: Vec<MerkleHash> = merkle_layer
                .par_chunks(2)
                .map(|pair| {
                    let left = &pair[0];
                    let right = pair.get(1).unwrap_or(left);
                    MerkleHash::from_pair(left, right)
                })
                .collect();
            merkle_layers.push(merkle_parents);
        }
        Ok(GrantMerkleTree { merkle_layers })
    }

    pub fn root(&self) -> MerkleHash {
        // construction guarantees a last layer with exactly one node
        self.merkle_layers[self.merkle_layers.len() - 1][0]
    }

    pub fn leaf_count(&self) -> usize {
        self.merkle_layers[0].len()
    }

    /// Sibling hashes from the leaf at `index` up to the root. An unpaired node is its
    /// own sibling.
    pub fn proof_at_index(&self, mut index: usize) -> Option<Vec<MerkleHash>> {
        if index >= self.leaf_count() {
            return None;
        }
        let mut proof = vec![];
        for layer in &self.merkle_layers {
            if layer.len() == 1 {
                break;
            }
            let sibling_index = if index % 2 == 0 { index + 1 } else { index - 1 };
            proof.push(*layer.get(sibling_index).unwrap_or(&layer[index]));
            index /= 2;
        }
        Some(proof)
    }
}
