mod commitment;
mod merkle_hash;
mod tree;

pub use commitment::{
    build_commitment, leaf_hash, verify_proof, Commitment, CommitmentArtifact, CommitmentEntry,
    CommitmentError, EntryArtifact, GrantArtifact,
};
pub use merkle_hash::{MerkleHash, MerkleHashError, HASH_BYTES};
pub use tree::GrantMerkleTree;
