//! Commitments over a finalized grant list.
//!
//! Grants are sorted into canonical order and indexed, each `(index, grant)` pair is hashed
//! into a leaf, and the leaves are folded into a [`GrantMerkleTree`]. A recipient can then
//! prove their grant against the root alone.

use rayon::prelude::*;
use reward_core::fixed_point::sum;
use reward_core::{Address, Grant, Reason, VestingSchedule};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::{GrantMerkleTree, MerkleHash};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommitmentError {
    #[error("grant list is empty")]
    EmptyGrantList,

    #[error("amount total overflows")]
    AmountOverflow,

    #[error("proof of entry {index} does not reach the merkle root")]
    InvalidProof { index: u64 },

    #[error("invalid commitment artifact: {0}")]
    InvalidArtifact(String),
}

/// `sha256(u64_be(index) ‖ account ‖ u128_be(amount) ‖ u64_be(vesting_length) ‖
/// u64_be(cliff_length) ‖ u64_be(vesting_interval))`
pub fn leaf_hash(index: u64, grant: &Grant) -> MerkleHash {
    MerkleHash::from_parts(&[
        &index.to_be_bytes(),
        grant.account.as_bytes(),
        &grant.amount.to_be_bytes(),
        &grant.vesting.vesting_length.to_be_bytes(),
        &grant.vesting.cliff_length.to_be_bytes(),
        &grant.vesting.vesting_interval.to_be_bytes(),
    ])
}

/// The check an on-chain verifier performs for a claim.
pub fn verify_proof(root: &MerkleHash, leaf: &MerkleHash, proof: &[MerkleHash]) -> bool {
    root.is_valid_proof(leaf, proof)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitmentEntry {
    pub index: u64,
    pub grant: Grant,
    pub proof: Vec<MerkleHash>,
}

impl CommitmentEntry {
    pub fn account(&self) -> Address {
        self.grant.account
    }

    pub fn reason(&self) -> Reason {
        self.grant.reason
    }

    pub fn leaf(&self) -> MerkleHash {
        leaf_hash(self.index, &self.grant)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Commitment {
    pub merkle_root: MerkleHash,
    pub amount_total: u128,
    pub entries: Vec<CommitmentEntry>,
}

/// Commits to `grants`. Input order does not matter.
pub fn build_commitment(grants: &[Grant]) -> Result<Commitment, CommitmentError> {
    let mut grants = grants.to_vec();
    grants.sort_by_key(Grant::sort_key);
    let amount_total = sum(grants.iter().map(|grant| grant.amount), "amount total")
        .map_err(|_| CommitmentError::AmountOverflow)?;

    let leaves: Vec<MerkleHash> = grants
        .par_iter()
        .enumerate()
        .map(|(index, grant)| leaf_hash(index as u64, grant))
        .collect();
    let tree = GrantMerkleTree::try_from(leaves)?;

    let entries = grants
        .into_iter()
        .enumerate()
        .map(|(index, grant)| CommitmentEntry {
            index: index as u64,
            grant,
            proof: tree.proof_at_index(index).unwrap_or_default(),
        })
        .collect::<Vec<_>>();
    let merkle_root = tree.root();
    info!(
        merkle_root = %merkle_root,
        entries = entries.len(),
        amount_total,
        "Built commitment"
    );
    Ok(Commitment {
        merkle_root,
        amount_total,
        entries,
    })
}

impl Commitment {
    /// Re-checks every entry's proof against the root.
    pub fn verify(&self) -> Result<(), CommitmentError> {
        match self
            .entries
            .par_iter()
            .find_first(|entry| !verify_proof(&self.merkle_root, &entry.leaf(), &entry.proof))
        {
            Some(entry) => Err(CommitmentError::InvalidProof { index: entry.index }),
            None => Ok(()),
        }
    }

    pub fn to_artifact(&self) -> CommitmentArtifact {
        CommitmentArtifact {
            merkle_root: self.merkle_root,
            amount_total: self.amount_total.to_string(),
            grants: self
                .entries
                .iter()
                .map(|entry| EntryArtifact {
                    index: entry.index,
                    account: entry.grant.account,
                    reason: entry.grant.reason,
                    grant: GrantArtifact {
                        amount: entry.grant.amount.to_string(),
                        vesting_length: entry.grant.vesting.vesting_length.to_string(),
                        cliff_length: entry.grant.vesting.cliff_length.to_string(),
                        vesting_interval: entry.grant.vesting.vesting_interval.to_string(),
                    },
                    proof: entry.proof.clone(),
                })
                .collect(),
        }
    }

    /// Reads an artifact back, rejecting it unless every proof and the total check out.
    pub fn from_artifact(artifact: CommitmentArtifact) -> Result<Commitment, CommitmentError> {
        fn number<T: std::str::FromStr>(field: &str, value: &str) -> Result<T, CommitmentError> {
            value
                .parse()
                .map_err(|_| CommitmentError::InvalidArtifact(format!("{field} {value:?}")))
        }

        let entries = artifact
            .grants
            .into_iter()
            .map(|entry| -> Result<CommitmentEntry, CommitmentError> {
                let vesting = VestingSchedule::new(
                    number("vestingLength", &entry.grant.vesting_length)?,
                    number("cliffLength", &entry.grant.cliff_length)?,
                    number("vestingInterval", &entry.grant.vesting_interval)?,
                )
                .map_err(|err| CommitmentError::InvalidArtifact(err.to_string()))?;
                Ok(CommitmentEntry {
                    index: entry.index,
                    grant: Grant {
                        account: entry.account,
                        reason: entry.reason,
                        amount: number("amount", &entry.grant.amount)?,
                        vesting,
                    },
                    proof: entry.proof,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        let commitment = Commitment {
            merkle_root: artifact.merkle_root,
            amount_total: number("amountTotal", &artifact.amount_total)?,
            entries,
        };
        let total = sum(
            commitment.entries.iter().map(|entry| entry.grant.amount),
            "amount total",
        )
        .map_err(|_| CommitmentError::AmountOverflow)?;
        if total != commitment.amount_total {
            return Err(CommitmentError::InvalidArtifact(format!(
                "amountTotal {} does not match grants summing to {total}",
                commitment.amount_total
            )));
        }
        commitment.verify()?;
        Ok(commitment)
    }
}

/// Wire form of a commitment. Integers are decimal strings, hashes are 0x hex.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitmentArtifact {
    pub merkle_root: MerkleHash,
    pub amount_total: String,
    pub grants: Vec<EntryArtifact>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryArtifact {
    pub index: u64,
    pub account: Address,
    pub reason: Reason,
    pub grant: GrantArtifact,
    pub proof: Vec<MerkleHash>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GrantArtifact {
    pub amount: String,
    pub vesting_length: String,
    pub cliff_length: String,
    pub vesting_interval: String,
}
