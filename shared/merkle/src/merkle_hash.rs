use std::fmt;
use std::str::FromStr;

use data_encoding::{HEXLOWER, HEXLOWER_PERMISSIVE};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};
use thiserror::Error;

pub const HASH_BYTES: usize = 32;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid merkle hash {0:?}: expected 0x followed by 64 hex digits")]
pub struct MerkleHashError(String);

/// A SHA-256 node of the grant tree.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct MerkleHash {
    bytes: [u8; HASH_BYTES],
}

impl MerkleHash {
    pub const fn from_bytes(bytes: [u8; HASH_BYTES]) -> MerkleHash {
        MerkleHash { bytes }
    }

    pub fn as_bytes(&self) -> &[u8; HASH_BYTES] {
        &self.bytes
    }

    /// Hash of the concatenation of `parts`.
    pub fn from_parts(parts: &[&[u8]]) -> MerkleHash {
        let mut hasher = Sha256::new();
        for part in parts {
            hasher.update(part);
        }
        MerkleHash {
            bytes: hasher.finalize().into(),
        }
    }

    /// Parent of two nodes. The smaller node goes first, so the result does not depend on
    /// which side each node sits.
    pub fn from_pair(a: &MerkleHash, b: &MerkleHash) -> MerkleHash {
        if a.bytes <= b.bytes {
            MerkleHash::from_parts(&[&a.bytes, &b.bytes])
        } else {
            MerkleHash::from_parts(&[&b.bytes, &a.bytes])
        }
    }

    /// Treats `self` as a root and checks that folding `merkle_leaf` through
    /// `merkle_proof` reaches it.
    pub fn is_valid_proof(&self, merkle_leaf: &MerkleHash, merkle_proof: &[MerkleHash]) -> bool {
        let mut merkle_hash = *merkle_leaf;
        for merkle_node in merkle_proof {
            merkle_hash = MerkleHash::from_pair(&merkle_hash, merkle_node);
        }
        merkle_hash == *self
    }
}

impl FromStr for MerkleHash {
    type Err = MerkleHashError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let invalid = || MerkleHashError(value.to_string());
        let hex = value
            .strip_prefix("0x")
            .filter(|hex| hex.len() == HASH_BYTES * 2)
            .ok_or_else(invalid)?;
        let decoded = HEXLOWER_PERMISSIVE
            .decode(hex.as_bytes())
            .map_err(|_| invalid())?;
        let bytes = decoded.try_into().map_err(|_| invalid())?;
        Ok(MerkleHash { bytes })
    }
}

impl fmt::Display for MerkleHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", HEXLOWER.encode(&self.bytes))
    }
}

impl fmt::Debug for MerkleHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl Serialize for MerkleHash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for MerkleHash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        value.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn sha256_of_parts_matches_known_digest() {
        // sha256("abc")
        assert_eq!(
            MerkleHash::from_parts(&[b"a", b"bc"]).to_string(),
            "0xba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn pair_order_does_not_matter() {
        let a = MerkleHash::from_parts(&[b"left"]);
        let b = MerkleHash::from_parts(&[b"right"]);
        assert_eq!(MerkleHash::from_pair(&a, &b), MerkleHash::from_pair(&b, &a));
        assert_ne!(MerkleHash::from_pair(&a, &b), MerkleHash::from_pair(&a, &a));
    }

    #[test]
    fn parses_what_it_prints() {
        let hash = MerkleHash::from_parts(&[b"x"]);
        assert_eq!(hash.to_string().parse::<MerkleHash>().unwrap(), hash);
        assert!("0x1234".parse::<MerkleHash>().is_err());
        assert!(hash.to_string()[2..].parse::<MerkleHash>().is_err());
    }
}
