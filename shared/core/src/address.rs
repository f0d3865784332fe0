use std::fmt;
use std::str::FromStr;

use data_encoding::{HEXLOWER, HEXLOWER_PERMISSIVE};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

pub const ADDRESS_BYTES: usize = 20;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AddressError {
    #[error("address is empty")]
    Empty,

    #[error("address {0:?} is missing the 0x prefix")]
    MissingPrefix(String),

    #[error("address {0:?} must have 20 bytes")]
    InvalidLength(String),

    #[error("address {0:?} is not valid hex")]
    InvalidHex(String),
}

/// A 20-byte account identifier.
///
/// Parsing is case-insensitive and rendering is always lowercase, so the derived byte
/// ordering matches the ordering of lowercased address strings.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Address([u8; ADDRESS_BYTES]);

impl Address {
    pub const fn new(bytes: [u8; ADDRESS_BYTES]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; ADDRESS_BYTES] {
        &self.0
    }
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(AddressError::Empty);
        }
        let hex = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .ok_or_else(|| AddressError::MissingPrefix(value.to_string()))?;
        if hex.len() != ADDRESS_BYTES * 2 {
            return Err(AddressError::InvalidLength(value.to_string()));
        }
        let decoded = HEXLOWER_PERMISSIVE
            .decode(hex.as_bytes())
            .map_err(|_| AddressError::InvalidHex(value.to_string()))?;
        let bytes: [u8; ADDRESS_BYTES] = decoded
            .try_into()
            .map_err(|_| AddressError::InvalidLength(value.to_string()))?;
        Ok(Self(bytes))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", HEXLOWER.encode(&self.0))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Address {
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
    fn parses_mixed_case_and_renders_lowercase() {
        let address: Address = "0x52908400098527886E0F7030069857D2E4169EE7".parse().unwrap();
        assert_eq!(
            address.to_string(),
            "0x52908400098527886e0f7030069857d2e4169ee7"
        );
        let same: Address = "0x52908400098527886e0f7030069857d2e4169ee7".parse().unwrap();
        assert_eq!(address, same);
    }

    #[test]
    fn rejects_malformed_addresses() {
        assert_eq!("".parse::<Address>(), Err(AddressError::Empty));
        assert!(matches!(
            "52908400098527886e0f7030069857d2e4169ee7".parse::<Address>(),
            Err(AddressError::MissingPrefix(_))
        ));
        assert!(matches!(
            "0x1234".parse::<Address>(),
            Err(AddressError::InvalidLength(_))
        ));
        assert!(matches!(
            "0xzz908400098527886e0f7030069857d2e4169ee7".parse::<Address>(),
            Err(AddressError::InvalidHex(_))
        ));
    }

    #[test]
    fn ordering_matches_lowercase_strings() {
        let a: Address = "0x0A00000000000000000000000000000000000000".parse().unwrap();
        let b: Address = "0x0b00000000000000000000000000000000000000".parse().unwrap();
        assert!(a < b);
        assert!(a.to_string() < b.to_string());
    }

    #[test]
    fn serde_uses_hex_strings() {
        let address: Address = "0x00000000000000000000000000000000000000ff".parse().unwrap();
        let json = serde_json::to_string(&address).unwrap();
        assert_eq!(json, "\"0x00000000000000000000000000000000000000ff\"");
        let back: Address = serde_json::from_str(&json).unwrap();
        assert_eq!(back, address);
    }
}
