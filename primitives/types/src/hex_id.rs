//! Hex-encoded ledger identifiers.
//!
//! Addresses and transaction hashes travel over JSON-RPC as `0x`-prefixed
//! hex strings whose letter case carries no meaning (mixed-case checksum
//! encodings included). Both are stored as raw bytes, so comparing two
//! identifiers is case-insensitive by construction.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Errors produced while parsing hex identifiers or payloads.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum HexIdError {
    /// The string did not start with `0x`.
    #[error("missing 0x prefix in {0:?}")]
    MissingPrefix(String),
    /// The digits after the prefix were not valid hex.
    #[error(transparent)]
    Hex(#[from] hex::FromHexError),
    /// The decoded value had the wrong width.
    #[error("expected {expected} bytes, found {found}")]
    WrongLength {
        /// Width required by the identifier type.
        expected: usize,
        /// Width actually decoded.
        found: usize,
    },
}

/// Renders bytes as a lowercase `0x`-prefixed hex string.
pub fn encode_hex(bytes: &[u8]) -> String { format!("0x{}", hex::encode(bytes)) }

/// Decodes a `0x`-prefixed hex string of any even length.
pub fn decode_hex(s: &str) -> Result<Vec<u8>, HexIdError> {
    let digits = s
        .strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .ok_or_else(|| HexIdError::MissingPrefix(s.to_string()))?;
    Ok(hex::decode(digits)?)
}

fn decode_fixed<const N: usize>(s: &str) -> Result<[u8; N], HexIdError> {
    let bytes = decode_hex(s)?;
    <[u8; N]>::try_from(bytes.as_slice())
        .map_err(|_| HexIdError::WrongLength { expected: N, found: bytes.len() })
}

/// A 20-byte account or contract address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address([u8; 20]);

impl Address {
    /// Wraps raw address bytes.
    pub const fn new(bytes: [u8; 20]) -> Self { Self(bytes) }

    /// Returns the raw address bytes.
    pub fn as_bytes(&self) -> &[u8; 20] { &self.0 }
}

impl FromStr for Address {
    type Err = HexIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> { decode_fixed(s.trim()).map(Self) }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&encode_hex(&self.0)) }
}

/// A 32-byte transaction hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TxHash([u8; 32]);

impl TxHash {
    /// Wraps raw hash bytes.
    pub const fn new(bytes: [u8; 32]) -> Self { Self(bytes) }

    /// Returns the raw hash bytes.
    pub fn as_bytes(&self) -> &[u8; 32] { &self.0 }
}

impl FromStr for TxHash {
    type Err = HexIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> { decode_fixed(s.trim()).map(Self) }
}

impl fmt::Display for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&encode_hex(&self.0)) }
}

macro_rules! serde_as_hex_string {
    ($ty:ty) => {
        impl Serialize for $ty {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.collect_str(self)
            }
        }

        impl<'de> Deserialize<'de> for $ty {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                s.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

serde_as_hex_string!(Address);
serde_as_hex_string!(TxHash);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_parse_is_case_insensitive() {
        let lower: Address =
            "0x9fe46736679d2d9a65f0992f2272de9f3c7fa6e0".parse().expect("lowercase parses");
        let mixed: Address =
            "0x9fE46736679d2D9a65F0992F2272dE9f3c7fa6e0".parse().expect("checksum case parses");

        assert_eq!(lower, mixed);
        assert_eq!(mixed.to_string(), "0x9fe46736679d2d9a65f0992f2272de9f3c7fa6e0");
    }

    #[test]
    fn test_address_rejects_malformed_input() {
        assert_eq!(
            "9fe46736679d2d9a65f0992f2272de9f3c7fa6e0".parse::<Address>(),
            Err(HexIdError::MissingPrefix("9fe46736679d2d9a65f0992f2272de9f3c7fa6e0".to_string()))
        );
        assert_eq!(
            "0x123".parse::<Address>(),
            Err(HexIdError::Hex(hex::FromHexError::OddLength))
        );
        assert_eq!(
            "0xzz".parse::<Address>(),
            Err(HexIdError::Hex(hex::FromHexError::InvalidHexCharacter { c: 'z', index: 0 }))
        );
        assert_eq!(
            "0x1234".parse::<Address>(),
            Err(HexIdError::WrongLength { expected: 20, found: 2 })
        );
    }

    #[test]
    fn test_encode_hex() {
        assert_eq!(encode_hex(&[]), "0x");
        assert_eq!(encode_hex(&[0x00, 0xab, 0x7f]), "0x00ab7f");
        assert_eq!(decode_hex("0X00AB7F").expect("upper-case prefix"), vec![0x00, 0xab, 0x7f]);
    }

    #[test]
    fn test_tx_hash_width() {
        let hash = format!("0x{}", "11".repeat(32));
        let parsed: TxHash = hash.parse().expect("32-byte hash parses");
        assert_eq!(parsed.to_string(), hash);
        assert!(format!("0x{}", "11".repeat(20)).parse::<TxHash>().is_err());
    }
}
