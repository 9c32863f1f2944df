#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::unwrap_used)]

//! Contract ABI for claim topic registries.
//!
//! Covers exactly the six functions of the registry interface:
//!
//! ```text
//! getClaimTopics() view returns (uint256[])
//! addClaimTopic(uint256)
//! removeClaimTopic(uint256)
//! claimTopicExists(uint256) view returns (bool)
//! getClaimTopicsCount() view returns (uint256)
//! owner() view returns (address)
//! ```
//!
//! Calldata is the 4-byte selector (first bytes of the Keccak-256 of the
//! signature) followed by 32-byte big-endian argument words. Return data is
//! decoded word by word; any value that does not fit the client's types is
//! a decode error rather than a silent truncation.

use thiserror::Error;
use types::{Address, Topic};

/// Width of an ABI word in bytes.
pub const WORD: usize = 32;

/// Errors raised while encoding or decoding ABI payloads.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AbiError {
    /// The payload was shorter than the layout requires.
    #[error("payload too short: need {needed} bytes, have {actual}")]
    Truncated {
        /// Bytes required.
        needed: usize,
        /// Bytes available.
        actual: usize,
    },
    /// A uint256 value exceeded 64 bits.
    #[error("uint256 value does not fit in 64 bits")]
    Overflow,
    /// A bool word held something other than 0 or 1.
    #[error("invalid bool word")]
    InvalidBool,
    /// An address word had non-zero padding.
    #[error("invalid address word")]
    InvalidAddress,
    /// The calldata selector is not part of the registry interface.
    #[error("unknown selector 0x{0}")]
    UnknownSelector(String),
}

/// A call against the registry contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryCall {
    /// `getClaimTopics()`
    GetClaimTopics,
    /// `addClaimTopic(uint256)`
    AddClaimTopic(Topic),
    /// `removeClaimTopic(uint256)`
    RemoveClaimTopic(Topic),
    /// `claimTopicExists(uint256)`
    ClaimTopicExists(Topic),
    /// `getClaimTopicsCount()`
    GetClaimTopicsCount,
    /// `owner()`
    Owner,
}

impl RegistryCall {
    /// Solidity signature of the function.
    pub fn signature(&self) -> &'static str {
        match self {
            Self::GetClaimTopics => "getClaimTopics()",
            Self::AddClaimTopic(_) => "addClaimTopic(uint256)",
            Self::RemoveClaimTopic(_) => "removeClaimTopic(uint256)",
            Self::ClaimTopicExists(_) => "claimTopicExists(uint256)",
            Self::GetClaimTopicsCount => "getClaimTopicsCount()",
            Self::Owner => "owner()",
        }
    }

    /// 4-byte function selector.
    pub fn selector(&self) -> [u8; 4] {
        match self {
            Self::GetClaimTopics => [0xdf, 0x09, 0xd6, 0x04],
            Self::AddClaimTopic(_) => [0xc7, 0xb2, 0x25, 0x51],
            Self::RemoveClaimTopic(_) => [0x08, 0x29, 0x78, 0x46],
            Self::ClaimTopicExists(_) => [0xe3, 0xba, 0x87, 0x69],
            Self::GetClaimTopicsCount => [0xde, 0x22, 0x3d, 0x10],
            Self::Owner => [0x8d, 0xa5, 0xcb, 0x5b],
        }
    }

    /// Whether the call mutates registry state.
    pub fn is_mutation(&self) -> bool {
        matches!(self, Self::AddClaimTopic(_) | Self::RemoveClaimTopic(_))
    }

    /// Encodes selector and arguments as calldata.
    pub fn encode(&self) -> Vec<u8> {
        let mut data = self.selector().to_vec();
        match self {
            Self::AddClaimTopic(topic)
            | Self::RemoveClaimTopic(topic)
            | Self::ClaimTopicExists(topic) => data.extend_from_slice(&encode_uint(topic.id())),
            Self::GetClaimTopics | Self::GetClaimTopicsCount | Self::Owner => {}
        }
        data
    }

    /// Decodes calldata back into a call.
    pub fn decode(data: &[u8]) -> Result<Self, AbiError> {
        let selector = data.get(..4).ok_or(AbiError::Truncated { needed: 4, actual: data.len() })?;
        let args = &data[4..];
        let topic_arg = || decode_uint(args, 0).map(Topic::new);

        let call = match selector {
            [0xdf, 0x09, 0xd6, 0x04] => Self::GetClaimTopics,
            [0xc7, 0xb2, 0x25, 0x51] => Self::AddClaimTopic(topic_arg()?),
            [0x08, 0x29, 0x78, 0x46] => Self::RemoveClaimTopic(topic_arg()?),
            [0xe3, 0xba, 0x87, 0x69] => Self::ClaimTopicExists(topic_arg()?),
            [0xde, 0x22, 0x3d, 0x10] => Self::GetClaimTopicsCount,
            [0x8d, 0xa5, 0xcb, 0x5b] => Self::Owner,
            other => return Err(AbiError::UnknownSelector(hex::encode(other))),
        };
        Ok(call)
    }
}

fn word(data: &[u8], index: usize) -> Result<&[u8], AbiError> {
    let start = index * WORD;
    data.get(start..start + WORD)
        .ok_or(AbiError::Truncated { needed: start + WORD, actual: data.len() })
}

fn word_to_u64(w: &[u8]) -> Result<u64, AbiError> {
    if w[..WORD - 8].iter().any(|b| *b != 0) {
        return Err(AbiError::Overflow);
    }
    let mut tail = [0u8; 8];
    tail.copy_from_slice(&w[WORD - 8..]);
    Ok(u64::from_be_bytes(tail))
}

/// Encodes a `uint256` word.
pub fn encode_uint(value: u64) -> [u8; WORD] {
    let mut out = [0u8; WORD];
    out[WORD - 8..].copy_from_slice(&value.to_be_bytes());
    out
}

/// Encodes a `bool` return word.
pub fn encode_bool(value: bool) -> [u8; WORD] { encode_uint(u64::from(value)) }

/// Encodes an `address` return word.
pub fn encode_address(address: &Address) -> [u8; WORD] {
    let mut out = [0u8; WORD];
    out[WORD - 20..].copy_from_slice(address.as_bytes());
    out
}

/// Encodes a dynamic `uint256[]` as a single return value.
pub fn encode_topics(topics: &[Topic]) -> Vec<u8> {
    let mut out = Vec::with_capacity((topics.len() + 2) * WORD);
    out.extend_from_slice(&encode_uint(WORD as u64));
    out.extend_from_slice(&encode_uint(topics.len() as u64));
    for topic in topics {
        out.extend_from_slice(&encode_uint(topic.id()));
    }
    out
}

/// Decodes the `uint256` word at `index`.
pub fn decode_uint(data: &[u8], index: usize) -> Result<u64, AbiError> {
    word_to_u64(word(data, index)?)
}

/// Decodes a single `bool` return value.
pub fn decode_bool(data: &[u8]) -> Result<bool, AbiError> {
    match decode_uint(data, 0) {
        Ok(0) => Ok(false),
        Ok(1) => Ok(true),
        Ok(_) | Err(AbiError::Overflow) => Err(AbiError::InvalidBool),
        Err(e) => Err(e),
    }
}

/// Decodes a single `address` return value.
pub fn decode_address(data: &[u8]) -> Result<Address, AbiError> {
    let w = word(data, 0)?;
    if w[..WORD - 20].iter().any(|b| *b != 0) {
        return Err(AbiError::InvalidAddress);
    }
    let mut bytes = [0u8; 20];
    bytes.copy_from_slice(&w[WORD - 20..]);
    Ok(Address::new(bytes))
}

/// Decodes a single dynamic `uint256[]` return value, preserving order.
pub fn decode_topics(data: &[u8]) -> Result<Vec<Topic>, AbiError> {
    let offset = usize::try_from(decode_uint(data, 0)?).map_err(|_| AbiError::Overflow)?;
    let body = data
        .get(offset..)
        .ok_or(AbiError::Truncated { needed: offset, actual: data.len() })?;
    let len = usize::try_from(decode_uint(body, 0)?).map_err(|_| AbiError::Overflow)?;

    let needed = len
        .checked_add(1)
        .and_then(|words| words.checked_mul(WORD))
        .ok_or(AbiError::Overflow)?;
    if body.len() < needed {
        return Err(AbiError::Truncated { needed: offset + needed, actual: data.len() });
    }

    (1..=len).map(|i| decode_uint(body, i).map(Topic::new)).collect()
}
