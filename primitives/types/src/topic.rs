//! Claim topic identifiers.

use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A claim topic: an integer naming a compliance or verification category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Topic(u64);

impl Topic {
    /// Wraps a raw topic identifier.
    pub const fn new(id: u64) -> Self { Self(id) }

    /// Returns the raw topic identifier.
    pub const fn id(self) -> u64 { self.0 }
}

impl From<u64> for Topic {
    fn from(id: u64) -> Self { Self(id) }
}

impl FromStr for Topic {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> { s.trim().parse().map(Self) }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.0) }
}

/// The registry returned the same topic twice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("registry returned duplicate topic {0}")]
pub struct DuplicateTopic(pub Topic);

/// The ordered, duplicate-free set of topics last read from the registry.
///
/// A `TopicSet` is never edited in place: it is rebuilt wholesale from each
/// successful registry read via [`TopicSet::from_remote`], which preserves
/// the order the registry reported.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct TopicSet(Vec<Topic>);

impl TopicSet {
    /// Builds a set from a registry read, rejecting duplicate identifiers.
    pub fn from_remote(topics: Vec<Topic>) -> Result<Self, DuplicateTopic> {
        for (i, topic) in topics.iter().enumerate() {
            if topics[..i].contains(topic) {
                return Err(DuplicateTopic(*topic));
            }
        }
        Ok(Self(topics))
    }

    /// Whether `topic` is part of the set.
    pub fn contains(&self, topic: Topic) -> bool { self.0.contains(&topic) }

    /// Number of topics in the set.
    pub fn len(&self) -> usize { self.0.len() }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool { self.0.is_empty() }

    /// Iterates the topics in registry order.
    pub fn iter(&self) -> impl Iterator<Item = Topic> + '_ { self.0.iter().copied() }

    /// The topics in registry order.
    pub fn as_slice(&self) -> &[Topic] { &self.0 }
}

impl<'de> Deserialize<'de> for TopicSet {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let topics = Vec::<Topic>::deserialize(deserializer)?;
        Self::from_remote(topics).map_err(serde::de::Error::custom)
    }
}
