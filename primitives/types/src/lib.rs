#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::unwrap_used)]

//! Core data model for the claim topics client.
//!
//! This crate defines the values that flow between the registry gateway,
//! the synchronization controller and whatever presentation layer renders
//! the controller's state:
//!
//! - [`Topic`] and [`TopicSet`]: the allow-listed claim topic identifiers as
//!   last read from the registry, in registry order and free of duplicates.
//! - [`Address`] and [`TxHash`]: fixed-width ledger identifiers with
//!   case-insensitive hex parsing.
//! - [`OperationPhase`] and [`ViewState`]: the immutable snapshot handed to
//!   observers after every controller transition.

/// Fixed-width hex identifiers (accounts, contracts, transactions).
pub mod hex_id;
/// Claim topic identifiers and the ordered, duplicate-free topic set.
pub mod topic;
/// Controller phases and the observable view snapshot.
pub mod view;

pub use hex_id::{Address, HexIdError, TxHash};
pub use topic::{DuplicateTopic, Topic, TopicSet};
pub use view::{OperationPhase, ViewState};
