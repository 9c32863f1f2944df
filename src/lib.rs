// SPDX-License-Identifier: CC0-1.0

//! Claim Topics umbrella crate.
//!
//! Re-exports the public surface of the workspace so that a presentation
//! layer can depend on a single crate: the synchronization controller, the
//! registry gateway and identity contracts, and the shared data model.
//!
//! All functional code lives in the workspace member crates under
//! `primitives`, `adapters`, `backends` and `client`.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::unwrap_used)]
#![doc(test(attr(warn(unused))))]

pub use adapters::{
    ContractGateway, GatewayError, IdentityError, IdentityResolver, RegistryGateway,
};
pub use controller::{Rejected, TopicsController};
pub use transport::{DynTransport, Transport, TransportError};
pub use types::{Address, OperationPhase, Topic, TopicSet, ViewState};

/// Miscellaneous metadata about the Claim Topics workspace.
pub mod claim_topics_meta {
    /// Version string for the umbrella crate, as reported by Cargo.
    pub const VERSION: &str = env!("CARGO_PKG_VERSION");
}
