#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::unwrap_used)]

//! Registry Adapters
//!
//! This crate holds the two collaborators the synchronization controller
//! depends on, each as a trait plus its JSON-RPC implementation:
//!
//! - [`RegistryGateway`]: reads and writes against a claim topics registry
//!   contract ([`ContractGateway`]).
//! - [`IdentityResolver`]: who the current caller is ([`NodeAccounts`],
//!   [`FixedSigner`], [`NoSigner`]).
//!
//! These are the only places where the client crosses into network I/O.

pub mod gateway;
pub mod identity;
pub mod registry_contract;

pub use gateway::{Confirmation, GatewayError, PendingOperation, RegistryGateway};
pub use identity::{FixedSigner, IdentityError, IdentityResolver, NoSigner, NodeAccounts};
pub use registry_contract::{ContractGateway, GatewayConfig};
