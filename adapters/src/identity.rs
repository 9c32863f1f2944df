//! Identity Resolver
//!
//! Resolves the address of the party that would sign mutations. A caller
//! without an active signing session is not an error for the controller:
//! it simply cannot be the owner, and reads still proceed.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use transport::{DynTransport, TransportError};
use types::{Address, HexIdError};

/// Errors that can occur while resolving the caller.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum IdentityError {
    /// No signing session is available.
    #[error("No active signer")]
    NoActiveSigner,
    /// The signer could not be queried.
    #[error("Signer lookup failed: {0}")]
    Lookup(#[from] TransportError),
    /// The signer reported an address that does not parse.
    #[error("Signer returned a malformed address: {0}")]
    Malformed(#[from] HexIdError),
}

/// Resolves the current caller's address from the active signing session.
#[async_trait]
pub trait IdentityResolver: Send + Sync {
    /// Address of the active signer.
    async fn resolve_caller(&self) -> Result<Address, IdentityError>;
}

#[async_trait]
impl<I: IdentityResolver + ?Sized> IdentityResolver for Arc<I> {
    async fn resolve_caller(&self) -> Result<Address, IdentityError> {
        (**self).resolve_caller().await
    }
}

/// Uses the first account the node or wallet exposes through `eth_accounts`.
#[derive(Clone)]
pub struct NodeAccounts {
    transport: DynTransport,
}

impl NodeAccounts {
    /// Creates a resolver over a shared transport.
    pub fn new(transport: DynTransport) -> Self { Self { transport } }
}

#[async_trait]
impl IdentityResolver for NodeAccounts {
    async fn resolve_caller(&self) -> Result<Address, IdentityError> {
        let accounts = self.transport.send("eth_accounts", &[]).await?;
        let first = accounts
            .as_array()
            .ok_or_else(|| {
                TransportError::InvalidFormat(format!("eth_accounts returned {}", accounts))
            })?
            .first();

        match first.and_then(|v| v.as_str()) {
            Some(address) => Ok(address.parse()?),
            None => Err(IdentityError::NoActiveSigner),
        }
    }
}

/// A signer configured up front, e.g. an account unlocked on the node.
#[derive(Debug, Clone, Copy)]
pub struct FixedSigner(pub Address);

#[async_trait]
impl IdentityResolver for FixedSigner {
    async fn resolve_caller(&self) -> Result<Address, IdentityError> { Ok(self.0) }
}

/// No signing session: the read-only viewer.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSigner;

#[async_trait]
impl IdentityResolver for NoSigner {
    async fn resolve_caller(&self) -> Result<Address, IdentityError> {
        Err(IdentityError::NoActiveSigner)
    }
}
