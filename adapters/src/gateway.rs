//! Registry Gateway
//!
//! The gateway is the controller's only window onto the remote registry.
//! Reads return the registry's current answer; writes return a
//! [`PendingOperation`] that settles once the ledger has included (or
//! reverted) the transaction. Implementations keep no state of their own
//! beyond a shared connection.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use transport::TransportError;
use types::{Address, Topic, TxHash};

/// Errors that can occur while talking to the registry.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GatewayError {
    /// A read call (list, exists, owner, count) failed.
    #[error("Error reading {call}: {source}")]
    RemoteRead {
        /// Contract function that was being read.
        call: &'static str,
        /// Underlying transport failure.
        #[source]
        source: TransportError,
    },

    /// A mutation was refused before it reached the ledger.
    #[error("Error submitting {call}: {source}")]
    RemoteWrite {
        /// Contract function that was being submitted.
        call: &'static str,
        /// Underlying transport failure.
        #[source]
        source: TransportError,
    },

    /// A submitted mutation did not settle in time.
    #[error("Transaction {tx} was not confirmed within {}ms", .waited.as_millis())]
    ConfirmationTimeout {
        /// Hash of the pending transaction.
        tx: TxHash,
        /// How long the gateway waited.
        waited: Duration,
    },

    /// The node answered with something that is not a valid reply.
    #[error("Malformed response to {call}: {reason}")]
    Decode {
        /// Contract function or RPC method concerned.
        call: &'static str,
        /// What was wrong with the reply.
        reason: String,
    },
}

impl GatewayError {
    /// Whether the signer declined to sign the transaction.
    pub fn is_signer_refusal(&self) -> bool {
        matches!(self, GatewayError::RemoteWrite { source, .. } if source.is_user_rejection())
    }
}

/// Final outcome of a submitted mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confirmation {
    /// The transaction was included and succeeded.
    Confirmed(TxHash),
    /// The transaction was included but the contract reverted it.
    Reverted(TxHash),
}

impl Confirmation {
    /// Hash of the settled transaction.
    pub fn tx_hash(&self) -> TxHash {
        match self {
            Confirmation::Confirmed(tx) | Confirmation::Reverted(tx) => *tx,
        }
    }
}

/// A submitted mutation awaiting network confirmation.
///
/// There is no cancel: the operation resolves, reverts, or times out.
#[async_trait]
pub trait PendingOperation: Send {
    /// Hash of the submitted transaction.
    fn tx_hash(&self) -> TxHash;

    /// Waits until the transaction settles.
    async fn await_confirmation(self: Box<Self>) -> Result<Confirmation, GatewayError>;
}

/// Read and write access to a claim topics registry.
#[async_trait]
pub trait RegistryGateway: Send + Sync {
    /// Topics currently registered, in registry order.
    async fn list_topics(&self, registry: &Address) -> Result<Vec<Topic>, GatewayError>;

    /// Whether `topic` is registered.
    async fn topic_exists(&self, registry: &Address, topic: Topic) -> Result<bool, GatewayError>;

    /// The registry's owner, the only identity allowed to mutate it.
    async fn owner(&self, registry: &Address) -> Result<Address, GatewayError>;

    /// Number of registered topics.
    async fn topic_count(&self, registry: &Address) -> Result<u64, GatewayError>;

    /// Submits `addClaimTopic(topic)` signed by `from`.
    async fn submit_add(
        &self,
        registry: &Address,
        from: &Address,
        topic: Topic,
    ) -> Result<Box<dyn PendingOperation>, GatewayError>;

    /// Submits `removeClaimTopic(topic)` signed by `from`.
    async fn submit_remove(
        &self,
        registry: &Address,
        from: &Address,
        topic: Topic,
    ) -> Result<Box<dyn PendingOperation>, GatewayError>;
}

#[async_trait]
impl<G: RegistryGateway + ?Sized> RegistryGateway for Arc<G> {
    async fn list_topics(&self, registry: &Address) -> Result<Vec<Topic>, GatewayError> {
        (**self).list_topics(registry).await
    }

    async fn topic_exists(&self, registry: &Address, topic: Topic) -> Result<bool, GatewayError> {
        (**self).topic_exists(registry, topic).await
    }

    async fn owner(&self, registry: &Address) -> Result<Address, GatewayError> {
        (**self).owner(registry).await
    }

    async fn topic_count(&self, registry: &Address) -> Result<u64, GatewayError> {
        (**self).topic_count(registry).await
    }

    async fn submit_add(
        &self,
        registry: &Address,
        from: &Address,
        topic: Topic,
    ) -> Result<Box<dyn PendingOperation>, GatewayError> {
        (**self).submit_add(registry, from, topic).await
    }

    async fn submit_remove(
        &self,
        registry: &Address,
        from: &Address,
        topic: Topic,
    ) -> Result<Box<dyn PendingOperation>, GatewayError> {
        (**self).submit_remove(registry, from, topic).await
    }
}
