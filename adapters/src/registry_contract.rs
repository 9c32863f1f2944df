//! JSON-RPC Registry Gateway
//!
//! [`ContractGateway`] talks to a deployed claim topics registry through any
//! [`transport::Transport`]:
//!
//! - reads are `eth_call` against the `latest` block;
//! - writes are `eth_sendTransaction` from the caller's account, leaving
//!   signing to the node or wallet behind the endpoint;
//! - confirmation polls `eth_getTransactionReceipt` until a receipt shows
//!   up or the confirmation timeout elapses.

use std::time::Duration;

use abi::RegistryCall;
use async_trait::async_trait;
use serde_json::{json, Value};
use transport::DynTransport;
use types::hex_id::{decode_hex, encode_hex};
use types::{Address, Topic, TxHash};

use crate::gateway::{Confirmation, GatewayError, PendingOperation, RegistryGateway};

/// Timing knobs for transaction confirmation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GatewayConfig {
    /// Delay between two receipt polls.
    pub poll_interval: Duration,
    /// Give up waiting for a receipt after this long.
    pub confirmation_timeout: Duration,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(1000),
            confirmation_timeout: Duration::from_secs(120),
        }
    }
}

/// Registry gateway backed by a JSON-RPC transport.
#[derive(Clone)]
pub struct ContractGateway {
    transport: DynTransport,
    config: GatewayConfig,
}

impl ContractGateway {
    /// Creates a gateway over a shared transport.
    pub fn new(transport: DynTransport, config: GatewayConfig) -> Self {
        Self { transport, config }
    }

    /// Endpoint of the underlying transport.
    pub fn endpoint(&self) -> &str { self.transport.endpoint() }

    async fn call(&self, registry: &Address, call: RegistryCall) -> Result<Vec<u8>, GatewayError> {
        let request = json!({
            "to": registry.to_string(),
            "data": encode_hex(&call.encode()),
        });
        let result = self
            .transport
            .send("eth_call", &[request, json!("latest")])
            .await
            .map_err(|source| GatewayError::RemoteRead { call: call.signature(), source })?;

        let data = result.as_str().ok_or_else(|| GatewayError::Decode {
            call: call.signature(),
            reason: format!("expected hex string, got {}", result),
        })?;
        decode_hex(data)
            .map_err(|e| GatewayError::Decode { call: call.signature(), reason: e.to_string() })
    }

    async fn send_transaction(
        &self,
        registry: &Address,
        from: &Address,
        call: RegistryCall,
    ) -> Result<Box<dyn PendingOperation>, GatewayError> {
        let request = json!({
            "from": from.to_string(),
            "to": registry.to_string(),
            "data": encode_hex(&call.encode()),
        });
        let result = self
            .transport
            .send("eth_sendTransaction", &[request])
            .await
            .map_err(|source| GatewayError::RemoteWrite { call: call.signature(), source })?;

        let tx: TxHash = result
            .as_str()
            .ok_or_else(|| format!("expected transaction hash, got {}", result))
            .and_then(|s| s.parse().map_err(|e: types::HexIdError| e.to_string()))
            .map_err(|reason| GatewayError::Decode { call: call.signature(), reason })?;

        tracing::debug!(%tx, call = call.signature(), "transaction submitted");
        Ok(Box::new(PendingTransaction {
            transport: self.transport.clone(),
            tx,
            config: self.config,
        }))
    }
}

#[async_trait]
impl RegistryGateway for ContractGateway {
    async fn list_topics(&self, registry: &Address) -> Result<Vec<Topic>, GatewayError> {
        let call = RegistryCall::GetClaimTopics;
        let data = self.call(registry, call).await?;
        abi::decode_topics(&data)
            .map_err(|e| GatewayError::Decode { call: call.signature(), reason: e.to_string() })
    }

    async fn topic_exists(&self, registry: &Address, topic: Topic) -> Result<bool, GatewayError> {
        let call = RegistryCall::ClaimTopicExists(topic);
        let data = self.call(registry, call).await?;
        abi::decode_bool(&data)
            .map_err(|e| GatewayError::Decode { call: call.signature(), reason: e.to_string() })
    }

    async fn owner(&self, registry: &Address) -> Result<Address, GatewayError> {
        let call = RegistryCall::Owner;
        let data = self.call(registry, call).await?;
        abi::decode_address(&data)
            .map_err(|e| GatewayError::Decode { call: call.signature(), reason: e.to_string() })
    }

    async fn topic_count(&self, registry: &Address) -> Result<u64, GatewayError> {
        let call = RegistryCall::GetClaimTopicsCount;
        let data = self.call(registry, call).await?;
        abi::decode_uint(&data, 0)
            .map_err(|e| GatewayError::Decode { call: call.signature(), reason: e.to_string() })
    }

    async fn submit_add(
        &self,
        registry: &Address,
        from: &Address,
        topic: Topic,
    ) -> Result<Box<dyn PendingOperation>, GatewayError> {
        self.send_transaction(registry, from, RegistryCall::AddClaimTopic(topic)).await
    }

    async fn submit_remove(
        &self,
        registry: &Address,
        from: &Address,
        topic: Topic,
    ) -> Result<Box<dyn PendingOperation>, GatewayError> {
        self.send_transaction(registry, from, RegistryCall::RemoveClaimTopic(topic)).await
    }
}

/// A transaction whose receipt has not been seen yet.
struct PendingTransaction {
    transport: DynTransport,
    tx: TxHash,
    config: GatewayConfig,
}

impl PendingTransaction {
    async fn poll_receipt(&self) -> Result<Confirmation, GatewayError> {
        loop {
            let params = [json!(self.tx.to_string())];
            match self.transport.send("eth_getTransactionReceipt", &params).await {
                Ok(Value::Null) => {}
                Ok(receipt) => return parse_receipt(self.tx, &receipt),
                // The node may be briefly unreachable; keep polling until the deadline.
                Err(e) => tracing::warn!(tx = %self.tx, "receipt poll failed: {}", e),
            }
            tokio::time::sleep(self.config.poll_interval).await;
        }
    }
}

#[async_trait]
impl PendingOperation for PendingTransaction {
    fn tx_hash(&self) -> TxHash { self.tx }

    async fn await_confirmation(self: Box<Self>) -> Result<Confirmation, GatewayError> {
        let waited = self.config.confirmation_timeout;
        match tokio::time::timeout(waited, self.poll_receipt()).await {
            Ok(outcome) => outcome,
            Err(_) => Err(GatewayError::ConfirmationTimeout { tx: self.tx, waited }),
        }
    }
}

fn parse_receipt(tx: TxHash, receipt: &Value) -> Result<Confirmation, GatewayError> {
    match receipt.get("status").and_then(Value::as_str) {
        Some("0x1") => Ok(Confirmation::Confirmed(tx)),
        Some("0x0") => Ok(Confirmation::Reverted(tx)),
        other => Err(GatewayError::Decode {
            call: "eth_getTransactionReceipt",
            reason: format!("unexpected receipt status {:?}", other),
        }),
    }
}
