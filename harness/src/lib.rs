#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::unwrap_used)]

//! Claim Topics Devnet Harness
//!
//! A small JSON-RPC server that stands in for a ledger node with one claim
//! topics registry deployed on it. It speaks just enough of the Ethereum
//! JSON-RPC dialect for the client (`eth_accounts`, `eth_call`,
//! `eth_sendTransaction`, `eth_getTransactionReceipt`) and enforces the
//! registry contract's rules:
//!
//! - only the owner may add or remove topics;
//! - adding a registered topic, or removing an unregistered one, reverts;
//! - at most [`MAX_TOPICS`] topics may be registered;
//! - removal swaps the last topic into the freed slot.
//!
//! Test controls let a caller hold back mining, simulate a signer refusal,
//! or mutate the registry behind the client's back.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use abi::RegistryCall;
use serde_json::{json, Value};
use thiserror::Error;
use tokio::sync::oneshot;
use types::hex_id::{decode_hex, encode_hex};
use types::{Address, Topic, TxHash};
use warp::Filter;

/// Upper bound on registered topics enforced by the registry contract.
pub const MAX_TOPICS: usize = 15;

/// Errors that can occur in the harness.
#[derive(Debug, Error)]
pub enum HarnessError {
    /// The JSON-RPC method is not served by the devnet.
    #[error("Unknown method: {0}")]
    UnknownMethod(String),

    /// The request parameters were missing or malformed.
    #[error("Invalid params: {0}")]
    InvalidParams(String),

    /// The sender is not an account held by the devnet.
    #[error("Unknown account: {0}")]
    UnknownAccount(Address),

    /// The simulated signer declined the transaction.
    #[error("User denied transaction signature")]
    UserRejected,

    /// The server could not bind its listening socket.
    #[error("Failed to bind devnet server: {0}")]
    Bind(String),
}

impl HarnessError {
    /// JSON-RPC error code for the failure.
    pub fn code(&self) -> i64 {
        match self {
            HarnessError::UnknownMethod(_) => -32601,
            HarnessError::InvalidParams(_) => -32602,
            HarnessError::UnknownAccount(_) => -32000,
            HarnessError::UserRejected => 4001,
            HarnessError::Bind(_) => -32603,
        }
    }
}

/// Initial chain state.
#[derive(Debug, Clone)]
pub struct DevnetConfig {
    /// Accounts the devnet can sign for, first one reported first.
    pub accounts: Vec<Address>,
    /// Owner of the registry.
    pub owner: Address,
    /// Address the registry is deployed at.
    pub registry: Address,
    /// Topics registered at genesis.
    pub topics: Vec<Topic>,
}

/// Well-known development account #0, the default registry owner.
pub const DEV_ACCOUNT_0: Address = Address::new([
    0xf3, 0x9f, 0xd6, 0xe5, 0x1a, 0xad, 0x88, 0xf6, 0xf4, 0xce, 0x6a, 0xb8, 0x82, 0x72, 0x79, 0xcf,
    0xff, 0xb9, 0x22, 0x66,
]);

/// Well-known development account #1.
pub const DEV_ACCOUNT_1: Address = Address::new([
    0x70, 0x99, 0x79, 0x70, 0xc5, 0x18, 0x12, 0xdc, 0x3a, 0x01, 0x0c, 0x7d, 0x01, 0xb5, 0x0e, 0x0d,
    0x17, 0xdc, 0x79, 0xc8,
]);

/// Default deployment address of the registry.
pub const DEFAULT_REGISTRY: Address = Address::new([
    0x9f, 0xe4, 0x67, 0x36, 0x67, 0x9d, 0x2d, 0x9a, 0x65, 0xf0, 0x99, 0x2f, 0x22, 0x72, 0xde, 0x9f,
    0x3c, 0x7f, 0xa6, 0xe0,
]);

impl Default for DevnetConfig {
    fn default() -> Self {
        Self {
            accounts: vec![DEV_ACCOUNT_0, DEV_ACCOUNT_1],
            owner: DEV_ACCOUNT_0,
            registry: DEFAULT_REGISTRY,
            topics: Vec::new(),
        }
    }
}

struct PendingTx {
    hash: TxHash,
    from: Address,
    to: Address,
    data: Vec<u8>,
}

struct ChainState {
    config: DevnetConfig,
    topics: Vec<Topic>,
    receipts: HashMap<TxHash, bool>,
    mempool: Vec<PendingTx>,
    auto_mine: bool,
    reject_next_send: bool,
    nonce: u64,
    calls: HashMap<&'static str, usize>,
}

impl ChainState {
    /// Runs a transaction against the registry, returning whether it succeeded.
    fn execute(&mut self, tx: &PendingTx) -> bool {
        if tx.to != self.config.registry || tx.from != self.config.owner {
            return false;
        }
        match RegistryCall::decode(&tx.data) {
            Ok(RegistryCall::AddClaimTopic(topic)) => {
                if self.topics.contains(&topic) || self.topics.len() >= MAX_TOPICS {
                    return false;
                }
                self.topics.push(topic);
                true
            }
            Ok(RegistryCall::RemoveClaimTopic(topic)) => {
                match self.topics.iter().position(|t| *t == topic) {
                    Some(index) => {
                        self.topics.swap_remove(index);
                        true
                    }
                    None => false,
                }
            }
            _ => false,
        }
    }

    fn mine(&mut self) -> usize {
        let pending = std::mem::take(&mut self.mempool);
        for tx in &pending {
            let success = self.execute(tx);
            tracing::debug!(tx = %tx.hash, success, "mined transaction");
            self.receipts.insert(tx.hash, success);
        }
        pending.len()
    }

    fn next_hash(&mut self) -> TxHash {
        self.nonce += 1;
        let mut bytes = [0u8; 32];
        bytes[..4].copy_from_slice(&[0xde, 0x71, 0xe7, 0x00]);
        bytes[24..].copy_from_slice(&self.nonce.to_be_bytes());
        TxHash::new(bytes)
    }

    fn view_call(&self, to: &Address, data: &[u8]) -> Result<Vec<u8>, HarnessError> {
        if *to != self.config.registry {
            // No code at that address.
            return Ok(Vec::new());
        }
        let call =
            RegistryCall::decode(data).map_err(|e| HarnessError::InvalidParams(e.to_string()))?;
        let out = match call {
            RegistryCall::GetClaimTopics => abi::encode_topics(&self.topics),
            RegistryCall::ClaimTopicExists(topic) => {
                abi::encode_bool(self.topics.contains(&topic)).to_vec()
            }
            RegistryCall::GetClaimTopicsCount => abi::encode_uint(self.topics.len() as u64).to_vec(),
            RegistryCall::Owner => abi::encode_address(&self.config.owner).to_vec(),
            RegistryCall::AddClaimTopic(_) | RegistryCall::RemoveClaimTopic(_) => Vec::new(),
        };
        Ok(out)
    }
}

/// In-memory chain with one registry deployed on it.
pub struct Devnet {
    state: Mutex<ChainState>,
}

impl Devnet {
    /// Creates a devnet from its genesis configuration.
    pub fn new(config: DevnetConfig) -> Self {
        let topics = config.topics.clone();
        Self {
            state: Mutex::new(ChainState {
                config,
                topics,
                receipts: HashMap::new(),
                mempool: Vec::new(),
                auto_mine: true,
                reject_next_send: false,
                nonce: 0,
                calls: HashMap::new(),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ChainState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Address the registry is deployed at.
    pub fn registry(&self) -> Address { self.lock().config.registry }

    /// Current registry owner.
    pub fn owner(&self) -> Address { self.lock().config.owner }

    /// Registered topics in storage order.
    pub fn topics(&self) -> Vec<Topic> { self.lock().topics.clone() }

    /// Transfers registry ownership.
    pub fn set_owner(&self, owner: Address) { self.lock().config.owner = owner; }

    /// Replaces the accounts the devnet reports and signs for.
    pub fn set_accounts(&self, accounts: Vec<Address>) { self.lock().config.accounts = accounts; }

    /// With auto-mining off, submitted transactions wait in the mempool
    /// without receipts until [`Devnet::mine`] is called.
    pub fn set_auto_mine(&self, enabled: bool) { self.lock().auto_mine = enabled; }

    /// Includes every pending transaction, returning how many were mined.
    pub fn mine(&self) -> usize { self.lock().mine() }

    /// Makes the next `eth_sendTransaction` fail as if the user declined.
    pub fn reject_next_send(&self) { self.lock().reject_next_send = true; }

    /// Registers a topic directly, as another client's transaction would.
    pub fn insert_topic_externally(&self, topic: Topic) {
        let mut state = self.lock();
        if !state.topics.contains(&topic) {
            state.topics.push(topic);
        }
    }

    /// How many times `method` has been served.
    pub fn call_count(&self, method: &str) -> usize {
        self.lock().calls.get(method).copied().unwrap_or(0)
    }

    /// Serves one JSON-RPC call.
    pub fn handle_rpc_call(&self, method: &str, params: &Value) -> Result<Value, HarnessError> {
        let mut state = self.lock();
        let key = match method {
            "eth_accounts" => "eth_accounts",
            "eth_call" => "eth_call",
            "eth_sendTransaction" => "eth_sendTransaction",
            "eth_getTransactionReceipt" => "eth_getTransactionReceipt",
            other => return Err(HarnessError::UnknownMethod(other.to_string())),
        };
        *state.calls.entry(key).or_insert(0) += 1;

        match key {
            "eth_accounts" => {
                let accounts: Vec<String> =
                    state.config.accounts.iter().map(ToString::to_string).collect();
                Ok(json!(accounts))
            }
            "eth_call" => {
                let request = param(params, 0)?;
                let to = address_field(request, "to")?;
                let data = data_field(request)?;
                Ok(json!(encode_hex(&state.view_call(&to, &data)?)))
            }
            "eth_sendTransaction" => {
                let request = param(params, 0)?;
                let from = address_field(request, "from")?;
                let to = address_field(request, "to")?;
                let data = data_field(request)?;

                if std::mem::take(&mut state.reject_next_send) {
                    return Err(HarnessError::UserRejected);
                }
                if !state.config.accounts.contains(&from) {
                    return Err(HarnessError::UnknownAccount(from));
                }

                let hash = state.next_hash();
                state.mempool.push(PendingTx { hash, from, to, data });
                if state.auto_mine {
                    state.mine();
                }
                Ok(json!(hash.to_string()))
            }
            _ => {
                let hash: TxHash = param(params, 0)?
                    .as_str()
                    .ok_or_else(|| HarnessError::InvalidParams("expected hash".to_string()))?
                    .parse()
                    .map_err(|e: types::HexIdError| HarnessError::InvalidParams(e.to_string()))?;
                Ok(match state.receipts.get(&hash) {
                    Some(success) => json!({
                        "transactionHash": hash.to_string(),
                        "status": if *success { "0x1" } else { "0x0" },
                    }),
                    None => Value::Null,
                })
            }
        }
    }
}

fn param(params: &Value, index: usize) -> Result<&Value, HarnessError> {
    params
        .get(index)
        .ok_or_else(|| HarnessError::InvalidParams(format!("missing parameter {}", index)))
}

fn address_field(request: &Value, field: &str) -> Result<Address, HarnessError> {
    request
        .get(field)
        .and_then(Value::as_str)
        .ok_or_else(|| HarnessError::InvalidParams(format!("missing {}", field)))?
        .parse()
        .map_err(|e: types::HexIdError| HarnessError::InvalidParams(format!("{}: {}", field, e)))
}

fn data_field(request: &Value) -> Result<Vec<u8>, HarnessError> {
    let data = request.get("data").and_then(Value::as_str).unwrap_or("0x");
    decode_hex(data).map_err(|e| HarnessError::InvalidParams(format!("data: {}", e)))
}

/// Create the HTTP server routes.
pub fn create_routes(
    devnet: Arc<Devnet>,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    let devnet_filter = warp::any().map(move || devnet.clone());

    // Health check endpoint
    let health =
        warp::path("health").and(warp::get()).map(|| warp::reply::json(&json!({"status": "ok"})));

    // RPC endpoint
    let rpc = warp::path::end()
        .and(warp::post())
        .and(devnet_filter)
        .and(warp::body::json())
        .map(handle_rpc_request);

    health.or(rpc)
}

/// Handle one JSON-RPC request envelope.
fn handle_rpc_request(devnet: Arc<Devnet>, request: Value) -> warp::reply::Json {
    let id = request.get("id").cloned().unwrap_or(json!(1));
    let method = request.get("method").and_then(Value::as_str).unwrap_or_default();
    let params = request.get("params").cloned().unwrap_or(json!([]));

    let response = match devnet.handle_rpc_call(method, &params) {
        Ok(result) => json!({"jsonrpc": "2.0", "id": id, "result": result}),
        Err(e) => {
            tracing::debug!(method, "devnet error: {}", e);
            json!({
                "jsonrpc": "2.0",
                "id": id,
                "error": {"code": e.code(), "message": e.to_string()}
            })
        }
    };
    warp::reply::json(&response)
}

/// A running devnet server; shuts down when dropped.
pub struct DevnetServer {
    addr: SocketAddr,
    devnet: Arc<Devnet>,
    shutdown: Option<oneshot::Sender<()>>,
}

impl DevnetServer {
    /// Serves `devnet` on an ephemeral localhost port.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(devnet: Arc<Devnet>) -> Result<Self, HarnessError> {
        Self::bind(([127, 0, 0, 1], 0).into(), devnet)
    }

    /// Serves `devnet` on `addr`.
    pub fn bind(addr: SocketAddr, devnet: Arc<Devnet>) -> Result<Self, HarnessError> {
        let (tx, rx) = oneshot::channel::<()>();
        let (addr, server) = warp::serve(create_routes(devnet.clone()))
            .try_bind_with_graceful_shutdown(addr, async {
                let _ = rx.await;
            })
            .map_err(|e| HarnessError::Bind(e.to_string()))?;
        tokio::spawn(server);
        tracing::info!("devnet listening on {}", addr);
        Ok(Self { addr, devnet, shutdown: Some(tx) })
    }

    /// JSON-RPC endpoint URL.
    pub fn url(&self) -> String { format!("http://{}", self.addr) }

    /// The chain served by this server.
    pub fn devnet(&self) -> &Arc<Devnet> { &self.devnet }
}

impl Drop for DevnetServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}
