#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::unwrap_used)]

//! # `claim-topics-transport`: Foundational Communication Layer
//!
//! This crate defines the **core transport abstraction** used by the claim
//! topics client to reach a ledger node.
//!
//! ## Core Concepts
//!
//! ### `Transport` Trait
//! Defines how a single JSON-RPC call is sent (`send`), returning the
//! deserialized [`serde_json::Value`] of the `result` field rather than a
//! typed response. Backends such as `claim-topics-http` implement this trait
//! to perform their actual I/O work; tests implement it in memory.
//!
//! ### `TransportError`
//! Enumerates all possible classes of errors encountered during communication.
//! JSON-RPC error objects keep their numeric code so callers can tell a
//! signer refusal from a node failure.
//!
//! ### `DynTransport`
//! A type-erased (`Arc<dyn Transport>`) wrapper for sharing one connection
//! between the registry gateway and the identity resolver.
//!
//! ## Example
//! ```no_run
//! use transport::{DynTransport, Transport, TransportError};
//!
//! async fn demo(transport: DynTransport) -> Result<(), TransportError> {
//!     let accounts = transport.send("eth_accounts", &[]).await?;
//!     println!("accounts = {}", accounts);
//!     Ok(())
//! }
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Type alias for structured error handling in transport operations.
pub type Result<T> = std::result::Result<T, TransportError>;

/// JSON-RPC error code a wallet returns when the user declines to sign
/// (EIP-1193 `4001 User Rejected Request`).
pub const USER_REJECTED_CODE: i64 = 4001;

/// Canonical error type for all transport implementations.
///
/// Each variant corresponds to a distinct communication or parsing
/// failure mode. Backend-specific details are flattened into strings so
/// that higher layers can reason uniformly about network, serialization,
/// and RPC failures.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum TransportError {
    /// An HTTP-level failure (connection refused, timeout, or bad status code).
    #[error("HTTP transport error: {0}")]
    Http(String),

    /// Failure to serialize or deserialize a JSON payload.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// The remote endpoint returned an explicit JSON-RPC error object.
    #[error("RPC error {code}: {message}")]
    Rpc {
        /// JSON-RPC error code.
        code: i64,
        /// Error message reported by the node or wallet.
        message: String,
    },

    /// The JSON-RPC response was missing the expected `result` field.
    #[error("Missing result field")]
    MissingResult,

    /// The response did not conform to the expected JSON-RPC envelope format.
    #[error("Invalid response format: {0}")]
    InvalidFormat(String),
}

impl TransportError {
    /// Whether a wallet or node refused to sign on the user's behalf.
    pub fn is_user_rejection(&self) -> bool {
        matches!(self, TransportError::Rpc { code, .. } if *code == USER_REJECTED_CODE)
    }
}

impl From<serde_json::Error> for TransportError {
    fn from(err: serde_json::Error) -> Self { TransportError::Serialization(err.to_string()) }
}

/// The base transport trait for single-message delivery.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Sends a single JSON-RPC call.
    ///
    /// The request is identified by its `method` name and an ordered list
    /// of parameters serialized as [`serde_json::Value`]s. Implementations
    /// return the value of the `"result"` field from the corresponding
    /// JSON-RPC response, or an appropriate [`TransportError`].
    async fn send(&self, method: &str, params: &[Value]) -> Result<Value>;

    /// Returns the configured endpoint or connection descriptor.
    ///
    /// For network transports, this is usually the URL.
    /// For mock or in-memory transports, it may be a symbolic name.
    fn endpoint(&self) -> &str;
}

/// Type alias for a shared, dynamically dispatched transport instance.
///
/// ```
/// use transport::{DynTransport, Transport};
///
/// fn use_transport(t: DynTransport) {
///     println!("Using endpoint: {}", t.endpoint());
/// }
/// ```
pub type DynTransport = Arc<dyn Transport>;

/// JSON-RPC 2.0 error object.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcError {
    /// Numeric error code.
    pub code: i64,
    /// Short description of the error.
    pub message: String,
}

/// Minimal structure representing a JSON-RPC response envelope.
///
/// Fields correspond directly to those defined in the JSON-RPC 2.0 specification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    /// The value returned by the RPC call, if successful.
    #[serde(default, deserialize_with = "deserialize_present")]
    pub result: Option<Value>,
    /// The error object returned by the server, if any.
    #[serde(default)]
    pub error: Option<JsonRpcError>,
    /// The unique identifier correlating request and response.
    #[serde(default)]
    pub id: Value,
}

/// Keeps an explicit `null` as `Some(Value::Null)`; only an absent field is `None`.
fn deserialize_present<'de, D>(deserializer: D) -> std::result::Result<Option<Value>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

impl JsonRpcResponse {
    /// Converts the envelope into the call's result or its error.
    ///
    /// A `null` result is a legitimate answer (e.g. a receipt that does not
    /// exist yet), so only an entirely absent `result` field is reported as
    /// [`TransportError::MissingResult`].
    pub fn into_result(self) -> Result<Value> {
        if let Some(error) = self.error {
            return Err(TransportError::Rpc { code: error.code, message: error.message });
        }
        self.result.ok_or(TransportError::MissingResult)
    }
}

/// Transport configuration for communication backends.
///
/// # Examples
///
/// HTTP transport with basic authentication:
/// ```
/// use transport::{AuthConfig, TransportConfig};
///
/// let config = TransportConfig {
///     endpoint: "http://127.0.0.1:8545".to_string(),
///     timeout_ms: 10_000,
///     auth: Some(AuthConfig {
///         username: "rpcuser".to_string(),
///         password: "rpcpassword".to_string(),
///     }),
/// };
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransportConfig {
    /// Connection endpoint (URL)
    pub endpoint: String,
    /// Per-request timeout in milliseconds
    #[serde(default = "TransportConfig::default_timeout_ms")]
    pub timeout_ms: u64,
    /// Authentication settings (optional)
    #[serde(default)]
    pub auth: Option<AuthConfig>,
}

impl TransportConfig {
    fn default_timeout_ms() -> u64 { 10_000 }
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://127.0.0.1:8545".to_string(),
            timeout_ms: Self::default_timeout_ms(),
            auth: None,
        }
    }
}

/// Basic authentication for node endpoints that sit behind a proxy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Username
    pub username: String,
    /// Password
    pub password: String,
}
