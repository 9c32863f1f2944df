#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::unwrap_used)]

//! # `claim-topics-http`: HTTP Transport Backend
//!
//! This crate provides a concrete HTTP-based implementation of the
//! [`transport::Transport`] trait, enabling JSON-RPC communication with an
//! Ethereum-compatible node or wallet endpoint.
//!
//! ## Overview
//!
//! - Implements [`HttpTransport`], a thin wrapper over [`reqwest::Client`]
//! - Supports both authenticated and unauthenticated RPC calls
//! - Applies the per-request timeout from [`transport::TransportConfig`]
//!
//! ## Example
//! ```no_run
//! use claim_topics_http::HttpTransport;
//! use transport::Transport;
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let transport = HttpTransport::new("http://127.0.0.1:8545");
//!
//! let accounts = transport.send("eth_accounts", &[]).await.unwrap();
//! println!("{:#?}", accounts);
//! # });
//! ```

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use transport::{JsonRpcResponse, Transport, TransportConfig, TransportError};

/// A concrete implementation of the [`Transport`] trait using HTTP.
///
/// `HttpTransport` performs no result typing: it sends raw JSON-RPC
/// requests and returns the `result` field as a [`serde_json::Value`].
///
/// Errors encountered at any stage (HTTP, JSON parsing, or RPC) are
/// normalized into [`TransportError`] variants for uniform handling.
#[derive(Clone)]
pub struct HttpTransport {
    /// The underlying HTTP client used to perform requests.
    client: reqwest::Client,
    /// The full URL of the JSON-RPC endpoint (e.g. `http://127.0.0.1:8545`).
    url: String,
    /// Optional basic authentication credentials `(username, password)`.
    auth: Option<(String, String)>,
    /// Source of JSON-RPC request ids, shared between clones.
    next_id: Arc<AtomicU64>,
}

impl HttpTransport {
    /// Constructs a new `HttpTransport` targeting the provided URL.
    ///
    /// This variant does **not** use authentication or a request timeout.
    ///
    /// # Example
    /// ```
    /// use claim_topics_http::HttpTransport;
    /// use transport::Transport;
    ///
    /// let transport = HttpTransport::new("http://127.0.0.1:8545");
    /// assert_eq!(transport.endpoint(), "http://127.0.0.1:8545");
    /// ```
    pub fn new(url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), url.into(), None)
    }

    /// Constructs a new `HttpTransport` with basic authentication.
    pub fn with_auth(
        url: impl Into<String>,
        user: impl Into<String>,
        pass: impl Into<String>,
    ) -> Self {
        Self::with_client(reqwest::Client::new(), url.into(), Some((user.into(), pass.into())))
    }

    /// Constructs an `HttpTransport` from a [`TransportConfig`].
    ///
    /// # Errors
    /// Returns [`TransportError::Http`] if the underlying client cannot be built.
    pub fn from_config(config: &TransportConfig) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| TransportError::Http(e.to_string()))?;
        let auth = config.auth.as_ref().map(|a| (a.username.clone(), a.password.clone()));
        Ok(Self::with_client(client, config.endpoint.clone(), auth))
    }

    fn with_client(client: reqwest::Client, url: String, auth: Option<(String, String)>) -> Self {
        logging::trace("HTTP", &format!("→ initializing HTTP transport for {}", url));
        Self { client, url, auth, next_id: Arc::new(AtomicU64::new(1)) }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    /// Sends a single JSON-RPC request and returns its `result` field as JSON.
    ///
    /// # Errors
    /// - [`TransportError::Http`] if the HTTP request fails or the status is not a success
    /// - [`TransportError::Serialization`] if body parsing fails
    /// - [`TransportError::Rpc`] if the RPC returns an error object
    /// - [`TransportError::MissingResult`] if the envelope carries neither result nor error
    async fn send(&self, method: &str, params: &[Value]) -> Result<Value, TransportError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        logging::trace("HTTP", &format!("→ POST {} (method: {}, id: {})", self.url, method, id));
        let body = serde_json::json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params
        });

        let mut req = self.client.post(&self.url).json(&body);
        if let Some((u, p)) = &self.auth {
            req = req.basic_auth(u, Some(p));
        }
        let resp = req.send().await.map_err(|e| {
            tracing::error!("HTTP Transport - Request failed: {}", e);
            TransportError::Http(e.to_string())
        })?;

        let status = resp.status();
        let text = resp.text().await.map_err(|e| {
            tracing::error!("HTTP Transport - Failed to read body: {}", e);
            TransportError::Serialization(e.to_string())
        })?;

        let envelope: JsonRpcResponse = match serde_json::from_str(&text) {
            Ok(envelope) => envelope,
            Err(_) if !status.is_success() => {
                return Err(TransportError::Http(format!("{} (body: {})", status, text)));
            }
            Err(e) => {
                return Err(TransportError::Serialization(format!("{} (body: {})", e, text)));
            }
        };

        envelope.into_result().map_err(|e| {
            tracing::debug!("HTTP Transport - {} returned {}", method, e);
            e
        })
    }

    /// Returns the configured JSON-RPC endpoint URL.
    fn endpoint(&self) -> &str { &self.url }
}

#[cfg(test)]
mod tests {
    use transport::AuthConfig;

    use super::*;

    #[test]
    fn test_new() {
        let url = "http://127.0.0.1:8545";
        let transport = HttpTransport::new(url);

        assert_eq!(transport.url, url);
        assert!(transport.auth.is_none());
        assert_eq!(transport.endpoint(), url);
    }

    #[test]
    fn test_with_auth() {
        let url = "http://127.0.0.1:8545";
        let transport = HttpTransport::with_auth(url, "rpcuser", "rpcpassword");

        let (auth_user, auth_pass) = transport.auth.as_ref().expect("auth should be set");
        assert_eq!(auth_user, "rpcuser");
        assert_eq!(auth_pass, "rpcpassword");
        assert_eq!(transport.endpoint(), url);
    }

    #[test]
    fn test_from_config() {
        let config = TransportConfig {
            endpoint: "http://node.internal:8545".to_string(),
            timeout_ms: 500,
            auth: Some(AuthConfig { username: "u".to_string(), password: "p".to_string() }),
        };
        let transport = HttpTransport::from_config(&config).expect("client builds");
        assert_eq!(transport.endpoint(), "http://node.internal:8545");
        assert_eq!(transport.auth, Some(("u".to_string(), "p".to_string())));
    }

    #[tokio::test]
    async fn test_send_to_closed_port_fails() {
        // Nothing listens on port 9 locally; the call must fail instead of yielding a default.
        let transport = HttpTransport::new("http://127.0.0.1:9");
        let result = transport.send("eth_accounts", &[]).await;

        assert!(matches!(result, Err(TransportError::Http(_))));
    }

    #[tokio::test]
    async fn test_request_ids_increase_across_clones() {
        let transport = HttpTransport::new("http://127.0.0.1:9");
        let clone = transport.clone();
        let _ = transport.send("eth_accounts", &[]).await;
        let _ = clone.send("eth_accounts", &[]).await;
        assert_eq!(transport.next_id.load(Ordering::Relaxed), 3);
    }
}
