#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::unwrap_used)]

//! Claim Topics Configuration
//!
//! This crate provides configuration management for the claim topics client.
//! It handles loading, saving, and overriding configuration that specifies:
//! - The registry contract to synchronize with
//! - Node connection and confirmation settings
//! - The signing account, if one is configured up front
//! - Logging configuration
//!
//! Configuration is stored in TOML format. Every field has a default suited to
//! a local development node, and `CLAIM_TOPICS_*` environment variables take
//! precedence over the file.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use transport::{AuthConfig, TransportConfig};
use types::Address;

/// Registry contract address.
pub const ENV_REGISTRY: &str = "CLAIM_TOPICS_REGISTRY";
/// JSON-RPC endpoint.
pub const ENV_RPC_URL: &str = "CLAIM_TOPICS_RPC_URL";
/// Per-request timeout in milliseconds.
pub const ENV_RPC_TIMEOUT_MS: &str = "CLAIM_TOPICS_RPC_TIMEOUT_MS";
/// Basic auth username.
pub const ENV_RPC_USER: &str = "CLAIM_TOPICS_RPC_USER";
/// Basic auth password.
pub const ENV_RPC_PASSWORD: &str = "CLAIM_TOPICS_RPC_PASSWORD";
/// Receipt polling interval in milliseconds.
pub const ENV_POLL_INTERVAL_MS: &str = "CLAIM_TOPICS_POLL_INTERVAL_MS";
/// Confirmation timeout in milliseconds.
pub const ENV_CONFIRMATION_TIMEOUT_MS: &str = "CLAIM_TOPICS_CONFIRMATION_TIMEOUT_MS";
/// Signing account.
pub const ENV_FROM: &str = "CLAIM_TOPICS_FROM";
/// Log level.
pub const ENV_LOG_LEVEL: &str = "CLAIM_TOPICS_LOG_LEVEL";
/// Log file.
pub const ENV_LOG_FILE: &str = "CLAIM_TOPICS_LOG_FILE";

/// Errors that can occur when loading or saving configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),
    /// Failed to parse the TOML configuration file
    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
    /// Failed to serialize configuration to TOML format
    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
    /// Configuration file was not found at the specified path
    #[error("Config file not found at: {0}")]
    NotFound(PathBuf),
    /// Could not locate the user's configuration directory
    #[error("Could not find user config directory")]
    ConfigDirUnavailable,
    /// An environment override could not be parsed
    #[error("Invalid value {value:?} for {key}: {reason}")]
    InvalidEnv {
        /// Variable name
        key: &'static str,
        /// Raw value
        value: String,
        /// Parse failure
        reason: String,
    },
}

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Registry contract settings
    pub registry: RegistryConfig,
    /// Node connection settings
    pub rpc: RpcConfig,
    /// Signing account settings
    pub signer: SignerConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Registry contract settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Address of the claim topics registry contract
    pub address: Option<Address>,
}

/// Node connection settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RpcConfig {
    /// JSON-RPC endpoint (URL)
    pub url: String,
    /// Per-request timeout in milliseconds
    pub timeout_ms: u64,
    /// Basic authentication (optional)
    pub auth: Option<AuthConfig>,
    /// Delay between two transaction receipt polls, in milliseconds
    pub poll_interval_ms: u64,
    /// Give up on a transaction after this many milliseconds
    pub confirmation_timeout_ms: u64,
}

impl RpcConfig {
    /// Transport settings for the HTTP backend.
    pub fn transport(&self) -> TransportConfig {
        TransportConfig {
            endpoint: self.url.clone(),
            timeout_ms: self.timeout_ms,
            auth: self.auth.clone(),
        }
    }

    /// Receipt polling interval.
    pub fn poll_interval(&self) -> Duration { Duration::from_millis(self.poll_interval_ms) }

    /// Confirmation timeout.
    pub fn confirmation_timeout(&self) -> Duration {
        Duration::from_millis(self.confirmation_timeout_ms)
    }
}

impl Default for RpcConfig {
    fn default() -> Self {
        let transport = TransportConfig::default();
        Self {
            url: transport.endpoint,
            timeout_ms: transport.timeout_ms,
            auth: None,
            poll_interval_ms: 1_000,
            confirmation_timeout_ms: 120_000,
        }
    }
}

/// Signing account settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignerConfig {
    /// Account that signs mutations; the node's first account when unset
    pub from: Option<Address>,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Log file path (optional)
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self { Self { level: "warn".to_string(), file: None } }
}

impl Config {
    /// Load configuration from a TOML file at `path`
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        let config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Save this configuration as a pretty-printed TOML file at `path`
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let contents = toml::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Returns the default config file path:
    /// `{config_dir()}/claim-topics/config.toml`
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        let config_dir =
            dirs::config_dir().ok_or(ConfigError::ConfigDirUnavailable)?.join("claim-topics");
        Ok(config_dir.join("config.toml"))
    }

    /// Loads the effective configuration.
    ///
    /// An explicit `path` must exist. Without one, the default path is used
    /// if present and defaults otherwise. Environment overrides are applied
    /// last.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) if !path.exists() => return Err(ConfigError::NotFound(path.to_path_buf())),
            Some(path) => Self::from_file(path)?,
            None => match Self::default_path() {
                Ok(path) if path.exists() => Self::from_file(path)?,
                _ => Self::default(),
            },
        };
        config.apply_env()?;
        Ok(config)
    }

    /// Applies `CLAIM_TOPICS_*` environment overrides
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        self.apply_env_internal(|key| std::env::var(key).ok())
    }

    /// Internal function for testing - allows injection of environment values
    fn apply_env_internal(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        fn parse_env<T>(key: &'static str, value: String) -> Result<T, ConfigError>
        where
            T: std::str::FromStr,
            T::Err: std::fmt::Display,
        {
            let parsed = value.trim().parse::<T>();
            parsed.map_err(|e| ConfigError::InvalidEnv { key, reason: e.to_string(), value })
        }

        if let Some(value) = lookup(ENV_REGISTRY) {
            self.registry.address = Some(parse_env(ENV_REGISTRY, value)?);
        }
        if let Some(url) = lookup(ENV_RPC_URL) {
            self.rpc.url = url;
        }
        if let Some(value) = lookup(ENV_RPC_TIMEOUT_MS) {
            self.rpc.timeout_ms = parse_env(ENV_RPC_TIMEOUT_MS, value)?;
        }
        if let (Some(username), Some(password)) = (lookup(ENV_RPC_USER), lookup(ENV_RPC_PASSWORD)) {
            self.rpc.auth = Some(AuthConfig { username, password });
        }
        if let Some(value) = lookup(ENV_POLL_INTERVAL_MS) {
            self.rpc.poll_interval_ms = parse_env(ENV_POLL_INTERVAL_MS, value)?;
        }
        if let Some(value) = lookup(ENV_CONFIRMATION_TIMEOUT_MS) {
            self.rpc.confirmation_timeout_ms = parse_env(ENV_CONFIRMATION_TIMEOUT_MS, value)?;
        }
        if let Some(value) = lookup(ENV_FROM) {
            self.signer.from = Some(parse_env(ENV_FROM, value)?);
        }
        if let Some(level) = lookup(ENV_LOG_LEVEL) {
            self.logging.level = level;
        }
        if let Some(file) = lookup(ENV_LOG_FILE) {
            self.logging.file = Some(PathBuf::from(file));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::fs;

    use tempfile::NamedTempFile;

    use super::*;

    const REGISTRY: &str = "0x9fe46736679d2d9a65f0992f2272de9f3c7fa6e0";
    const OWNER: &str = "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266";

    #[test]
    fn test_from_file() {
        let temp_file = NamedTempFile::new().expect("Failed to create temporary file");
        let toml_content = format!(
            r#"
            [registry]
            address = "{}"

            [rpc]
            url = "http://10.0.0.5:8545"
            confirmation_timeout_ms = 30000

            [rpc.auth]
            username = "rpcuser"
            password = "rpcpassword"

            [signer]
            from = "0xF39FD6E51AAD88F6F4CE6AB8827279CFFFB92266"

            [logging]
            level = "debug"
            file = "claim-topics.log"
        "#,
            REGISTRY
        );
        fs::write(&temp_file, toml_content).expect("Failed to write TOML content");

        let loaded = Config::from_file(&temp_file).expect("Failed to load config");
        assert_eq!(loaded.registry.address, Some(REGISTRY.parse().expect("address")));
        assert_eq!(loaded.rpc.url, "http://10.0.0.5:8545");
        assert_eq!(loaded.rpc.confirmation_timeout(), Duration::from_secs(30));
        // Unspecified fields keep their defaults
        assert_eq!(loaded.rpc.timeout_ms, 10_000);
        assert_eq!(loaded.rpc.poll_interval(), Duration::from_secs(1));
        assert_eq!(loaded.signer.from, Some(OWNER.parse().expect("address")));
        assert_eq!(loaded.logging.level, "debug");
        assert_eq!(loaded.logging.file, Some(PathBuf::from("claim-topics.log")));

        let transport = loaded.rpc.transport();
        assert_eq!(transport.endpoint, "http://10.0.0.5:8545");
        assert_eq!(transport.auth.expect("auth").username, "rpcuser");

        // Test file not found error
        match Config::from_file("nonexistent_file.toml").expect_err("missing file") {
            ConfigError::FileRead(_) => {}
            other => panic!("Expected FileRead error, got {:?}", other),
        }

        // Test parse error
        let temp_file = NamedTempFile::new().expect("Failed to create temporary file");
        fs::write(&temp_file, "[registry]\naddress = \"0x1234\"").expect("Failed to write");
        match Config::from_file(&temp_file).expect_err("short address") {
            ConfigError::Parse(_) => {}
            other => panic!("Expected Parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_file_is_default() {
        let temp_file = NamedTempFile::new().expect("Failed to create temporary file");
        let loaded = Config::from_file(&temp_file).expect("empty config");
        assert_eq!(loaded, Config::default());
    }

    #[test]
    fn test_save() {
        let mut config = Config::default();
        config.registry.address = Some(REGISTRY.parse().expect("address"));
        let temp_file = NamedTempFile::new().expect("Failed to create temporary file");

        config.save(&temp_file).expect("save");
        let contents = fs::read_to_string(&temp_file).expect("Failed to read saved config");
        assert!(contents.contains(REGISTRY));
        assert!(contents.contains("http://127.0.0.1:8545"));
        assert_eq!(Config::from_file(&temp_file).expect("reload"), config);

        let temp_dir = tempfile::tempdir().expect("Failed to create temporary directory");
        let non_existent_subdir = temp_dir.path().join("nonexistent").join("config.toml");
        match config.save(&non_existent_subdir).expect_err("missing directory") {
            ConfigError::FileRead(_) => (),
            other => panic!("Expected FileRead error, got {:?}", other),
        }
    }

    #[test]
    fn test_default_path() {
        let path = Config::default_path().expect("Failed to get default config path");
        let path_str = path.to_str().expect("Path should be valid UTF-8");
        assert!(path_str.contains("claim-topics"));
        assert!(path_str.ends_with("config.toml"));
    }

    #[test]
    fn test_load_explicit_path_must_exist() {
        let temp_dir = tempfile::tempdir().expect("Failed to create temporary directory");
        let missing = temp_dir.path().join("config.toml");
        match Config::load(Some(&missing)).expect_err("missing") {
            ConfigError::NotFound(path) => assert_eq!(path, missing),
            other => panic!("Expected NotFound error, got {:?}", other),
        }
    }

    #[test]
    fn test_apply_env_internal() {
        let env: HashMap<&str, &str> = [
            (ENV_REGISTRY, REGISTRY),
            (ENV_RPC_URL, "http://node:8545"),
            (ENV_RPC_USER, "alice"),
            (ENV_RPC_PASSWORD, "secret"),
            (ENV_CONFIRMATION_TIMEOUT_MS, " 2500 "),
            (ENV_FROM, OWNER),
            (ENV_LOG_LEVEL, "trace"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config
            .apply_env_internal(|key| env.get(key).map(|v| v.to_string()))
            .expect("valid overrides");
        assert_eq!(config.registry.address, Some(REGISTRY.parse().expect("address")));
        assert_eq!(config.rpc.url, "http://node:8545");
        assert_eq!(config.rpc.confirmation_timeout_ms, 2_500);
        assert_eq!(config.rpc.poll_interval_ms, 1_000);
        assert_eq!(
            config.rpc.auth,
            Some(AuthConfig { username: "alice".to_string(), password: "secret".to_string() })
        );
        assert_eq!(config.signer.from, Some(OWNER.parse().expect("address")));
        assert_eq!(config.logging.level, "trace");
        assert_eq!(config.logging.file, None);
    }

    #[test]
    fn test_apply_env_rejects_garbage() {
        let mut config = Config::default();
        let err = config
            .apply_env_internal(|key| (key == ENV_POLL_INTERVAL_MS).then(|| "soon".to_string()))
            .expect_err("not a number");
        match err {
            ConfigError::InvalidEnv { key, value, .. } => {
                assert_eq!(key, ENV_POLL_INTERVAL_MS);
                assert_eq!(value, "soon");
            }
            other => panic!("Expected InvalidEnv error, got {:?}", other),
        }

        let err = config
            .apply_env_internal(|key| (key == ENV_REGISTRY).then(|| "registry".to_string()))
            .expect_err("not an address");
        assert!(err.to_string().contains(ENV_REGISTRY));
    }

    #[test]
    fn test_default() {
        let config = Config::default();
        assert_eq!(config.registry.address, None);
        assert_eq!(config.rpc.url, "http://127.0.0.1:8545");
        assert_eq!(config.rpc.confirmation_timeout(), Duration::from_secs(120));
        assert_eq!(config.signer.from, None);
        assert_eq!(config.logging.level, "warn");
        assert_eq!(config.logging.file, None);
    }
}
