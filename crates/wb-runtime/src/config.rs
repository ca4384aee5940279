//! # Runtime Configuration
//!
//! Every section has working defaults, so an empty file (or no file at all)
//! starts a local wallet background on Avalanche C-Chain.
//!
//! ## Sources, in order
//!
//! 1. Built-in defaults
//! 2. TOML file named by `WB_CONFIG`
//! 3. `WB_HOST`, `WB_PORT`, `WB_DATA_FILE` and `WB_AUTH_TOKEN`
//!
//! Without a configured auth token the process generates one per launch and
//! hands it to the host on stdout.

use serde::{Deserialize, Serialize};
use shared_types::{ChainList, Network, NetworkToken};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};
use url::Url;
use wb_01_transport::ConnectionNames;

pub const C_CHAIN_ID: u64 = 43114;
pub const FUJI_CHAIN_ID: u64 = 43113;
pub const MIN_AUTH_TOKEN_LEN: usize = 16;

/// Complete runtime configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Host transport listener.
    pub server: ServerConfig,
    /// Connection names the host uses for each trust domain.
    pub connections: ConnectionsConfig,
    pub storage: StorageConfig,
    pub trust: TrustConfig,
    /// Approval lifecycle limits.
    pub actions: ActionsConfig,
    pub networks: NetworksConfig,
    pub signer: SignerConfig,
    pub swap: SwapConfig,
}

impl RuntimeConfig {
    /// Parse a TOML document.
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        Self::from_toml(&text)
    }

    /// Defaults, then `WB_CONFIG`, then the environment overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = match std::env::var("WB_CONFIG") {
            Ok(path) => {
                info!(path = %path, "Loading configuration file");
                Self::from_file(Path::new(&path))?
            }
            Err(_) => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Generate a per-launch auth token if none is configured.
    ///
    /// Returns `true` if one was generated.
    pub fn ensure_auth_token(&mut self) -> bool {
        if self.server.auth_token.is_some() {
            return false;
        }
        self.server.auth_token = Some(uuid::Uuid::new_v4().simple().to_string());
        true
    }

    /// Apply overrides from `lookup`. Unparseable values are ignored.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("WB_HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("WB_PORT") {
            match port.parse() {
                Ok(port) => self.server.port = port,
                Err(_) => warn!(value = %port, "WB_PORT is not a port number, ignoring"),
            }
        }
        if let Some(path) = lookup("WB_DATA_FILE") {
            self.storage.data_file = PathBuf::from(path);
        }
        if let Some(token) = lookup("WB_AUTH_TOKEN") {
            self.server.auth_token = Some(token);
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.listen_addr()?;
        if self.server.auth_token.as_deref().is_some_and(|token| token.len() < MIN_AUTH_TOKEN_LEN) {
            return Err(ConfigError::Invalid(format!(
                "server.auth_token must be at least {MIN_AUTH_TOKEN_LEN} characters"
            )));
        }

        let names = [
            &self.connections.extension_name,
            &self.connections.approval_name,
            &self.connections.provider_name,
        ];
        if names.iter().any(|name| name.is_empty()) {
            return Err(ConfigError::Invalid("connection names cannot be empty".into()));
        }
        if names[0] == names[1] || names[0] == names[2] || names[1] == names[2] {
            return Err(ConfigError::DuplicateConnectionName);
        }

        if self.networks.supported.is_empty() {
            return Err(ConfigError::Invalid("at least one supported network is required".into()));
        }
        if !self
            .networks
            .supported
            .iter()
            .any(|network| network.chain_id == self.networks.default_chain)
        {
            return Err(ConfigError::UnknownDefaultChain(self.networks.default_chain));
        }
        for network in &self.networks.supported {
            Url::parse(&network.rpc_url).map_err(|e| ConfigError::InvalidUrl {
                field: format!("networks.supported[{}].rpc_url", network.chain_id),
                reason: e.to_string(),
            })?;
        }

        if self.actions.cleanup_interval_secs == 0 {
            return Err(ConfigError::Invalid("actions.cleanup_interval_secs cannot be 0".into()));
        }

        for (field, url) in [("signer.url", &self.signer.url), ("swap.url", &self.swap.url)] {
            if let Some(url) = url {
                Url::parse(url).map_err(|e| ConfigError::InvalidUrl {
                    field: field.to_string(),
                    reason: e.to_string(),
                })?;
            }
        }
        Ok(())
    }

    pub fn listen_addr(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|_| {
                ConfigError::Invalid(format!(
                    "invalid listen address {}:{}",
                    self.server.host, self.server.port
                ))
            })
    }

    pub fn connection_names(&self) -> ConnectionNames {
        ConnectionNames {
            extension: self.connections.extension_name.clone(),
            approval: self.connections.approval_name.clone(),
            provider: self.connections.provider_name.clone(),
        }
    }

    pub fn supported_chains(&self) -> ChainList {
        self.networks
            .supported
            .iter()
            .map(|network| (network.chain_id, network.clone()))
            .collect()
    }
}

/// Configuration errors.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {reason}")]
    Read { path: PathBuf, reason: String },

    #[error("failed to parse configuration: {0}")]
    Parse(String),

    #[error("connection names must be distinct")]
    DuplicateConnectionName,

    #[error("default chain {0} is not among the supported networks")]
    UnknownDefaultChain(u64),

    #[error("invalid url in {field}: {reason}")]
    InvalidUrl { field: String, reason: String },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Largest accepted inbound frame in bytes.
    pub max_message_size: usize,
    /// Secret the host presents when opening extension or approval connections.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth_token: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 8645,
            max_message_size: wb_01_transport::service::DEFAULT_MAX_MESSAGE_SIZE,
            auth_token: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionsConfig {
    pub extension_name: String,
    /// Extension connection opened by an approval window.
    pub approval_name: String,
    /// dApp provider connection.
    pub provider_name: String,
}

impl Default for ConnectionsConfig {
    fn default() -> Self {
        let names = ConnectionNames::default();
        Self {
            extension_name: names.extension,
            approval_name: names.approval,
            provider_name: names.provider,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// JSON document holding every persisted key.
    pub data_file: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_file: PathBuf::from("./data/wallet-background.json"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrustConfig {
    /// Sites (and their subdomains) that skip approval where a handler allows it.
    pub first_party_domains: Vec<String>,
}

impl Default for TrustConfig {
    fn default() -> Self {
        Self {
            first_party_domains: vec!["core.app".into()],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ActionsConfig {
    /// Reject pending actions older than this. `None` keeps them until decided.
    pub max_pending_age_secs: Option<u64>,
    pub cleanup_interval_secs: u64,
}

impl Default for ActionsConfig {
    fn default() -> Self {
        Self {
            max_pending_age_secs: None,
            cleanup_interval_secs: 60,
        }
    }
}

impl ActionsConfig {
    pub fn cleanup_interval(&self) -> Duration {
        Duration::from_secs(self.cleanup_interval_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworksConfig {
    /// Built-in networks.
    pub supported: Vec<Network>,
    /// Activated when nothing was persisted.
    pub default_chain: u64,
}

impl Default for NetworksConfig {
    fn default() -> Self {
        Self {
            supported: vec![
                avalanche(
                    C_CHAIN_ID,
                    "Avalanche (C-Chain)",
                    "https://api.avax.network/ext/bc/C/rpc",
                    "https://snowtrace.io",
                    false,
                ),
                avalanche(
                    FUJI_CHAIN_ID,
                    "Avalanche (C-Chain) Testnet",
                    "https://api.avax-test.network/ext/bc/C/rpc",
                    "https://testnet.snowtrace.io",
                    true,
                ),
            ],
            default_chain: C_CHAIN_ID,
        }
    }
}

fn avalanche(chain_id: u64, name: &str, rpc_url: &str, explorer_url: &str, is_testnet: bool) -> Network {
    Network {
        chain_id,
        chain_name: name.into(),
        rpc_url: rpc_url.into(),
        explorer_url: explorer_url.into(),
        network_token: NetworkToken {
            symbol: "AVAX".into(),
            decimals: 18,
            name: "Avalanche".into(),
            description: String::new(),
            logo_uri: String::new(),
        },
        primary_color: "#E84142".into(),
        is_testnet,
        ..Default::default()
    }
}

/// Remote signer holding the wallet keys. No url means no wallet is loaded.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SignerConfig {
    pub url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SwapConfig {
    /// DEX aggregator API. No url disables `swap_performSwap`.
    pub url: Option<String>,
    /// Transaction build attempts while the aggregator reports it is busy.
    pub max_attempts: u32,
}

impl Default for SwapConfig {
    fn default() -> Self {
        Self {
            url: None,
            max_attempts: 10,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults_validate() {
        let config = RuntimeConfig::default();
        config.validate().unwrap();
        assert_eq!(config.networks.default_chain, C_CHAIN_ID);
        assert_eq!(config.supported_chains().len(), 2);
        assert_eq!(config.connection_names(), ConnectionNames::default());
        assert!(config.actions.max_pending_age_secs.is_none());
    }

    #[test]
    fn test_partial_toml_keeps_other_defaults() {
        let config = RuntimeConfig::from_toml(
            r#"
            [server]
            port = 9000

            [actions]
            max_pending_age_secs = 600

            [trust]
            first_party_domains = ["wallet.example"]
            "#,
        )
        .unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.actions.max_pending_age_secs, Some(600));
        assert_eq!(config.actions.cleanup_interval_secs, 60);
        assert_eq!(config.trust.first_party_domains, vec!["wallet.example"]);
        assert_eq!(config.networks.supported.len(), 2);
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("WB_HOST", "0.0.0.0"),
            ("WB_PORT", "7000"),
            ("WB_DATA_FILE", "/tmp/wallet.json"),
        ]
        .into_iter()
        .collect();
        let mut config = RuntimeConfig::default();
        config.apply_env(|key| env.get(key).map(|v| v.to_string()));
        assert_eq!(config.listen_addr().unwrap().to_string(), "0.0.0.0:7000");
        assert_eq!(config.storage.data_file, PathBuf::from("/tmp/wallet.json"));
    }

    #[test]
    fn test_bad_port_is_ignored() {
        let mut config = RuntimeConfig::default();
        config.apply_env(|key| (key == "WB_PORT").then(|| "http".to_string()));
        assert_eq!(config.server.port, 8645);
    }

    #[test]
    fn test_validation_errors() {
        let mut config = RuntimeConfig::default();
        config.networks.default_chain = 1;
        assert!(matches!(config.validate(), Err(ConfigError::UnknownDefaultChain(1))));

        let mut config = RuntimeConfig::default();
        config.connections.approval_name = "extension".into();
        assert!(matches!(config.validate(), Err(ConfigError::DuplicateConnectionName)));

        let mut config = RuntimeConfig::default();
        config.signer.url = Some("not a url".into());
        assert!(matches!(config.validate(), Err(ConfigError::InvalidUrl { .. })));

        let mut config = RuntimeConfig::default();
        config.server.host = "no host".into();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_auth_token_generated_once() {
        let mut config = RuntimeConfig::default();
        assert!(config.ensure_auth_token());
        let token = config.server.auth_token.clone().unwrap();
        assert!(token.len() >= MIN_AUTH_TOKEN_LEN);
        assert!(!config.ensure_auth_token());
        assert_eq!(config.server.auth_token, Some(token));
        config.validate().unwrap();

        let mut other = RuntimeConfig::default();
        other.ensure_auth_token();
        assert_ne!(other.server.auth_token, config.server.auth_token);

        let mut configured = RuntimeConfig::default();
        configured.apply_env(|key| (key == "WB_AUTH_TOKEN").then(|| "short".to_string()));
        assert!(!configured.ensure_auth_token());
        assert!(matches!(configured.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_unparseable_toml() {
        assert!(matches!(
            RuntimeConfig::from_toml("[server\nport = 1"),
            Err(ConfigError::Parse(_))
        ));
    }
}
