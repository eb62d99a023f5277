//! Application configuration.
//!
//! Read once at startup from an optional JSON file. Every field has a serde
//! default that falls back to an environment variable, then to a hardcoded
//! value, so an empty or missing file still yields a working (if walletless)
//! configuration.

use linguaframe_chain_eip155::chain::{Eip155ChainReference, Eip155ChainReferenceFormatError};
use linguaframe_types::chain::ChainId;
use linguaframe_types::config::{LiteralOrEnv, RpcConfig};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[serde(default = "config_defaults::default_api_base_url")]
    api_base_url: String,
    #[serde(default = "config_defaults::default_wallet_connect_project_id")]
    wallet_connect_project_id: String,
    #[serde(default = "config_defaults::default_onchain_kit_api_key")]
    onchain_kit_api_key: String,
    #[serde(default = "config_defaults::default_app_name")]
    app_name: String,
    #[serde(default = "config_defaults::default_chain")]
    chain: ChainId,
    #[serde(default = "config_defaults::default_rpc")]
    rpc: Vec<RpcConfig>,
    #[serde(default = "config_defaults::default_http_timeout_secs")]
    http_timeout_secs: u64,
    #[serde(default = "config_defaults::default_receipt_timeout_secs")]
    receipt_timeout_secs: u64,
    /// Hex private key, usually `"$EVM_PRIVATE_KEY"`.
    #[serde(default = "config_defaults::default_signer")]
    signer: Option<LiteralOrEnv<String>>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            api_base_url: config_defaults::default_api_base_url(),
            wallet_connect_project_id: config_defaults::default_wallet_connect_project_id(),
            onchain_kit_api_key: config_defaults::default_onchain_kit_api_key(),
            app_name: config_defaults::default_app_name(),
            chain: config_defaults::default_chain(),
            rpc: config_defaults::default_rpc(),
            http_timeout_secs: config_defaults::default_http_timeout_secs(),
            receipt_timeout_secs: config_defaults::default_receipt_timeout_secs(),
            signer: config_defaults::default_signer(),
        }
    }
}

pub mod config_defaults {
    use linguaframe_types::chain::ChainId;
    use linguaframe_types::config::{LiteralOrEnv, RpcConfig};
    use std::env;

    pub const DEFAULT_ONCHAIN_KIT_API_KEY: &str = "cdp_demo_key";
    pub const DEFAULT_APP_NAME: &str = "LinguaFrame";
    pub const DEFAULT_RPC_URL: &str = "https://mainnet.base.org";
    pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

    fn env_or(var: &str, default: &str) -> String {
        env::var(var).unwrap_or_else(|_| default.to_string())
    }

    /// `$API_BASE_URL`, else empty (no base URL).
    pub fn default_api_base_url() -> String {
        env_or("API_BASE_URL", "")
    }

    pub fn default_wallet_connect_project_id() -> String {
        env_or("WALLETCONNECT_PROJECT_ID", "")
    }

    pub fn default_onchain_kit_api_key() -> String {
        env_or("ONCHAINKIT_API_KEY", DEFAULT_ONCHAIN_KIT_API_KEY)
    }

    pub fn default_app_name() -> String {
        DEFAULT_APP_NAME.to_string()
    }

    /// Base mainnet.
    pub fn default_chain() -> ChainId {
        ChainId::new("eip155", "8453")
    }

    /// `$BASE_RPC_URL`, else the public Base endpoint.
    pub fn default_rpc() -> Vec<RpcConfig> {
        let http = env::var("BASE_RPC_URL")
            .ok()
            .and_then(|s| s.parse().ok())
            .or_else(|| DEFAULT_RPC_URL.parse().ok());
        http.map(|http| RpcConfig { http }).into_iter().collect()
    }

    pub fn default_http_timeout_secs() -> u64 {
        DEFAULT_TIMEOUT_SECS
    }

    pub fn default_receipt_timeout_secs() -> u64 {
        env::var("RECEIPT_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS)
    }

    pub fn default_signer() -> Option<LiteralOrEnv<String>> {
        LiteralOrEnv::from_env("EVM_PRIVATE_KEY")
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {0}: {1}")]
    FileRead(PathBuf, std::io::Error),
    #[error("Failed to parse config file: {0}")]
    JsonParse(#[from] serde_json::Error),
    #[error("Unsupported chain {0}: {1}")]
    Chain(ChainId, Eip155ChainReferenceFormatError),
    #[error("No RPC endpoint configured for {0}")]
    NoRpc(ChainId),
}

impl Config {
    /// Loads `path`, or the defaults if there is no file there.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content =
            fs::read_to_string(path).map_err(|e| ConfigError::FileRead(path.to_path_buf(), e))?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(content)?)
    }

    /// Base for relative request paths. `None` when unset or not a URL.
    pub fn api_base_url(&self) -> Option<Url> {
        Some(self.api_base_url.as_str())
            .filter(|s| !s.is_empty())
            .and_then(|s| Url::parse(s).ok())
    }

    pub fn wallet_connect_project_id(&self) -> &str {
        &self.wallet_connect_project_id
    }

    pub fn onchain_kit_api_key(&self) -> &str {
        &self.onchain_kit_api_key
    }

    pub fn app_name(&self) -> &str {
        &self.app_name
    }

    pub fn chain(&self) -> &ChainId {
        &self.chain
    }

    pub fn chain_reference(&self) -> Result<Eip155ChainReference, ConfigError> {
        Eip155ChainReference::try_from(&self.chain)
            .map_err(|e| ConfigError::Chain(self.chain.clone(), e))
    }

    /// First configured RPC endpoint.
    pub fn rpc(&self) -> Result<&RpcConfig, ConfigError> {
        self.rpc
            .first()
            .ok_or_else(|| ConfigError::NoRpc(self.chain.clone()))
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    pub fn receipt_timeout(&self) -> Duration {
        Duration::from_secs(self.receipt_timeout_secs)
    }

    pub fn signer(&self) -> Option<&str> {
        self.signer
            .as_ref()
            .map(|s| s.inner().as_str())
            .filter(|s| !s.is_empty())
    }
}
