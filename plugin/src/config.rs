//! Plugin configuration with TOML file support.

use serde::{Deserialize, Serialize};
use std::path::Path;

use stake_contracts::ChainEndpoints;
use stake_policies::fantom::{fantom_endpoints, PUBLIC_RPC_URL};
use stake_types::StakeError;
use stake_utils::LogFormat;

/// Fantom RPC access.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FantomConfig {
    /// Endpoints raced on every read, in order.
    #[serde(default = "default_rpc_urls")]
    pub rpc_urls: Vec<String>,

    /// When set, the QuickNode endpoint for this key is tried alongside `rpc_urls`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quiknode_api_key: Option<String>,
}

impl FantomConfig {
    pub fn endpoints(&self) -> ChainEndpoints {
        fantom_endpoints(&self.rpc_urls, self.quiknode_api_key.as_deref())
    }
}

impl Default for FantomConfig {
    fn default() -> Self {
        Self {
            rpc_urls: default_rpc_urls(),
            quiknode_api_key: None,
        }
    }
}

/// Configuration for the stake plugin.
///
/// Every field has a default, so an empty file is a valid configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginConfig {
    /// Stake policy ids hidden from listing and rejected by quotes.
    #[serde(default)]
    pub disabled_policies: Vec<String>,

    /// Log format: "human" or "json".
    #[serde(default)]
    pub log_format: LogFormat,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub fantom: FantomConfig,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_rpc_urls() -> Vec<String> {
    vec![PUBLIC_RPC_URL.to_string()]
}

fn default_log_level() -> String {
    "info".to_string()
}

// ── Impl ───────────────────────────────────────────────────────────────

impl PluginConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, StakeError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| StakeError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, StakeError> {
        toml::from_str(s).map_err(|e| StakeError::Config(e.to_string()))
    }

    pub fn to_toml_string(&self) -> Result<String, StakeError> {
        toml::to_string_pretty(self).map_err(|e| StakeError::Config(e.to_string()))
    }
}

impl Default for PluginConfig {
    fn default() -> Self {
        Self {
            disabled_policies: Vec::new(),
            log_format: LogFormat::default(),
            log_level: default_log_level(),
            fantom: FantomConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_round_trips_through_toml() {
        let config = PluginConfig::default();
        let toml_str = config.to_toml_string().unwrap();
        let parsed = PluginConfig::from_toml_str(&toml_str).expect("should parse");
        assert_eq!(parsed, config);
    }

    #[test]
    fn minimal_toml_uses_defaults() {
        let config = PluginConfig::from_toml_str("").expect("empty toml should use defaults");
        assert_eq!(config.fantom.rpc_urls, vec![PUBLIC_RPC_URL.to_string()]);
        assert!(config.disabled_policies.is_empty());
        assert_eq!(config.log_format, LogFormat::Human);
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn partial_toml_overrides() {
        let toml = r#"
            disabled_policies = ["tomb_masonry:fantom:TSHARE=fantom:TOMB"]
            log_format = "json"

            [fantom]
            quiknode_api_key = "secret"
        "#;
        let config = PluginConfig::from_toml_str(toml).expect("should parse");
        assert_eq!(config.disabled_policies.len(), 1);
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.log_level, "info"); // default
        let endpoints = config.fantom.endpoints();
        assert_eq!(endpoints.plugin_id, "fantom");
        assert_eq!(
            endpoints.rpc_urls,
            vec![
                "https://polished-empty-cloud.fantom.quiknode.pro/secret/".to_string(),
                PUBLIC_RPC_URL.to_string(),
            ]
        );
    }

    #[test]
    fn unknown_log_format_is_a_config_error() {
        let err = PluginConfig::from_toml_str(r#"log_format = "xml""#).unwrap_err();
        assert!(matches!(err, StakeError::Config(_)));
    }

    #[test]
    fn missing_file_returns_config_error() {
        let result = PluginConfig::from_toml_file("/nonexistent/stake.toml");
        assert!(matches!(result, Err(StakeError::Config(_))));
    }
}
