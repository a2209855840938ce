//! Configuration loading and validation.
//!
//! Configuration is loaded from a TOML file. The file is located, in order:
//! 1. the `--config` CLI flag
//! 2. the `SOLVER_CONFIG_PATH` environment variable
//! 3. `./config.toml`
//! 4. `~/.config/onlyswaps/solver/config.toml`
//!
//! # Example Configuration
//!
//! ```toml
//! [agent]
//! evaluator = "v2"
//! log_level = "info"
//! log_json = false
//! healthcheck_listen_addr = "0.0.0.0"
//! healthcheck_port = 9100
//!
//! [[networks]]
//! chain_id = 1
//! rpc_url = "https://eth.llamarpc.com"
//! router_address = "0x0000000000000000000000000000000000000001"
//! tokens = ["0x0000000000000000000000000000000000000002"]
//! ```

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use alloy::primitives::Address;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ConfigError, Result};

// ═══════════════════════════════════════════════════════════════════════════════
// SETTINGS
// ═══════════════════════════════════════════════════════════════════════════════

/// Root configuration structure.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Settings {
    /// Agent-wide configuration.
    #[serde(default)]
    pub agent: AgentConfig,

    /// Per-chain network configuration.
    pub networks: Vec<NetworkConfig>,
}

impl Settings {
    /// Resolve the config file path by the documented search order.
    #[must_use]
    pub fn resolve_path(cli_flag: Option<&str>) -> Option<PathBuf> {
        if let Some(flag) = cli_flag {
            return Some(PathBuf::from(flag));
        }
        if let Ok(env_path) = std::env::var("SOLVER_CONFIG_PATH") {
            return Some(PathBuf::from(env_path));
        }
        let cwd_candidate = PathBuf::from("config.toml");
        if cwd_candidate.is_file() {
            return Some(cwd_candidate);
        }
        let home_candidate = dirs_home().map(|home| home.join(".config/onlyswaps/solver/config.toml"));
        if let Some(candidate) = &home_candidate
            && candidate.is_file()
        {
            return Some(candidate.clone());
        }
        None
    }

    /// Load settings from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!(path = %path.display(), "loading configuration");

        let content = fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;

        let settings: Self = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            source: Box::new(e),
        })?;

        Ok(settings)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.networks.is_empty() {
            return Err(ConfigError::Validation("at least one [[networks]] entry is required".into()).into());
        }

        for (i, network) in self.networks.iter().enumerate() {
            if network.rpc_url.is_empty() {
                return Err(ConfigError::Validation(format!("networks[{i}].rpc_url is required")).into());
            }
            if network.tokens.is_empty() {
                return Err(ConfigError::Validation(format!("networks[{i}].tokens must not be empty")).into());
            }
        }

        let mut seen_chain_ids = std::collections::HashSet::new();
        for network in &self.networks {
            if !seen_chain_ids.insert(network.chain_id) {
                let chain_id = network.chain_id;
                return Err(ConfigError::Validation(format!("duplicate networks[].chain_id = {chain_id}")).into());
            }
        }

        match self.agent.evaluator.as_str() {
            "v1" | "v2" => {}
            other => {
                return Err(ConfigError::Validation(format!(
                    "agent.evaluator must be \"v1\" or \"v2\", got {other:?}"
                ))
                .into())
            }
        }

        Ok(())
    }
}

fn dirs_home() -> Option<PathBuf> {
    std::env::var_os("HOME").map(PathBuf::from)
}

// ═══════════════════════════════════════════════════════════════════════════════
// AGENT CONFIG
// ═══════════════════════════════════════════════════════════════════════════════

/// Agent-wide configuration: logging, healthcheck, evaluator selection.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AgentConfig {
    /// Which evaluator variant to run: "v1" (simple) or "v2" (scored).
    #[serde(default = "default_evaluator")]
    pub evaluator: String,

    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Emit logs as JSON.
    #[serde(default)]
    pub log_json: bool,

    /// Healthcheck HTTP listen address.
    #[serde(default = "default_healthcheck_listen_addr")]
    pub healthcheck_listen_addr: String,

    /// Healthcheck HTTP port (0 to disable).
    #[serde(default = "default_healthcheck_port")]
    pub healthcheck_port: u16,

    /// In-flight cache TTL in seconds.
    #[serde(default = "default_inflight_ttl_secs")]
    pub inflight_ttl_secs: u64,

    /// In-flight cache capacity.
    #[serde(default = "default_inflight_capacity")]
    pub inflight_capacity: usize,
}

fn default_evaluator() -> String {
    "v1".into()
}

fn default_log_level() -> String {
    "info".into()
}

fn default_healthcheck_listen_addr() -> String {
    "127.0.0.1".into()
}

const fn default_healthcheck_port() -> u16 {
    9100
}

const fn default_inflight_ttl_secs() -> u64 {
    30
}

const fn default_inflight_capacity() -> usize {
    1000
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            evaluator: default_evaluator(),
            log_level: default_log_level(),
            log_json: false,
            healthcheck_listen_addr: default_healthcheck_listen_addr(),
            healthcheck_port: default_healthcheck_port(),
            inflight_ttl_secs: default_inflight_ttl_secs(),
            inflight_capacity: default_inflight_capacity(),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// NETWORK CONFIG
// ═══════════════════════════════════════════════════════════════════════════════

/// Per-chain configuration: one chain client is created per entry.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NetworkConfig {
    /// EVM chain ID.
    pub chain_id: u64,

    /// RPC URL. Polled for new blocks on a fixed interval (no push subscription).
    pub rpc_url: String,

    /// Router contract address on this chain.
    pub router_address: Address,

    /// Tokens this solver holds inventory in on this chain.
    pub tokens: Vec<Address>,

    /// Percentage buffer applied on top of estimated gas (100 = no buffer).
    #[serde(default = "default_tx_gas_buffer")]
    pub tx_gas_buffer: u64,

    /// Percentage buffer applied on top of the fetched gas price (100 = no buffer).
    #[serde(default = "default_tx_gas_price_buffer")]
    pub tx_gas_price_buffer: u64,

    /// Fixed gas price override in wei, bypassing live estimation.
    pub gas_price_wei_override: Option<u128>,

    /// Extra per-chain metadata, currently unused but accepted for forward-compatibility.
    #[serde(default)]
    pub labels: HashMap<String, String>,
}

const fn default_tx_gas_buffer() -> u64 {
    120
}

const fn default_tx_gas_price_buffer() -> u64 {
    100
}

// ═══════════════════════════════════════════════════════════════════════════════
// TESTS
// ═══════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_toml() -> &'static str {
        r#"
        [agent]
        evaluator = "v2"

        [[networks]]
        chain_id = 1
        rpc_url = "http://localhost:8545"
        router_address = "0x0000000000000000000000000000000000000001"
        tokens = ["0x0000000000000000000000000000000000000002"]
        "#
    }

    #[test]
    fn parses_minimal_config() {
        let settings: Settings = toml::from_str(sample_toml()).unwrap();
        assert_eq!(settings.agent.evaluator, "v2");
        assert_eq!(settings.networks.len(), 1);
        assert_eq!(settings.networks[0].tx_gas_buffer, 120);
    }

    #[test]
    fn validate_rejects_empty_networks() {
        let settings = Settings {
            agent: AgentConfig::default(),
            networks: vec![],
        };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn validate_rejects_unknown_evaluator() {
        let mut settings: Settings = toml::from_str(sample_toml()).unwrap();
        settings.agent.evaluator = "v3".into();
        assert!(settings.validate().is_err());
    }

    #[test]
    fn validate_rejects_duplicate_chain_ids() {
        let mut settings: Settings = toml::from_str(sample_toml()).unwrap();
        let dup = settings.networks[0].clone();
        settings.networks.push(dup);
        assert!(settings.validate().is_err());
    }

    #[test]
    fn resolve_path_prefers_cli_flag() {
        let resolved = Settings::resolve_path(Some("explicit.toml"));
        assert_eq!(resolved, Some(PathBuf::from("explicit.toml")));
    }

    #[test]
    fn loads_from_real_file() {
        use std::io::Write;

        let mut file = tempfile::NamedTempFile::new().expect("create temp file");
        file.write_all(sample_toml().as_bytes()).expect("write config");

        let settings = Settings::load(file.path()).expect("load");
        assert_eq!(settings.agent.evaluator, "v2");
    }

    #[test]
    fn load_reports_missing_file() {
        use crate::error::SolverAppError;

        let result = Settings::load("/nonexistent/path/config.toml");
        assert!(matches!(result, Err(SolverAppError::Config(ConfigError::FileRead { .. }))));
    }
}
