//! Known server parameters and their typed representation.

use crate::error::ConfigError;
use alloy::primitives::Address;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::info;

/// Declared type of a configuration parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamType {
    Number,
    Boolean,
    String,
}

/// Ordered mapping from parameter name to declared type.
pub type ParamTable<'a> = [(&'a str, ParamType)];

/// Parameters recognized by the relay server.
pub const CONFIG_PARAMS: &ParamTable<'static> = &[
    ("config", ParamType::String),
    ("baseRelayFee", ParamType::Number),
    ("pctRelayFee", ParamType::Number),
    ("url", ParamType::String),
    ("port", ParamType::Number),
    ("relayHubAddress", ParamType::String),
    ("versionOracleAddress", ParamType::String),
    ("versionOracleDelayPeriod", ParamType::Number),
    ("relayHubId", ParamType::String),
    ("gasPriceFactor", ParamType::Number),
    ("ethereumNodeUrl", ParamType::String),
    ("workdir", ParamType::String),
    ("devMode", ParamType::Boolean),
    ("debug", ParamType::Boolean),
    ("logLevel", ParamType::String),
    ("registrationBlockRate", ParamType::Number),
    ("maxAcceptanceBudget", ParamType::Number),
    ("alertedBlockDelay", ParamType::Number),
    ("minAlertedDelayMS", ParamType::Number),
    ("maxAlertedDelayMS", ParamType::Number),
];

/// Declared type of `key` in `table`.
pub fn param_type(table: &ParamTable<'_>, key: &str) -> Option<ParamType> {
    table
        .iter()
        .find(|(name, _)| *name == key)
        .map(|(_, kind)| *kind)
}

/// Typed relay server configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ServerConfigParams {
    /// Path of the JSON config file, if one was given
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<String>,

    /// Flat fee added to every relayed call
    #[serde(default)]
    pub base_relay_fee: f64,

    /// Percentage fee added to every relayed call
    #[serde(default)]
    pub pct_relay_fee: f64,

    /// Public URL of this relay
    #[serde(default = "default_url")]
    pub url: String,

    /// HTTP listen port
    #[serde(default = "default_port")]
    pub port: u16,

    /// RelayHub address, when given directly
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relay_hub_address: Option<String>,

    /// VersionOracle address used to look up the hub
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version_oracle_address: Option<String>,

    /// Minimum age (seconds) of an oracle entry before it is used
    #[serde(default)]
    pub version_oracle_delay_period: u64,

    /// Identifier of the hub inside the VersionOracle
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relay_hub_id: Option<String>,

    /// Multiplier applied to the network gas price
    #[serde(default = "default_gas_price_factor")]
    pub gas_price_factor: f64,

    /// JSON-RPC endpoint of the ethereum node
    #[serde(default = "default_ethereum_node_url")]
    pub ethereum_node_url: String,

    /// Working directory for keystores and state
    #[serde(default)]
    pub workdir: String,

    #[serde(default)]
    pub dev_mode: bool,

    #[serde(default)]
    pub debug: bool,

    /// Tracing filter directive (e.g. "info,relay_core=debug")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,

    /// Blocks between relay re-registrations (0 = never)
    #[serde(default)]
    pub registration_block_rate: u64,

    /// Gas budget the relay accepts per request
    #[serde(default = "default_max_acceptance_budget")]
    pub max_acceptance_budget: u64,

    #[serde(default)]
    pub alerted_block_delay: u64,

    #[serde(default, rename = "minAlertedDelayMS")]
    pub min_alerted_delay_ms: u64,

    #[serde(default, rename = "maxAlertedDelayMS")]
    pub max_alerted_delay_ms: u64,
}

fn default_url() -> String {
    "http://localhost:8090".to_string()
}
fn default_port() -> u16 {
    8090
}
fn default_gas_price_factor() -> f64 {
    1.0
}
fn default_ethereum_node_url() -> String {
    "http://localhost:8545".to_string()
}
fn default_max_acceptance_budget() -> u64 {
    200_000
}

impl Default for ServerConfigParams {
    fn default() -> Self {
        Self {
            config: None,
            base_relay_fee: 0.0,
            pct_relay_fee: 0.0,
            url: default_url(),
            port: default_port(),
            relay_hub_address: None,
            version_oracle_address: None,
            version_oracle_delay_period: 0,
            relay_hub_id: None,
            gas_price_factor: default_gas_price_factor(),
            ethereum_node_url: default_ethereum_node_url(),
            workdir: String::new(),
            dev_mode: false,
            debug: false,
            log_level: None,
            registration_block_rate: 0,
            max_acceptance_budget: default_max_acceptance_budget(),
            alerted_block_delay: 0,
            min_alerted_delay_ms: 0,
            max_alerted_delay_ms: 0,
        }
    }
}

impl ServerConfigParams {
    /// Build typed params from a parsed config map, filling defaults.
    pub fn from_map(map: Map<String, Value>) -> Result<Self, ConfigError> {
        serde_json::from_value(Value::Object(map)).map_err(ConfigError::InvalidParams)
    }

    /// The config as a raw map (defaults included).
    pub fn to_map(&self) -> Result<Map<String, Value>, ConfigError> {
        match serde_json::to_value(self).map_err(ConfigError::InvalidParams)? {
            Value::Object(map) => Ok(map),
            other => Err(ConfigError::InvalidParams(<serde_json::Error as serde::ser::Error>::custom(format!(
                "expected a JSON object, got {}",
                other
            )))),
        }
    }

    /// Relay hub address, if set and well-formed.
    pub fn relay_hub(&self) -> Option<Address> {
        self.relay_hub_address.as_deref()?.parse().ok()
    }

    /// Log the configuration.
    pub fn log_config(&self) {
        info!(
            url = %self.url,
            port = self.port,
            ethereum_node_url = %self.ethereum_node_url,
            workdir = %self.workdir,
            dev_mode = self.dev_mode,
            "Server configuration"
        );
        info!(
            relay_hub_address = ?self.relay_hub_address,
            version_oracle_address = ?self.version_oracle_address,
            relay_hub_id = ?self.relay_hub_id,
            "RelayHub source"
        );
        info!(
            base_relay_fee = self.base_relay_fee,
            pct_relay_fee = self.pct_relay_fee,
            gas_price_factor = self.gas_price_factor,
            max_acceptance_budget = self.max_acceptance_budget,
            "Fee configuration"
        );
    }
}
