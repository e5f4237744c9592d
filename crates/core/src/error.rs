//! Error types for configuration parsing, hub resolution and version checks.

use alloy::primitives::Address;
use relay_chain::IdentifierError;
use thiserror::Error;

/// Errors raised while parsing and merging server configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unexpected param {0}")]
    UnexpectedParam(String),

    #[error("missing value for param {0}")]
    MissingValue(String),

    #[error("unable to read config file {path}: {source}")]
    UnreadableConfigFile {
        path: String,
        source: std::io::Error,
    },

    #[error("SyntaxError: config file {path} is not valid JSON: {source}")]
    Syntax {
        path: String,
        source: serde_json::Error,
    },

    #[error("SyntaxError: config file {0} must contain a JSON object")]
    NotAnObject(String),

    #[error("Invalid boolean: {0}")]
    InvalidBoolean(String),

    #[error("Invalid number: {0}")]
    InvalidNumber(String),

    #[error("Invalid string: {0}")]
    InvalidString(String),

    #[error("invalid server config: {0}")]
    InvalidParams(#[source] serde_json::Error),
}

/// Why a version oracle lookup did not yield a usable relay hub.
///
/// All variants surface under the same `VersionOracle: no contract at address`
/// message; the reason is kept for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OracleFailure {
    #[error("no contract deployed at the oracle address")]
    OracleNotDeployed,
    #[error("oracle has no entry for the requested id")]
    EntryNotFound,
    #[error("entry value is not an address")]
    NotAnAddress,
    #[error("entry holds the zero address")]
    ZeroAddress,
    #[error("no contract deployed at the entry address")]
    HubNotDeployed,
    #[error("contract at the entry address is not a relay hub")]
    NotARelayHub,
}

/// Errors raised while resolving the relay hub address.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("must have either relayHubAddress or versionOracleAddress")]
    MissingHubSource,

    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("RelayHub: no contract at address {0}")]
    NoRelayHub(Address),

    #[error("missing relayHubId to read from versionOracle")]
    MissingRelayHubId,

    #[error("invalid relayHubId: {0}")]
    InvalidRelayHubId(#[from] IdentifierError),

    #[error("VersionOracle: no contract at address {address}")]
    NoVersionOracle {
        address: String,
        reason: OracleFailure,
    },

    #[error("Provided Hub version({found}) is not supported by the current implementation ({required})")]
    UnsupportedHubVersion { found: String, required: String },

    #[error(transparent)]
    Connection(#[from] anyhow::Error),
}

/// Errors raised by the version manager.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VersionError {
    #[error("Component version is not valid: {0}")]
    Invalid(String),
}
