//! Relay server core logic.
//!
//! This crate provides the configuration bootstrap of the relay server:
//! - Parsing and merging of command line, environment and config file values
//! - Resolution of the RelayHub address, directly or via a VersionOracle
//! - Semantic version gating of dependency versions

pub mod config;
mod error;
mod version;

pub use config::{
    parse_server_config, resolve_server_config, validate_hub_version, ParamType,
    ServerConfigParams, CONFIG_PARAMS,
};
pub use error::{ConfigError, OracleFailure, ResolveError, VersionError};
pub use version::VersionManager;
