//! Relay server configuration.
//!
//! This module provides:
//! - The table of known parameters and the typed `ServerConfigParams`
//! - Command line / environment / config file parsing and merging
//! - RelayHub address resolution, directly or through a VersionOracle

mod params;
mod parser;
mod resolver;

pub use params::{param_type, ParamTable, ParamType, ServerConfigParams, CONFIG_PARAMS};
pub use parser::{entries_to_obj, filter_members, filter_type, parse_server_config};
pub use resolver::{resolve_server_config, validate_hub_version};
