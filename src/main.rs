//! Relay server bootstrap.
//!
//! Parses configuration from the command line, the environment and an
//! optional JSON config file, connects to the ethereum node and resolves the
//! RelayHub the server relays through.

use std::ffi::OsString;

use anyhow::{Context, Result};
use serde_json::{Map, Value};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use relay_chain::ContractInteractor;
use relay_core::{
    parse_server_config, resolve_server_config, validate_hub_version, ServerConfigParams,
    VersionManager,
};

/// RelayHub version this server implementation speaks.
const REQUIRED_HUB_VERSION: &str = "2.2.0";

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let argv: Vec<String> = std::env::args().skip(1).collect();
    let env = env_defaults(std::env::vars_os());

    let raw = parse_server_config(argv.as_slice(), &env)?;
    let params = ServerConfigParams::from_map(raw)?;

    init_tracing(&params);

    info!("Starting relay server");
    if let Some(path) = &params.config {
        info!(path = %path, "Loaded config file");
    }
    params.log_config();

    let required = VersionManager::new(REQUIRED_HUB_VERSION)?;

    let connection = ContractInteractor::connect(&params.ethereum_node_url).await?;
    let resolved = resolve_server_config(&params, &connection).await?;
    let hub = resolved
        .relay_hub()
        .context("resolved config has no RelayHub address")?;

    let hub_version = validate_hub_version(&connection, hub, &required).await?;
    info!(
        hub = %hub,
        hub_version = %hub_version,
        node = %connection.url(),
        "RelayHub resolved"
    );

    let summary = serde_json::to_string(&resolved.to_map()?)?;
    info!(config = %summary, "Relay server configuration resolved");

    Ok(())
}

/// Environment variables as the lowest config layer. Pairs that are not
/// valid UTF-8 are skipped.
fn env_defaults(vars: impl IntoIterator<Item = (OsString, OsString)>) -> Map<String, Value> {
    vars.into_iter()
        .filter_map(|(key, value)| {
            Some((key.into_string().ok()?, Value::String(value.into_string().ok()?)))
        })
        .collect()
}

/// Initialize tracing. `RUST_LOG` wins over `logLevel`, which wins over `debug`.
fn init_tracing(params: &ServerConfigParams) {
    let fallback = params.log_level.clone().unwrap_or_else(|| {
        if params.debug {
            "debug".to_string()
        } else {
            "info".to_string()
        }
    });

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback)))
        .init();
}
