//! RelayHub address resolution.
//!
//! The hub is either configured directly through `relayHubAddress` or looked
//! up in a VersionOracle by `relayHubId`. Checks run one at a time; their
//! order decides which error wins.

use super::params::ServerConfigParams;
use crate::error::{OracleFailure, ResolveError};
use crate::version::VersionManager;
use alloy::primitives::{Address, U256};
use relay_chain::{string_to_bytes32, ContractReader};
use tracing::{debug, info, warn};

/// Resolve the RelayHub address for `config`, verifying it on chain.
///
/// Returns a copy of `config` with `relay_hub_address` set to the
/// checksummed hub address.
pub async fn resolve_server_config<C>(
    config: &ServerConfigParams,
    connection: &C,
) -> Result<ServerConfigParams, ResolveError>
where
    C: ContractReader + ?Sized,
{
    let hub = match (
        non_empty(&config.relay_hub_address),
        non_empty(&config.version_oracle_address),
    ) {
        (None, None) => return Err(ResolveError::MissingHubSource),
        (Some(hub), _) => resolve_direct(hub, connection).await?,
        (None, Some(oracle)) => {
            let relay_hub_id =
                non_empty(&config.relay_hub_id).ok_or(ResolveError::MissingRelayHubId)?;
            resolve_from_oracle(
                oracle,
                relay_hub_id,
                config.version_oracle_delay_period,
                connection,
            )
            .await?
        }
    };

    let mut resolved = config.clone();
    resolved.relay_hub_address = Some(hub.to_checksum(None));
    Ok(resolved)
}

/// Check that the hub at `hub` reports a version compatible with `required`.
///
/// Returns the reported version.
pub async fn validate_hub_version<C>(
    connection: &C,
    hub: Address,
    required: &VersionManager,
) -> Result<String, ResolveError>
where
    C: ContractReader + ?Sized,
{
    let version = connection
        .relay_hub_version(hub)
        .await?
        .ok_or(ResolveError::NoRelayHub(hub))?;

    if !required.is_minor_same_or_newer(&version) {
        return Err(ResolveError::UnsupportedHubVersion {
            found: version,
            required: required.to_string(),
        });
    }

    info!(hub = %hub, version = %version, required = %required, "RelayHub version accepted");
    Ok(version)
}

/// Blank values (e.g. `relayHubAddress=` in a .env file) count as unset.
fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// Parse an address; mixed-case input must carry a valid EIP-55 checksum.
fn parse_address(value: &str) -> Result<Address, ResolveError> {
    let hex = value.strip_prefix("0x").unwrap_or(value);
    let mixed_case =
        hex.chars().any(|c| c.is_ascii_uppercase()) && hex.chars().any(|c| c.is_ascii_lowercase());

    let parsed = if mixed_case {
        Address::parse_checksummed(value, None).ok()
    } else {
        value.parse().ok()
    };
    parsed.ok_or_else(|| ResolveError::InvalidAddress(value.to_string()))
}

async fn resolve_direct<C>(value: &str, connection: &C) -> Result<Address, ResolveError>
where
    C: ContractReader + ?Sized,
{
    let hub = parse_address(value)?;
    if !connection.is_contract_deployed(hub).await? {
        return Err(ResolveError::NoRelayHub(hub));
    }

    debug!(hub = %hub, "Using configured RelayHub");
    Ok(hub)
}

async fn resolve_from_oracle<C>(
    value: &str,
    relay_hub_id: &str,
    delay_period: u64,
    connection: &C,
) -> Result<Address, ResolveError>
where
    C: ContractReader + ?Sized,
{
    let oracle = parse_address(value)?;
    if !connection.is_contract_deployed(oracle).await? {
        return Err(oracle_failure(
            oracle.to_string(),
            OracleFailure::OracleNotDeployed,
        ));
    }

    let id = string_to_bytes32(relay_hub_id)?;
    debug!(oracle = %oracle, relay_hub_id, "Reading RelayHub from VersionOracle");

    let Some(entry) = connection
        .oracle_version(oracle, id, U256::from(delay_period))
        .await?
    else {
        return Err(oracle_failure(
            oracle.to_string(),
            OracleFailure::EntryNotFound,
        ));
    };

    let Ok(hub) = entry.value.parse::<Address>() else {
        return Err(oracle_failure(entry.value, OracleFailure::NotAnAddress));
    };
    if hub.is_zero() {
        return Err(oracle_failure(hub.to_string(), OracleFailure::ZeroAddress));
    }
    if !connection.is_contract_deployed(hub).await? {
        return Err(oracle_failure(hub.to_string(), OracleFailure::HubNotDeployed));
    }
    if connection.relay_hub_version(hub).await?.is_none() {
        return Err(oracle_failure(hub.to_string(), OracleFailure::NotARelayHub));
    }

    info!(
        relay_hub_id,
        version = %entry.version,
        hub = %hub,
        registered_at = entry.time,
        "Resolved RelayHub from VersionOracle"
    );
    Ok(hub)
}

fn oracle_failure(address: String, reason: OracleFailure) -> ResolveError {
    warn!(address = %address, reason = %reason, "VersionOracle lookup failed");
    ResolveError::NoVersionOracle { address, reason }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parse_server_config;
    use alloy::primitives::B256;
    use async_trait::async_trait;
    use relay_chain::VersionEntry;
    use serde_json::Value;
    use std::collections::{HashMap, HashSet};

    const HUB: &str = "0x00000000000000000000000000000000000000aa";
    const ORACLE: &str = "0x00000000000000000000000000000000000000bb";
    const OTHER: &str = "0x00000000000000000000000000000000000000cc";
    const EMPTY: &str = "0x00000000000000000000000000000000000000dd";

    /// In-memory chain: deployed code, hubs and oracle entries.
    #[derive(Default)]
    struct FakeChain {
        code: HashSet<Address>,
        hubs: HashMap<Address, String>,
        entries: HashMap<(Address, B256), VersionEntry>,
    }

    impl FakeChain {
        fn with_hub(mut self, address: &str, version: &str) -> Self {
            let address = address.parse().unwrap();
            self.code.insert(address);
            self.hubs.insert(address, version.to_string());
            self
        }

        fn with_contract(mut self, address: &str) -> Self {
            self.code.insert(address.parse().unwrap());
            self
        }

        fn with_entry(mut self, oracle: &str, id: &str, value: &str) -> Self {
            let oracle: Address = oracle.parse().unwrap();
            self.code.insert(oracle);
            self.entries.insert(
                (oracle, string_to_bytes32(id).unwrap()),
                VersionEntry {
                    version: "2.2.0".to_string(),
                    value: value.to_string(),
                    time: 1_600_000_000,
                },
            );
            self
        }
    }

    #[async_trait]
    impl ContractReader for FakeChain {
        async fn is_contract_deployed(&self, address: Address) -> anyhow::Result<bool> {
            Ok(self.code.contains(&address))
        }

        async fn relay_hub_version(&self, hub: Address) -> anyhow::Result<Option<String>> {
            Ok(self.hubs.get(&hub).cloned())
        }

        async fn oracle_version(
            &self,
            oracle: Address,
            id: B256,
            _delay_period: U256,
        ) -> anyhow::Result<Option<VersionEntry>> {
            Ok(self.entries.get(&(oracle, id)).cloned())
        }
    }

    /// Reader whose node is unreachable.
    struct OfflineChain;

    #[async_trait]
    impl ContractReader for OfflineChain {
        async fn is_contract_deployed(&self, _address: Address) -> anyhow::Result<bool> {
            anyhow::bail!("connection refused")
        }

        async fn relay_hub_version(&self, _hub: Address) -> anyhow::Result<Option<String>> {
            anyhow::bail!("connection refused")
        }

        async fn oracle_version(
            &self,
            _oracle: Address,
            _id: B256,
            _delay_period: U256,
        ) -> anyhow::Result<Option<VersionEntry>> {
            anyhow::bail!("connection refused")
        }
    }

    fn direct(address: &str) -> ServerConfigParams {
        ServerConfigParams {
            relay_hub_address: Some(address.to_string()),
            ..Default::default()
        }
    }

    fn via_oracle(oracle: &str, id: Option<&str>) -> ServerConfigParams {
        ServerConfigParams {
            version_oracle_address: Some(oracle.to_string()),
            relay_hub_id: id.map(str::to_string),
            ..Default::default()
        }
    }

    fn assert_oracle_failure(err: ResolveError, expected: OracleFailure) {
        assert!(err
            .to_string()
            .contains("VersionOracle: no contract at address"));
        match err {
            ResolveError::NoVersionOracle { reason, .. } => assert_eq!(reason, expected),
            other => panic!("unexpected error: {}", other),
        }
    }

    #[tokio::test]
    async fn test_missing_hub_source() {
        let chain = FakeChain::default();
        let err = resolve_server_config(&ServerConfigParams::default(), &chain)
            .await
            .unwrap_err();
        assert!(err
            .to_string()
            .contains("must have either relayHubAddress or versionOracleAddress"));
    }

    #[tokio::test]
    async fn test_invalid_hub_address() {
        let chain = FakeChain::default();
        let err = resolve_server_config(&direct("123"), &chain)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("invalid address: 123"));
    }

    #[tokio::test]
    async fn test_hub_not_deployed() {
        let chain = FakeChain::default();
        let err = resolve_server_config(&direct(EMPTY), &chain)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("RelayHub: no contract at address"));
    }

    #[tokio::test]
    async fn test_direct_hub() {
        let chain = FakeChain::default().with_hub(HUB, "2.2.0");
        let config = direct(HUB);
        let resolved = resolve_server_config(&config, &chain).await.unwrap();
        assert_eq!(resolved.relay_hub(), Some(HUB.parse().unwrap()));
        assert_eq!(resolved.url, config.url);
    }

    #[tokio::test]
    async fn test_direct_hub_takes_precedence_over_oracle() {
        let chain = FakeChain::default().with_hub(HUB, "2.2.0");
        let config = ServerConfigParams {
            relay_hub_address: Some(HUB.to_string()),
            version_oracle_address: Some("not an address".to_string()),
            ..Default::default()
        };
        let resolved = resolve_server_config(&config, &chain).await.unwrap();
        assert_eq!(resolved.relay_hub(), Some(HUB.parse().unwrap()));
    }

    #[tokio::test]
    async fn test_missing_relay_hub_id() {
        let chain = FakeChain::default();
        let err = resolve_server_config(&via_oracle(ORACLE, None), &chain)
            .await
            .unwrap_err();
        assert!(err
            .to_string()
            .contains("missing relayHubId to read from versionOracle"));
    }

    #[tokio::test]
    async fn test_oracle_not_deployed() {
        let chain = FakeChain::default();
        let err = resolve_server_config(&via_oracle(ORACLE, Some("hub")), &chain)
            .await
            .unwrap_err();
        assert_oracle_failure(err, OracleFailure::OracleNotDeployed);
    }

    #[tokio::test]
    async fn test_oracle_entry_not_found() {
        let chain = FakeChain::default().with_contract(ORACLE);
        let err = resolve_server_config(&via_oracle(ORACLE, Some("hub")), &chain)
            .await
            .unwrap_err();
        assert_oracle_failure(err, OracleFailure::EntryNotFound);
    }

    #[tokio::test]
    async fn test_oracle_entry_not_an_address() {
        let chain = FakeChain::default().with_entry(ORACLE, "hub", "abc");
        let err = resolve_server_config(&via_oracle(ORACLE, Some("hub")), &chain)
            .await
            .unwrap_err();
        assert_oracle_failure(err, OracleFailure::NotAnAddress);
    }

    #[tokio::test]
    async fn test_oracle_entry_zero_address() {
        let zero = Address::ZERO.to_string();
        let chain = FakeChain::default().with_entry(ORACLE, "hub", &zero);
        let err = resolve_server_config(&via_oracle(ORACLE, Some("hub")), &chain)
            .await
            .unwrap_err();
        assert_oracle_failure(err, OracleFailure::ZeroAddress);
    }

    #[tokio::test]
    async fn test_oracle_entry_not_deployed() {
        let chain = FakeChain::default().with_entry(ORACLE, "hub", EMPTY);
        let err = resolve_server_config(&via_oracle(ORACLE, Some("hub")), &chain)
            .await
            .unwrap_err();
        assert_oracle_failure(err, OracleFailure::HubNotDeployed);
    }

    #[tokio::test]
    async fn test_oracle_entry_wrong_contract_type() {
        let chain = FakeChain::default()
            .with_contract(OTHER)
            .with_entry(ORACLE, "hub", OTHER);
        let err = resolve_server_config(&via_oracle(ORACLE, Some("hub")), &chain)
            .await
            .unwrap_err();
        assert_oracle_failure(err, OracleFailure::NotARelayHub);
    }

    #[tokio::test]
    async fn test_oracle_failures_share_message() {
        let not_deployed = FakeChain::default().with_entry(ORACLE, "hub", EMPTY);
        let wrong_type = FakeChain::default()
            .with_contract(EMPTY)
            .with_entry(ORACLE, "hub", EMPTY);
        let config = via_oracle(ORACLE, Some("hub"));

        let a = resolve_server_config(&config, &not_deployed)
            .await
            .unwrap_err();
        let b = resolve_server_config(&config, &wrong_type)
            .await
            .unwrap_err();
        assert_eq!(a.to_string(), b.to_string());
    }

    #[tokio::test]
    async fn test_hub_from_oracle() {
        let chain = FakeChain::default()
            .with_hub(HUB, "2.2.0")
            .with_entry(ORACLE, "hub", HUB);
        let resolved = resolve_server_config(&via_oracle(ORACLE, Some("hub")), &chain)
            .await
            .unwrap();
        assert_eq!(resolved.relay_hub(), Some(HUB.parse().unwrap()));
        assert_eq!(resolved.version_oracle_address.as_deref(), Some(ORACLE));
    }

    #[tokio::test]
    async fn test_relay_hub_id_too_long() {
        let chain = FakeChain::default().with_contract(ORACLE);
        let id = "h".repeat(40);
        let err = resolve_server_config(&via_oracle(ORACLE, Some(&id)), &chain)
            .await
            .unwrap_err();
        assert!(matches!(err, ResolveError::InvalidRelayHubId(_)));
    }

    #[tokio::test]
    async fn test_connection_error_propagates() {
        let err = resolve_server_config(&direct(HUB), &OfflineChain)
            .await
            .unwrap_err();
        assert!(matches!(err, ResolveError::Connection(_)));
        assert!(err.to_string().contains("connection refused"));
    }

    #[tokio::test]
    async fn test_blank_hub_address_falls_back_to_oracle() {
        let chain = FakeChain::default()
            .with_hub(HUB, "2.2.0")
            .with_entry(ORACLE, "hub", HUB);
        let env = serde_json::json!({
            "relayHubAddress": "",
            "versionOracleAddress": ORACLE,
            "relayHubId": "hub",
        });
        let Value::Object(env) = env else {
            panic!("not an object")
        };
        let raw = parse_server_config(&[] as &[&str], &env).unwrap();
        let config = ServerConfigParams::from_map(raw).unwrap();
        assert_eq!(config.relay_hub_address.as_deref(), Some(""));

        let resolved = resolve_server_config(&config, &chain).await.unwrap();
        assert_eq!(resolved.relay_hub(), Some(HUB.parse().unwrap()));
    }

    #[tokio::test]
    async fn test_blank_hub_settings_are_missing() {
        let chain = FakeChain::default().with_contract(ORACLE);
        let blank = ServerConfigParams {
            relay_hub_address: Some(String::new()),
            version_oracle_address: Some("  ".to_string()),
            ..Default::default()
        };
        let err = resolve_server_config(&blank, &chain).await.unwrap_err();
        assert!(matches!(err, ResolveError::MissingHubSource));

        let err = resolve_server_config(&via_oracle(ORACLE, Some("")), &chain)
            .await
            .unwrap_err();
        assert!(matches!(err, ResolveError::MissingRelayHubId));
    }

    #[test]
    fn test_address_checksum() {
        // EIP-55 reference address
        let valid = "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed";
        assert!(parse_address(valid).is_ok());
        assert!(parse_address(&valid.to_lowercase()).is_ok());
        assert!(parse_address(&valid.to_uppercase().replacen("0X", "0x", 1)).is_ok());

        let typo = "0x5aaeb6053F3E94C9b9A09f33669435E7Ef1BeAed";
        let err = parse_address(typo).unwrap_err();
        assert_eq!(err.to_string(), format!("invalid address: {}", typo));
    }

    #[tokio::test]
    async fn test_bad_checksum_reported_as_invalid_address() {
        let chain = FakeChain::default();
        let typo = "0x5aaeb6053F3E94C9b9A09f33669435E7Ef1BeAed";
        let err = resolve_server_config(&direct(typo), &chain)
            .await
            .unwrap_err();
        assert!(matches!(err, ResolveError::InvalidAddress(_)));
    }

    #[tokio::test]
    async fn test_hub_version_accepted() {
        let chain = FakeChain::default().with_hub(HUB, "2.3.1+opengsn.hub");
        let required = VersionManager::new("2.2.0").unwrap();
        let version = validate_hub_version(&chain, HUB.parse().unwrap(), &required)
            .await
            .unwrap();
        assert_eq!(version, "2.3.1+opengsn.hub");
    }

    #[tokio::test]
    async fn test_hub_version_rejected() {
        let chain = FakeChain::default().with_hub(HUB, "3.0.0");
        let required = VersionManager::new("2.2.0").unwrap();
        let err = validate_hub_version(&chain, HUB.parse().unwrap(), &required)
            .await
            .unwrap_err();
        assert!(err
            .to_string()
            .contains("Provided Hub version(3.0.0) is not supported"));
    }

    #[tokio::test]
    async fn test_hub_version_missing() {
        let chain = FakeChain::default().with_contract(OTHER);
        let required = VersionManager::new("2.2.0").unwrap();
        let err = validate_hub_version(&chain, OTHER.parse().unwrap(), &required)
            .await
            .unwrap_err();
        assert!(matches!(err, ResolveError::NoRelayHub(_)));
    }
}
