//! Read-only contract access used while bootstrapping the relay server.
//! Uses Alloy providers for type-safe RPC interactions.

use crate::contracts::{bytes32_to_string, IRelayHub, IVersionOracle};
use alloy::primitives::{Address, B256, U256};
use alloy::providers::{Provider, ProviderBuilder};
use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::{debug, info};

/// Entry stored in a version oracle under a bytes32 identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionEntry {
    /// Version string (decoded from bytes32)
    pub version: String,
    /// Registered value, expected to hold a contract address
    pub value: String,
    /// Registration timestamp (unix seconds)
    pub time: u64,
}

/// Network boundary used by the config resolver.
///
/// `Err` is reserved for transport failures. A contract that reverts or
/// returns undecodable data is reported as `Ok(None)`.
#[async_trait]
pub trait ContractReader: Send + Sync {
    /// Whether any bytecode is deployed at `address`.
    async fn is_contract_deployed(&self, address: Address) -> Result<bool>;

    /// Version reported by a relay hub, or `None` if the contract does not answer.
    async fn relay_hub_version(&self, hub: Address) -> Result<Option<String>>;

    /// Look up `id` in a version oracle.
    async fn oracle_version(
        &self,
        oracle: Address,
        id: B256,
        delay_period: U256,
    ) -> Result<Option<VersionEntry>>;
}

/// Contract reader backed by an HTTP JSON-RPC endpoint.
#[derive(Debug, Clone)]
pub struct ContractInteractor {
    /// Ethereum node URL
    url: String,
}

impl ContractInteractor {
    /// Connect to an ethereum node, verifying it answers.
    pub async fn connect(url: &str) -> Result<Self> {
        info!(url = url, "Connecting to ethereum node");

        let provider = ProviderBuilder::new().on_http(url.parse()?);
        let chain_id = provider
            .get_chain_id()
            .await
            .with_context(|| format!("unable to reach ethereum node at {}", url))?;
        info!(chain_id = chain_id, "Ethereum node connection verified");

        Ok(Self {
            url: url.to_string(),
        })
    }

    /// Get the node URL.
    pub fn url(&self) -> &str {
        &self.url
    }
}

/// Whether a failed call means "the contract did not answer" rather than
/// "the node could not be reached".
fn is_unanswered(err: &alloy::contract::Error) -> bool {
    match err {
        alloy::contract::Error::TransportError(e) => e.as_error_resp().is_some(),
        // zero or undecodable return data
        _ => true,
    }
}

#[async_trait]
impl ContractReader for ContractInteractor {
    async fn is_contract_deployed(&self, address: Address) -> Result<bool> {
        let provider = ProviderBuilder::new().on_http(self.url.parse()?);
        let code = provider
            .get_code_at(address)
            .await
            .with_context(|| format!("failed to read code at {}", address))?;

        debug!(address = %address, code_len = code.len(), "Checked contract code");
        Ok(!code.is_empty())
    }

    async fn relay_hub_version(&self, hub: Address) -> Result<Option<String>> {
        let provider = ProviderBuilder::new().on_http(self.url.parse()?);
        let contract = IRelayHub::new(hub, &provider);

        match contract.versionHub().call().await {
            Ok(ret) => Ok(Some(ret._0)),
            Err(e) if is_unanswered(&e) => {
                debug!(hub = %hub, error = %e, "versionHub() not answered");
                Ok(None)
            }
            Err(e) => Err(e).with_context(|| format!("versionHub() call to {} failed", hub)),
        }
    }

    async fn oracle_version(
        &self,
        oracle: Address,
        id: B256,
        delay_period: U256,
    ) -> Result<Option<VersionEntry>> {
        let provider = ProviderBuilder::new().on_http(self.url.parse()?);
        let contract = IVersionOracle::new(oracle, &provider);

        match contract.getVersion(id, delay_period).call().await {
            Ok(ret) => Ok(Some(VersionEntry {
                version: bytes32_to_string(ret.version),
                value: ret.value,
                time: ret.time.saturating_to::<u64>(),
            })),
            Err(e) if is_unanswered(&e) => {
                debug!(oracle = %oracle, id = %id, error = %e, "getVersion() not answered");
                Ok(None)
            }
            Err(e) => Err(e).with_context(|| format!("getVersion() call to {} failed", oracle)),
        }
    }
}
