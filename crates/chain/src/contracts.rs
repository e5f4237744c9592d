//! Contract bindings for the relay hub and the version oracle.
//!
//! Only the read-only methods needed while bootstrapping the server are
//! declared here; the full ABIs live with the contracts.

use alloy::primitives::B256;
use alloy::sol;
use thiserror::Error;

// RelayHub interface (subset used to identify a hub deployment)
sol! {
    /// Relay hub contract interface
    #[sol(rpc)]
    interface IRelayHub {
        function versionHub() external view returns (string memory);
    }
}

// VersionOracle interface for indirect hub discovery
sol! {
    /// Version oracle contract interface
    #[sol(rpc)]
    interface IVersionOracle {
        function getVersion(
            bytes32 id,
            uint256 delayPeriod
        ) external view returns (bytes32 version, string memory value, uint256 time);
    }
}

/// Errors converting identifiers to their on-chain representation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentifierError {
    #[error("identifier does not fit in bytes32: {0}")]
    TooLong(String),
}

/// Encode a string identifier as a right-padded bytes32.
pub fn string_to_bytes32(value: &str) -> Result<B256, IdentifierError> {
    let bytes = value.as_bytes();
    if bytes.len() > 32 {
        return Err(IdentifierError::TooLong(value.to_string()));
    }

    let mut out = [0u8; 32];
    out[..bytes.len()].copy_from_slice(bytes);
    Ok(B256::new(out))
}

/// Decode a right-padded bytes32 back into a string, dropping the padding.
pub fn bytes32_to_string(value: B256) -> String {
    let bytes = value.as_slice();
    let end = bytes.iter().position(|b| *b == 0).unwrap_or(bytes.len());
    String::from_utf8_lossy(&bytes[..end]).into_owned()
}
