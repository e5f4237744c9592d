//! Relay server chain interaction layer.
//!
//! This crate provides:
//! - Contract bindings for the RelayHub and the VersionOracle
//! - The `ContractReader` seam used by the config resolver
//! - An Alloy-backed reader for HTTP JSON-RPC endpoints

mod contracts;
mod interactor;

pub use contracts::{
    bytes32_to_string, string_to_bytes32, IRelayHub, IVersionOracle, IdentifierError,
};
pub use interactor::{ContractInteractor, ContractReader, VersionEntry};
