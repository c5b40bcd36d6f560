//! # Host API Adapter

use crate::domain::value_objects::ContractAddress;
use crate::ports::outbound::HostApi;

/// Addresses are `0x`-prefixed hex of 20 bytes.
#[derive(Clone, Copy, Debug, Default)]
pub struct HexAddressApi;

impl HostApi for HexAddressApi {
    fn canonicalize(&self, human: &str) -> Result<Vec<u8>, String> {
        ContractAddress::from_hex(human)
            .map(|addr| addr.as_bytes().to_vec())
            .ok_or_else(|| format!("invalid address: {human}"))
    }

    fn humanize(&self, canonical: &[u8]) -> Result<String, String> {
        ContractAddress::from_slice(canonical)
            .map(|addr| addr.to_string())
            .ok_or_else(|| format!("invalid canonical length: {}", canonical.len()))
    }
}
