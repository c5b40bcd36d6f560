//! # Value Objects
//!
//! Immutable domain primitives for the IBC contract relay.
//! These types represent concepts that are defined by their value, not identity.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

// =============================================================================
// CONTRACT ADDRESS (20 bytes)
// =============================================================================

/// A 20-byte contract instance address.
///
/// Assigned once at instantiation and never changes afterwards.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct ContractAddress(pub [u8; 20]);

impl ContractAddress {
    /// The zero address.
    pub const ZERO: Self = Self([0u8; 20]);

    /// Creates an address from a 20-byte array.
    #[must_use]
    pub const fn new(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    /// Creates an address from a slice. Returns None if wrong length.
    #[must_use]
    pub fn from_slice(slice: &[u8]) -> Option<Self> {
        <[u8; 20]>::try_from(slice).ok().map(Self)
    }

    /// Parses a hex address, with or without the `0x` prefix.
    #[must_use]
    pub fn from_hex(s: &str) -> Option<Self> {
        let raw = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(raw).ok()?;
        Self::from_slice(&bytes)
    }

    /// Returns the underlying bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Lowercase hex without prefix. Used for port ids and event attributes.
    #[must_use]
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Debug for ContractAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContractAddress(0x{})", self.to_hex())
    }
}

impl fmt::Display for ContractAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", self.to_hex())
    }
}

impl From<[u8; 20]> for ContractAddress {
    fn from(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }
}

impl Serialize for ContractAddress {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for ContractAddress {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid contract address: {s}")))
    }
}

// =============================================================================
// CODE HASH (32 bytes)
// =============================================================================

/// SHA-256 of a compiled contract artifact.
///
/// Many contract instances may share one code hash.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct CodeHash(pub [u8; 32]);

impl CodeHash {
    /// The zero hash.
    pub const ZERO: Self = Self([0u8; 32]);

    /// Creates a code hash from a 32-byte array.
    #[must_use]
    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Returns the underlying bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Debug for CodeHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CodeHash(0x{}...)", hex::encode(&self.0[..4]))
    }
}

impl fmt::Display for CodeHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

// =============================================================================
// PORT ID
// =============================================================================

/// IBC port identifier bound to a contract instance.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Serialize, Deserialize)]
pub struct PortId(String);

impl PortId {
    /// Prefix of every port owned by a contract.
    pub const CONTRACT_PREFIX: &'static str = "wasm.";

    /// Creates a port id from any string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The port a contract is bound to when none was assigned explicitly.
    #[must_use]
    pub fn for_contract(address: &ContractAddress) -> Self {
        Self(format!("{}{}", Self::CONTRACT_PREFIX, address.to_hex()))
    }

    /// Returns the contract address encoded in a `wasm.` port id, if any.
    #[must_use]
    pub fn contract_address(&self) -> Option<ContractAddress> {
        self.0
            .strip_prefix(Self::CONTRACT_PREFIX)
            .and_then(ContractAddress::from_hex)
    }

    /// Returns the port id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PortId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// =============================================================================
// BINARY (variable length)
// =============================================================================

/// Opaque byte payload exchanged with contracts (messages, acknowledgements).
///
/// Serializes as a hex string.
#[derive(Clone, PartialEq, Eq, Hash, Default)]
pub struct Binary(pub Vec<u8>);

impl Binary {
    /// Creates an empty Binary.
    #[must_use]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    /// Creates Binary from a slice.
    #[must_use]
    pub fn from_slice(slice: &[u8]) -> Self {
        Self(slice.to_vec())
    }

    /// Returns a reference to the underlying slice.
    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }

    /// Returns the underlying vector.
    #[must_use]
    pub fn into_vec(self) -> Vec<u8> {
        self.0
    }

    /// Returns the length.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Binary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.len() <= 8 {
            write!(f, "0x{}", hex::encode(&self.0))
        } else {
            write!(f, "0x{}..({} bytes)", hex::encode(&self.0[..4]), self.0.len())
        }
    }
}

impl From<Vec<u8>> for Binary {
    fn from(vec: Vec<u8>) -> Self {
        Self(vec)
    }
}

impl From<&[u8]> for Binary {
    fn from(slice: &[u8]) -> Self {
        Self(slice.to_vec())
    }
}

impl AsRef<[u8]> for Binary {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl Serialize for Binary {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(&self.0))
    }
}

impl<'de> Deserialize<'de> for Binary {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        hex::decode(&s).map(Self).map_err(serde::de::Error::custom)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contract_address_hex() {
        let addr = ContractAddress::new([0xab; 20]);
        assert_eq!(addr.to_hex(), "ab".repeat(20));
        assert_eq!(ContractAddress::from_hex(&addr.to_string()), Some(addr));
        assert_eq!(ContractAddress::from_hex(&addr.to_hex()), Some(addr));
        assert!(ContractAddress::from_hex("0x1234").is_none());
        assert!(ContractAddress::from_hex("zz").is_none());
    }

    #[test]
    fn test_port_for_contract() {
        let addr = ContractAddress::new([7u8; 20]);
        let port = PortId::for_contract(&addr);
        assert!(port.as_str().starts_with("wasm."));
        assert_eq!(port.contract_address(), Some(addr));
        assert_eq!(PortId::new("transfer").contract_address(), None);
    }

    #[test]
    fn test_binary_serializes_as_hex() {
        let bin = Binary::from_slice(&[0x01, 0xff]);
        let json = serde_json::to_string(&bin).unwrap();
        assert_eq!(json, "\"01ff\"");
        let back: Binary = serde_json::from_str(&json).unwrap();
        assert_eq!(back, bin);
    }

    #[test]
    fn test_binary_debug_truncates() {
        let short = Binary::from_slice(&[1, 2]);
        assert_eq!(format!("{short:?}"), "0x0102");

        let long = Binary::from(vec![0u8; 32]);
        assert!(format!("{long:?}").contains("32 bytes"));
    }
}
