//! # Domain Services
//!
//! Pure functions used by the relay: code identity, address derivation,
//! gas budgeting and attribute-to-event translation.

use crate::domain::entities::{Attribute, Event};
use crate::domain::value_objects::{CodeHash, ContractAddress};
use sha2::{Digest, Sha256};

/// Attribute key prepended to every contract event.
pub const CONTRACT_ADDRESS_ATTRIBUTE: &str = "contract_address";

/// Computes the code identity of a compiled artifact.
#[must_use]
pub fn code_hash(wasm: &[u8]) -> CodeHash {
    CodeHash(Sha256::digest(wasm).into())
}

/// Derives the address of the `instance_id`-th instance of `code_id`.
///
/// `sha256("contract" || code_id_be || instance_id_be)[..20]`.
#[must_use]
pub fn derive_contract_address(code_id: u64, instance_id: u64) -> ContractAddress {
    let mut hasher = Sha256::new();
    hasher.update(b"contract");
    hasher.update(code_id.to_be_bytes());
    hasher.update(instance_id.to_be_bytes());
    let digest = hasher.finalize();

    let mut bytes = [0u8; 20];
    bytes.copy_from_slice(&digest[..20]);
    ContractAddress(bytes)
}

/// Gas handed to a single VM call.
///
/// * exhausted ledger: `0`
/// * infinite ledger (`remaining == None`): `cap`
/// * otherwise: `min(remaining, cap)`
#[must_use]
pub fn contract_gas_budget(remaining: Option<u64>, cap: u64) -> u64 {
    match remaining {
        None => cap,
        Some(remaining) => remaining.min(cap),
    }
}

/// Turns contract attributes into host events attributed to `contract`.
///
/// Produces a single event of `event_type` whose first attribute is the
/// contract address, followed by the contract's attributes in order. No
/// attributes means no event.
#[must_use]
pub fn parse_events(
    attributes: &[Attribute],
    contract: &ContractAddress,
    event_type: &str,
) -> Vec<Event> {
    if attributes.is_empty() {
        return Vec::new();
    }

    let mut event = Event::new(event_type);
    event.attributes.reserve(attributes.len() + 1);
    event
        .attributes
        .push(Attribute::new(CONTRACT_ADDRESS_ATTRIBUTE, contract.to_string()));
    event.attributes.extend(attributes.iter().cloned());
    vec![event]
}
