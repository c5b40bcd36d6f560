//! # Domain Invariants
//!
//! Invariants that MUST hold for every relayed lifecycle call.
//!
//! | ID | Invariant | Checked by |
//! |----|-----------|------------|
//! | INVARIANT-1 | Gas used never exceeds the call budget | `check_gas_budget_invariant()` |
//! | INVARIANT-2 | Dispatch is scoped to the contract's own port | `check_port_ownership_invariant()` |
//! | INVARIANT-3 | No side effects without a successful call | `check_side_effect_invariant()` |

use crate::domain::entities::EntryPoint;
use crate::domain::value_objects::{ContractAddress, PortId};
use std::fmt;

/// INVARIANT-1: the VM cannot report more gas than it was given.
#[must_use]
pub fn check_gas_budget_invariant(gas_used: u64, budget: u64) -> bool {
    gas_used <= budget
}

/// INVARIANT-2: a contract port must not name another contract.
///
/// Ports outside the `wasm.` namespace carry no address and are accepted;
/// the resolver is trusted to have bound them to this instance.
#[must_use]
pub fn check_port_ownership_invariant(port: &PortId, contract: &ContractAddress) -> bool {
    match port.contract_address() {
        Some(owner) => owner == *contract,
        None => !port.as_str().starts_with(PortId::CONTRACT_PREFIX),
    }
}

/// INVARIANT-3: events and messages only follow a successful call to an
/// entry point that integrates side effects.
#[must_use]
pub fn check_side_effect_invariant(
    entry_point: EntryPoint,
    succeeded: bool,
    events_emitted: usize,
    messages_dispatched: usize,
) -> bool {
    let produced = events_emitted + messages_dispatched;
    produced == 0 || (succeeded && entry_point.integrates_side_effects())
}

/// Specific invariant violation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InvariantViolation {
    /// VM reported more gas than its budget.
    GasBudgetExceeded {
        /// Reported gas.
        used: u64,
        /// Budget handed to the VM.
        budget: u64,
    },
}

impl fmt::Display for InvariantViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GasBudgetExceeded { used, budget } => {
                write!(f, "gas used {used} exceeds budget {budget}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gas_budget_invariant() {
        assert!(check_gas_budget_invariant(0, 0));
        assert!(check_gas_budget_invariant(100, 100));
        assert!(!check_gas_budget_invariant(101, 100));
    }

    #[test]
    fn test_port_ownership_invariant() {
        let me = ContractAddress::new([1u8; 20]);
        let other = ContractAddress::new([2u8; 20]);

        assert!(check_port_ownership_invariant(&PortId::for_contract(&me), &me));
        assert!(!check_port_ownership_invariant(&PortId::for_contract(&other), &me));
        assert!(check_port_ownership_invariant(&PortId::new("custom-port"), &me));
        assert!(!check_port_ownership_invariant(&PortId::new("wasm.garbage"), &me));
    }

    #[test]
    fn test_side_effect_invariant() {
        assert!(check_side_effect_invariant(EntryPoint::ChannelOpen, true, 0, 0));
        assert!(!check_side_effect_invariant(EntryPoint::ChannelOpen, true, 1, 0));
        assert!(!check_side_effect_invariant(EntryPoint::PacketReceive, false, 0, 1));
        assert!(check_side_effect_invariant(EntryPoint::PacketReceive, true, 1, 1));
        assert!(check_side_effect_invariant(EntryPoint::PacketTimeout, false, 0, 0));
    }

    #[test]
    fn test_violation_display() {
        let v = InvariantViolation::GasBudgetExceeded { used: 11, budget: 10 };
        assert_eq!(v.to_string(), "gas used 11 exceeds budget 10");
    }
}
