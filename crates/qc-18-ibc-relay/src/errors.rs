//! # Error Types
//!
//! All error types for relaying IBC lifecycle events into contracts.
//!
//! | Stage | Error | Gas charged | Side effects |
//! |-------|-------|-------------|--------------|
//! | Resolve | `RelayError::Resolve` | no | none |
//! | Execute | `RelayError::ExecuteFailed` | yes | none |
//! | Charge | `RelayError::OutOfGas` | yes | none |
//! | Dispatch | `RelayError::DispatchFailed` | yes | events already emitted |

use crate::domain::entities::EntryPoint;
use crate::domain::value_objects::{ContractAddress, PortId};
use thiserror::Error;

// =============================================================================
// RELAY ERRORS
// =============================================================================

/// Errors surfaced to the host protocol layer by the lifecycle dispatcher.
///
/// Every variant names the offending contract and entry point.
#[derive(Debug, Error)]
pub enum RelayError {
    /// The contract could not be resolved. Raised before any gas is charged.
    #[error("{entry_point}: cannot resolve contract {contract}: {source}")]
    Resolve {
        /// Contract address requested by the host.
        contract: ContractAddress,
        /// Entry point that was about to run.
        entry_point: EntryPoint,
        /// Underlying resolution failure.
        #[source]
        source: ResolveError,
    },

    /// The VM reported a trap or the contract rejected the call.
    #[error("{entry_point}: execute wasm contract {contract} failed: {message}")]
    ExecuteFailed {
        /// Executing contract.
        contract: ContractAddress,
        /// Entry point that failed.
        entry_point: EntryPoint,
        /// VM or contract error message.
        message: String,
    },

    /// Charging the reported gas exhausted the ambient gas ledger.
    #[error("{entry_point}: contract {contract} exhausted the gas ledger: {source}")]
    OutOfGas {
        /// Executing contract.
        contract: ContractAddress,
        /// Entry point that was charged.
        entry_point: EntryPoint,
        /// Ledger failure.
        #[source]
        source: GasError,
    },

    /// A follow-up message requested by the contract failed.
    #[error("{entry_point}: dispatch for contract {contract} failed: {source}")]
    DispatchFailed {
        /// Contract that requested the messages.
        contract: ContractAddress,
        /// Entry point whose messages were dispatched.
        entry_point: EntryPoint,
        /// Dispatch failure.
        #[source]
        source: DispatchError,
    },
}

impl RelayError {
    /// Contract the failed call targeted.
    #[must_use]
    pub fn contract(&self) -> &ContractAddress {
        match self {
            Self::Resolve { contract, .. }
            | Self::ExecuteFailed { contract, .. }
            | Self::OutOfGas { contract, .. }
            | Self::DispatchFailed { contract, .. } => contract,
        }
    }

    /// Entry point of the failed call.
    #[must_use]
    pub fn entry_point(&self) -> EntryPoint {
        match self {
            Self::Resolve { entry_point, .. }
            | Self::ExecuteFailed { entry_point, .. }
            | Self::OutOfGas { entry_point, .. }
            | Self::DispatchFailed { entry_point, .. } => *entry_point,
        }
    }

    /// Returns true if the failure happened before the VM ran.
    #[must_use]
    pub fn is_resolution_failure(&self) -> bool {
        matches!(self, Self::Resolve { .. })
    }
}

// =============================================================================
// RESOLUTION ERRORS
// =============================================================================

/// Errors from the contract resolver.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ResolveError {
    /// No instance lives at this address.
    #[error("contract not found")]
    ContractNotFound,

    /// The instance exists but its code is missing.
    #[error("code {code_id} not found")]
    CodeNotFound {
        /// Code id recorded on the instance.
        code_id: u64,
    },

    /// The instance is bound to a port owned by another contract.
    #[error("port {port} is not owned by this contract")]
    ForeignPort {
        /// Offending port.
        port: PortId,
    },
}

// =============================================================================
// VM ERRORS
// =============================================================================

/// Errors reported by the VM for one entry point call.
///
/// The dispatcher does not distinguish between these; all of them become
/// [`RelayError::ExecuteFailed`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum VmError {
    /// Execution ran out of gas.
    #[error("out of gas")]
    OutOfGas,

    /// The contract does not export the entry point.
    #[error("missing export: {0}")]
    MissingExport(String),

    /// The VM trapped.
    #[error("trap: {0}")]
    Trap(String),

    /// The contract returned an error.
    #[error("contract error: {0}")]
    Contract(String),
}

// =============================================================================
// GAS ERRORS
// =============================================================================

/// Errors from the ambient gas ledger.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GasError {
    /// Consumption went past the ledger limit.
    #[error("out of gas in {descriptor}: consumed {consumed} > limit {limit}")]
    OutOfGas {
        /// What was being charged.
        descriptor: String,
        /// Consumed after charging.
        consumed: u64,
        /// Ledger limit.
        limit: u64,
    },
}

// =============================================================================
// DISPATCH ERRORS
// =============================================================================

/// Errors from executing contract follow-up messages.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DispatchError {
    /// The message names a port the contract does not own.
    #[error("unauthorized port: {0}")]
    Unauthorized(PortId),

    /// The message executed and failed.
    #[error("message {index} failed: {reason}")]
    MessageFailed {
        /// Position in the contract's message list.
        index: usize,
        /// Failure reason.
        reason: String,
    },
}

// =============================================================================
// QUERY ERRORS
// =============================================================================

/// Errors returned to contract code through the query bridge.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum QueryError {
    /// No plugin handles this query.
    #[error("unsupported query: {0}")]
    Unsupported(String),

    /// Queried entity does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Plugin failed.
    #[error("query failed: {0}")]
    Failed(String),
}

// =============================================================================
// IPC ERRORS
// =============================================================================

/// Errors related to IPC communication.
#[derive(Debug, Error, Clone)]
pub enum IpcError {
    /// Unauthorized sender.
    #[error("unauthorized sender: {sender_id} not in allowed list {allowed:?}")]
    UnauthorizedSender {
        /// Envelope sender.
        sender_id: u8,
        /// Subsystems allowed to send this message.
        allowed: Vec<u8>,
    },

    /// Too many requests waiting on the relay.
    #[error("relay busy: {pending} pending requests (max {max})")]
    Backpressure {
        /// Requests in flight.
        pending: usize,
        /// Configured maximum.
        max: usize,
    },
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relay_error_display_names_contract_and_entry_point() {
        let contract = ContractAddress::new([1u8; 20]);
        let err = RelayError::ExecuteFailed {
            contract,
            entry_point: EntryPoint::PacketReceive,
            message: "out of gas".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("ibc_packet_receive"));
        assert!(msg.contains(&contract.to_hex()));
        assert!(msg.contains("out of gas"));
        assert_eq!(err.contract(), &contract);
        assert_eq!(err.entry_point(), EntryPoint::PacketReceive);
    }

    #[test]
    fn test_resolve_error_is_resolution_failure() {
        let err = RelayError::Resolve {
            contract: ContractAddress::ZERO,
            entry_point: EntryPoint::ChannelOpen,
            source: ResolveError::ContractNotFound,
        };
        assert!(err.is_resolution_failure());
        assert!(err.to_string().contains("contract not found"));
    }

    #[test]
    fn test_dispatch_error_source_chain() {
        use std::error::Error as _;

        let err = RelayError::DispatchFailed {
            contract: ContractAddress::ZERO,
            entry_point: EntryPoint::ChannelClose,
            source: DispatchError::MessageFailed {
                index: 2,
                reason: "insufficient funds".into(),
            },
        };
        let source = err.source().map(ToString::to_string);
        assert_eq!(source.as_deref(), Some("message 2 failed: insufficient funds"));
    }

    #[test]
    fn test_gas_error_display() {
        let err = GasError::OutOfGas {
            descriptor: "wasm contract".into(),
            consumed: 120,
            limit: 100,
        };
        assert_eq!(
            err.to_string(),
            "out of gas in wasm contract: consumed 120 > limit 100"
        );
    }

    #[test]
    fn test_ipc_error_display() {
        let err = IpcError::UnauthorizedSender {
            sender_id: 5,
            allowed: vec![15],
        };
        assert!(err.to_string().contains("unauthorized"));
        assert!(err.to_string().contains('5'));
    }
}
