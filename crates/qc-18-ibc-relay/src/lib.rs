//! # QC-18 IBC Relay - Contract Lifecycle Dispatch Subsystem
//!
//! **Subsystem ID:** 18
//! **Architecture:** Architecture.md v2.3, IPC-MATRIX.md v2.3
//! **Status:** Phase 3
//!
//! ## Purpose
//!
//! Bridges IBC channel and packet lifecycle events into contract entry
//! points. For each event the relay resolves the bound contract, builds a
//! deterministic environment, runs one metered VM call, charges the reported
//! gas, and folds the contract's events and follow-up messages back into the
//! enclosing transaction.
//!
//! ## Lifecycle Entry Points
//!
//! | Event | Entry point | Side effects | Returns |
//! |-------|-------------|--------------|---------|
//! | Channel open (INIT/TRY) | `ibc_channel_open` | dropped | - |
//! | Channel connect (ACK/CONFIRM) | `ibc_channel_connect` | yes | - |
//! | Channel close | `ibc_channel_close` | yes | - |
//! | Packet receive | `ibc_packet_receive` | yes | ack bytes |
//! | Packet ack | `ibc_packet_ack` | yes | - |
//! | Packet timeout | `ibc_packet_timeout` | yes | - |
//!
//! ## Domain Invariants
//!
//! | ID | Invariant | Enforcement Location |
//! |----|-----------|---------------------|
//! | INVARIANT-1 | Gas used never exceeds the call budget | `domain/invariants.rs` - `check_gas_budget_invariant()` |
//! | INVARIANT-2 | Dispatch scoped to the contract's own port | `domain/invariants.rs` - `check_port_ownership_invariant()` |
//! | INVARIANT-3 | No side effects without a successful call | `dispatcher.rs` - `run()` early returns, debug-asserted with `check_side_effect_invariant()` |
//!
//! ## Security (IPC-MATRIX.md)
//!
//! - **Envelope-Only Identity**: Identity derived solely from `sender_id`
//! - **Atomic Callbacks**: A failed callback publishes no events and leaves no storage writes
//!
//! ### IPC Authorization Matrix
//!
//! | Message | Authorized Sender(s) | Enforcement |
//! |---------|---------------------|-------------|
//! | `IbcCallbackRequest` | Cross-Chain (15) ONLY | `service.rs` - `handle_ibc_callback()` |
//!
//! ## Outbound Dependencies
//!
//! | Collaborator | Trait | Purpose |
//! |--------------|-------|---------|
//! | Contract keeper | `ContractResolver` | Address to code, metadata, storage |
//! | Contract VM | `WasmVm` | Metered entry point execution |
//! | Transaction | `GasMeter` | Ambient gas ledger |
//! | Message router | `MessageDispatcher` | Follow-up message execution |
//! | Chain state | `QueryPlugins` | Contract queries |
//!
//! ## Usage Example
//!
//! ```ignore
//! use qc_18_ibc_relay::prelude::*;
//!
//! let mut ctx = TxContext::with_gas_limit(block, 5_000_000);
//! let ack = dispatcher.on_packet_receive(&mut ctx, &contract, packet)?;
//! ```

// Crate-level lints
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::similar_names)]

// =============================================================================
// MODULES
// =============================================================================

pub mod adapters;
pub mod context;
pub mod dispatcher;
pub mod domain;
pub mod errors;
pub mod events;
pub mod ports;
pub mod query;
pub mod service;

// =============================================================================
// PRELUDE
// =============================================================================

/// Convenient re-exports for common usage.
pub mod prelude {
    // Domain entities
    pub use crate::domain::entities::{
        Attribute, BlockInfo, Coin, ContractInfo, ContractInstance, ContractMsg,
        ContractResponse, EntryPoint, Env, Event, QueryRequest, RelayConfig,
    };

    // IBC payloads
    pub use crate::domain::ibc::{
        IbcAcknowledgement, IbcChannel, IbcEndpoint, IbcOrder, IbcPacket, IbcPayload,
        IbcTimeout, IbcTimeoutHeight,
    };
    pub use crate::domain::acknowledgement::AckEnvelope;

    // Value objects
    pub use crate::domain::value_objects::{Binary, CodeHash, ContractAddress, PortId};

    // Domain services
    pub use crate::domain::services::{
        code_hash, contract_gas_budget, derive_contract_address, parse_events,
    };

    // Invariants
    pub use crate::domain::invariants::{
        check_gas_budget_invariant, check_port_ownership_invariant, check_side_effect_invariant,
        InvariantViolation,
    };

    // Ports
    pub use crate::ports::inbound::{IbcLifecycle, IbcRelayApi};
    pub use crate::ports::outbound::{
        ContractResolver, EnvironmentBuilder, EventTranslator, GasMeter, HostApi,
        MessageDispatcher, Querier, QueryPlugins, Storage, VmCall, VmOutcome, WasmVm,
    };

    // Context
    pub use crate::context::{EventManager, JournaledStore, StateJournal, TxContext};
    pub use crate::dispatcher::LifecycleDispatcher;
    pub use crate::query::{NoQueryPlugins, QueryHandler};

    // Events
    pub use crate::events::{
        subsystem_ids, topics, IbcCallback, IbcCallbackRequestPayload,
        IbcCallbackResponsePayload,
    };

    // Errors
    pub use crate::errors::{
        DispatchError, GasError, IpcError, QueryError, RelayError, ResolveError, VmError,
    };

    // Adapters
    pub use crate::adapters::{
        BlockEnvBuilder, ContractStore, GasLedger, HexAddressApi, InMemoryContractRegistry,
        MockVm, RecordingMessenger, WasmEventTranslator,
    };

    // Service
    pub use crate::service::{
        create_test_service, IbcRelayService, InMemoryRelayService, ServiceConfig, ServiceStats,
    };
}

// =============================================================================
// CRATE INFO
// =============================================================================

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Subsystem ID for IPC (per IPC-MATRIX.md).
pub const SUBSYSTEM_ID: u8 = 18;

/// Subsystem name.
pub const SUBSYSTEM_NAME: &str = "IBC Relay";

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subsystem_id() {
        assert_eq!(SUBSYSTEM_ID, 18);
        assert_eq!(SUBSYSTEM_ID, events::subsystem_ids::IBC_RELAY);
    }

    #[test]
    fn test_prelude_exports() {
        // Verify prelude exports compile
        use prelude::*;
        let _ = RelayConfig::default();
        let _ = ContractAddress::ZERO;
        let _ = TxContext::infinite(BlockInfo::default());
    }
}
