//! # Adapters Layer (Outer Hexagon)
//!
//! In-memory implementations of the driven ports. A host chain swaps these
//! for its contract keeper, VM and message router.
//!
//! | Adapter | Port |
//! |---------|------|
//! | `InMemoryContractRegistry` | `ContractResolver`, `QueryPlugins` |
//! | `BlockEnvBuilder` | `EnvironmentBuilder` |
//! | `GasLedger` | `GasMeter` |
//! | `MockVm` | `WasmVm` |
//! | `WasmEventTranslator` | `EventTranslator` |
//! | `RecordingMessenger` | `MessageDispatcher` |
//! | `HexAddressApi` | `HostApi` |

pub mod env_builder;
pub mod event_translator;
pub mod gas_ledger;
pub mod host_api;
pub mod messenger;
pub mod mock_vm;
pub mod registry;

pub use env_builder::*;
pub use event_translator::*;
pub use gas_ledger::*;
pub use host_api::*;
pub use messenger::*;
pub use mock_vm::*;
pub use registry::*;
