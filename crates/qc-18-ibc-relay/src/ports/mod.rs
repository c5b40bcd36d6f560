//! # Ports Layer (Middle Hexagon)
//!
//! Trait definitions for relaying IBC lifecycle events into contracts.
//!
//! - **Driving Ports (Inbound)**: `IbcLifecycle`, `IbcRelayApi`
//! - **Driven Ports (Outbound)**: `ContractResolver`, `WasmVm`, `GasMeter`,
//!   `EnvironmentBuilder`, `EventTranslator`, `MessageDispatcher`,
//!   `QueryPlugins`, `HostApi`
//! - No concrete implementations in this module

pub mod inbound;
pub mod outbound;

pub use inbound::*;
pub use outbound::*;
