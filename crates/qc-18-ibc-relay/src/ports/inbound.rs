//! # Driving Ports (API - Inbound)
//!
//! These are the interfaces exposed by the IBC relay.
//!
//! - [`IbcLifecycle`]: synchronous callbacks invoked by the host's IBC
//!   module inside its own transaction.
//! - [`IbcRelayApi`]: async event-bus surface used by the Cross-Chain
//!   subsystem.

use crate::context::TxContext;
use crate::domain::ibc::{IbcAcknowledgement, IbcChannel, IbcPacket};
use crate::domain::value_objects::{Binary, ContractAddress};
use crate::errors::{IpcError, RelayError};
use crate::events::{IbcCallbackRequestPayload, IbcCallbackResponsePayload};
use async_trait::async_trait;
use uuid::Uuid;

// =============================================================================
// IBC LIFECYCLE (Primary Driving Port)
// =============================================================================

/// The six IBC lifecycle callbacks routed to a contract.
///
/// Each call resolves exactly one contract and runs exactly one VM entry
/// point. Gas reported by the VM is charged to `ctx` whether or not the call
/// succeeds. On `Err` the caller MUST abort its transaction; events emitted
/// before a dispatch failure are not removed here.
pub trait IbcLifecycle {
    /// Channel open INIT/TRY. The contract may veto the handshake; anything
    /// else it returns is dropped.
    ///
    /// # Errors
    ///
    /// `Resolve`, `ExecuteFailed` or `OutOfGas`.
    fn on_channel_open(
        &self,
        ctx: &mut TxContext,
        contract: &ContractAddress,
        channel: IbcChannel,
    ) -> Result<(), RelayError>;

    /// Channel open ACK/CONFIRM.
    ///
    /// # Errors
    ///
    /// Any [`RelayError`].
    fn on_channel_connect(
        &self,
        ctx: &mut TxContext,
        contract: &ContractAddress,
        channel: IbcChannel,
    ) -> Result<(), RelayError>;

    /// Channel closed.
    ///
    /// # Errors
    ///
    /// Any [`RelayError`].
    fn on_channel_close(
        &self,
        ctx: &mut TxContext,
        contract: &ContractAddress,
        channel: IbcChannel,
    ) -> Result<(), RelayError>;

    /// Incoming packet. Returns the contract's acknowledgement bytes
    /// verbatim, empty when the contract wrote none.
    ///
    /// # Errors
    ///
    /// Any [`RelayError`].
    fn on_packet_receive(
        &self,
        ctx: &mut TxContext,
        contract: &ContractAddress,
        packet: IbcPacket,
    ) -> Result<Binary, RelayError>;

    /// Acknowledgement for a packet the contract sent.
    ///
    /// # Errors
    ///
    /// Any [`RelayError`].
    fn on_packet_ack(
        &self,
        ctx: &mut TxContext,
        contract: &ContractAddress,
        acknowledgement: IbcAcknowledgement,
    ) -> Result<(), RelayError>;

    /// A packet the contract sent timed out.
    ///
    /// # Errors
    ///
    /// Any [`RelayError`].
    fn on_packet_timeout(
        &self,
        ctx: &mut TxContext,
        contract: &ContractAddress,
        packet: IbcPacket,
    ) -> Result<(), RelayError>;
}

// =============================================================================
// IBC RELAY API (Event Bus)
// =============================================================================

/// Event-bus API of the relay.
///
/// ## IPC-MATRIX.md Compliance
///
/// Authorized senders:
/// - Subsystem 15 (Cross-Chain): IBC module callbacks
///
/// ## Usage
///
/// ```ignore
/// let response = api.handle_ibc_callback(15, Uuid::new_v4(), request).await?;
/// ```
#[async_trait]
pub trait IbcRelayApi: Send + Sync {
    /// Runs one callback as its own atomic transaction.
    ///
    /// Relay failures are reported inside the response, not as `Err`.
    ///
    /// # Errors
    ///
    /// * `IpcError::UnauthorizedSender` - sender is not Cross-Chain
    /// * `IpcError::Backpressure` - too many requests waiting
    async fn handle_ibc_callback(
        &self,
        sender_id: u8,
        correlation_id: Uuid,
        payload: IbcCallbackRequestPayload,
    ) -> Result<IbcCallbackResponsePayload, IpcError>;
}
