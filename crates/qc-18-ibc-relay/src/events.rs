//! # Event Schema (EDA Compliance)
//!
//! Defines all IPC message payloads for the IBC relay.
//! These messages are wrapped in `AuthenticatedMessage<T>` for transport.
//!
//! ## Architecture Compliance (Architecture.md v2.3, IPC-MATRIX.md)
//!
//! - **Envelope-Only Identity (v2.2):** NO `requester_id` fields in payloads
//! - **Correlation IDs:** All request/response pairs use `correlation_id`
//! - **Security Boundaries:** Validated via `envelope.sender_id`
//!
//! ## Authorized Senders (per IPC-MATRIX.md Subsystem 18)
//!
//! | Message Type | Authorized Sender(s) |
//! |--------------|---------------------|
//! | `IbcCallbackRequest` | Subsystem 15 ONLY |

use crate::domain::entities::{BlockInfo, EntryPoint, Event};
use crate::domain::ibc::{IbcAcknowledgement, IbcChannel, IbcPacket};
use crate::domain::value_objects::{Binary, ContractAddress};
use serde::{Deserialize, Serialize};

// =============================================================================
// INBOUND EVENTS (From Other Subsystems)
// =============================================================================

/// One IBC lifecycle callback with its protocol payload.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IbcCallback {
    /// Channel open INIT/TRY.
    ChannelOpen {
        /// Channel being opened.
        channel: IbcChannel,
    },
    /// Channel open ACK/CONFIRM.
    ChannelConnect {
        /// Channel now open.
        channel: IbcChannel,
    },
    /// Channel closed.
    ChannelClose {
        /// Channel being closed.
        channel: IbcChannel,
    },
    /// Incoming packet.
    PacketReceive {
        /// Received packet.
        packet: IbcPacket,
    },
    /// Acknowledgement of a sent packet.
    PacketAck {
        /// Acknowledgement with its original packet.
        acknowledgement: IbcAcknowledgement,
    },
    /// Sent packet timed out.
    PacketTimeout {
        /// Timed out packet.
        packet: IbcPacket,
    },
}

impl IbcCallback {
    /// Contract entry point this callback runs.
    #[must_use]
    pub fn entry_point(&self) -> EntryPoint {
        match self {
            Self::ChannelOpen { .. } => EntryPoint::ChannelOpen,
            Self::ChannelConnect { .. } => EntryPoint::ChannelConnect,
            Self::ChannelClose { .. } => EntryPoint::ChannelClose,
            Self::PacketReceive { .. } => EntryPoint::PacketReceive,
            Self::PacketAck { .. } => EntryPoint::PacketAck,
            Self::PacketTimeout { .. } => EntryPoint::PacketTimeout,
        }
    }
}

/// Request to run an IBC lifecycle callback on a contract.
///
/// ## IPC-MATRIX.md Security
///
/// - Authorized sender: Subsystem 15 (Cross-Chain) ONLY
/// - Envelope validation: `envelope.sender_id` MUST be 15
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IbcCallbackRequestPayload {
    // NO requester_id - per Envelope-Only Identity v2.2
    /// Contract bound to the channel.
    pub contract: ContractAddress,
    /// Callback to run.
    pub callback: IbcCallback,
    /// Block the callback executes in.
    pub block: BlockInfo,
    /// Gas limit of the enclosing transaction. `None` uses the service default.
    #[serde(default)]
    pub gas_limit: Option<u64>,
}

/// Response to an IBC callback.
///
/// On failure `events` is empty: the callback ran as its own atomic unit.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IbcCallbackResponsePayload {
    /// Whether the callback succeeded.
    pub success: bool,
    /// Gas charged, including gas of failed calls.
    pub gas_used: u64,
    /// Acknowledgement bytes (packet receive only).
    pub acknowledgement: Option<Binary>,
    /// Events emitted by the callback.
    pub events: Vec<Event>,
    /// Error message (if failed).
    pub error: Option<String>,
}

// =============================================================================
// EVENT BUS TOPICS
// =============================================================================

/// Event topics for the IBC relay subsystem.
pub mod topics {
    /// Topic for receiving IBC callback requests.
    pub const IBC_CALLBACK_REQUEST: &str = "ibc_relay.callback.request";

    /// Topic for publishing IBC callback responses.
    pub const IBC_CALLBACK_RESPONSE: &str = "ibc_relay.callback.response";

    /// Dead letter queue for failed callbacks.
    pub const DLQ: &str = "dlq.ibc_relay";
}

// =============================================================================
// SUBSYSTEM ID VALIDATION
// =============================================================================

/// Subsystem IDs for validation.
pub mod subsystem_ids {
    /// Smart Contracts (contract execution).
    pub const SMART_CONTRACTS: u8 = 11;

    /// Cross-Chain (IBC module, sends lifecycle callbacks).
    pub const CROSS_CHAIN: u8 = 15;

    /// IBC Relay (this subsystem).
    pub const IBC_RELAY: u8 = 18;

    /// Validates that sender is authorized for `IbcCallbackRequest`.
    #[must_use]
    pub fn is_authorized_callback_sender(sender_id: u8) -> bool {
        sender_id == CROSS_CHAIN
    }
}

// =============================================================================
// TESTS
// =============================================================================
