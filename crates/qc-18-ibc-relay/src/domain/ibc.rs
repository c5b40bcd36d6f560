//! # IBC Protocol Payloads
//!
//! Channel, packet and acknowledgement shapes as defined by the host IBC
//! layer (ICS-004). The relay forwards these into the VM verbatim and never
//! reads their fields; they live here only so the crate has a concrete type
//! to carry across the VM boundary.

use crate::domain::value_objects::Binary;
use serde::{Deserialize, Serialize};

/// One side of a channel.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IbcEndpoint {
    /// Port identifier.
    pub port_id: String,
    /// Channel identifier.
    pub channel_id: String,
}

/// Channel ordering.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IbcOrder {
    /// Packets may be delivered in any order.
    Unordered,
    /// Packets are delivered in sequence order.
    Ordered,
}

/// Channel descriptor handed to channel lifecycle entry points.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IbcChannel {
    /// Our side of the channel.
    pub endpoint: IbcEndpoint,
    /// The counterparty side. The channel id may be empty during INIT.
    pub counterparty_endpoint: IbcEndpoint,
    /// Channel ordering.
    pub order: IbcOrder,
    /// Negotiated application version.
    pub version: String,
    /// Proposed counterparty version (TRY step only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub counterparty_version: Option<String>,
    /// Connection the channel runs over.
    pub connection_id: String,
}

/// Height on the counterparty chain.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IbcTimeoutHeight {
    /// Revision number.
    pub revision: u64,
    /// Block height within the revision.
    pub height: u64,
}

/// Packet timeout; either bound may be unset.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IbcTimeout {
    /// Timeout block height.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block: Option<IbcTimeoutHeight>,
    /// Timeout timestamp (unix nanos).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<u64>,
}

/// Packet descriptor.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IbcPacket {
    /// Sending side.
    pub src: IbcEndpoint,
    /// Receiving side.
    pub dest: IbcEndpoint,
    /// Sequence number on the channel.
    pub sequence: u64,
    /// Application data.
    pub data: Binary,
    /// Timeout bounds.
    pub timeout: IbcTimeout,
}

/// Acknowledgement written by the counterparty for a packet we sent.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IbcAcknowledgement {
    /// Raw acknowledgement bytes, application defined.
    pub acknowledgement: Binary,
    /// The packet being acknowledged.
    pub original_packet: IbcPacket,
}

/// Payload handed to exactly one VM entry point.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IbcPayload {
    /// Channel lifecycle payload.
    Channel(IbcChannel),
    /// Packet receive and timeout payload.
    Packet(IbcPacket),
    /// Packet acknowledgement payload.
    Acknowledgement(IbcAcknowledgement),
}
