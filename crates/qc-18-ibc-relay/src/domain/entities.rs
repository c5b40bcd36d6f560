//! # Core Domain Entities
//!
//! Main business entities for relaying IBC lifecycle events into contracts.

use crate::domain::ibc::IbcTimeout;
use crate::domain::value_objects::{Binary, CodeHash, ContractAddress, PortId};
use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// BLOCK / EXECUTION ENVIRONMENT
// =============================================================================

/// Block-level chain state visible to a contract call.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockInfo {
    /// Block height.
    pub height: u64,
    /// Block time (unix nanos).
    pub time: u64,
    /// Chain identifier.
    pub chain_id: String,
}

impl Default for BlockInfo {
    fn default() -> Self {
        Self {
            height: 1,
            time: 0,
            chain_id: "quantum-chain".to_string(),
        }
    }
}

/// Contract section of the execution environment.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractEnv {
    /// Address of the executing contract.
    pub address: ContractAddress,
}

/// Immutable snapshot passed verbatim into every VM call.
///
/// Identical chain state and address always produce an identical `Env`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Env {
    /// Current block.
    pub block: BlockInfo,
    /// Executing contract.
    pub contract: ContractEnv,
}

impl Env {
    /// Creates the environment for `address` at `block`.
    #[must_use]
    pub fn new(block: &BlockInfo, address: ContractAddress) -> Self {
        Self {
            block: block.clone(),
            contract: ContractEnv { address },
        }
    }
}

// =============================================================================
// CONTRACT METADATA
// =============================================================================

/// Per-instance contract metadata.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractInfo {
    /// Id of the stored code this instance runs.
    pub code_id: u64,
    /// Account that instantiated the contract.
    pub creator: String,
    /// Optional admin allowed to migrate.
    pub admin: Option<String>,
    /// Human readable label.
    pub label: String,
    /// IBC port bound to this instance, if the contract is IBC enabled.
    pub ibc_port_id: Option<PortId>,
}

/// A resolved contract instance: metadata, code identity and storage handle.
#[derive(Debug)]
pub struct ContractInstance<S> {
    /// Instance metadata.
    pub info: ContractInfo,
    /// Code identity backing the instance.
    pub code_hash: CodeHash,
    /// Storage partition owned by this instance.
    pub store: S,
}

// =============================================================================
// ENTRY POINTS
// =============================================================================

/// The six IBC lifecycle entry points a contract can export.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryPoint {
    /// Channel open INIT/TRY handshake step.
    ChannelOpen,
    /// Channel open ACK/CONFIRM handshake step.
    ChannelConnect,
    /// Channel close.
    ChannelClose,
    /// Incoming packet.
    PacketReceive,
    /// Acknowledgement for a packet we sent.
    PacketAck,
    /// Packet we sent timed out.
    PacketTimeout,
}

impl EntryPoint {
    /// All entry points, in lifecycle order.
    pub const ALL: [Self; 6] = [
        Self::ChannelOpen,
        Self::ChannelConnect,
        Self::ChannelClose,
        Self::PacketReceive,
        Self::PacketAck,
        Self::PacketTimeout,
    ];

    /// Name of the exported contract function.
    #[must_use]
    pub const fn export_name(self) -> &'static str {
        match self {
            Self::ChannelOpen => "ibc_channel_open",
            Self::ChannelConnect => "ibc_channel_connect",
            Self::ChannelClose => "ibc_channel_close",
            Self::PacketReceive => "ibc_packet_receive",
            Self::PacketAck => "ibc_packet_ack",
            Self::PacketTimeout => "ibc_packet_timeout",
        }
    }

    /// Whether events and messages from this entry point reach the host.
    ///
    /// The open handshake step only validates; whatever the contract returns
    /// is dropped.
    #[must_use]
    pub const fn integrates_side_effects(self) -> bool {
        !matches!(self, Self::ChannelOpen)
    }

    /// Whether this entry point hands acknowledgement bytes back to the host.
    #[must_use]
    pub const fn returns_acknowledgement(self) -> bool {
        matches!(self, Self::PacketReceive)
    }
}

impl fmt::Display for EntryPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.export_name())
    }
}

// =============================================================================
// CONTRACT RESPONSE
// =============================================================================

/// Key/value attribute emitted by a contract.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    /// Attribute key.
    pub key: String,
    /// Attribute value.
    pub value: String,
}

impl Attribute {
    /// Creates an attribute.
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Host-native event record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// Event type.
    #[serde(rename = "type")]
    pub ty: String,
    /// Ordered attributes.
    pub attributes: Vec<Attribute>,
}

impl Event {
    /// Creates an empty event of the given type.
    pub fn new(ty: impl Into<String>) -> Self {
        Self {
            ty: ty.into(),
            attributes: Vec::new(),
        }
    }

    /// Returns the first value stored under `key`.
    #[must_use]
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.key == key)
            .map(|a| a.value.as_str())
    }
}

/// Token amount.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coin {
    /// Denomination.
    pub denom: String,
    /// Amount.
    pub amount: u64,
}

/// Follow-up message a contract asks the host to execute on its behalf.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContractMsg {
    /// Bank transfer from the contract account.
    BankSend {
        /// Recipient.
        to_address: String,
        /// Amount to send.
        amount: Vec<Coin>,
    },
    /// Execute another contract.
    WasmExecute {
        /// Target contract.
        contract: ContractAddress,
        /// Execute message.
        msg: Binary,
        /// Funds attached.
        funds: Vec<Coin>,
    },
    /// Send a packet on a channel bound to the contract's port.
    IbcSendPacket {
        /// Channel on the contract's own port.
        channel_id: String,
        /// Packet data.
        data: Binary,
        /// Timeout bounds.
        timeout: IbcTimeout,
    },
    /// Close a channel bound to the contract's port.
    IbcCloseChannel {
        /// Channel on the contract's own port.
        channel_id: String,
    },
    /// Chain specific message.
    Custom(serde_json::Value),
}

/// Uniform result of any IBC entry point.
///
/// `acknowledgement` is only meaningful for [`EntryPoint::PacketReceive`].
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ContractResponse {
    /// Attributes for event translation, in emission order.
    pub attributes: Vec<Attribute>,
    /// Follow-up messages, in dispatch order.
    pub messages: Vec<ContractMsg>,
    /// Raw acknowledgement bytes written by the contract.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub acknowledgement: Option<Binary>,
}

impl ContractResponse {
    /// Creates an empty response.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an attribute.
    #[must_use]
    pub fn add_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push(Attribute::new(key, value));
        self
    }

    /// Appends a follow-up message.
    #[must_use]
    pub fn add_message(mut self, msg: ContractMsg) -> Self {
        self.messages.push(msg);
        self
    }

    /// Sets the acknowledgement bytes.
    #[must_use]
    pub fn set_acknowledgement(mut self, ack: impl Into<Binary>) -> Self {
        self.acknowledgement = Some(ack.into());
        self
    }
}

// =============================================================================
// QUERIES
// =============================================================================

/// Read-only query a contract may issue while executing.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryRequest {
    /// Current block info.
    Block,
    /// Metadata of a contract instance.
    ContractInfo {
        /// Queried contract.
        contract: ContractAddress,
    },
    /// Raw storage read from another contract.
    Raw {
        /// Queried contract.
        contract: ContractAddress,
        /// Storage key.
        key: Binary,
    },
    /// Chain specific query.
    Custom(serde_json::Value),
}

// =============================================================================
// CONFIGURATION
// =============================================================================

/// Relay configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    /// Upper bound on the gas handed to a single VM call.
    pub max_contract_gas: u64,
    /// Event type used for contract emitted attributes.
    pub event_type: String,
}

impl RelayConfig {
    /// Hard cap on gas for one contract call.
    pub const DEFAULT_MAX_CONTRACT_GAS: u64 = 10_000_000_000;

    /// Default event type for contract attributes.
    pub const DEFAULT_EVENT_TYPE: &'static str = "wasm";
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            max_contract_gas: Self::DEFAULT_MAX_CONTRACT_GAS,
            event_type: Self::DEFAULT_EVENT_TYPE.to_string(),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
