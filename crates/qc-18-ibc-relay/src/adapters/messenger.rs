//! # Message Dispatcher Adapter
//!
//! Records every dispatch and emits one `message` event per executed
//! message. A failure can be injected at a given message index to exercise
//! the host's abort path.

use crate::context::TxContext;
use crate::domain::entities::{Attribute, ContractMsg, Event};
use crate::domain::invariants::check_port_ownership_invariant;
use crate::domain::value_objects::{ContractAddress, PortId};
use crate::errors::DispatchError;
use crate::ports::outbound::MessageDispatcher;
use parking_lot::Mutex;

/// Event type emitted per executed message.
pub const MESSAGE_EVENT_TYPE: &str = "message";

/// One call into the dispatcher.
#[derive(Clone, Debug, PartialEq)]
pub struct DispatchRecord {
    /// Contract the messages were dispatched for.
    pub contract: ContractAddress,
    /// Port the messages were scoped to.
    pub port: PortId,
    /// Messages in dispatch order.
    pub messages: Vec<ContractMsg>,
}

/// In-memory message dispatcher.
#[derive(Debug, Default)]
pub struct RecordingMessenger {
    records: Mutex<Vec<DispatchRecord>>,
    fail_at: Mutex<Option<(usize, String)>>,
}

impl RecordingMessenger {
    /// Creates a dispatcher that executes every message.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the message at `index` fail with `reason` on every later dispatch.
    pub fn fail_at(&self, index: usize, reason: impl Into<String>) {
        *self.fail_at.lock() = Some((index, reason.into()));
    }

    /// Clears an injected failure.
    pub fn clear_failure(&self) {
        *self.fail_at.lock() = None;
    }

    /// All dispatch calls so far.
    #[must_use]
    pub fn records(&self) -> Vec<DispatchRecord> {
        self.records.lock().clone()
    }

    /// Number of dispatch calls so far.
    #[must_use]
    pub fn dispatch_count(&self) -> usize {
        self.records.lock().len()
    }
}

fn message_kind(msg: &ContractMsg) -> &'static str {
    match msg {
        ContractMsg::BankSend { .. } => "bank_send",
        ContractMsg::WasmExecute { .. } => "wasm_execute",
        ContractMsg::IbcSendPacket { .. } => "ibc_send_packet",
        ContractMsg::IbcCloseChannel { .. } => "ibc_close_channel",
        ContractMsg::Custom(_) => "custom",
    }
}

impl MessageDispatcher for RecordingMessenger {
    fn dispatch(
        &self,
        ctx: &mut TxContext,
        contract: &ContractAddress,
        port: &PortId,
        messages: Vec<ContractMsg>,
    ) -> Result<(), DispatchError> {
        self.records.lock().push(DispatchRecord {
            contract: *contract,
            port: port.clone(),
            messages: messages.clone(),
        });
        if !check_port_ownership_invariant(port, contract) {
            return Err(DispatchError::Unauthorized(port.clone()));
        }
        let fail_at = self.fail_at.lock().clone();

        for (index, msg) in messages.iter().enumerate() {
            if let Some((at, reason)) = &fail_at {
                if *at == index {
                    return Err(DispatchError::MessageFailed {
                        index,
                        reason: reason.clone(),
                    });
                }
            }
            ctx.events.emit_event(Event {
                ty: MESSAGE_EVENT_TYPE.to_string(),
                attributes: vec![
                    Attribute::new("sender", contract.to_string()),
                    Attribute::new("port", port.as_str()),
                    Attribute::new("kind", message_kind(msg)),
                ],
            });
        }
        Ok(())
    }
}
