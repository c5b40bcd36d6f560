//! # Event Translator Adapter

use crate::domain::entities::{Attribute, Event, RelayConfig};
use crate::domain::services::parse_events;
use crate::domain::value_objects::ContractAddress;
use crate::ports::outbound::EventTranslator;

/// Emits contract attributes as one typed event led by `contract_address`.
#[derive(Clone, Debug)]
pub struct WasmEventTranslator {
    event_type: String,
}

impl WasmEventTranslator {
    /// Translator emitting events of `event_type`.
    pub fn new(event_type: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
        }
    }
}

impl Default for WasmEventTranslator {
    fn default() -> Self {
        Self::new(RelayConfig::DEFAULT_EVENT_TYPE)
    }
}

impl EventTranslator for WasmEventTranslator {
    fn translate(&self, attributes: &[Attribute], contract: &ContractAddress) -> Vec<Event> {
        parse_events(attributes, contract, &self.event_type)
    }
}
