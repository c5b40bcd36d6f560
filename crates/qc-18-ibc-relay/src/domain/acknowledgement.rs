//! # Acknowledgement Envelope
//!
//! Optional success/failure envelope for packet acknowledgements
//! (ICS-004 "acknowledgement envelope"). Contracts are free to return any
//! bytes; the relay never validates acknowledgements against this shape.

use crate::domain::value_objects::Binary;
use serde::{Deserialize, Serialize};

/// Structured acknowledgement: `{"result": "<hex>"}` or `{"error": "<msg>"}`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AckEnvelope {
    /// Packet processed; application result bytes.
    Result(Binary),
    /// Packet rejected by the application.
    Error(String),
}

impl AckEnvelope {
    /// Success envelope.
    pub fn success(data: impl Into<Binary>) -> Self {
        Self::Result(data.into())
    }

    /// Failure envelope.
    pub fn failure(msg: impl Into<String>) -> Self {
        Self::Error(msg.into())
    }

    /// Returns true for a success envelope.
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Result(_))
    }

    /// Encodes as JSON bytes.
    ///
    /// # Errors
    ///
    /// Only fails if serde_json cannot serialize the envelope.
    pub fn to_binary(&self) -> Result<Binary, serde_json::Error> {
        serde_json::to_vec(self).map(Binary)
    }

    /// Parses acknowledgement bytes, returning `None` for anything that is
    /// not an envelope.
    #[must_use]
    pub fn parse(raw: &[u8]) -> Option<Self> {
        serde_json::from_slice(raw).ok()
    }
}
