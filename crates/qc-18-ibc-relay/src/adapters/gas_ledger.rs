//! # Gas Ledger
//!
//! Basic and infinite gas meters for a transaction.

use crate::errors::GasError;
use crate::ports::outbound::GasMeter;

/// Gas ledger of one transaction.
///
/// ## Invariants
/// - `consumed` only grows
/// - consumption past the limit is recorded, then reported as `OutOfGas`
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GasLedger {
    /// `None` for an infinite ledger.
    limit: Option<u64>,
    consumed: u64,
}

impl GasLedger {
    /// Creates a bounded ledger.
    #[must_use]
    pub const fn new(limit: u64) -> Self {
        Self {
            limit: Some(limit),
            consumed: 0,
        }
    }

    /// Creates a ledger without a limit.
    #[must_use]
    pub const fn infinite() -> Self {
        Self {
            limit: None,
            consumed: 0,
        }
    }
}

impl GasMeter for GasLedger {
    fn limit(&self) -> Option<u64> {
        self.limit
    }

    fn consumed(&self) -> u64 {
        self.consumed
    }

    fn consume(&mut self, amount: u64, descriptor: &str) -> Result<(), GasError> {
        self.consumed = self.consumed.saturating_add(amount);
        match self.limit {
            Some(limit) if self.consumed > limit => Err(GasError::OutOfGas {
                descriptor: descriptor.to_string(),
                consumed: self.consumed,
                limit,
            }),
            _ => Ok(()),
        }
    }
}
