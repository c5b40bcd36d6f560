//! # Transaction Context
//!
//! Explicit ambient state threaded through every relay call: the current
//! block, the transaction's gas ledger, its event log and the undo journal
//! of contract storage writes.
//!
//! The relay itself never rolls anything back. Atomicity belongs to the
//! transaction boundary, modelled here by [`TxContext::atomic`]: events
//! emitted and storage written inside a failed closure are dropped, gas
//! stays charged.

use crate::adapters::gas_ledger::GasLedger;
use crate::domain::entities::{BlockInfo, Event};
use crate::ports::outbound::{GasMeter, Storage};

// =============================================================================
// EVENT MANAGER
// =============================================================================

/// Append-only event log of one transaction.
#[derive(Clone, Debug, Default)]
pub struct EventManager {
    events: Vec<Event>,
}

impl EventManager {
    /// Creates an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one event.
    pub fn emit_event(&mut self, event: Event) {
        self.events.push(event);
    }

    /// Appends events in order.
    pub fn emit_events(&mut self, events: impl IntoIterator<Item = Event>) {
        self.events.extend(events);
    }

    /// Events emitted so far.
    #[must_use]
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Number of events emitted so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Returns true if nothing was emitted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Drops every event emitted after `checkpoint`.
    pub fn truncate(&mut self, checkpoint: usize) {
        self.events.truncate(checkpoint);
    }

    /// Takes all events out of the log.
    pub fn take(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }
}

// =============================================================================
// STATE JOURNAL
// =============================================================================

type Undo = Box<dyn FnOnce() + Send>;

/// Undo log of the storage writes made in one transaction.
#[derive(Default)]
pub struct StateJournal {
    entries: Vec<Undo>,
}

impl StateJournal {
    /// Creates an empty journal.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records how to undo one write.
    pub fn record(&mut self, undo: impl FnOnce() + Send + 'static) {
        self.entries.push(Box::new(undo));
    }

    /// Number of recorded writes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing was written.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Undoes every write recorded after `checkpoint`, newest first.
    pub fn revert_to(&mut self, checkpoint: usize) {
        while self.entries.len() > checkpoint {
            if let Some(undo) = self.entries.pop() {
                undo();
            }
        }
    }
}

impl std::fmt::Debug for StateJournal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateJournal")
            .field("entries", &self.entries.len())
            .finish()
    }
}

/// Storage handle that journals the previous value of every key it writes.
///
/// `S` must be a shared handle: the undo entries write back through clones
/// of it.
pub struct JournaledStore<'a, S> {
    inner: &'a mut S,
    journal: &'a mut StateJournal,
}

impl<'a, S> JournaledStore<'a, S>
where
    S: Storage + Clone + 'static,
{
    /// Wraps `inner`, recording undo entries into `journal`.
    #[must_use]
    pub fn new(inner: &'a mut S, journal: &'a mut StateJournal) -> Self {
        Self { inner, journal }
    }

    fn remember(&mut self, key: &[u8]) {
        let previous = self.inner.get(key);
        let mut store = self.inner.clone();
        let key = key.to_vec();
        self.journal.record(move || match previous {
            Some(value) => store.set(&key, &value),
            None => store.remove(&key),
        });
    }
}

impl<S> Storage for JournaledStore<'_, S>
where
    S: Storage + Clone + 'static,
{
    fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
        self.inner.get(key)
    }

    fn set(&mut self, key: &[u8], value: &[u8]) {
        self.remember(key);
        self.inner.set(key, value);
    }

    fn remove(&mut self, key: &[u8]) {
        self.remember(key);
        self.inner.remove(key);
    }
}

// =============================================================================
// TX CONTEXT
// =============================================================================

/// Ambient state of the enclosing chain transaction.
pub struct TxContext {
    /// Block the transaction executes in.
    pub block: BlockInfo,
    /// Gas ledger of the transaction.
    pub gas_meter: Box<dyn GasMeter>,
    /// Event log of the transaction.
    pub events: EventManager,
    /// Undo journal of contract storage writes.
    pub journal: StateJournal,
}

impl TxContext {
    /// Context with a custom gas meter.
    #[must_use]
    pub fn new(block: BlockInfo, gas_meter: Box<dyn GasMeter>) -> Self {
        Self {
            block,
            gas_meter,
            events: EventManager::new(),
            journal: StateJournal::new(),
        }
    }

    /// Context with a bounded [`GasLedger`].
    #[must_use]
    pub fn with_gas_limit(block: BlockInfo, limit: u64) -> Self {
        Self::new(block, Box::new(GasLedger::new(limit)))
    }

    /// Context with an infinite [`GasLedger`] (genesis, begin/end block).
    #[must_use]
    pub fn infinite(block: BlockInfo) -> Self {
        Self::new(block, Box::new(GasLedger::infinite()))
    }

    /// Runs `f` as an atomic unit.
    ///
    /// On `Err`, every event `f` emitted is discarded and every storage
    /// write `f` journaled is undone. Gas consumed by `f` stays charged.
    ///
    /// # Errors
    ///
    /// Returns whatever `f` returns.
    pub fn atomic<T, E>(&mut self, f: impl FnOnce(&mut Self) -> Result<T, E>) -> Result<T, E> {
        let events = self.events.len();
        let writes = self.journal.len();
        let result = f(self);
        if result.is_err() {
            self.events.truncate(events);
            self.journal.revert_to(writes);
        }
        result
    }
}

impl std::fmt::Debug for TxContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TxContext")
            .field("block", &self.block)
            .field("gas_limit", &self.gas_meter.limit())
            .field("gas_consumed", &self.gas_meter.consumed())
            .field("events", &self.events.len())
            .field("writes", &self.journal.len())
            .finish()
    }
}

// =============================================================================
// TESTS
// =============================================================================
