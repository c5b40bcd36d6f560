//! # Driven Ports (SPI - Outbound)
//!
//! These are the interfaces the relay depends on. The host chain implements
//! them; `crate::adapters` carries in-memory versions for tests and local
//! nodes.
//!
//! | Port | Collaborator |
//! |------|--------------|
//! | `ContractResolver` | contract registry (address -> code, metadata, storage) |
//! | `EnvironmentBuilder` | deterministic `Env` construction |
//! | `GasMeter` | ambient transaction gas ledger |
//! | `WasmVm` | metered contract VM |
//! | `EventTranslator` | attribute -> host event conversion |
//! | `MessageDispatcher` | follow-up message execution |
//! | `QueryPlugins` | chain state answering contract queries |
//! | `HostApi` | address host functions exposed to contracts |

use crate::context::TxContext;
use crate::domain::entities::{
    Attribute, BlockInfo, ContractInstance, ContractMsg, ContractResponse, EntryPoint, Env, Event,
    QueryRequest,
};
use crate::domain::ibc::IbcPayload;
use crate::domain::value_objects::{Binary, CodeHash, ContractAddress, PortId};
use crate::errors::{DispatchError, GasError, QueryError, ResolveError, VmError};
use std::sync::Arc;

// =============================================================================
// STORAGE
// =============================================================================

/// Key/value partition owned by a single contract instance.
pub trait Storage: Send {
    /// Reads a value.
    fn get(&self, key: &[u8]) -> Option<Vec<u8>>;

    /// Writes a value.
    fn set(&mut self, key: &[u8], value: &[u8]);

    /// Deletes a value.
    fn remove(&mut self, key: &[u8]);
}

// =============================================================================
// CONTRACT RESOLVER
// =============================================================================

/// Resolves a contract address to its metadata, code identity and storage.
pub trait ContractResolver: Send + Sync {
    /// Storage handle type handed out per instance.
    ///
    /// Clones of a handle share the instance's partition; the transaction
    /// journal undoes writes through them.
    type Store: Storage + Clone + 'static;

    /// Looks up a contract instance.
    ///
    /// # Errors
    ///
    /// * `ResolveError::ContractNotFound` - no instance at `contract`
    /// * `ResolveError::CodeNotFound` - instance exists, code does not
    fn resolve(&self, contract: &ContractAddress)
        -> Result<ContractInstance<Self::Store>, ResolveError>;
}

impl<T: ContractResolver + ?Sized> ContractResolver for Arc<T> {
    type Store = T::Store;

    fn resolve(
        &self,
        contract: &ContractAddress,
    ) -> Result<ContractInstance<Self::Store>, ResolveError> {
        (**self).resolve(contract)
    }
}

// =============================================================================
// ENVIRONMENT BUILDER
// =============================================================================

/// Builds the execution environment for one call.
///
/// Implementations MUST be pure: identical inputs give identical output.
pub trait EnvironmentBuilder: Send + Sync {
    /// Builds the environment for `contract` at `block`.
    fn build(&self, block: &BlockInfo, contract: &ContractAddress) -> Env;
}

// =============================================================================
// GAS METER
// =============================================================================

/// Ambient gas ledger of the enclosing transaction.
pub trait GasMeter: Send {
    /// Ledger limit. `None` for an infinite meter.
    fn limit(&self) -> Option<u64>;

    /// Gas consumed so far.
    fn consumed(&self) -> u64;

    /// Records consumption.
    ///
    /// The amount is recorded even when it pushes the ledger past its limit.
    ///
    /// # Errors
    ///
    /// `GasError::OutOfGas` if the ledger is past its limit after charging.
    fn consume(&mut self, amount: u64, descriptor: &str) -> Result<(), GasError>;

    /// Gas left before the limit. `None` for an infinite meter.
    fn remaining(&self) -> Option<u64> {
        self.limit().map(|limit| limit.saturating_sub(self.consumed()))
    }

    /// Returns true once consumption reached the limit.
    fn is_out_of_gas(&self) -> bool {
        self.remaining() == Some(0)
    }
}

// =============================================================================
// QUERY BRIDGE
// =============================================================================

/// Read-only query capability handed to the VM.
pub trait Querier {
    /// Answers one query with serialized response bytes.
    ///
    /// # Errors
    ///
    /// Any `QueryError`; returned to the contract, not to the host.
    fn query(&self, request: &QueryRequest) -> Result<Binary, QueryError>;
}

/// Chain state backing the query bridge.
pub trait QueryPlugins: Send + Sync {
    /// Answers `request` against state at `block`.
    ///
    /// # Errors
    ///
    /// `QueryError::Unsupported` when the request kind is not handled.
    fn handle(&self, block: &BlockInfo, request: &QueryRequest) -> Result<Binary, QueryError>;
}

impl<T: QueryPlugins + ?Sized> QueryPlugins for Arc<T> {
    fn handle(&self, block: &BlockInfo, request: &QueryRequest) -> Result<Binary, QueryError> {
        (**self).handle(block, request)
    }
}

// =============================================================================
// HOST API
// =============================================================================

/// Address host functions exposed to contract code.
pub trait HostApi: Send + Sync {
    /// Human readable address to canonical bytes.
    ///
    /// # Errors
    ///
    /// Returns a message when the address is malformed.
    fn canonicalize(&self, human: &str) -> Result<Vec<u8>, String>;

    /// Canonical bytes to human readable address.
    ///
    /// # Errors
    ///
    /// Returns a message when the bytes have the wrong length.
    fn humanize(&self, canonical: &[u8]) -> Result<String, String>;
}

// =============================================================================
// VIRTUAL MACHINE
// =============================================================================

/// Everything the VM needs for one entry point call.
pub struct VmCall<'a> {
    /// Entry point to run.
    pub entry_point: EntryPoint,
    /// Code to run it on.
    pub code_hash: &'a CodeHash,
    /// Execution environment.
    pub env: &'a Env,
    /// Protocol payload, forwarded as received.
    pub payload: &'a IbcPayload,
    /// Contract storage.
    pub store: &'a mut dyn Storage,
    /// Host functions.
    pub api: &'a dyn HostApi,
    /// Read-only query bridge.
    pub querier: &'a dyn Querier,
    /// Ambient gas ledger, for inspection only.
    pub gas_meter: &'a dyn GasMeter,
    /// Gas budget for this call.
    pub gas_limit: u64,
}

/// What the VM reports back for one call.
///
/// `gas_used` is reported for failures as well as successes.
#[derive(Clone, Debug, PartialEq)]
pub struct VmOutcome {
    /// Gas consumed by the call.
    pub gas_used: u64,
    /// Contract response or the VM error.
    pub result: Result<ContractResponse, VmError>,
}

impl VmOutcome {
    /// Successful call.
    #[must_use]
    pub fn success(response: ContractResponse, gas_used: u64) -> Self {
        Self {
            gas_used,
            result: Ok(response),
        }
    }

    /// Failed call.
    #[must_use]
    pub fn failure(error: VmError, gas_used: u64) -> Self {
        Self {
            gas_used,
            result: Err(error),
        }
    }
}

/// Metered contract VM.
pub trait WasmVm: Send + Sync {
    /// Runs one IBC entry point.
    fn call(&self, call: VmCall<'_>) -> VmOutcome;
}

impl<T: WasmVm + ?Sized> WasmVm for Arc<T> {
    fn call(&self, call: VmCall<'_>) -> VmOutcome {
        (**self).call(call)
    }
}

// =============================================================================
// EVENT TRANSLATOR
// =============================================================================

/// Converts contract attributes into host events.
pub trait EventTranslator: Send + Sync {
    /// Translates `attributes` emitted by `contract`.
    fn translate(&self, attributes: &[Attribute], contract: &ContractAddress) -> Vec<Event>;
}

// =============================================================================
// MESSAGE DISPATCHER
// =============================================================================

/// Executes contract follow-up messages inside the current transaction.
pub trait MessageDispatcher: Send + Sync {
    /// Executes `messages` in order on behalf of `contract` and its `port`.
    ///
    /// # Errors
    ///
    /// The first failing message aborts the rest.
    fn dispatch(
        &self,
        ctx: &mut TxContext,
        contract: &ContractAddress,
        port: &PortId,
        messages: Vec<ContractMsg>,
    ) -> Result<(), DispatchError>;
}

impl<T: MessageDispatcher + ?Sized> MessageDispatcher for Arc<T> {
    fn dispatch(
        &self,
        ctx: &mut TxContext,
        contract: &ContractAddress,
        port: &PortId,
        messages: Vec<ContractMsg>,
    ) -> Result<(), DispatchError> {
        (**self).dispatch(ctx, contract, port, messages)
    }
}
