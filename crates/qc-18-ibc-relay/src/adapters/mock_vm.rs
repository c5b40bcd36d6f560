//! # Scripted VM Adapter
//!
//! `WasmVm` stand-in for tests and local nodes. Each entry point answers
//! with a scripted [`VmOutcome`]; every call is recorded with the inputs the
//! relay handed over.
//!
//! Like a metered VM, the mock never reports more gas than its limit: a
//! script asking for more is turned into `VmError::OutOfGas` at exactly the
//! limit. `unmetered()` switches that off to model a misbehaving VM.
//! Entry points marked with `unexport` fail as if the module lacked them.

use crate::domain::entities::{ContractResponse, EntryPoint, Env, QueryRequest};
use crate::domain::ibc::IbcPayload;
use crate::domain::value_objects::{Binary, CodeHash};
use crate::errors::{QueryError, VmError};
use crate::ports::outbound::{VmCall, VmOutcome, WasmVm};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};

/// Gas reported by unscripted calls.
pub const DEFAULT_CALL_GAS: u64 = 1_000;

/// Inputs of one recorded VM call.
#[derive(Clone, Debug, PartialEq)]
pub struct VmCallRecord {
    /// Entry point that ran.
    pub entry_point: EntryPoint,
    /// Code it ran on.
    pub code_hash: CodeHash,
    /// Environment handed in.
    pub env: Env,
    /// Payload handed in.
    pub payload: IbcPayload,
    /// Gas budget handed in.
    pub gas_limit: u64,
    /// Contract address as humanized by the host API.
    pub human_address: Option<String>,
    /// Result of the scripted query, if one was configured.
    pub query_result: Option<Result<Binary, QueryError>>,
}

/// Scripted VM.
#[derive(Debug)]
pub struct MockVm {
    scripts: Mutex<HashMap<EntryPoint, VmOutcome>>,
    unexported: Mutex<HashSet<EntryPoint>>,
    calls: Mutex<Vec<VmCallRecord>>,
    storage_write: Mutex<Option<(Vec<u8>, Vec<u8>)>>,
    query: Mutex<Option<QueryRequest>>,
    metered: bool,
}

impl Default for MockVm {
    fn default() -> Self {
        Self {
            scripts: Mutex::new(HashMap::new()),
            unexported: Mutex::new(HashSet::new()),
            calls: Mutex::new(Vec::new()),
            storage_write: Mutex::new(None),
            query: Mutex::new(None),
            metered: true,
        }
    }
}

impl MockVm {
    /// Creates a VM answering every entry point with an empty success.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a VM that reports scripted gas even past its limit.
    #[must_use]
    pub fn unmetered() -> Self {
        Self {
            metered: false,
            ..Self::default()
        }
    }

    /// Scripts the outcome of `entry_point`.
    pub fn script(&self, entry_point: EntryPoint, outcome: VmOutcome) {
        self.scripts.lock().insert(entry_point, outcome);
    }

    /// Scripts a successful response for `entry_point`.
    pub fn respond(&self, entry_point: EntryPoint, response: ContractResponse, gas_used: u64) {
        self.script(entry_point, VmOutcome::success(response, gas_used));
    }

    /// Scripts a failure for `entry_point`.
    pub fn fail(&self, entry_point: EntryPoint, error: VmError, gas_used: u64) {
        self.script(entry_point, VmOutcome::failure(error, gas_used));
    }

    /// Removes `entry_point` from the module's exports.
    pub fn unexport(&self, entry_point: EntryPoint) {
        self.unexported.lock().insert(entry_point);
    }

    /// Makes every later call write `key = value` into contract storage.
    pub fn write_on_call(&self, key: &[u8], value: &[u8]) {
        *self.storage_write.lock() = Some((key.to_vec(), value.to_vec()));
    }

    /// Makes every later call issue `request` through the query bridge.
    pub fn query_on_call(&self, request: QueryRequest) {
        *self.query.lock() = Some(request);
    }

    /// Recorded calls, oldest first.
    #[must_use]
    pub fn calls(&self) -> Vec<VmCallRecord> {
        self.calls.lock().clone()
    }

    /// Number of calls so far.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    fn scripted(&self, entry_point: EntryPoint) -> VmOutcome {
        self.scripts
            .lock()
            .get(&entry_point)
            .cloned()
            .unwrap_or_else(|| VmOutcome::success(ContractResponse::new(), DEFAULT_CALL_GAS))
    }
}

impl WasmVm for MockVm {
    fn call(&self, mut call: VmCall<'_>) -> VmOutcome {
        let human_address = call
            .api
            .humanize(call.env.contract.address.as_bytes())
            .ok();
        let query_result = self
            .query
            .lock()
            .as_ref()
            .map(|request| call.querier.query(request));

        self.calls.lock().push(VmCallRecord {
            entry_point: call.entry_point,
            code_hash: *call.code_hash,
            env: call.env.clone(),
            payload: call.payload.clone(),
            gas_limit: call.gas_limit,
            human_address,
            query_result,
        });

        if self.unexported.lock().contains(&call.entry_point) {
            let export = call.entry_point.export_name().to_string();
            return VmOutcome::failure(VmError::MissingExport(export), 0);
        }

        let outcome = self.scripted(call.entry_point);
        if self.metered && outcome.gas_used > call.gas_limit {
            return VmOutcome::failure(VmError::OutOfGas, call.gas_limit);
        }

        if outcome.result.is_ok() {
            if let Some((key, value)) = self.storage_write.lock().as_ref() {
                call.store.set(key, value);
            }
        }
        outcome
    }
}
