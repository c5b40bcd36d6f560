//! # Contract Registry Adapter
//!
//! In-memory code store and contract registry for testing and local nodes.
//! Production implementation would read the contract keeper's state.

use crate::domain::entities::{BlockInfo, ContractInfo, ContractInstance, QueryRequest};
use crate::domain::services::{code_hash, derive_contract_address};
use crate::domain::value_objects::{Binary, CodeHash, ContractAddress, PortId};
use crate::errors::{QueryError, ResolveError};
use crate::ports::outbound::{ContractResolver, QueryPlugins, Storage};
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

type KvMap = BTreeMap<Vec<u8>, Vec<u8>>;

// =============================================================================
// CONTRACT STORE
// =============================================================================

/// Storage handle of one contract instance.
///
/// Handles for the same instance share the partition; handles for different
/// instances never do.
#[derive(Clone, Debug, Default)]
pub struct ContractStore {
    inner: Arc<RwLock<KvMap>>,
}

impl ContractStore {
    /// Number of keys in the partition.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    /// Returns true if the partition is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }
}

impl Storage for ContractStore {
    fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
        self.inner.read().get(key).cloned()
    }

    fn set(&mut self, key: &[u8], value: &[u8]) {
        self.inner.write().insert(key.to_vec(), value.to_vec());
    }

    fn remove(&mut self, key: &[u8]) {
        self.inner.write().remove(key);
    }
}

// =============================================================================
// REGISTRY
// =============================================================================

#[derive(Debug)]
struct ContractEntry {
    info: ContractInfo,
    store: ContractStore,
}

#[derive(Debug, Default)]
struct RegistryState {
    codes: HashMap<u64, CodeHash>,
    contracts: HashMap<ContractAddress, ContractEntry>,
    next_code_id: u64,
    next_instance_id: u64,
}

/// In-memory contract registry.
#[derive(Debug, Default)]
pub struct InMemoryContractRegistry {
    state: RwLock<RegistryState>,
}

impl InMemoryContractRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores compiled code and returns its code id (starting at 1).
    pub fn store_code(&self, wasm: &[u8]) -> u64 {
        let mut state = self.state.write();
        state.next_code_id += 1;
        let code_id = state.next_code_id;
        state.codes.insert(code_id, code_hash(wasm));
        code_id
    }

    /// Removes stored code. Instances of it stop resolving.
    pub fn remove_code(&self, code_id: u64) -> Option<CodeHash> {
        self.state.write().codes.remove(&code_id)
    }

    /// Instantiates `code_id`. IBC enabled instances get their own
    /// `wasm.<address>` port.
    ///
    /// # Errors
    ///
    /// `ResolveError::CodeNotFound` if no code is stored under `code_id`.
    pub fn instantiate(
        &self,
        code_id: u64,
        creator: &str,
        label: &str,
        ibc_enabled: bool,
    ) -> Result<ContractAddress, ResolveError> {
        let mut state = self.state.write();
        if !state.codes.contains_key(&code_id) {
            return Err(ResolveError::CodeNotFound { code_id });
        }
        state.next_instance_id += 1;
        let address = derive_contract_address(code_id, state.next_instance_id);

        let info = ContractInfo {
            code_id,
            creator: creator.to_string(),
            admin: None,
            label: label.to_string(),
            ibc_port_id: ibc_enabled.then(|| PortId::for_contract(&address)),
        };
        state.contracts.insert(
            address,
            ContractEntry {
                info,
                store: ContractStore::default(),
            },
        );
        Ok(address)
    }

    /// Rebinds a contract to another port.
    pub fn set_port(&self, contract: &ContractAddress, port: PortId) -> bool {
        match self.state.write().contracts.get_mut(contract) {
            Some(entry) => {
                entry.info.ibc_port_id = Some(port);
                true
            }
            None => false,
        }
    }

    /// Metadata of a contract.
    #[must_use]
    pub fn contract_info(&self, contract: &ContractAddress) -> Option<ContractInfo> {
        self.state
            .read()
            .contracts
            .get(contract)
            .map(|entry| entry.info.clone())
    }

    /// Raw storage read.
    #[must_use]
    pub fn raw_get(&self, contract: &ContractAddress, key: &[u8]) -> Option<Vec<u8>> {
        self.state
            .read()
            .contracts
            .get(contract)
            .and_then(|entry| entry.store.get(key))
    }
}

impl ContractResolver for InMemoryContractRegistry {
    type Store = ContractStore;

    fn resolve(
        &self,
        contract: &ContractAddress,
    ) -> Result<ContractInstance<ContractStore>, ResolveError> {
        let state = self.state.read();
        let entry = state
            .contracts
            .get(contract)
            .ok_or(ResolveError::ContractNotFound)?;
        let code_hash = state
            .codes
            .get(&entry.info.code_id)
            .copied()
            .ok_or(ResolveError::CodeNotFound {
                code_id: entry.info.code_id,
            })?;

        Ok(ContractInstance {
            info: entry.info.clone(),
            code_hash,
            store: entry.store.clone(),
        })
    }
}

impl QueryPlugins for InMemoryContractRegistry {
    fn handle(&self, _block: &BlockInfo, request: &QueryRequest) -> Result<Binary, QueryError> {
        match request {
            QueryRequest::ContractInfo { contract } => {
                let info = self
                    .contract_info(contract)
                    .ok_or_else(|| QueryError::NotFound(contract.to_string()))?;
                serde_json::to_vec(&info)
                    .map(Binary)
                    .map_err(|e| QueryError::Failed(e.to_string()))
            }
            QueryRequest::Raw { contract, key } => {
                if self.contract_info(contract).is_none() {
                    return Err(QueryError::NotFound(contract.to_string()));
                }
                Ok(Binary(self.raw_get(contract, key.as_slice()).unwrap_or_default()))
            }
            other => Err(QueryError::Unsupported(format!("{other:?}"))),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
