//! # Storage
//!
//! In-memory contract store with one lock per record.
//!
//! | Structure                                      | Guards                          |
//! |------------------------------------------------|---------------------------------|
//! | `RwLock<HashMap<ContractId, Arc<Mutex<..>>>>`  | membership (insert / lookup)    |
//! | `Mutex<Contract>` (per record)                 | the record's status             |
//! | `AtomicU64`                                    | id counter                      |
//!
//! The map lock is held only long enough to clone a record's `Arc`; the
//! record mutex is then held across the whole check-and-mutate of a
//! transition. Transitions on different ids never touch the same mutex.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

use crate::types::{Contract, ContractId};

type Record = Arc<Mutex<Contract>>;

#[derive(Debug)]
pub struct ContractStore {
    records: RwLock<HashMap<ContractId, Record>>,
    next_id: AtomicU64,
}

impl Default for ContractStore {
    fn default() -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }
}

impl ContractStore {
    /// Atomically reads and increments the id counter.
    /// Returns the id to use for the *current* contract (pre-increment value).
    pub fn next_id(&self) -> ContractId {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    pub fn insert(&self, contract: Contract) {
        let id = contract.id;
        self.records
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, Arc::new(Mutex::new(contract)));
    }

    /// Handle to a single record, or `None` if the id was never stored.
    pub fn record(&self, id: ContractId) -> Option<Record> {
        self.records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Point-in-time copies of every record, ordered by id.
    pub fn snapshot_all(&self) -> Vec<Contract> {
        let records: Vec<Record> = self
            .records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect();
        let mut contracts: Vec<Contract> = records.iter().map(|r| lock(r).clone()).collect();
        contracts.sort_by_key(|c| c.id);
        contracts
    }
}

/// Lock a record, ignoring poisoning. A status change is a single field write.
pub fn lock(record: &Mutex<Contract>) -> MutexGuard<'_, Contract> {
    record.lock().unwrap_or_else(PoisonError::into_inner)
}
