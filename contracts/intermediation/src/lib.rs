//! # Intermediation contracts
//!
//! Lifecycle core for AndinaTrading's investor/broker intermediation
//! contracts. It exposes [`ContractLedger`], whose entry points cover the
//! full contract lifecycle:
//!
//! | Phase        | Entry Point(s)                                  |
//! |--------------|-------------------------------------------------|
//! | Registration | [`ContractLedger::create`]                      |
//! | Decision     | [`ContractLedger::accept`], [`ContractLedger::reject`] |
//! | Queries      | `get`, `list`, `len`                            |
//!
//! ## Architecture
//!
//! Transition rules live in [`types`] ([`ContractStatus::apply`]); record
//! storage and locking live in `storage`. This file contains **only** the
//! public entry points.
//!
//! The crate never logs and never retries: every failure is returned as an
//! [`Error`] for the caller to report.

mod storage;
pub mod types;

#[cfg(test)]
mod test_concurrency;
#[cfg(test)]
mod test_lifecycle;

use chrono::Utc;
use thiserror::Error;

use storage::{lock, ContractStore};
pub use types::{
    Contract, ContractId, ContractStatus, NewContract, Transition, ValidatedTerms,
    DEFAULT_COMMISSION_RATE, DEFAULT_DURATION_HOURS,
};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// Creation input rejected; the caller must fix it.
    #[error("invalid contract terms: {0}")]
    Validation(String),

    #[error("contract {0} not found")]
    NotFound(ContractId),

    /// The status precondition of a transition did not hold.
    #[error("cannot {transition} contract {id}: status is {from}, expected PENDING")]
    InvalidTransition {
        id: ContractId,
        from: ContractStatus,
        transition: Transition,
    },
}

pub type Result<T> = std::result::Result<T, Error>;

/// Shared contract store. Safe to use from many threads at once.
#[derive(Debug, Default)]
pub struct ContractLedger {
    store: ContractStore,
}

impl ContractLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new contract in the `Pending` state.
    ///
    /// Validation runs before anything is written, so a rejected request
    /// leaves the ledger unchanged.
    pub fn create(&self, request: NewContract) -> Result<Contract> {
        let terms = request.validate()?;
        let id = self.store.next_id();
        let contract = Contract::from_terms(id, terms, Utc::now());
        self.store.insert(contract.clone());
        Ok(contract)
    }

    /// Retrieve a contract by its ID.
    pub fn get(&self, id: ContractId) -> Result<Contract> {
        let record = self.store.record(id).ok_or(Error::NotFound(id))?;
        let contract = lock(&record).clone();
        Ok(contract)
    }

    /// All contracts, ordered by id.
    pub fn list(&self) -> Vec<Contract> {
        self.store.snapshot_all()
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Move a `Pending` contract to `Accepted`.
    pub fn accept(&self, id: ContractId) -> Result<Contract> {
        self.apply(id, Transition::Accept)
    }

    /// Move a `Pending` contract to `Rejected`.
    pub fn reject(&self, id: ContractId) -> Result<Contract> {
        self.apply(id, Transition::Reject)
    }

    /// Check and mutate under the record's lock. A caller that loses a race
    /// sees the winner's status and gets `InvalidTransition`.
    pub fn apply(&self, id: ContractId, transition: Transition) -> Result<Contract> {
        let record = self.store.record(id).ok_or(Error::NotFound(id))?;
        let mut contract = lock(&record);
        contract.transition(transition)?;
        Ok(contract.clone())
    }
}
