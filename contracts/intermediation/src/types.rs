//! # Types
//!
//! Shared data structures used across the intermediation crate.
//!
//! ## Status as a Finite-State Machine
//!
//! [`ContractStatus`] enforces a strict forward-only lifecycle:
//!
//! ```text
//! Pending ──accept──► Accepted
//!     └────reject──► Rejected
//! Expired  (declared, no operation produces it)
//! ```
//!
//! Every state other than `Pending` is terminal. The table lives in
//! [`ContractStatus::apply`] and is the only place a status changes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::Error;

/// Identifier assigned to a contract at creation.
pub type ContractId = u64;

/// Commission percentage applied when the request omits one.
pub const DEFAULT_COMMISSION_RATE: f64 = 1.5;

/// Minimum validity window, in hours, applied when the request omits one.
pub const DEFAULT_DURATION_HOURS: i64 = 24;

/// Lifecycle status of a contract.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContractStatus {
    /// Awaiting a decision from the counterparty.
    Pending,
    /// Accepted; terminal.
    Accepted,
    /// Rejected; terminal.
    Rejected,
    /// Validity window elapsed; terminal.
    Expired,
}

/// A requested status change.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Transition {
    Accept,
    Reject,
}

impl ContractStatus {
    pub const ALL: [ContractStatus; 4] = [
        ContractStatus::Pending,
        ContractStatus::Accepted,
        ContractStatus::Rejected,
        ContractStatus::Expired,
    ];

    /// Resolve `transition` against the current status.
    ///
    /// Returns the next status, or `None` when the table has no edge for the
    /// pair.
    pub fn apply(self, transition: Transition) -> Option<ContractStatus> {
        match (self, transition) {
            (ContractStatus::Pending, Transition::Accept) => Some(ContractStatus::Accepted),
            (ContractStatus::Pending, Transition::Reject) => Some(ContractStatus::Rejected),
            _ => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        !matches!(self, ContractStatus::Pending)
    }

    /// Canonical identifier used on the wire and in the database.
    pub fn as_str(self) -> &'static str {
        match self {
            ContractStatus::Pending => "PENDING",
            ContractStatus::Accepted => "ACCEPTED",
            ContractStatus::Rejected => "REJECTED",
            ContractStatus::Expired => "EXPIRED",
        }
    }

    /// Parse the canonical identifier produced by [`ContractStatus::as_str`].
    pub fn from_str_opt(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.as_str() == value)
    }

    /// Label printed on rendered documents.
    pub fn display_label(self) -> &'static str {
        match self {
            ContractStatus::Pending => "PENDIENTE",
            ContractStatus::Accepted => "ACEPTADO",
            ContractStatus::Rejected => "RECHAZADO",
            ContractStatus::Expired => "VENCIDO",
        }
    }
}

impl std::fmt::Display for ContractStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::fmt::Display for Transition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Transition::Accept => f.write_str("accept"),
            Transition::Reject => f.write_str("reject"),
        }
    }
}

/// Terms supplied by the caller when creating a contract.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NewContract {
    pub investor_ref: u64,
    pub broker_ref: u64,
    #[serde(default = "default_commission_rate")]
    pub commission_rate: f64,
    #[serde(default = "default_duration_hours")]
    pub duration_hours: i64,
    #[serde(default)]
    pub notes: Option<String>,
}

fn default_commission_rate() -> f64 {
    DEFAULT_COMMISSION_RATE
}

fn default_duration_hours() -> i64 {
    DEFAULT_DURATION_HOURS
}

/// Terms that passed validation. Only [`NewContract::validate`] builds one.
#[derive(Clone, Debug, PartialEq)]
pub struct ValidatedTerms {
    pub investor_ref: u64,
    pub broker_ref: u64,
    pub commission_rate: f64,
    pub duration_hours: u32,
    pub notes: Option<String>,
}

impl NewContract {
    /// Terms with the default commission and duration and no notes.
    pub fn new(investor_ref: u64, broker_ref: u64) -> Self {
        Self {
            investor_ref,
            broker_ref,
            commission_rate: DEFAULT_COMMISSION_RATE,
            duration_hours: DEFAULT_DURATION_HOURS,
            notes: None,
        }
    }

    pub fn with_commission_rate(mut self, rate: f64) -> Self {
        self.commission_rate = rate;
        self
    }

    pub fn with_duration_hours(mut self, hours: i64) -> Self {
        self.duration_hours = hours;
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    pub fn validate(&self) -> Result<ValidatedTerms, Error> {
        if !self.commission_rate.is_finite() {
            return Err(Error::Validation(
                "commission_rate must be a finite number".to_string(),
            ));
        }
        if self.commission_rate < 0.0 {
            return Err(Error::Validation(format!(
                "commission_rate must be non-negative, got {}",
                self.commission_rate
            )));
        }
        if self.duration_hours <= 0 {
            return Err(Error::Validation(format!(
                "duration_hours must be positive, got {}",
                self.duration_hours
            )));
        }
        let duration_hours = u32::try_from(self.duration_hours).map_err(|_| {
            Error::Validation(format!(
                "duration_hours is out of range, got {}",
                self.duration_hours
            ))
        })?;

        Ok(ValidatedTerms {
            investor_ref: self.investor_ref,
            broker_ref: self.broker_ref,
            commission_rate: self.commission_rate,
            duration_hours,
            notes: self.notes.clone(),
        })
    }
}

/// Full representation of an intermediation contract.
///
/// Values handed out by the ledger are point-in-time copies.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Contract {
    /// Unique identifier (auto-incremented).
    pub id: ContractId,
    /// Investor counterparty.
    pub investor_ref: u64,
    /// Broker counterparty.
    pub broker_ref: u64,
    /// Commission percentage.
    pub commission_rate: f64,
    /// Minimum validity window in hours.
    pub duration_hours: u32,
    pub created_at: DateTime<Utc>,
    /// Current lifecycle status.
    pub status: ContractStatus,
    pub notes: Option<String>,
}

impl Contract {
    /// Build a freshly created contract in the `Pending` state.
    pub fn from_terms(id: ContractId, terms: ValidatedTerms, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            investor_ref: terms.investor_ref,
            broker_ref: terms.broker_ref,
            commission_rate: terms.commission_rate,
            duration_hours: terms.duration_hours,
            created_at,
            status: ContractStatus::Pending,
            notes: terms.notes,
        }
    }

    /// Apply `transition` in place, leaving every other field untouched.
    pub fn transition(&mut self, transition: Transition) -> Result<(), Error> {
        let next = self
            .status
            .apply(transition)
            .ok_or(Error::InvalidTransition {
                id: self.id,
                from: self.status,
                transition,
            })?;
        self.status = next;
        Ok(())
    }
}
