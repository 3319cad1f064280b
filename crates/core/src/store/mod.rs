//! Persistence collaborator contract.
//!
//! The core consumes abstract repositories; persistence technology lives
//! outside. Each repository exposes find/insert/update plus the queries the
//! services need. Updates carry optimistic version checks: the persistence
//! collaborator surfaces an isolation conflict as
//! [`StoreError::VersionConflict`], which services report as
//! `ConcurrentModification` for caller-driven retry of the whole command.

pub mod memory;

use chrono::NaiveDate;
use thiserror::Error;

use keystone_shared::types::{
    AccountId, FiscalPeriodId, FiscalYearId, InvoiceId, JournalEntryId, PaymentId,
};

use crate::arap::types::{Invoice, Payment};
use crate::fiscal::period::FiscalPeriod;
use crate::ledger::types::{Account, AccountType, JournalEntry, JournalLine};

pub use memory::MemoryLedger;

/// Errors surfaced by a persistence collaborator.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    /// The entity does not exist.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// Entity type name.
        entity: &'static str,
        /// The missing ID.
        id: String,
    },

    /// An entity with this ID already exists.
    #[error("{entity} already exists: {id}")]
    Duplicate {
        /// Entity type name.
        entity: &'static str,
        /// The duplicated ID.
        id: String,
    },

    /// The stored version does not match the caller's copy.
    #[error("{entity} {id} was modified concurrently")]
    VersionConflict {
        /// Entity type name.
        entity: &'static str,
        /// The conflicted ID.
        id: String,
    },
}

/// Repository for the chart of accounts.
pub trait AccountRepository {
    /// Finds an account by ID.
    fn find_account(&self, id: AccountId) -> Option<Account>;
    /// Inserts a new account.
    fn insert_account(&mut self, account: Account) -> Result<(), StoreError>;
    /// Returns all accounts of the given type.
    fn accounts_by_type(&self, account_type: AccountType) -> Vec<Account>;
}

/// Repository for journal entries.
pub trait JournalRepository {
    /// Finds an entry by ID.
    fn find_entry(&self, id: JournalEntryId) -> Option<JournalEntry>;
    /// Inserts a new entry; fails on a duplicate ID.
    fn insert_entry(&mut self, entry: JournalEntry) -> Result<JournalEntry, StoreError>;
    /// Updates an entry under an optimistic version check; the returned
    /// entity carries the bumped version.
    fn update_entry(&mut self, entry: JournalEntry) -> Result<JournalEntry, StoreError>;
    /// Allocates the next posting sequence number. Monotonic per store.
    fn next_sequence(&mut self) -> i64;
    /// All lines of Posted entries touching the account, dated up to and
    /// including `as_of`.
    fn posted_lines_for_account(&self, account_id: AccountId, as_of: NaiveDate)
    -> Vec<JournalLine>;
    /// All Posted entries dated within `[from, to]`.
    fn posted_entries_in_range(&self, from: NaiveDate, to: NaiveDate) -> Vec<JournalEntry>;
}

/// Repository for fiscal periods.
pub trait PeriodRepository {
    /// Finds a period by ID.
    fn find_period(&self, id: FiscalPeriodId) -> Option<FiscalPeriod>;
    /// Inserts a new period.
    fn insert_period(&mut self, period: FiscalPeriod) -> Result<(), StoreError>;
    /// Updates a period. Period close runs under the collaborator's
    /// coarse-grained write lock, so no version check is carried here.
    fn update_period(&mut self, period: FiscalPeriod) -> Result<(), StoreError>;
    /// The period whose date range contains `date`, if any.
    fn period_for_date(&self, date: NaiveDate) -> Option<FiscalPeriod>;
    /// All periods of a fiscal year, ordered by period number.
    fn periods_for_year(&self, fiscal_year_id: FiscalYearId) -> Vec<FiscalPeriod>;
}

/// Repository for AR/AP invoices.
pub trait InvoiceRepository {
    /// Finds an invoice by ID.
    fn find_invoice(&self, id: InvoiceId) -> Option<Invoice>;
    /// Inserts a new invoice; fails on a duplicate ID.
    fn insert_invoice(&mut self, invoice: Invoice) -> Result<Invoice, StoreError>;
    /// Updates an invoice under an optimistic version check.
    fn update_invoice(&mut self, invoice: Invoice) -> Result<Invoice, StoreError>;
    /// All invoices still accepting payments (Open or PartiallyPaid).
    fn outstanding_invoices(&self) -> Vec<Invoice>;
}

/// Repository for AR/AP payments.
pub trait PaymentRepository {
    /// Finds a payment by ID.
    fn find_payment(&self, id: PaymentId) -> Option<Payment>;
    /// Inserts a new payment; fails on a duplicate ID.
    fn insert_payment(&mut self, payment: Payment) -> Result<Payment, StoreError>;
    /// Updates a payment under an optimistic version check.
    fn update_payment(&mut self, payment: Payment) -> Result<Payment, StoreError>;
}
