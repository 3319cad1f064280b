//! Double-entry bookkeeping logic.
//!
//! This module implements the core ledger functionality:
//! - Journal entries and their lines
//! - Chart of accounts types
//! - Balance calculations over posted history
//! - Business rule validation
//! - Ledger service for the entry lifecycle

pub mod balance;
pub mod error;
pub mod service;
pub mod types;
pub mod validation;

#[cfg(test)]
mod validation_props;

pub use balance::{account_balance, AccountBalance, BalanceProjection};
pub use error::LedgerError;
pub use service::LedgerService;
pub use types::{
    Account, AccountType, DimensionTags, EntryStatus, JournalEntry, JournalLine, NormalBalance,
    ReconciliationStatus,
};
pub use validation::{validate_entry, validate_line};
