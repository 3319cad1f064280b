//! Ledger error types for validation and state errors.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use thiserror::Error;

use keystone_shared::types::{AccountId, JournalEntryId, MoneyError};

/// Errors that can occur during ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    // ========== Validation Errors ==========
    /// Entry must have at least 2 lines to balance.
    #[error("Entry {0} must have at least 2 lines")]
    EmptyEntry(JournalEntryId),

    /// Entry is not balanced (debits != credits).
    #[error("Entry {id} is not balanced. Debit: {debits}, Credit: {credits}")]
    UnbalancedEntry {
        /// The offending entry.
        id: JournalEntryId,
        /// Total debit amount.
        debits: Decimal,
        /// Total credit amount.
        credits: Decimal,
    },

    /// A line must carry exactly one non-zero side.
    #[error("Line on account {account_id} must be either a debit or a credit")]
    InvalidLine {
        /// The account the line posts to.
        account_id: AccountId,
    },

    /// Line amounts cannot be negative.
    #[error("Line amount on account {account_id} cannot be negative")]
    NegativeAmount {
        /// The account the line posts to.
        account_id: AccountId,
    },

    /// Amount construction or arithmetic failed.
    #[error(transparent)]
    Money(#[from] MoneyError),

    // ========== Fiscal Period Errors ==========
    /// No fiscal period covers the entry date.
    #[error("No fiscal period found for date {0}")]
    NoFiscalPeriod(NaiveDate),

    /// The entry date falls inside a closed period.
    #[error("Fiscal period containing {date} is closed, no posting allowed")]
    PeriodClosed {
        /// The entry date that was rejected.
        date: NaiveDate,
    },

    // ========== State Errors ==========
    /// Entry not found.
    #[error("Journal entry not found: {0}")]
    EntryNotFound(JournalEntryId),

    /// Account not found.
    #[error("Account not found: {0}")]
    AccountNotFound(AccountId),

    /// Account is inactive and cannot be posted to.
    #[error("Account {0} is inactive")]
    AccountInactive(AccountId),

    /// Cannot modify an entry that is posted or reversed.
    #[error("Cannot modify entry {0}: it is immutable")]
    CannotModifyPosted(JournalEntryId),

    /// Only posted entries can be reversed.
    #[error("Entry {0} is not posted and cannot be reversed")]
    NotPosted(JournalEntryId),

    /// The entry has already been reversed.
    #[error("Entry {id} was already reversed by {reversed_by}")]
    AlreadyReversed {
        /// The entry that was the target of the reversal.
        id: JournalEntryId,
        /// The reversing entry.
        reversed_by: JournalEntryId,
    },

    // ========== Concurrency Errors ==========
    /// Concurrent modification detected by the persistence collaborator.
    #[error("Concurrent modification detected, please retry")]
    ConcurrentModification,
}

impl LedgerError {
    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::EmptyEntry(_) => "EMPTY_ENTRY",
            Self::UnbalancedEntry { .. } => "UNBALANCED_ENTRY",
            Self::InvalidLine { .. } => "INVALID_LINE",
            Self::NegativeAmount { .. } => "NEGATIVE_AMOUNT",
            Self::Money(e) => e.error_code(),
            Self::NoFiscalPeriod(_) => "NO_FISCAL_PERIOD",
            Self::PeriodClosed { .. } => "PERIOD_CLOSED",
            Self::EntryNotFound(_) => "ENTRY_NOT_FOUND",
            Self::AccountNotFound(_) => "ACCOUNT_NOT_FOUND",
            Self::AccountInactive(_) => "ACCOUNT_INACTIVE",
            Self::CannotModifyPosted(_) => "CANNOT_MODIFY_POSTED",
            Self::NotPosted(_) => "NOT_POSTED",
            Self::AlreadyReversed { .. } => "ALREADY_REVERSED",
            Self::ConcurrentModification => "CONCURRENT_MODIFICATION",
        }
    }

    /// Returns true if the whole command is a candidate for caller-driven
    /// retry. Logic errors are not; only isolation conflicts are.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::ConcurrentModification)
    }
}
