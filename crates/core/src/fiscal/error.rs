//! Fiscal period error types.

use rust_decimal::Decimal;
use thiserror::Error;

use keystone_shared::types::{FiscalPeriodId, FiscalYearId, MoneyError};

use crate::ledger::LedgerError;

/// Errors that can occur during fiscal period operations.
#[derive(Debug, Error)]
pub enum FiscalError {
    /// Period not found.
    #[error("Fiscal period not found: {0}")]
    PeriodNotFound(FiscalPeriodId),

    /// No periods are registered for the fiscal year.
    #[error("Fiscal year has no periods: {0}")]
    YearNotFound(FiscalYearId),

    /// The period is already closed; Closed is terminal.
    #[error("Fiscal period {0} is already closed")]
    PeriodAlreadyClosed(FiscalPeriodId),

    /// Periods close in chronological order only.
    #[error("Cannot close period: period {period_number} is still open")]
    PriorPeriodOpen {
        /// The earlier period still open.
        period_number: i32,
    },

    /// The period's posted entries do not net to a balanced trial balance.
    /// A redundant guard against external data corruption; the ledger
    /// invariant should make this unreachable.
    #[error("Period {period_id} trial balance is unbalanced. Debit: {debits}, Credit: {credits}")]
    UnbalancedPeriod {
        /// The offending period.
        period_id: FiscalPeriodId,
        /// Total posted debits in the period.
        debits: Decimal,
        /// Total posted credits in the period.
        credits: Decimal,
    },

    /// Periods within a year must be contiguous and non-overlapping.
    #[error("Periods are not contiguous after period {after_period}")]
    NonContiguousPeriods {
        /// The period number after which the gap or overlap occurs.
        after_period: i32,
    },

    /// A period does not belong to, or fit within, its fiscal year.
    #[error("Period {period_number} does not fit the fiscal year")]
    PeriodOutsideYear {
        /// The offending period number.
        period_number: i32,
    },

    /// Year-end close partially applied: closing entry posted but the
    /// period not marked closed, or vice versa. Fatal; halts further close
    /// attempts until manually repaired.
    #[error("Year-end close for {fiscal_year_id} is partially applied: {detail}")]
    YearEndInconsistency {
        /// The fiscal year in the inconsistent state.
        fiscal_year_id: FiscalYearId,
        /// What was and was not applied.
        detail: String,
    },

    /// An underlying ledger operation failed.
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// Amount arithmetic failed.
    #[error(transparent)]
    Money(#[from] MoneyError),
}

impl FiscalError {
    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::PeriodNotFound(_) => "PERIOD_NOT_FOUND",
            Self::YearNotFound(_) => "YEAR_NOT_FOUND",
            Self::PeriodAlreadyClosed(_) => "PERIOD_ALREADY_CLOSED",
            Self::PriorPeriodOpen { .. } => "PRIOR_PERIOD_OPEN",
            Self::UnbalancedPeriod { .. } => "UNBALANCED_PERIOD",
            Self::NonContiguousPeriods { .. } => "NON_CONTIGUOUS_PERIODS",
            Self::PeriodOutsideYear { .. } => "PERIOD_OUTSIDE_YEAR",
            Self::YearEndInconsistency { .. } => "YEAR_END_INCONSISTENCY",
            Self::Ledger(e) => e.error_code(),
            Self::Money(e) => e.error_code(),
        }
    }

    /// Returns true for fatal inconsistencies that must halt further
    /// period-close attempts, as opposed to recoverable validation errors.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::YearEndInconsistency { .. })
    }
}
