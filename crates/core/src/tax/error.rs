//! Tax engine error types.

use chrono::NaiveDate;
use thiserror::Error;

use keystone_shared::types::MoneyError;

/// Errors that can occur during tax calculation.
#[derive(Debug, Error)]
pub enum TaxError {
    /// No jurisdiction is registered under the given code.
    #[error("Unknown tax jurisdiction: {0}")]
    UnknownJurisdiction(String),

    /// A named jurisdiction has no rate effective at the given date.
    ///
    /// Never treated as 0%: tax omission is a correctness bug, not a
    /// default.
    #[error("No effective tax rate for jurisdiction {jurisdiction} on {date}")]
    NoEffectiveRate {
        /// The jurisdiction code.
        jurisdiction: String,
        /// The date for which a rate was requested.
        date: NaiveDate,
    },

    /// A rate's calculation method is malformed (e.g. unordered brackets).
    #[error("Malformed calculation method on rate {rate_name:?}")]
    MalformedMethod {
        /// Name of the offending rate.
        rate_name: String,
    },

    /// Amount arithmetic failed.
    #[error(transparent)]
    Money(#[from] MoneyError),
}

impl TaxError {
    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::UnknownJurisdiction(_) => "UNKNOWN_JURISDICTION",
            Self::NoEffectiveRate { .. } => "NO_EFFECTIVE_RATE",
            Self::MalformedMethod { .. } => "MALFORMED_METHOD",
            Self::Money(e) => e.error_code(),
        }
    }
}
