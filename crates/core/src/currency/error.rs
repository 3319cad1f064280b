//! Currency engine error types.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use thiserror::Error;

use keystone_shared::types::MoneyError;

/// Errors that can occur during currency operations.
#[derive(Debug, Error)]
pub enum CurrencyError {
    /// No exchange rate (direct or inverse) for the currency pair on the
    /// given date. Never defaulted to 1.0.
    #[error("No exchange rate found for {from} to {to} on {date}")]
    NoExchangeRate {
        /// Source currency code.
        from: String,
        /// Target currency code.
        to: String,
        /// Date for which the rate was requested.
        date: NaiveDate,
    },

    /// Exchange rate must be positive.
    #[error("Exchange rate must be positive, got {rate}")]
    InvalidExchangeRate {
        /// The offending rate.
        rate: Decimal,
    },

    /// Amount arithmetic failed.
    #[error(transparent)]
    Money(#[from] MoneyError),
}

impl CurrencyError {
    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::NoExchangeRate { .. } => "NO_EXCHANGE_RATE",
            Self::InvalidExchangeRate { .. } => "INVALID_EXCHANGE_RATE",
            Self::Money(e) => e.error_code(),
        }
    }
}
