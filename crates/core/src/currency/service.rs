//! Currency conversion and revaluation service.
//!
//! CRITICAL: Rounding strategy for multi-currency:
//! - Multiply at full precision, round once to the target currency's
//!   decimal places
//! - A missing rate is an error, never a default of 1.0

use chrono::NaiveDate;
use rust_decimal::Decimal;

use keystone_shared::types::Money;

use super::error::CurrencyError;
use super::exchange::Currency;

/// Currency service for conversion and revaluation.
///
/// Rate data is injected as a lookup function so the service works the same
/// against any persistence collaborator or live rate source.
pub struct CurrencyService;

impl CurrencyService {
    /// Resolves the conversion factor from `from` to `to` as of a date.
    ///
    /// Resolution order: identity for the same currency, then the direct
    /// rate, then the reciprocal of the inverse rate.
    ///
    /// # Errors
    ///
    /// Returns [`CurrencyError::NoExchangeRate`] when neither direction has
    /// an effective rate.
    pub fn resolve_rate<F>(
        from: &str,
        to: &str,
        as_of: NaiveDate,
        lookup: &F,
    ) -> Result<Decimal, CurrencyError>
    where
        F: Fn(&str, &str, NaiveDate) -> Option<Decimal>,
    {
        if from == to {
            return Ok(Decimal::ONE);
        }
        if let Some(rate) = lookup(from, to, as_of) {
            return Ok(rate);
        }
        if let Some(inverse) = lookup(to, from, as_of) {
            if inverse > Decimal::ZERO {
                return Ok(Decimal::ONE / inverse);
            }
        }
        Err(CurrencyError::NoExchangeRate {
            from: from.to_string(),
            to: to.to_string(),
            date: as_of,
        })
    }

    /// Converts an amount between currencies at the effective rate,
    /// re-quantized to the target currency's decimal places.
    ///
    /// # Errors
    ///
    /// Returns [`CurrencyError::NoExchangeRate`] when no rate resolves.
    pub fn convert<F>(
        amount: Money,
        from: &Currency,
        to: &Currency,
        as_of: NaiveDate,
        lookup: &F,
    ) -> Result<Money, CurrencyError>
    where
        F: Fn(&str, &str, NaiveDate) -> Option<Decimal>,
    {
        if from.code == to.code {
            return Ok(amount);
        }
        let rate = Self::resolve_rate(&from.code, &to.code, as_of, lookup)?;
        Ok(Money::from_decimal(amount.amount() * rate).to_fixed(to.decimal_places))
    }

    /// Computes the unrealized gain/loss on a foreign-currency balance when
    /// the rate moves from `old_rate` to `new_rate`:
    /// `balance × (new_rate − old_rate)`, in the base currency's scale.
    ///
    /// Never mutates the balance; the result feeds a derived adjustment
    /// entry.
    #[must_use]
    pub fn revalue(balance: Money, base: &Currency, old_rate: Decimal, new_rate: Decimal) -> Money {
        Money::from_decimal(balance.amount() * (new_rate - old_rate)).to_fixed(base.decimal_places)
    }
}
