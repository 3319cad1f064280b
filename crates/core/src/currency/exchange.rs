//! Currency and exchange rate types.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use keystone_shared::types::ExchangeRateId;

use super::error::CurrencyError;

/// A currency with its fractional-digit setting.
///
/// At most one currency carries `is_base_currency = true` process-wide.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Currency {
    /// ISO 4217 currency code (e.g. "USD", "JPY").
    pub code: String,
    /// Number of fractional digits (2 for most currencies, 0 for JPY).
    pub decimal_places: u32,
    /// Whether this is the functional (base) currency.
    pub is_base_currency: bool,
}

impl Currency {
    /// Creates a non-base currency.
    #[must_use]
    pub fn new(code: impl Into<String>, decimal_places: u32) -> Self {
        Self {
            code: code.into(),
            decimal_places,
            is_base_currency: false,
        }
    }

    /// Creates the functional (base) currency.
    #[must_use]
    pub fn base(code: impl Into<String>, decimal_places: u32) -> Self {
        Self {
            code: code.into(),
            decimal_places,
            is_base_currency: true,
        }
    }
}

/// A directed, time-bounded conversion factor between two currencies.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExchangeRate {
    /// Unique identifier.
    pub id: ExchangeRateId,
    /// Source currency code.
    pub from_currency: String,
    /// Target currency code.
    pub to_currency: String,
    /// Conversion factor (1 from_currency = rate to_currency).
    pub rate: Decimal,
    /// First date the rate is effective (inclusive).
    pub effective_from: NaiveDate,
    /// Last date the rate is effective (inclusive); `None` is open-ended.
    pub effective_to: Option<NaiveDate>,
}

impl ExchangeRate {
    /// Creates a new exchange rate.
    ///
    /// # Errors
    ///
    /// Returns [`CurrencyError::InvalidExchangeRate`] for zero or negative
    /// rates.
    pub fn new(
        from_currency: impl Into<String>,
        to_currency: impl Into<String>,
        rate: Decimal,
        effective_from: NaiveDate,
        effective_to: Option<NaiveDate>,
    ) -> Result<Self, CurrencyError> {
        if rate <= Decimal::ZERO {
            return Err(CurrencyError::InvalidExchangeRate { rate });
        }
        Ok(Self {
            id: ExchangeRateId::new(),
            from_currency: from_currency.into(),
            to_currency: to_currency.into(),
            rate,
            effective_from,
            effective_to,
        })
    }

    /// Returns true if the rate's effective window contains `date`.
    #[must_use]
    pub fn is_effective(&self, date: NaiveDate) -> bool {
        date >= self.effective_from && self.effective_to.is_none_or(|to| date <= to)
    }

    /// Returns the reciprocal rate in the opposite direction.
    #[must_use]
    pub fn inverse(&self) -> Self {
        Self {
            id: ExchangeRateId::new(),
            from_currency: self.to_currency.clone(),
            to_currency: self.from_currency.clone(),
            rate: Decimal::ONE / self.rate,
            effective_from: self.effective_from,
            effective_to: self.effective_to,
        }
    }
}

/// Resolves the effective rate for (from, to, date) from a rate list:
/// the most recent rate whose window contains the date.
#[must_use]
pub fn effective_rate<'a>(
    rates: &'a [ExchangeRate],
    from: &str,
    to: &str,
    as_of: NaiveDate,
) -> Option<&'a ExchangeRate> {
    rates
        .iter()
        .filter(|r| r.from_currency == from && r.to_currency == to && r.is_effective(as_of))
        .max_by_key(|r| r.effective_from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_rejects_non_positive_rate() {
        assert!(ExchangeRate::new("USD", "EUR", dec!(0), date(2026, 1, 1), None).is_err());
        assert!(ExchangeRate::new("USD", "EUR", dec!(-0.92), date(2026, 1, 1), None).is_err());
    }

    #[test]
    fn test_inverse() {
        let rate = ExchangeRate::new("USD", "EUR", dec!(0.5), date(2026, 1, 1), None).unwrap();
        let inverse = rate.inverse();
        assert_eq!(inverse.from_currency, "EUR");
        assert_eq!(inverse.to_currency, "USD");
        assert_eq!(inverse.rate, dec!(2));
    }

    #[test]
    fn test_effective_rate_picks_most_recent() {
        let rates = vec![
            ExchangeRate::new("USD", "EUR", dec!(0.90), date(2026, 1, 1), None).unwrap(),
            ExchangeRate::new("USD", "EUR", dec!(0.92), date(2026, 2, 1), None).unwrap(),
        ];

        let resolved = effective_rate(&rates, "USD", "EUR", date(2026, 3, 1)).unwrap();
        assert_eq!(resolved.rate, dec!(0.92));

        let earlier = effective_rate(&rates, "USD", "EUR", date(2026, 1, 15)).unwrap();
        assert_eq!(earlier.rate, dec!(0.90));
    }

    #[test]
    fn test_effective_rate_respects_window_end() {
        let rates = vec![
            ExchangeRate::new(
                "USD",
                "EUR",
                dec!(0.90),
                date(2026, 1, 1),
                Some(date(2026, 1, 31)),
            )
            .unwrap(),
        ];
        assert!(effective_rate(&rates, "USD", "EUR", date(2026, 2, 1)).is_none());
    }

    #[test]
    fn test_effective_rate_is_directed() {
        let rates =
            vec![ExchangeRate::new("USD", "EUR", dec!(0.92), date(2026, 1, 1), None).unwrap()];
        assert!(effective_rate(&rates, "EUR", "USD", date(2026, 2, 1)).is_none());
    }
}
