//! Money type with exact decimal precision and a fixed scale.
//!
//! CRITICAL: Never use floating-point for money calculations.
//! This type wraps `rust_decimal::Decimal` and carries the number of
//! fractional digits (scale) of the currency it denominates.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Default rounding for monetary amounts: round half away from zero.
///
/// Call sites that need a different strategy (e.g. banker's rounding for
/// rate conversion legs) pass it explicitly via [`Money::mul_rate_with`].
pub const DEFAULT_ROUNDING: RoundingStrategy = RoundingStrategy::MidpointAwayFromZero;

/// Errors produced by [`Money`] construction and arithmetic.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MoneyError {
    /// The input is not a valid decimal number, or carries more fractional
    /// digits than the target scale allows.
    #[error("Invalid amount {input:?}: {reason}")]
    InvalidAmount {
        /// The offending input, as received.
        input: String,
        /// Why the input was rejected.
        reason: String,
    },

    /// Arithmetic between two amounts of different scales.
    #[error("Scale mismatch: {left} vs {right} fractional digits")]
    ScaleMismatch {
        /// Scale of the left operand.
        left: u32,
        /// Scale of the right operand.
        right: u32,
    },
}

impl MoneyError {
    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidAmount { .. } => "INVALID_AMOUNT",
            Self::ScaleMismatch { .. } => "SCALE_MISMATCH",
        }
    }
}

/// A monetary amount with a fixed number of fractional digits.
///
/// Invariants:
/// - The inner decimal never carries more fractional digits than `scale`.
/// - All arithmetic preserves `scale`; rounding happens only in
///   [`Money::to_fixed`] and the `mul_rate` family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Money {
    amount: Decimal,
    scale: u32,
}

impl Money {
    /// Creates a new amount at the given scale.
    ///
    /// # Errors
    ///
    /// Returns [`MoneyError::InvalidAmount`] if `amount` carries more
    /// fractional digits than `scale`. Use [`Money::to_fixed`] when rounding
    /// is intended.
    pub fn new(amount: Decimal, scale: u32) -> Result<Self, MoneyError> {
        if amount.scale() > scale {
            return Err(MoneyError::InvalidAmount {
                input: amount.to_string(),
                reason: format!(
                    "more than {scale} fractional digit(s) requires an explicit rounding step"
                ),
            });
        }
        let mut amount = amount;
        amount.rescale(scale);
        Ok(Self { amount, scale })
    }

    /// Creates an amount from an integer count of minor units
    /// (e.g. cents for a scale of 2).
    #[must_use]
    pub fn from_minor_units(minor_units: i64, scale: u32) -> Self {
        Self {
            amount: Decimal::new(minor_units, scale),
            scale,
        }
    }

    /// Creates a zero amount at the given scale.
    #[must_use]
    pub fn zero(scale: u32) -> Self {
        Self::from_minor_units(0, scale)
    }

    /// Creates an amount adopting the decimal's own scale.
    ///
    /// Used to carry full-precision intermediate results to a single
    /// [`Money::to_fixed`] rounding step.
    #[must_use]
    pub fn from_decimal(amount: Decimal) -> Self {
        Self {
            amount,
            scale: amount.scale(),
        }
    }

    /// Parses a decimal string into an amount at the given scale.
    ///
    /// # Errors
    ///
    /// Returns [`MoneyError::InvalidAmount`] if the input is not numeric or
    /// has more fractional digits than `scale`.
    pub fn parse(input: &str, scale: u32) -> Result<Self, MoneyError> {
        let amount =
            Decimal::from_str_exact(input.trim()).map_err(|e| MoneyError::InvalidAmount {
                input: input.to_string(),
                reason: e.to_string(),
            })?;
        Self::new(amount, scale)
    }

    /// Returns the inner decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.amount
    }

    /// Returns the number of fractional digits.
    #[must_use]
    pub const fn scale(&self) -> u32 {
        self.scale
    }

    /// Returns true if the amount is zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.amount.is_zero()
    }

    /// Returns true if the amount is negative.
    #[must_use]
    pub fn is_negative(&self) -> bool {
        self.amount.is_sign_negative() && !self.amount.is_zero()
    }

    /// Returns true if the amount is strictly positive.
    #[must_use]
    pub fn is_positive(&self) -> bool {
        self.amount.is_sign_positive() && !self.amount.is_zero()
    }

    /// Adds two amounts of the same scale.
    ///
    /// # Errors
    ///
    /// Returns [`MoneyError::ScaleMismatch`] if the scales differ. Mixing
    /// scales means mixing currencies; convert first.
    pub fn checked_add(self, other: Self) -> Result<Self, MoneyError> {
        self.ensure_same_scale(other)?;
        Ok(Self {
            amount: self.amount + other.amount,
            scale: self.scale,
        })
    }

    /// Subtracts an amount of the same scale.
    ///
    /// # Errors
    ///
    /// Returns [`MoneyError::ScaleMismatch`] if the scales differ.
    pub fn checked_sub(self, other: Self) -> Result<Self, MoneyError> {
        self.ensure_same_scale(other)?;
        Ok(Self {
            amount: self.amount - other.amount,
            scale: self.scale,
        })
    }

    /// Multiplies by a rational factor (exchange rate, percentage fraction),
    /// rounding half-up to this amount's scale.
    #[must_use]
    pub fn mul_rate(self, rate: Decimal) -> Self {
        self.mul_rate_with(rate, DEFAULT_ROUNDING)
    }

    /// Multiplies by a rational factor with an explicit rounding strategy.
    #[must_use]
    pub fn mul_rate_with(self, rate: Decimal, rounding: RoundingStrategy) -> Self {
        let mut amount = (self.amount * rate).round_dp_with_strategy(self.scale, rounding);
        amount.rescale(self.scale);
        Self {
            amount,
            scale: self.scale,
        }
    }

    /// Returns `percent`% of this amount, rounded half-up to this scale.
    ///
    /// `percent` is expressed as a percentage, e.g. `8.25` for 8.25%.
    #[must_use]
    pub fn percent_of(self, percent: Decimal) -> Self {
        self.mul_rate(percent / Decimal::ONE_HUNDRED)
    }

    /// Re-quantizes to a new scale, rounding half-up.
    ///
    /// This is the only place a `Money` value changes scale. Idempotent:
    /// `m.to_fixed(s).to_fixed(s) == m.to_fixed(s)`.
    #[must_use]
    pub fn to_fixed(self, scale: u32) -> Self {
        self.to_fixed_with(scale, DEFAULT_ROUNDING)
    }

    /// Re-quantizes to a new scale with an explicit rounding strategy.
    #[must_use]
    pub fn to_fixed_with(self, scale: u32, rounding: RoundingStrategy) -> Self {
        let mut amount = self.amount.round_dp_with_strategy(scale, rounding);
        amount.rescale(scale);
        Self { amount, scale }
    }

    /// Returns the negated amount.
    #[must_use]
    pub fn negate(self) -> Self {
        Self {
            amount: -self.amount,
            scale: self.scale,
        }
    }

    /// Returns the absolute amount.
    #[must_use]
    pub fn abs(self) -> Self {
        Self {
            amount: self.amount.abs(),
            scale: self.scale,
        }
    }

    /// Sums an iterator of same-scale amounts, starting from zero.
    ///
    /// # Errors
    ///
    /// Returns [`MoneyError::ScaleMismatch`] if any item's scale differs
    /// from `scale`.
    pub fn sum<'a, I>(scale: u32, items: I) -> Result<Self, MoneyError>
    where
        I: IntoIterator<Item = &'a Self>,
    {
        items
            .into_iter()
            .try_fold(Self::zero(scale), |acc, item| acc.checked_add(*item))
    }

    fn ensure_same_scale(self, other: Self) -> Result<(), MoneyError> {
        if self.scale == other.scale {
            Ok(())
        } else {
            Err(MoneyError::ScaleMismatch {
                left: self.scale,
                right: other.scale,
            })
        }
    }
}

impl PartialOrd for Money {
    /// Orders amounts of the same scale; amounts of different scales are
    /// incomparable.
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        (self.scale == other.scale).then(|| self.amount.cmp(&other.amount))
    }
}

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // The inner amount is already rescaled, so Decimal's Display prints
        // exactly `scale` fractional digits.
        write!(f, "{}", self.amount)
    }
}

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

struct MoneyVisitor;

impl Visitor<'_> for MoneyVisitor {
    type Value = Money;

    fn expecting(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter.write_str("a decimal string with fixed fractional digits")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
        let amount = Decimal::from_str_exact(v).map_err(E::custom)?;
        // The wire format carries exactly the currency's fractional digits,
        // so the parsed scale is the amount's scale.
        Money::new(amount, amount.scale()).map_err(E::custom)
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_str(MoneyVisitor)
    }
}
