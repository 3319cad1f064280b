//! Tax domain types: jurisdictions, rates, and calculation results.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use keystone_shared::types::{JurisdictionId, Money, TaxRateId};

/// Tax classification as the surrounding platform distinguishes them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaxType {
    /// Sales tax collected at the point of sale.
    Sales,
    /// Value-added tax.
    Vat,
    /// Tax withheld at source.
    Withholding,
}

/// Product classification used to select the applicable rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductType {
    /// Physical goods.
    Goods,
    /// Services.
    Services,
    /// Digital products.
    Digital,
}

/// One bracket of a tiered tax schedule.
///
/// Brackets are ordered by ascending upper bound; the last bracket carries
/// `up_to = None` and is unbounded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxBracket {
    /// Upper bound of the bracket (exclusive); `None` for the top bracket.
    pub up_to: Option<Decimal>,
    /// Percentage rate applied to the amount falling in this bracket.
    pub rate: Decimal,
}

/// How a tax amount is computed from a taxable base.
///
/// A tagged variant evaluated by a single calculation function with an
/// explicit case per method; all monetary rounding stays in `Money`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "method")]
pub enum CalculationMethod {
    /// Percentage of the taxable base, e.g. `rate = 8.25` for 8.25%.
    Percentage {
        /// Percentage rate.
        rate: Decimal,
    },
    /// A flat amount regardless of the base.
    Flat {
        /// The flat tax amount.
        amount: Money,
    },
    /// Bracket arithmetic over the taxable base.
    Tiered {
        /// Ordered brackets, last one unbounded.
        brackets: Vec<TaxBracket>,
    },
}

impl CalculationMethod {
    /// Validates the method's shape: non-negative rates, and for tiered
    /// schedules strictly ascending bounds with an unbounded final bracket.
    #[must_use]
    pub fn is_well_formed(&self) -> bool {
        match self {
            Self::Percentage { rate } => !rate.is_sign_negative(),
            Self::Flat { amount } => !amount.is_negative(),
            Self::Tiered { brackets } => {
                if brackets.is_empty() || brackets.last().is_none_or(|b| b.up_to.is_some()) {
                    return false;
                }
                let mut previous = Decimal::ZERO;
                for bracket in brackets {
                    if bracket.rate.is_sign_negative() {
                        return false;
                    }
                    if let Some(up_to) = bracket.up_to {
                        if up_to <= previous {
                            return false;
                        }
                        previous = up_to;
                    }
                }
                true
            }
        }
    }
}

/// A time-bounded tax rate within a jurisdiction.
///
/// For a given (jurisdiction, tax type, date) at most one rate is
/// effective.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaxRate {
    /// Unique identifier.
    pub id: TaxRateId,
    /// The jurisdiction this rate belongs to.
    pub jurisdiction_id: JurisdictionId,
    /// Tax classification.
    pub tax_type: TaxType,
    /// Display name (e.g. "CA state sales tax").
    pub name: String,
    /// How the tax amount is computed.
    pub method: CalculationMethod,
    /// Product classification this rate applies to; `None` applies to all.
    pub applies_to: Option<ProductType>,
    /// First date the rate is effective (inclusive).
    pub effective_from: NaiveDate,
    /// Last date the rate is effective (inclusive); `None` is open-ended.
    pub effective_to: Option<NaiveDate>,
    /// Base below which no tax applies.
    pub min_taxable: Option<Money>,
    /// Base above which the excess is not taxed.
    pub max_taxable: Option<Money>,
}

impl TaxRate {
    /// Returns true if the rate's effective window contains `date`.
    #[must_use]
    pub fn is_effective(&self, date: NaiveDate) -> bool {
        date >= self.effective_from && self.effective_to.is_none_or(|to| date <= to)
    }

    /// Returns true if the rate applies to the given product type.
    #[must_use]
    pub fn applies_to_product(&self, product_type: ProductType) -> bool {
        self.applies_to.is_none_or(|p| p == product_type)
    }
}

/// A tax jurisdiction with its configured rates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaxJurisdiction {
    /// Unique identifier.
    pub id: JurisdictionId,
    /// Jurisdiction code referenced by invoice lines (e.g. "US-CA").
    pub code: String,
    /// Display name.
    pub name: String,
    /// The jurisdiction's rates.
    pub rates: Vec<TaxRate>,
}

impl TaxJurisdiction {
    /// Resolves the single rate effective for (`product_type`, `as_of`).
    ///
    /// A product-specific rate wins over a generic one; among remaining
    /// candidates the most recent `effective_from` wins.
    #[must_use]
    pub fn effective_rate(&self, product_type: ProductType, as_of: NaiveDate) -> Option<&TaxRate> {
        self.rates
            .iter()
            .filter(|r| r.is_effective(as_of) && r.applies_to_product(product_type))
            .max_by_key(|r| (r.applies_to.is_some(), r.effective_from))
    }
}

/// Per-jurisdiction detail line of a tax calculation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaxDetail {
    /// The jurisdiction code the detail belongs to.
    pub jurisdiction_code: String,
    /// Name of the applied rate, for audit display.
    pub rate_name: String,
    /// The taxable base after min/max clamping.
    pub taxable_amount: Money,
    /// The computed tax amount.
    pub tax_amount: Money,
    /// The applied percentage, when the method is percentage-based.
    pub applied_rate: Option<Decimal>,
}

/// Result of a tax calculation: per-jurisdiction detail plus grand total.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaxCalculationResult {
    /// One detail per named jurisdiction, in input order.
    pub details: Vec<TaxDetail>,
    /// Sum of all detail tax amounts, at the taxable amount's scale.
    pub total: Money,
}
