//! Tax calculation service.
//!
//! Resolves jurisdiction rates and computes tax amounts for a taxable base.
//! Jurisdictions are evaluated independently and summed; compound taxes are
//! only supported where a jurisdiction's own rate definition encodes them.

use chrono::NaiveDate;
use rust_decimal::Decimal;

use keystone_shared::types::Money;

use super::error::TaxError;
use super::types::{
    CalculationMethod, ProductType, TaxCalculationResult, TaxDetail, TaxJurisdiction, TaxRate,
};

/// Tax calculation service.
///
/// Stateless: jurisdiction data is injected per call, so the service works
/// the same against any persistence collaborator.
pub struct TaxService;

impl TaxService {
    /// Computes the tax on `taxable_amount` for every named jurisdiction.
    ///
    /// For each code the single effective rate is resolved; a jurisdiction
    /// with no effective rate fails the whole calculation with
    /// [`TaxError::NoEffectiveRate`] rather than contributing 0%.
    ///
    /// # Errors
    ///
    /// Returns an error if a code is unknown, a rate is missing or
    /// malformed, or amount arithmetic fails.
    pub fn calculate_tax<'a, F>(
        taxable_amount: Money,
        jurisdiction_codes: &[String],
        product_type: ProductType,
        as_of: NaiveDate,
        jurisdictions: F,
    ) -> Result<TaxCalculationResult, TaxError>
    where
        F: Fn(&str) -> Option<&'a TaxJurisdiction>,
    {
        let scale = taxable_amount.scale();
        let mut details = Vec::with_capacity(jurisdiction_codes.len());
        let mut total = Money::zero(scale);

        for code in jurisdiction_codes {
            let jurisdiction = jurisdictions(code)
                .ok_or_else(|| TaxError::UnknownJurisdiction(code.clone()))?;
            let rate = jurisdiction
                .effective_rate(product_type, as_of)
                .ok_or_else(|| TaxError::NoEffectiveRate {
                    jurisdiction: code.clone(),
                    date: as_of,
                })?;

            let detail = Self::apply_rate(taxable_amount, &jurisdiction.code, rate)?;
            total = total.checked_add(detail.tax_amount)?;
            details.push(detail);
        }

        Ok(TaxCalculationResult { details, total })
    }

    /// Applies one resolved rate to the taxable base.
    fn apply_rate(taxable: Money, code: &str, rate: &TaxRate) -> Result<TaxDetail, TaxError> {
        if !rate.method.is_well_formed() {
            return Err(TaxError::MalformedMethod {
                rate_name: rate.name.clone(),
            });
        }

        let scale = taxable.scale();
        let base = Self::clamp_base(taxable, rate);

        let (tax, applied_rate) = match &rate.method {
            CalculationMethod::Percentage { rate: percent } => {
                let raw = base * *percent / Decimal::ONE_HUNDRED;
                (Money::from_decimal(raw).to_fixed(scale), Some(*percent))
            }
            CalculationMethod::Flat { amount } => (amount.to_fixed(scale), None),
            CalculationMethod::Tiered { brackets } => {
                let mut accumulated = Decimal::ZERO;
                let mut lower = Decimal::ZERO;
                for bracket in brackets {
                    let upper = bracket.up_to.unwrap_or(base).min(base);
                    if upper > lower {
                        accumulated += (upper - lower) * bracket.rate / Decimal::ONE_HUNDRED;
                    }
                    lower = upper;
                    if lower >= base {
                        break;
                    }
                }
                (Money::from_decimal(accumulated).to_fixed(scale), None)
            }
        };

        Ok(TaxDetail {
            jurisdiction_code: code.to_string(),
            rate_name: rate.name.clone(),
            taxable_amount: Money::from_decimal(base).to_fixed(scale),
            tax_amount: tax,
            applied_rate,
        })
    }

    /// Clamps the taxable base to the rate's min/max window.
    ///
    /// A base below the minimum is not taxable at all; a base above the
    /// maximum is taxed only up to the maximum.
    fn clamp_base(taxable: Money, rate: &TaxRate) -> Decimal {
        let mut base = taxable.amount();
        if let Some(min) = &rate.min_taxable {
            if base < min.amount() {
                return Decimal::ZERO;
            }
        }
        if let Some(max) = &rate.max_taxable {
            base = base.min(max.amount());
        }
        base
    }
}
