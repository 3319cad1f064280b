//! Aging reports over outstanding invoices.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use keystone_shared::types::Money;

use super::error::ArapError;
use crate::store::InvoiceRepository;

/// One day-range classification, `[days_from, days_to)`.
///
/// The caller supplies an ordered, non-overlapping list; the last bucket
/// has no upper bound.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgingBucket {
    /// Display label (e.g. "31-60").
    pub label: String,
    /// Lower bound of days overdue (inclusive).
    pub days_from: i64,
    /// Upper bound of days overdue (exclusive); `None` is unbounded.
    pub days_to: Option<i64>,
}

impl AgingBucket {
    /// Creates a bucket.
    #[must_use]
    pub fn new(label: impl Into<String>, days_from: i64, days_to: Option<i64>) -> Self {
        Self {
            label: label.into(),
            days_from,
            days_to,
        }
    }

    /// Returns true if `days` falls in `[days_from, days_to)`.
    #[must_use]
    pub fn contains(&self, days: i64) -> bool {
        days >= self.days_from && self.days_to.is_none_or(|to| days < to)
    }
}

/// The conventional bucket list: Current, 1-30, 31-60, 61-90, 90+.
///
/// "Current" catches everything not yet due (days overdue <= 0).
#[must_use]
pub fn standard_buckets() -> Vec<AgingBucket> {
    vec![
        AgingBucket::new("Current", i64::MIN, Some(1)),
        AgingBucket::new("1-30", 1, Some(31)),
        AgingBucket::new("31-60", 31, Some(61)),
        AgingBucket::new("61-90", 61, Some(91)),
        AgingBucket::new("90+", 91, None),
    ]
}

/// Aggregated figures for one bucket.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgingBucketSummary {
    /// The bucket's label.
    pub label: String,
    /// Number of invoices in the bucket.
    pub invoice_count: usize,
    /// Sum of outstanding balances in the bucket.
    pub balance_total: Money,
}

/// An aging report as of a date.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgingReport {
    /// The report's as-of date.
    pub as_of: NaiveDate,
    /// Per-bucket aggregation, in bucket order.
    pub buckets: Vec<AgingBucketSummary>,
    /// Total outstanding balance across all buckets.
    pub total: Money,
}

/// Validates that buckets are ordered, contiguous, and end unbounded.
fn validate_buckets(buckets: &[AgingBucket]) -> Result<(), ArapError> {
    if buckets.is_empty() || buckets.last().is_none_or(|b| b.days_to.is_some()) {
        return Err(ArapError::InvalidBuckets);
    }
    for pair in buckets.windows(2) {
        if pair[0].days_to != Some(pair[1].days_from) {
            return Err(ArapError::InvalidBuckets);
        }
    }
    Ok(())
}

/// Builds an aging report over every outstanding invoice as of a date.
///
/// Each invoice's days overdue (`as_of - due_date`) is assigned to the
/// first bucket whose range contains it by a linear scan over the ordered
/// bucket list.
///
/// # Errors
///
/// Returns an error if the bucket list is malformed or balances mix
/// scales.
pub fn generate_aging_report<I>(
    invoices: &I,
    as_of: NaiveDate,
    buckets: &[AgingBucket],
    scale: u32,
) -> Result<AgingReport, ArapError>
where
    I: InvoiceRepository,
{
    validate_buckets(buckets)?;

    let mut summaries: Vec<AgingBucketSummary> = buckets
        .iter()
        .map(|b| AgingBucketSummary {
            label: b.label.clone(),
            invoice_count: 0,
            balance_total: Money::zero(scale),
        })
        .collect();
    let mut total = Money::zero(scale);

    for invoice in invoices.outstanding_invoices() {
        if invoice.invoice_date > as_of {
            continue;
        }
        let days = invoice.days_overdue(as_of);
        let index = buckets
            .iter()
            .position(|b| b.contains(days))
            .ok_or(ArapError::UnbucketedDays { days })?;

        summaries[index].invoice_count += 1;
        summaries[index].balance_total = summaries[index]
            .balance_total
            .checked_add(invoice.balance_amount)?;
        total = total.checked_add(invoice.balance_amount)?;
    }

    Ok(AgingReport {
        as_of,
        buckets: summaries,
        total,
    })
}
