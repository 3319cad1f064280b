//! AR/AP error types.

use rust_decimal::Decimal;
use thiserror::Error;

use keystone_shared::types::{InvoiceId, MoneyError, PaymentId};

use crate::tax::TaxError;

/// Errors that can occur during AR/AP operations.
#[derive(Debug, Error)]
pub enum ArapError {
    /// Invoice not found.
    #[error("Invoice not found: {0}")]
    InvoiceNotFound(InvoiceId),

    /// Payment not found.
    #[error("Payment not found: {0}")]
    PaymentNotFound(PaymentId),

    /// The invoice has no lines.
    #[error("Invoice must have at least one line")]
    EmptyInvoice,

    /// The invoice is void and cannot take payments.
    #[error("Invoice {0} is void")]
    InvoiceVoided(InvoiceId),

    /// An invoice with applied payments cannot be voided.
    #[error("Invoice {0} has payments applied and cannot be voided")]
    CannotVoidPaid(InvoiceId),

    /// Applied amount must be positive.
    #[error("Applied amount must be positive")]
    InvalidApplication,

    /// The applied amount exceeds the payment's unapplied remainder or the
    /// invoice's outstanding balance.
    #[error(
        "Applying {requested} of payment {payment_id} to invoice {invoice_id} \
         exceeds the available {available}"
    )]
    OverApplication {
        /// The target invoice.
        invoice_id: InvoiceId,
        /// The applying payment.
        payment_id: PaymentId,
        /// The requested application amount.
        requested: Decimal,
        /// What remained available on the binding constraint.
        available: Decimal,
    },

    /// Aging buckets must be ordered, contiguous, and end unbounded.
    #[error("Aging buckets are not ordered and contiguous")]
    InvalidBuckets,

    /// No bucket contains the computed days overdue.
    #[error("No aging bucket contains {days} days overdue")]
    UnbucketedDays {
        /// The days-overdue value without a bucket.
        days: i64,
    },

    /// Concurrent modification detected by the persistence collaborator.
    #[error("Concurrent modification detected, please retry")]
    ConcurrentModification,

    /// Tax calculation failed.
    #[error(transparent)]
    Tax(#[from] TaxError),

    /// Amount arithmetic failed.
    #[error(transparent)]
    Money(#[from] MoneyError),
}

impl ArapError {
    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvoiceNotFound(_) => "INVOICE_NOT_FOUND",
            Self::PaymentNotFound(_) => "PAYMENT_NOT_FOUND",
            Self::EmptyInvoice => "EMPTY_INVOICE",
            Self::InvoiceVoided(_) => "INVOICE_VOIDED",
            Self::CannotVoidPaid(_) => "CANNOT_VOID_PAID",
            Self::InvalidApplication => "INVALID_APPLICATION",
            Self::OverApplication { .. } => "OVER_APPLICATION",
            Self::InvalidBuckets => "INVALID_BUCKETS",
            Self::UnbucketedDays { .. } => "UNBUCKETED_DAYS",
            Self::ConcurrentModification => "CONCURRENT_MODIFICATION",
            Self::Tax(e) => e.error_code(),
            Self::Money(e) => e.error_code(),
        }
    }

    /// Returns true if the whole command is a candidate for caller-driven
    /// retry.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::ConcurrentModification)
    }
}
