//! AR/AP domain types: counterparties, invoices, payments, applications.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use keystone_shared::types::{
    CounterpartyId, InvoiceId, Money, MoneyError, PaymentId, TenantId, UserId,
};

use crate::tax::ProductType;

/// Which side of the ledger a counterparty sits on.
///
/// An invoice belongs to exactly one counterparty: a customer (receivable)
/// XOR a supplier (payable), never both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CounterpartyKind {
    /// A customer we invoice (accounts receivable).
    Customer,
    /// A supplier who invoices us (accounts payable).
    Supplier,
}

/// A customer or supplier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Counterparty {
    /// Unique identifier.
    pub id: CounterpartyId,
    /// Tenant this counterparty belongs to.
    pub tenant_id: TenantId,
    /// Receivable or payable side.
    pub kind: CounterpartyKind,
    /// Display name.
    pub name: String,
}

/// Invoice lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceStatus {
    /// No payment applied yet.
    Open,
    /// Partially paid (0 < paid < total).
    PartiallyPaid,
    /// Fully paid (paid == total).
    Paid,
    /// Voided before any payment; terminal.
    Void,
}

impl InvoiceStatus {
    /// Returns true if payments can still be applied.
    #[must_use]
    pub fn accepts_payments(&self) -> bool {
        matches!(self, Self::Open | Self::PartiallyPaid)
    }

    /// Returns true if the invoice counts as outstanding for aging.
    #[must_use]
    pub fn is_outstanding(&self) -> bool {
        matches!(self, Self::Open | Self::PartiallyPaid)
    }
}

/// A single invoice line: quantity × unit price, optionally tax-coded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvoiceLine {
    /// Line description.
    pub description: String,
    /// Quantity billed.
    pub quantity: Decimal,
    /// Price per unit.
    pub unit_price: Money,
    /// Jurisdiction codes whose tax applies to this line.
    pub tax_codes: Vec<String>,
    /// Product classification for rate selection.
    pub product_type: ProductType,
}

impl InvoiceLine {
    /// Returns the extended amount (quantity × unit price), rounded half-up
    /// to the unit price's scale.
    #[must_use]
    pub fn extended_amount(&self) -> Money {
        self.unit_price.mul_rate(self.quantity)
    }
}

/// An AR/AP invoice with derived totals.
///
/// Invariant: `balance_amount = total_amount - paid_amount`, never negative
/// for a non-credit-memo invoice; `paid_amount` never exceeds
/// `total_amount`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Invoice {
    /// Unique identifier.
    pub id: InvoiceId,
    /// Tenant this invoice belongs to.
    pub tenant_id: TenantId,
    /// The counterparty billed or billing.
    pub counterparty_id: CounterpartyId,
    /// Receivable or payable side.
    pub counterparty_kind: CounterpartyKind,
    /// Invoice number for display and source references.
    pub number: String,
    /// Issue date.
    pub invoice_date: NaiveDate,
    /// Payment due date.
    pub due_date: NaiveDate,
    /// ISO 4217 currency code of all amounts on this invoice.
    pub currency: String,
    /// The invoice lines.
    pub lines: Vec<InvoiceLine>,
    /// Sum of line extended amounts.
    pub subtotal: Money,
    /// Tax computed by the tax engine.
    pub tax_amount: Money,
    /// subtotal + tax_amount.
    pub total_amount: Money,
    /// Total applied payments.
    pub paid_amount: Money,
    /// total_amount - paid_amount.
    pub balance_amount: Money,
    /// Lifecycle status.
    pub status: InvoiceStatus,
    /// The user who created the invoice.
    pub created_by: UserId,
    /// Optimistic concurrency version, bumped by the repository on update.
    pub version: i64,
}

impl Invoice {
    /// Recomputes `balance_amount` and `status` from `paid_amount`.
    ///
    /// # Errors
    ///
    /// Returns a [`MoneyError`] on scale mismatch between totals.
    pub fn refresh_balance(&mut self) -> Result<(), MoneyError> {
        self.balance_amount = self.total_amount.checked_sub(self.paid_amount)?;
        if self.status != InvoiceStatus::Void {
            self.status = if self.paid_amount.is_zero() {
                InvoiceStatus::Open
            } else if self.balance_amount.is_zero() {
                InvoiceStatus::Paid
            } else {
                InvoiceStatus::PartiallyPaid
            };
        }
        Ok(())
    }

    /// Days overdue as of a date; negative when not yet due.
    #[must_use]
    pub fn days_overdue(&self, as_of: NaiveDate) -> i64 {
        (as_of - self.due_date).num_days()
    }
}

/// How a payment was made. Evaluated by explicit cases, never dynamic
/// dispatch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum PaymentMethod {
    /// Cash.
    Cash,
    /// Bank transfer with an optional statement reference.
    BankTransfer {
        /// Statement or wire reference.
        reference: Option<String>,
    },
    /// Card payment.
    Card {
        /// Last four digits, for display.
        last_four: Option<String>,
    },
    /// Cheque.
    Cheque {
        /// Cheque number.
        number: Option<String>,
    },
}

/// The application of part of a payment against one invoice.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentApplication {
    /// The invoice the amount was applied to.
    pub invoice_id: InvoiceId,
    /// The applied amount.
    pub amount: Money,
    /// The date of application.
    pub applied_on: NaiveDate,
}

/// A receipt (AR) or disbursement (AP) that may be applied to zero, one, or
/// many invoices.
///
/// Invariant: the sum of applications never exceeds `amount`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    /// Unique identifier.
    pub id: PaymentId,
    /// Tenant this payment belongs to.
    pub tenant_id: TenantId,
    /// The paying or paid counterparty.
    pub counterparty_id: CounterpartyId,
    /// Date the payment was received or made.
    pub payment_date: NaiveDate,
    /// ISO 4217 currency code.
    pub currency: String,
    /// The payment amount.
    pub amount: Money,
    /// How the payment was made.
    pub method: PaymentMethod,
    /// Applications against invoices, in application order.
    pub applications: Vec<PaymentApplication>,
    /// The user who recorded the payment.
    pub created_by: UserId,
    /// Optimistic concurrency version, bumped by the repository on update.
    pub version: i64,
}

impl Payment {
    /// Creates a payment with no applications yet.
    #[must_use]
    pub fn new(
        tenant_id: TenantId,
        counterparty_id: CounterpartyId,
        payment_date: NaiveDate,
        currency: impl Into<String>,
        amount: Money,
        method: PaymentMethod,
        created_by: UserId,
    ) -> Self {
        Self {
            id: PaymentId::new(),
            tenant_id,
            counterparty_id,
            payment_date,
            currency: currency.into(),
            amount,
            method,
            applications: Vec::new(),
            created_by,
            version: 0,
        }
    }

    /// Sum of all applied amounts.
    ///
    /// # Errors
    ///
    /// Returns a [`MoneyError`] on scale mismatch.
    pub fn applied_total(&self) -> Result<Money, MoneyError> {
        Money::sum(self.amount.scale(), self.applications.iter().map(|a| &a.amount))
    }

    /// Remaining amount not yet applied to any invoice.
    ///
    /// # Errors
    ///
    /// Returns a [`MoneyError`] on scale mismatch.
    pub fn unapplied_amount(&self) -> Result<Money, MoneyError> {
        self.amount.checked_sub(self.applied_total()?)
    }
}
