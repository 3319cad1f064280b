//! AR/AP service: invoice creation, payment application, voiding.
//!
//! Payment application is atomic and isolated: the over-application checks
//! and both state updates commit as one unit under the persistence
//! collaborator's transaction, so concurrent applications cannot both
//! succeed against a stale balance.

use chrono::NaiveDate;

use keystone_shared::types::{CounterpartyId, InvoiceId, Money, PaymentId, TenantId, UserId};

use super::error::ArapError;
use super::types::{
    CounterpartyKind, Invoice, InvoiceLine, InvoiceStatus, Payment, PaymentApplication,
};
use crate::event::{AuditAction, AuditContext, AuditEvent, EventSink};
use crate::store::{InvoiceRepository, PaymentRepository, StoreError};
use crate::tax::{TaxJurisdiction, TaxService};

/// Input for creating a new invoice.
#[derive(Debug, Clone)]
pub struct CreateInvoiceInput {
    /// The tenant the invoice belongs to.
    pub tenant_id: TenantId,
    /// The counterparty billed or billing.
    pub counterparty_id: CounterpartyId,
    /// Receivable or payable side.
    pub counterparty_kind: CounterpartyKind,
    /// Invoice number.
    pub number: String,
    /// Issue date.
    pub invoice_date: NaiveDate,
    /// Payment due date.
    pub due_date: NaiveDate,
    /// ISO 4217 currency code.
    pub currency: String,
    /// The invoice lines (at least one).
    pub lines: Vec<InvoiceLine>,
    /// The user creating the invoice.
    pub created_by: UserId,
}

/// AR/AP service.
///
/// Stateless; repositories and the event sink are injected per call.
pub struct ArapService;

impl ArapService {
    /// Creates an invoice with derived totals.
    ///
    /// Subtotal comes from the lines, tax from the tax engine per line's
    /// jurisdiction codes, total = subtotal + tax. The invoice starts Open
    /// with nothing paid.
    ///
    /// # Errors
    ///
    /// Returns an error if the invoice has no lines or tax resolution
    /// fails.
    pub fn create_invoice<'a, I, E, F>(
        invoices: &mut I,
        events: &E,
        input: CreateInvoiceInput,
        jurisdictions: F,
        ctx: &AuditContext,
    ) -> Result<Invoice, ArapError>
    where
        I: InvoiceRepository,
        E: EventSink,
        F: Fn(&str) -> Option<&'a TaxJurisdiction>,
    {
        let Some(first) = input.lines.first() else {
            return Err(ArapError::EmptyInvoice);
        };
        let scale = first.unit_price.scale();

        let mut subtotal = Money::zero(scale);
        let mut tax_amount = Money::zero(scale);
        for line in &input.lines {
            let extended = line.extended_amount();
            subtotal = subtotal.checked_add(extended)?;
            if !line.tax_codes.is_empty() {
                let result = TaxService::calculate_tax(
                    extended,
                    &line.tax_codes,
                    line.product_type,
                    input.invoice_date,
                    &jurisdictions,
                )?;
                tax_amount = tax_amount.checked_add(result.total)?;
            }
        }
        let total_amount = subtotal.checked_add(tax_amount)?;

        let invoice = Invoice {
            id: InvoiceId::new(),
            tenant_id: input.tenant_id,
            counterparty_id: input.counterparty_id,
            counterparty_kind: input.counterparty_kind,
            number: input.number,
            invoice_date: input.invoice_date,
            due_date: input.due_date,
            currency: input.currency,
            lines: input.lines,
            subtotal,
            tax_amount,
            total_amount,
            paid_amount: Money::zero(scale),
            balance_amount: total_amount,
            status: InvoiceStatus::Open,
            created_by: input.created_by,
            version: 0,
        };
        let invoice = invoices.insert_invoice(invoice).map_err(store_conflict)?;

        events.emit(
            AuditEvent::new(
                "invoice",
                invoice.id.into_inner(),
                AuditAction::InvoiceCreated,
                ctx,
            )
            .with_amounts(None, Some(invoice.total_amount)),
        );
        tracing::info!(
            invoice_id = %invoice.id,
            number = %invoice.number,
            total = %invoice.total_amount,
            "invoice created"
        );
        Ok(invoice)
    }

    /// Records a new payment with no applications.
    ///
    /// # Errors
    ///
    /// Returns an error on an insert conflict.
    pub fn record_payment<P>(payments: &mut P, payment: Payment) -> Result<Payment, ArapError>
    where
        P: PaymentRepository,
    {
        payments.insert_payment(payment).map_err(store_conflict)
    }

    /// Applies part of a payment to an invoice.
    ///
    /// The applied amount may exceed neither the payment's remaining
    /// unapplied amount nor the invoice's outstanding balance. On success
    /// the invoice's paid and balance amounts are recomputed and its status
    /// transitions to PartiallyPaid or Paid.
    ///
    /// # Errors
    ///
    /// Returns an error if either entity is missing, the invoice is void,
    /// or the amount over-applies.
    pub fn apply_payment<I, P, E>(
        invoices: &mut I,
        payments: &mut P,
        events: &E,
        payment_id: PaymentId,
        invoice_id: InvoiceId,
        amount: Money,
        ctx: &AuditContext,
    ) -> Result<(Invoice, Payment), ArapError>
    where
        I: InvoiceRepository,
        P: PaymentRepository,
        E: EventSink,
    {
        if !amount.is_positive() {
            return Err(ArapError::InvalidApplication);
        }
        let mut payment = payments
            .find_payment(payment_id)
            .ok_or(ArapError::PaymentNotFound(payment_id))?;
        let mut invoice = invoices
            .find_invoice(invoice_id)
            .ok_or(ArapError::InvoiceNotFound(invoice_id))?;

        if invoice.status == InvoiceStatus::Void {
            return Err(ArapError::InvoiceVoided(invoice_id));
        }

        let unapplied = payment.unapplied_amount()?;
        if unapplied.checked_sub(amount)?.is_negative() {
            return Err(ArapError::OverApplication {
                invoice_id,
                payment_id,
                requested: amount.amount(),
                available: unapplied.amount(),
            });
        }
        let balance_before = invoice.balance_amount;
        if balance_before.checked_sub(amount)?.is_negative() {
            return Err(ArapError::OverApplication {
                invoice_id,
                payment_id,
                requested: amount.amount(),
                available: balance_before.amount(),
            });
        }

        payment.applications.push(PaymentApplication {
            invoice_id,
            amount,
            applied_on: payment.payment_date,
        });
        invoice.paid_amount = invoice.paid_amount.checked_add(amount)?;
        invoice.refresh_balance()?;

        let invoice = invoices.update_invoice(invoice).map_err(store_conflict)?;
        let payment = payments.update_payment(payment).map_err(store_conflict)?;

        events.emit(
            AuditEvent::new(
                "invoice",
                invoice.id.into_inner(),
                AuditAction::PaymentApplied,
                ctx,
            )
            .with_amounts(Some(balance_before), Some(invoice.balance_amount)),
        );
        tracing::info!(
            invoice_id = %invoice.id,
            payment_id = %payment.id,
            amount = %amount,
            balance = %invoice.balance_amount,
            "payment applied"
        );
        Ok((invoice, payment))
    }

    /// Voids an invoice that has no payments applied.
    ///
    /// # Errors
    ///
    /// Returns an error if the invoice is already void or has payments.
    pub fn void_invoice<I, E>(
        invoices: &mut I,
        events: &E,
        invoice_id: InvoiceId,
        ctx: &AuditContext,
    ) -> Result<Invoice, ArapError>
    where
        I: InvoiceRepository,
        E: EventSink,
    {
        let mut invoice = invoices
            .find_invoice(invoice_id)
            .ok_or(ArapError::InvoiceNotFound(invoice_id))?;
        if invoice.status == InvoiceStatus::Void {
            return Err(ArapError::InvoiceVoided(invoice_id));
        }
        if !invoice.paid_amount.is_zero() {
            return Err(ArapError::CannotVoidPaid(invoice_id));
        }

        let total = invoice.total_amount;
        invoice.status = InvoiceStatus::Void;
        let invoice = invoices.update_invoice(invoice).map_err(store_conflict)?;

        events.emit(
            AuditEvent::new(
                "invoice",
                invoice.id.into_inner(),
                AuditAction::InvoiceVoided,
                ctx,
            )
            .with_amounts(Some(total), None),
        );
        tracing::info!(invoice_id = %invoice.id, "invoice voided");
        Ok(invoice)
    }
}

/// Any storage surprise after the initial read is an isolation conflict:
/// the caller retries the whole command.
fn store_conflict(_: StoreError) -> ArapError {
    ArapError::ConcurrentModification
}
