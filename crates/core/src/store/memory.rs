//! In-memory repository implementation.
//!
//! The reference implementation of the persistence collaborator contract,
//! scoped to one tenant. Used by the test suite and small hosts; production
//! deployments supply database-backed repositories instead.

use std::collections::HashMap;

use chrono::NaiveDate;

use keystone_shared::types::{
    AccountId, FiscalPeriodId, FiscalYearId, InvoiceId, JournalEntryId, PaymentId,
};

use crate::arap::types::{Invoice, Payment};
use crate::fiscal::period::FiscalPeriod;
use crate::ledger::types::{Account, AccountType, EntryStatus, JournalEntry, JournalLine};

use super::{
    AccountRepository, InvoiceRepository, JournalRepository, PaymentRepository, PeriodRepository,
    StoreError,
};

/// In-memory implementation of every repository trait, for one tenant.
#[derive(Debug, Default)]
pub struct MemoryLedger {
    accounts: HashMap<AccountId, Account>,
    entries: HashMap<JournalEntryId, JournalEntry>,
    periods: HashMap<FiscalPeriodId, FiscalPeriod>,
    invoices: HashMap<InvoiceId, Invoice>,
    payments: HashMap<PaymentId, Payment>,
    sequence: i64,
}

impl MemoryLedger {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl AccountRepository for MemoryLedger {
    fn find_account(&self, id: AccountId) -> Option<Account> {
        self.accounts.get(&id).cloned()
    }

    fn insert_account(&mut self, account: Account) -> Result<(), StoreError> {
        if self.accounts.contains_key(&account.id) {
            return Err(StoreError::Duplicate {
                entity: "account",
                id: account.id.to_string(),
            });
        }
        self.accounts.insert(account.id, account);
        Ok(())
    }

    fn accounts_by_type(&self, account_type: AccountType) -> Vec<Account> {
        let mut accounts: Vec<Account> = self
            .accounts
            .values()
            .filter(|a| a.account_type == account_type)
            .cloned()
            .collect();
        accounts.sort_by(|a, b| a.code.cmp(&b.code));
        accounts
    }
}

impl JournalRepository for MemoryLedger {
    fn find_entry(&self, id: JournalEntryId) -> Option<JournalEntry> {
        self.entries.get(&id).cloned()
    }

    fn insert_entry(&mut self, entry: JournalEntry) -> Result<JournalEntry, StoreError> {
        if self.entries.contains_key(&entry.id) {
            return Err(StoreError::Duplicate {
                entity: "journal_entry",
                id: entry.id.to_string(),
            });
        }
        self.entries.insert(entry.id, entry.clone());
        Ok(entry)
    }

    fn update_entry(&mut self, mut entry: JournalEntry) -> Result<JournalEntry, StoreError> {
        let stored = self
            .entries
            .get(&entry.id)
            .ok_or_else(|| StoreError::NotFound {
                entity: "journal_entry",
                id: entry.id.to_string(),
            })?;
        if stored.version != entry.version {
            return Err(StoreError::VersionConflict {
                entity: "journal_entry",
                id: entry.id.to_string(),
            });
        }
        entry.version += 1;
        self.entries.insert(entry.id, entry.clone());
        Ok(entry)
    }

    fn next_sequence(&mut self) -> i64 {
        self.sequence += 1;
        self.sequence
    }

    fn posted_lines_for_account(
        &self,
        account_id: AccountId,
        as_of: NaiveDate,
    ) -> Vec<JournalLine> {
        let mut posted: Vec<&JournalEntry> = self
            .entries
            .values()
            .filter(|e| e.status == EntryStatus::Posted || e.status == EntryStatus::Reversed)
            .filter(|e| e.entry_date <= as_of)
            .collect();
        posted.sort_by_key(|e| e.sequence_number);
        posted
            .into_iter()
            .flat_map(|e| e.lines.iter())
            .filter(|l| l.account_id == account_id)
            .cloned()
            .collect()
    }

    fn posted_entries_in_range(&self, from: NaiveDate, to: NaiveDate) -> Vec<JournalEntry> {
        let mut posted: Vec<JournalEntry> = self
            .entries
            .values()
            .filter(|e| e.status == EntryStatus::Posted || e.status == EntryStatus::Reversed)
            .filter(|e| e.entry_date >= from && e.entry_date <= to)
            .cloned()
            .collect();
        posted.sort_by_key(|e| e.sequence_number);
        posted
    }
}

impl PeriodRepository for MemoryLedger {
    fn find_period(&self, id: FiscalPeriodId) -> Option<FiscalPeriod> {
        self.periods.get(&id).cloned()
    }

    fn insert_period(&mut self, period: FiscalPeriod) -> Result<(), StoreError> {
        if self.periods.contains_key(&period.id) {
            return Err(StoreError::Duplicate {
                entity: "fiscal_period",
                id: period.id.to_string(),
            });
        }
        self.periods.insert(period.id, period);
        Ok(())
    }

    fn update_period(&mut self, period: FiscalPeriod) -> Result<(), StoreError> {
        if !self.periods.contains_key(&period.id) {
            return Err(StoreError::NotFound {
                entity: "fiscal_period",
                id: period.id.to_string(),
            });
        }
        self.periods.insert(period.id, period);
        Ok(())
    }

    fn period_for_date(&self, date: NaiveDate) -> Option<FiscalPeriod> {
        self.periods
            .values()
            .find(|p| p.contains_date(date))
            .cloned()
    }

    fn periods_for_year(&self, fiscal_year_id: FiscalYearId) -> Vec<FiscalPeriod> {
        let mut periods: Vec<FiscalPeriod> = self
            .periods
            .values()
            .filter(|p| p.fiscal_year_id == fiscal_year_id)
            .cloned()
            .collect();
        periods.sort_by_key(|p| p.period_number);
        periods
    }
}

impl InvoiceRepository for MemoryLedger {
    fn find_invoice(&self, id: InvoiceId) -> Option<Invoice> {
        self.invoices.get(&id).cloned()
    }

    fn insert_invoice(&mut self, invoice: Invoice) -> Result<Invoice, StoreError> {
        if self.invoices.contains_key(&invoice.id) {
            return Err(StoreError::Duplicate {
                entity: "invoice",
                id: invoice.id.to_string(),
            });
        }
        self.invoices.insert(invoice.id, invoice.clone());
        Ok(invoice)
    }

    fn update_invoice(&mut self, mut invoice: Invoice) -> Result<Invoice, StoreError> {
        let stored = self
            .invoices
            .get(&invoice.id)
            .ok_or_else(|| StoreError::NotFound {
                entity: "invoice",
                id: invoice.id.to_string(),
            })?;
        if stored.version != invoice.version {
            return Err(StoreError::VersionConflict {
                entity: "invoice",
                id: invoice.id.to_string(),
            });
        }
        invoice.version += 1;
        self.invoices.insert(invoice.id, invoice.clone());
        Ok(invoice)
    }

    fn outstanding_invoices(&self) -> Vec<Invoice> {
        let mut invoices: Vec<Invoice> = self
            .invoices
            .values()
            .filter(|i| i.status.is_outstanding())
            .cloned()
            .collect();
        invoices.sort_by_key(|i| (i.due_date, i.id.into_inner()));
        invoices
    }
}

impl PaymentRepository for MemoryLedger {
    fn find_payment(&self, id: PaymentId) -> Option<Payment> {
        self.payments.get(&id).cloned()
    }

    fn insert_payment(&mut self, payment: Payment) -> Result<Payment, StoreError> {
        if self.payments.contains_key(&payment.id) {
            return Err(StoreError::Duplicate {
                entity: "payment",
                id: payment.id.to_string(),
            });
        }
        self.payments.insert(payment.id, payment.clone());
        Ok(payment)
    }

    fn update_payment(&mut self, mut payment: Payment) -> Result<Payment, StoreError> {
        let stored = self
            .payments
            .get(&payment.id)
            .ok_or_else(|| StoreError::NotFound {
                entity: "payment",
                id: payment.id.to_string(),
            })?;
        if stored.version != payment.version {
            return Err(StoreError::VersionConflict {
                entity: "payment",
                id: payment.id.to_string(),
            });
        }
        payment.version += 1;
        self.payments.insert(payment.id, payment.clone());
        Ok(payment)
    }
}
