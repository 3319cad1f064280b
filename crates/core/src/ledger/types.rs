//! Ledger domain types for journal entries and the chart of accounts.
//!
//! This module defines the core types of the double-entry bookkeeping
//! system: accounts, journal entries, and their lines.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use keystone_shared::types::{
    AccountId, JournalEntryId, JournalLineId, Money, TenantId, UserId,
};

/// Account classification in the chart of accounts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountType {
    /// Resources owned (cash, receivables, inventory).
    Asset,
    /// Obligations owed (payables, loans).
    Liability,
    /// Owner's residual interest (capital, retained earnings).
    Equity,
    /// Income earned.
    Revenue,
    /// Costs incurred.
    Expense,
}

/// Which side increases an account's balance.
///
/// In double-entry bookkeeping:
/// - Debits increase asset/expense accounts, decrease the others
/// - Credits increase liability/equity/revenue accounts, decrease the others
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NormalBalance {
    /// Debit-normal accounts (Asset, Expense).
    Debit,
    /// Credit-normal accounts (Liability, Equity, Revenue).
    Credit,
}

impl AccountType {
    /// Returns the normal balance side for this account type.
    #[must_use]
    pub const fn normal_balance(self) -> NormalBalance {
        match self {
            Self::Asset | Self::Expense => NormalBalance::Debit,
            Self::Liability | Self::Equity | Self::Revenue => NormalBalance::Credit,
        }
    }
}

/// A node in the chart of accounts.
///
/// Immutable once referenced by a posted journal line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    /// Unique identifier.
    pub id: AccountId,
    /// Tenant this account belongs to.
    pub tenant_id: TenantId,
    /// Account code (e.g. "1000").
    pub code: String,
    /// Display name.
    pub name: String,
    /// Account classification.
    pub account_type: AccountType,
    /// Whether the account accepts new postings.
    pub is_active: bool,
}

impl Account {
    /// Returns the normal balance side for this account.
    #[must_use]
    pub const fn normal_balance(&self) -> NormalBalance {
        self.account_type.normal_balance()
    }
}

/// Journal entry status in its lifecycle.
///
/// The valid transitions are:
/// - Draft → PendingApproval (submit)
/// - Draft | PendingApproval → Posted (post)
/// - Posted → Reversed (reverse)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryStatus {
    /// Entry is being drafted and can be modified; may be unbalanced.
    Draft,
    /// Entry has been submitted for approval.
    PendingApproval,
    /// Entry has been posted to the ledger (immutable).
    Posted,
    /// Entry has been reversed by a later entry (immutable).
    Reversed,
}

impl EntryStatus {
    /// Returns true if lines can still be added or removed.
    #[must_use]
    pub fn is_editable(&self) -> bool {
        matches!(self, Self::Draft)
    }

    /// Returns true if the entry can transition to Posted.
    #[must_use]
    pub fn is_postable(&self) -> bool {
        matches!(self, Self::Draft | Self::PendingApproval)
    }

    /// Returns true if the entry is immutable.
    #[must_use]
    pub fn is_immutable(&self) -> bool {
        matches!(self, Self::Posted | Self::Reversed)
    }
}

/// Reconciliation status of a line against an external statement.
///
/// Fed by the external reconciliation module; inert to the balance
/// invariant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReconciliationStatus {
    /// Not yet matched to a statement line.
    Unreconciled,
    /// Matched to a statement line.
    Reconciled,
}

/// Dimensional tags on a line, used for reporting only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DimensionTags {
    /// Department code.
    pub department: Option<String>,
    /// Project code.
    pub project: Option<String>,
    /// Location code.
    pub location: Option<String>,
    /// Customer or supplier code.
    pub counterparty: Option<String>,
}

impl DimensionTags {
    /// Returns true if no tag is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.department.is_none()
            && self.project.is_none()
            && self.location.is_none()
            && self.counterparty.is_none()
    }
}

/// A single line of a journal entry.
///
/// Canonical form: exactly one of `debit` / `credit` is non-zero.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JournalLine {
    /// Unique identifier.
    pub id: JournalLineId,
    /// The account posted to.
    pub account_id: AccountId,
    /// Debit amount (zero on credit lines).
    pub debit: Money,
    /// Credit amount (zero on debit lines).
    pub credit: Money,
    /// Optional memo for this line.
    pub memo: Option<String>,
    /// Reconciliation status, if the line participates in reconciliation.
    pub reconciliation: Option<ReconciliationStatus>,
    /// Dimensional tags for reporting.
    pub dimensions: DimensionTags,
}

impl JournalLine {
    /// Creates a debit line.
    #[must_use]
    pub fn debit(account_id: AccountId, amount: Money) -> Self {
        Self {
            id: JournalLineId::new(),
            account_id,
            debit: amount,
            credit: Money::zero(amount.scale()),
            memo: None,
            reconciliation: None,
            dimensions: DimensionTags::default(),
        }
    }

    /// Creates a credit line.
    #[must_use]
    pub fn credit(account_id: AccountId, amount: Money) -> Self {
        Self {
            id: JournalLineId::new(),
            account_id,
            debit: Money::zero(amount.scale()),
            credit: amount,
            memo: None,
            reconciliation: None,
            dimensions: DimensionTags::default(),
        }
    }

    /// Attaches a memo.
    #[must_use]
    pub fn with_memo(mut self, memo: impl Into<String>) -> Self {
        self.memo = Some(memo.into());
        self
    }

    /// Attaches dimension tags.
    #[must_use]
    pub fn with_dimensions(mut self, dimensions: DimensionTags) -> Self {
        self.dimensions = dimensions;
        self
    }

    /// Returns a copy with debit and credit swapped, under a fresh line ID.
    #[must_use]
    pub fn swapped(&self) -> Self {
        Self {
            id: JournalLineId::new(),
            account_id: self.account_id,
            debit: self.credit,
            credit: self.debit,
            memo: self.memo.clone(),
            reconciliation: None,
            dimensions: self.dimensions.clone(),
        }
    }
}

/// A journal entry: header plus an ordered list of lines.
///
/// Balanced (sum of debits == sum of credits) at the instant it is Posted;
/// a Draft may be temporarily unbalanced. Never physically deleted once
/// Posted; corrections go through reversing entries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JournalEntry {
    /// Unique identifier.
    pub id: JournalEntryId,
    /// Tenant this entry belongs to.
    pub tenant_id: TenantId,
    /// Accounting date of the entry.
    pub entry_date: NaiveDate,
    /// Human-readable description.
    pub description: String,
    /// Optional source document reference (e.g. invoice number).
    pub source_reference: Option<String>,
    /// Lifecycle status.
    pub status: EntryStatus,
    /// The entry's lines.
    pub lines: Vec<JournalLine>,
    /// Posting sequence number, assigned exactly once at post time.
    pub sequence_number: Option<i64>,
    /// Set on a reversing entry: the entry it reverses.
    pub reversal_of: Option<JournalEntryId>,
    /// Set on a reversed entry: the entry that reversed it.
    /// A back-reference only; written when the reversal is created.
    pub reversed_by: Option<JournalEntryId>,
    /// The user who created the entry.
    pub created_by: UserId,
    /// The user who last mutated the entry.
    pub updated_by: UserId,
    /// Optimistic concurrency version, bumped by the repository on update.
    pub version: i64,
}

impl JournalEntry {
    /// Creates a new draft entry with no lines.
    #[must_use]
    pub fn draft(
        tenant_id: TenantId,
        entry_date: NaiveDate,
        description: impl Into<String>,
        created_by: UserId,
    ) -> Self {
        Self {
            id: JournalEntryId::new(),
            tenant_id,
            entry_date,
            description: description.into(),
            source_reference: None,
            status: EntryStatus::Draft,
            lines: Vec::new(),
            sequence_number: None,
            reversal_of: None,
            reversed_by: None,
            created_by,
            updated_by: created_by,
            version: 0,
        }
    }

    /// Attaches a source document reference.
    #[must_use]
    pub fn with_source_reference(mut self, reference: impl Into<String>) -> Self {
        self.source_reference = Some(reference.into());
        self
    }

    /// Appends a line. The caller is responsible for checking editability
    /// (see `LedgerService::add_line` for the guarded path).
    pub fn push_line(&mut self, line: JournalLine) {
        self.lines.push(line);
    }
}
