//! Ledger service: journal entry lifecycle.
//!
//! Drives the entry state machine (Draft → PendingApproval → Posted →
//! Reversed) against injected repositories. The period-open check,
//! validation, and the state transition are evaluated as one unit; the
//! persistence collaborator's transaction boundary makes the unit atomic.

use keystone_shared::types::{JournalEntryId, JournalLineId, Money};

use super::error::LedgerError;
use super::types::{EntryStatus, JournalEntry, JournalLine};
use super::validation::{validate_entry, validate_line};
use crate::event::{AuditAction, AuditContext, AuditEvent, EventSink};
use crate::store::{JournalRepository, PeriodRepository, StoreError};

/// Ledger service for journal entry lifecycle operations.
///
/// Stateless; repositories and the event sink are injected per call.
pub struct LedgerService;

impl LedgerService {
    /// Persists a new draft entry.
    ///
    /// # Errors
    ///
    /// Returns an error if a line is malformed or the insert conflicts.
    pub fn create_draft<J>(journal: &mut J, entry: JournalEntry) -> Result<JournalEntry, LedgerError>
    where
        J: JournalRepository,
    {
        for line in &entry.lines {
            validate_line(line)?;
        }
        journal.insert_entry(entry).map_err(store_conflict)
    }

    /// Appends a line to a draft entry.
    ///
    /// # Errors
    ///
    /// Returns an error if the entry is not editable or the line is
    /// malformed.
    pub fn add_line<J>(
        journal: &mut J,
        entry_id: JournalEntryId,
        line: JournalLine,
    ) -> Result<JournalEntry, LedgerError>
    where
        J: JournalRepository,
    {
        let mut entry = journal
            .find_entry(entry_id)
            .ok_or(LedgerError::EntryNotFound(entry_id))?;
        if !entry.status.is_editable() {
            return Err(LedgerError::CannotModifyPosted(entry_id));
        }
        validate_line(&line)?;
        entry.push_line(line);
        journal.update_entry(entry).map_err(store_conflict)
    }

    /// Removes a line from a draft entry.
    ///
    /// # Errors
    ///
    /// Returns an error if the entry is not editable.
    pub fn remove_line<J>(
        journal: &mut J,
        entry_id: JournalEntryId,
        line_id: JournalLineId,
    ) -> Result<JournalEntry, LedgerError>
    where
        J: JournalRepository,
    {
        let mut entry = journal
            .find_entry(entry_id)
            .ok_or(LedgerError::EntryNotFound(entry_id))?;
        if !entry.status.is_editable() {
            return Err(LedgerError::CannotModifyPosted(entry_id));
        }
        entry.lines.retain(|l| l.id != line_id);
        journal.update_entry(entry).map_err(store_conflict)
    }

    /// Submits a draft entry for approval.
    ///
    /// # Errors
    ///
    /// Returns an error if the entry is not a draft or fails validation.
    pub fn submit<J>(journal: &mut J, entry_id: JournalEntryId) -> Result<JournalEntry, LedgerError>
    where
        J: JournalRepository,
    {
        let mut entry = journal
            .find_entry(entry_id)
            .ok_or(LedgerError::EntryNotFound(entry_id))?;
        if entry.status != EntryStatus::Draft {
            return Err(LedgerError::CannotModifyPosted(entry_id));
        }
        validate_entry(&entry)?;
        entry.status = EntryStatus::PendingApproval;
        journal.update_entry(entry).map_err(store_conflict)
    }

    /// Posts an entry to the ledger.
    ///
    /// Validates balance, checks the entry date's fiscal period is open,
    /// assigns an immutable sequence number, and transitions the entry to
    /// Posted. Idempotent: a second post of an already-posted entry is a
    /// no-op, not a duplicate posting.
    ///
    /// # Errors
    ///
    /// Returns an error if validation fails, the period is closed, or the
    /// transition conflicts with a concurrent writer.
    pub fn post<J, P, E>(
        journal: &mut J,
        periods: &P,
        events: &E,
        entry_id: JournalEntryId,
        ctx: &AuditContext,
    ) -> Result<JournalEntry, LedgerError>
    where
        J: JournalRepository,
        P: PeriodRepository,
        E: EventSink,
    {
        let mut entry = journal
            .find_entry(entry_id)
            .ok_or(LedgerError::EntryNotFound(entry_id))?;

        if !entry.status.is_postable() {
            // Posted and Reversed are terminal states
            tracing::debug!(entry_id = %entry_id, "re-post of posted entry is a no-op");
            return Ok(entry);
        }

        validate_entry(&entry)?;
        check_period_open(periods, &entry)?;

        entry.status = EntryStatus::Posted;
        entry.sequence_number = Some(journal.next_sequence());
        entry.updated_by = ctx.user_id;
        let entry = journal.update_entry(entry).map_err(store_conflict)?;

        let total = entry_total(&entry)?;
        events.emit(
            AuditEvent::new(
                "journal_entry",
                entry.id.into_inner(),
                AuditAction::EntryPosted,
                ctx,
            )
            .with_amounts(None, Some(total)),
        );
        tracing::info!(
            entry_id = %entry.id,
            sequence = entry.sequence_number,
            date = %entry.entry_date,
            "journal entry posted"
        );
        Ok(entry)
    }

    /// Reverses a posted entry.
    ///
    /// Creates a new balanced entry with every line's debit and credit
    /// swapped, referencing the original, and posts it through the same
    /// validation path. The original's lines are never mutated; it gains
    /// only the `reversed_by` back-reference and the Reversed status.
    /// An entry can be reversed exactly once.
    ///
    /// # Errors
    ///
    /// Returns an error if the entry is not posted, already reversed, or
    /// the reversal date's period is closed.
    pub fn reverse<J, P, E>(
        journal: &mut J,
        periods: &P,
        events: &E,
        entry_id: JournalEntryId,
        reason: &str,
        reversal_date: chrono::NaiveDate,
        ctx: &AuditContext,
    ) -> Result<JournalEntry, LedgerError>
    where
        J: JournalRepository,
        P: PeriodRepository,
        E: EventSink,
    {
        let mut original = journal
            .find_entry(entry_id)
            .ok_or(LedgerError::EntryNotFound(entry_id))?;

        match original.status {
            EntryStatus::Posted => {}
            EntryStatus::Reversed => {
                return Err(LedgerError::AlreadyReversed {
                    id: entry_id,
                    reversed_by: original.reversed_by.unwrap_or(entry_id),
                });
            }
            _ => return Err(LedgerError::NotPosted(entry_id)),
        }
        if let Some(reversed_by) = original.reversed_by {
            return Err(LedgerError::AlreadyReversed {
                id: entry_id,
                reversed_by,
            });
        }

        let mut reversal = JournalEntry::draft(
            original.tenant_id,
            reversal_date,
            format!("Reversal of entry {entry_id}. Reason: {reason}"),
            ctx.user_id,
        );
        reversal.source_reference = original.source_reference.clone();
        reversal.reversal_of = Some(original.id);
        reversal.lines = original.lines.iter().map(JournalLine::swapped).collect();

        // The reversal goes through the same gates as any other posting
        validate_entry(&reversal)?;
        check_period_open(periods, &reversal)?;

        reversal.status = EntryStatus::Posted;
        reversal.sequence_number = Some(journal.next_sequence());
        let reversal = journal.insert_entry(reversal).map_err(store_conflict)?;

        original.status = EntryStatus::Reversed;
        original.reversed_by = Some(reversal.id);
        original.updated_by = ctx.user_id;
        let original = journal.update_entry(original).map_err(store_conflict)?;

        let total = entry_total(&reversal)?;
        events.emit(
            AuditEvent::new(
                "journal_entry",
                original.id.into_inner(),
                AuditAction::EntryReversed,
                ctx,
            )
            .with_amounts(Some(total), Some(total.negate())),
        );
        tracing::info!(
            entry_id = %original.id,
            reversal_id = %reversal.id,
            reason,
            "journal entry reversed"
        );
        Ok(reversal)
    }
}

/// Fails with `PeriodClosed` unless the entry date's period exists and is
/// open.
fn check_period_open<P: PeriodRepository>(
    periods: &P,
    entry: &JournalEntry,
) -> Result<(), LedgerError> {
    let period = periods
        .period_for_date(entry.entry_date)
        .ok_or(LedgerError::NoFiscalPeriod(entry.entry_date))?;
    if !period.is_open() {
        return Err(LedgerError::PeriodClosed {
            date: entry.entry_date,
        });
    }
    Ok(())
}

/// Total posted amount of an entry (sum of debits).
fn entry_total(entry: &JournalEntry) -> Result<Money, LedgerError> {
    let scale = entry.lines.first().map_or(2, |l| l.debit.scale());
    Ok(Money::sum(scale, entry.lines.iter().map(|l| &l.debit))?)
}

/// Any storage surprise after the initial read is an isolation conflict:
/// the caller retries the whole command.
fn store_conflict(_: StoreError) -> LedgerError {
    LedgerError::ConcurrentModification
}
