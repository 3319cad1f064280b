//! Business rule validation for journal entries.

use keystone_shared::types::Money;

use super::error::LedgerError;
use super::types::{JournalEntry, JournalLine};

/// Validates that an entry is in postable shape: at least two lines, every
/// line in canonical form, and debits equal to credits to the exact minor
/// unit.
///
/// # Errors
///
/// Returns an error if the entry violates any posting rule.
pub fn validate_entry(entry: &JournalEntry) -> Result<(), LedgerError> {
    if entry.lines.len() < 2 {
        return Err(LedgerError::EmptyEntry(entry.id));
    }

    for line in &entry.lines {
        validate_line(line)?;
    }

    let scale = entry.lines[0].debit.scale();
    let debits = Money::sum(scale, entry.lines.iter().map(|l| &l.debit))?;
    let credits = Money::sum(scale, entry.lines.iter().map(|l| &l.credit))?;

    if debits != credits {
        return Err(LedgerError::UnbalancedEntry {
            id: entry.id,
            debits: debits.amount(),
            credits: credits.amount(),
        });
    }

    Ok(())
}

/// Validates a single line's canonical form: exactly one non-zero side,
/// neither side negative.
///
/// # Errors
///
/// Returns an error if the line is malformed.
pub fn validate_line(line: &JournalLine) -> Result<(), LedgerError> {
    if line.debit.is_negative() || line.credit.is_negative() {
        return Err(LedgerError::NegativeAmount {
            account_id: line.account_id,
        });
    }
    if line.debit.is_zero() == line.credit.is_zero() {
        return Err(LedgerError::InvalidLine {
            account_id: line.account_id,
        });
    }
    Ok(())
}
