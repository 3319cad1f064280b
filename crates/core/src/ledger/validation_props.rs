//! Property-based tests for journal entry validation and reversal.

use chrono::NaiveDate;
use proptest::prelude::*;

use keystone_shared::types::{AccountId, Money, TenantId, UserId};

use super::types::{JournalEntry, JournalLine};
use super::validation::validate_entry;

fn make_entry(lines: Vec<JournalLine>) -> JournalEntry {
    let mut entry = JournalEntry::draft(
        TenantId::new(),
        NaiveDate::from_ymd_opt(2026, 1, 15).unwrap(),
        "prop entry",
        UserId::new(),
    );
    entry.lines = lines;
    entry
}

/// Strategy for positive minor-unit amounts (0.01 to 1,000,000.00).
fn amount_strategy() -> impl Strategy<Value = i64> {
    1i64..100_000_000
}

/// Strategy for a balanced entry: N debit amounts mirrored by one credit
/// line carrying their sum.
fn balanced_lines_strategy() -> impl Strategy<Value = Vec<JournalLine>> {
    prop::collection::vec(amount_strategy(), 1..8).prop_map(|debits| {
        let total: i64 = debits.iter().sum();
        let mut lines: Vec<JournalLine> = debits
            .into_iter()
            .map(|minor| JournalLine::debit(AccountId::new(), Money::from_minor_units(minor, 2)))
            .collect();
        lines.push(JournalLine::credit(
            AccountId::new(),
            Money::from_minor_units(total, 2),
        ));
        lines
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Any entry whose debits mirror its credits validates.
    #[test]
    fn prop_balanced_entries_validate(lines in balanced_lines_strategy()) {
        let entry = make_entry(lines);
        prop_assert!(validate_entry(&entry).is_ok());
    }

    /// Skewing one line by a single minor unit breaks the balance.
    #[test]
    fn prop_one_minor_unit_skew_is_unbalanced(lines in balanced_lines_strategy()) {
        let mut lines = lines;
        let last = lines.last_mut().unwrap();
        let skewed = last
            .credit
            .checked_add(Money::from_minor_units(1, 2))
            .unwrap();
        last.credit = skewed;

        let entry = make_entry(lines);
        prop_assert!(validate_entry(&entry).is_err());
    }

    /// Swapping every line's debit and credit preserves balance: a
    /// reversal built from a balanced entry always validates.
    #[test]
    fn prop_swapped_entry_stays_balanced(lines in balanced_lines_strategy()) {
        let swapped: Vec<JournalLine> = lines.iter().map(JournalLine::swapped).collect();
        let entry = make_entry(swapped);
        prop_assert!(validate_entry(&entry).is_ok());
    }

    /// Swapping is an involution on the amounts: swapping twice restores
    /// every line's debit and credit.
    #[test]
    fn prop_swap_twice_restores_amounts(lines in balanced_lines_strategy()) {
        for line in &lines {
            let round_trip = line.swapped().swapped();
            prop_assert_eq!(round_trip.debit, line.debit);
            prop_assert_eq!(round_trip.credit, line.credit);
            prop_assert_eq!(round_trip.account_id, line.account_id);
        }
    }
}
