//! Fiscal period lifecycle: close and year-end processing.
//!
//! Period close and year-end are coarse-grained, operator-triggered
//! operations. The persistence collaborator excludes new postings into the
//! affected period for their duration; this service assumes that exclusion
//! and focuses on the accounting rules.

use std::collections::HashMap;

use keystone_shared::types::{AccountId, FiscalPeriodId, FiscalYearId, Money};

use super::error::FiscalError;
use super::period::{FiscalPeriod, FiscalYear, PeriodStatus};
use crate::event::{AuditAction, AuditContext, AuditEvent, EventSink};
use crate::ledger::types::{AccountType, JournalEntry, JournalLine};
use crate::ledger::{LedgerError, LedgerService};
use crate::store::{AccountRepository, JournalRepository, PeriodRepository};

/// Outcome of a year-end close.
#[derive(Debug)]
pub struct YearEndResult {
    /// Net income for the year (revenue minus expenses).
    pub net_income: Money,
    /// The posted closing entry; `None` when the year had no revenue or
    /// expense activity.
    pub closing_entry: Option<JournalEntry>,
    /// The year's final period, now closed.
    pub closed_period: FiscalPeriod,
}

/// Fiscal period service.
///
/// Stateless; repositories and the event sink are injected per call.
pub struct FiscalService;

impl FiscalService {
    /// Validates that a year's periods are contiguous and non-overlapping
    /// when ordered by period number.
    ///
    /// # Errors
    ///
    /// Returns [`FiscalError::NonContiguousPeriods`] on a gap or overlap.
    pub fn validate_calendar(periods: &[FiscalPeriod]) -> Result<(), FiscalError> {
        let mut ordered: Vec<&FiscalPeriod> = periods.iter().collect();
        ordered.sort_by_key(|p| p.period_number);
        for pair in ordered.windows(2) {
            if pair[0].end_date.succ_opt() != Some(pair[1].start_date) {
                return Err(FiscalError::NonContiguousPeriods {
                    after_period: pair[0].period_number,
                });
            }
        }
        Ok(())
    }

    /// Registers a validated set of periods for a new fiscal year.
    ///
    /// # Errors
    ///
    /// Returns an error if the calendar is malformed, a period falls
    /// outside the year, or an insert conflicts.
    pub fn open_year<P>(
        periods: &mut P,
        year: &FiscalYear,
        year_periods: Vec<FiscalPeriod>,
    ) -> Result<(), FiscalError>
    where
        P: PeriodRepository,
    {
        Self::validate_calendar(&year_periods)?;
        for period in &year_periods {
            if period.fiscal_year_id != year.id
                || period.start_date < year.start_date
                || period.end_date > year.end_date
            {
                return Err(FiscalError::PeriodOutsideYear {
                    period_number: period.period_number,
                });
            }
        }
        for period in year_periods {
            periods
                .insert_period(period)
                .map_err(|_| FiscalError::Ledger(LedgerError::ConcurrentModification))?;
        }
        Ok(())
    }

    /// Closes a fiscal period.
    ///
    /// Periods close in chronological order only, and only with a balanced
    /// trial balance. Closed is terminal.
    ///
    /// # Errors
    ///
    /// Returns an error if the period is unknown, already closed, an
    /// earlier period is still open, or the trial balance is off.
    pub fn close_period<J, P, E>(
        journal: &J,
        periods: &mut P,
        events: &E,
        period_id: FiscalPeriodId,
        ctx: &AuditContext,
    ) -> Result<FiscalPeriod, FiscalError>
    where
        J: JournalRepository,
        P: PeriodRepository,
        E: EventSink,
    {
        let mut period = periods
            .find_period(period_id)
            .ok_or(FiscalError::PeriodNotFound(period_id))?;
        if !period.is_open() {
            return Err(FiscalError::PeriodAlreadyClosed(period_id));
        }

        let siblings = periods.periods_for_year(period.fiscal_year_id);
        if let Some(earlier) = siblings
            .iter()
            .find(|p| p.period_number < period.period_number && p.is_open())
        {
            return Err(FiscalError::PriorPeriodOpen {
                period_number: earlier.period_number,
            });
        }

        Self::check_trial_balance(journal, &period)?;

        period.status = PeriodStatus::Closed;
        periods
            .update_period(period.clone())
            .map_err(|_| FiscalError::Ledger(LedgerError::ConcurrentModification))?;

        events.emit(AuditEvent::new(
            "fiscal_period",
            period.id.into_inner(),
            AuditAction::PeriodClosed,
            ctx,
        ));
        tracing::info!(
            period_id = %period.id,
            period = period.period_number,
            "fiscal period closed"
        );
        Ok(period)
    }

    /// Closes a fiscal year: computes net income, posts one closing entry
    /// zeroing revenue and expense accounts into retained earnings, and
    /// closes the final period.
    ///
    /// The operation runs inside one all-or-nothing transaction boundary
    /// provided by the persistence collaborator. If the period close fails
    /// after the closing entry posted, the partial state is reported as the
    /// fatal [`FiscalError::YearEndInconsistency`].
    ///
    /// # Errors
    ///
    /// Returns an error if preconditions fail or the close partially
    /// applies.
    pub fn process_year_end<J, P, A, E>(
        journal: &mut J,
        periods: &mut P,
        accounts: &A,
        events: &E,
        fiscal_year_id: FiscalYearId,
        retained_earnings: AccountId,
        ctx: &AuditContext,
    ) -> Result<YearEndResult, FiscalError>
    where
        J: JournalRepository,
        P: PeriodRepository,
        A: AccountRepository,
        E: EventSink,
    {
        let year_periods = periods.periods_for_year(fiscal_year_id);
        let (Some(first), Some(last)) = (year_periods.first(), year_periods.last()) else {
            return Err(FiscalError::YearNotFound(fiscal_year_id));
        };
        let final_period = last.clone();
        if !final_period.is_open() {
            return Err(FiscalError::PeriodAlreadyClosed(final_period.id));
        }
        if let Some(earlier) = year_periods
            .iter()
            .find(|p| p.period_number < final_period.period_number && p.is_open())
        {
            return Err(FiscalError::PriorPeriodOpen {
                period_number: earlier.period_number,
            });
        }
        let year_start = first.start_date;
        let year_end = final_period.end_date;

        // Net each revenue/expense account over the year from posted lines
        let entries = journal.posted_entries_in_range(year_start, year_end);
        let scale = entries
            .iter()
            .flat_map(|e| e.lines.first())
            .map(|l| l.debit.scale())
            .next()
            .unwrap_or(2);
        let mut totals: HashMap<AccountId, (Money, Money)> = HashMap::new();
        for line in entries.iter().flat_map(|e| e.lines.iter()) {
            let slot = totals
                .entry(line.account_id)
                .or_insert((Money::zero(scale), Money::zero(scale)));
            slot.0 = slot.0.checked_add(line.debit)?;
            slot.1 = slot.1.checked_add(line.credit)?;
        }

        let mut lines = Vec::new();
        let mut revenue_total = Money::zero(scale);
        for account in accounts.accounts_by_type(AccountType::Revenue) {
            let Some((debit, credit)) = totals.get(&account.id) else {
                continue;
            };
            let balance = credit.checked_sub(*debit)?;
            if balance.is_positive() {
                lines.push(JournalLine::debit(account.id, balance));
            } else if balance.is_negative() {
                lines.push(JournalLine::credit(account.id, balance.abs()));
            }
            revenue_total = revenue_total.checked_add(balance)?;
        }
        let mut expense_total = Money::zero(scale);
        for account in accounts.accounts_by_type(AccountType::Expense) {
            let Some((debit, credit)) = totals.get(&account.id) else {
                continue;
            };
            let balance = debit.checked_sub(*credit)?;
            if balance.is_positive() {
                lines.push(JournalLine::credit(account.id, balance));
            } else if balance.is_negative() {
                lines.push(JournalLine::debit(account.id, balance.abs()));
            }
            expense_total = expense_total.checked_add(balance)?;
        }

        let net_income = revenue_total.checked_sub(expense_total)?;
        if net_income.is_positive() {
            lines.push(JournalLine::credit(retained_earnings, net_income));
        } else if net_income.is_negative() {
            lines.push(JournalLine::debit(retained_earnings, net_income.abs()));
        }

        let closing_entry = if lines.is_empty() {
            None
        } else {
            let mut entry = JournalEntry::draft(
                ctx.tenant_id,
                year_end,
                format!("Year-end closing for fiscal year {fiscal_year_id}"),
                ctx.user_id,
            );
            entry.lines = lines;
            let entry = LedgerService::create_draft(journal, entry)?;
            Some(LedgerService::post(journal, &*periods, events, entry.id, ctx)?)
        };

        let closed_period =
            match Self::close_period(journal, periods, events, final_period.id, ctx) {
                Ok(period) => period,
                Err(e) => {
                    // Preconditions were checked up front, so failing here
                    // with the closing entry already posted means the close
                    // partially applied
                    if let Some(entry) = &closing_entry {
                        return Err(FiscalError::YearEndInconsistency {
                            fiscal_year_id,
                            detail: format!(
                                "closing entry {} posted but period close failed: {e}",
                                entry.id
                            ),
                        });
                    }
                    return Err(e);
                }
            };

        events.emit(
            AuditEvent::new(
                "fiscal_year",
                fiscal_year_id.into_inner(),
                AuditAction::YearEndClosed,
                ctx,
            )
            .with_amounts(None, Some(net_income)),
        );
        tracing::info!(
            fiscal_year_id = %fiscal_year_id,
            net_income = %net_income,
            "fiscal year closed"
        );

        Ok(YearEndResult {
            net_income,
            closing_entry,
            closed_period,
        })
    }

    /// Redundant balance check over every posted entry in the period,
    /// guarding against external data corruption.
    fn check_trial_balance<J>(journal: &J, period: &FiscalPeriod) -> Result<(), FiscalError>
    where
        J: JournalRepository,
    {
        let entries = journal.posted_entries_in_range(period.start_date, period.end_date);
        let scale = entries
            .iter()
            .flat_map(|e| e.lines.first())
            .map(|l| l.debit.scale())
            .next()
            .unwrap_or(2);
        let debits = Money::sum(
            scale,
            entries.iter().flat_map(|e| e.lines.iter()).map(|l| &l.debit),
        )?;
        let credits = Money::sum(
            scale,
            entries
                .iter()
                .flat_map(|e| e.lines.iter())
                .map(|l| &l.credit),
        )?;
        if debits != credits {
            return Err(FiscalError::UnbalancedPeriod {
                period_id: period.id,
                debits: debits.amount(),
                credits: credits.amount(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{MemorySink, NullSink};
    use crate::ledger::types::{Account, EntryStatus};
    use crate::store::MemoryLedger;
    use chrono::NaiveDate;
    use keystone_shared::types::{TenantId, UserId};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn money(minor: i64) -> Money {
        Money::from_minor_units(minor, 2)
    }

    fn ctx() -> AuditContext {
        AuditContext {
            tenant_id: TenantId::new(),
            user_id: UserId::new(),
        }
    }

    fn month(
        year_id: FiscalYearId,
        number: i32,
        start: NaiveDate,
        end: NaiveDate,
    ) -> FiscalPeriod {
        FiscalPeriod {
            id: FiscalPeriodId::new(),
            fiscal_year_id: year_id,
            period_number: number,
            name: format!("P{number}"),
            start_date: start,
            end_date: end,
            status: PeriodStatus::Open,
        }
    }

    fn fy2026(year_id: FiscalYearId) -> FiscalYear {
        FiscalYear {
            id: year_id,
            tenant_id: TenantId::new(),
            name: "FY2026".to_string(),
            start_date: date(2026, 1, 1),
            end_date: date(2026, 12, 31),
        }
    }

    fn quarter_year(periods: &mut MemoryLedger) -> (FiscalYearId, Vec<FiscalPeriodId>) {
        let year_id = FiscalYearId::new();
        let quarters = vec![
            month(year_id, 1, date(2026, 1, 1), date(2026, 3, 31)),
            month(year_id, 2, date(2026, 4, 1), date(2026, 6, 30)),
            month(year_id, 3, date(2026, 7, 1), date(2026, 9, 30)),
            month(year_id, 4, date(2026, 10, 1), date(2026, 12, 31)),
        ];
        let ids = quarters.iter().map(|p| p.id).collect();
        FiscalService::open_year(periods, &fy2026(year_id), quarters).unwrap();
        (year_id, ids)
    }

    fn account(accounts: &mut MemoryLedger, code: &str, account_type: AccountType) -> AccountId {
        let account = Account {
            id: AccountId::new(),
            tenant_id: TenantId::new(),
            code: code.to_string(),
            name: code.to_string(),
            account_type,
            is_active: true,
        };
        let id = account.id;
        accounts.insert_account(account).unwrap();
        id
    }

    fn post_entry(
        journal: &mut MemoryLedger,
        periods: &MemoryLedger,
        entry_date: NaiveDate,
        lines: Vec<JournalLine>,
    ) -> JournalEntry {
        let mut entry = JournalEntry::draft(TenantId::new(), entry_date, "test", UserId::new());
        entry.lines = lines;
        let entry = LedgerService::create_draft(journal, entry).unwrap();
        LedgerService::post(journal, periods, &NullSink, entry.id, &ctx()).unwrap()
    }

    #[test]
    fn test_validate_calendar_contiguous() {
        let year_id = FiscalYearId::new();
        let periods = vec![
            month(year_id, 1, date(2026, 1, 1), date(2026, 1, 31)),
            month(year_id, 2, date(2026, 2, 1), date(2026, 2, 28)),
        ];
        assert!(FiscalService::validate_calendar(&periods).is_ok());
    }

    #[test]
    fn test_validate_calendar_gap() {
        let year_id = FiscalYearId::new();
        let periods = vec![
            month(year_id, 1, date(2026, 1, 1), date(2026, 1, 31)),
            month(year_id, 2, date(2026, 2, 2), date(2026, 2, 28)),
        ];
        assert!(matches!(
            FiscalService::validate_calendar(&periods),
            Err(FiscalError::NonContiguousPeriods { after_period: 1 })
        ));
    }

    #[test]
    fn test_validate_calendar_overlap() {
        let year_id = FiscalYearId::new();
        let periods = vec![
            month(year_id, 1, date(2026, 1, 1), date(2026, 1, 31)),
            month(year_id, 2, date(2026, 1, 31), date(2026, 2, 28)),
        ];
        assert!(matches!(
            FiscalService::validate_calendar(&periods),
            Err(FiscalError::NonContiguousPeriods { .. })
        ));
    }

    #[test]
    fn test_open_year_rejects_period_outside_year() {
        let mut periods = MemoryLedger::new();
        let year_id = FiscalYearId::new();
        let spill = vec![
            month(year_id, 1, date(2026, 1, 1), date(2026, 6, 30)),
            month(year_id, 2, date(2026, 7, 1), date(2027, 1, 15)),
        ];
        let result = FiscalService::open_year(&mut periods, &fy2026(year_id), spill);
        assert!(matches!(
            result,
            Err(FiscalError::PeriodOutsideYear { period_number: 2 })
        ));
    }

    #[test]
    fn test_close_period_in_order() {
        let journal = MemoryLedger::new();
        let mut periods = MemoryLedger::new();
        let (_, ids) = quarter_year(&mut periods);
        let sink = MemorySink::new();

        let closed =
            FiscalService::close_period(&journal, &mut periods, &sink, ids[0], &ctx()).unwrap();
        assert_eq!(closed.status, PeriodStatus::Closed);
        assert_eq!(sink.events().len(), 1);
        assert_eq!(sink.events()[0].action, AuditAction::PeriodClosed);
    }

    #[test]
    fn test_close_period_out_of_order_fails() {
        let journal = MemoryLedger::new();
        let mut periods = MemoryLedger::new();
        let (_, ids) = quarter_year(&mut periods);

        let result = FiscalService::close_period(&journal, &mut periods, &NullSink, ids[2], &ctx());
        assert!(matches!(result, Err(FiscalError::PriorPeriodOpen { .. })));
    }

    #[test]
    fn test_close_closed_period_fails() {
        let journal = MemoryLedger::new();
        let mut periods = MemoryLedger::new();
        let (_, ids) = quarter_year(&mut periods);

        FiscalService::close_period(&journal, &mut periods, &NullSink, ids[0], &ctx()).unwrap();
        let again = FiscalService::close_period(&journal, &mut periods, &NullSink, ids[0], &ctx());
        assert!(matches!(again, Err(FiscalError::PeriodAlreadyClosed(_))));
    }

    #[test]
    fn test_close_period_detects_corrupted_trial_balance() {
        let mut journal = MemoryLedger::new();
        let mut periods = MemoryLedger::new();
        let (_, ids) = quarter_year(&mut periods);

        // Simulate external corruption: a posted entry bypassing validation
        let mut corrupted =
            JournalEntry::draft(TenantId::new(), date(2026, 1, 15), "bad", UserId::new());
        corrupted.lines = vec![
            JournalLine::debit(AccountId::new(), money(10_000)),
            JournalLine::credit(AccountId::new(), money(9_000)),
        ];
        corrupted.status = EntryStatus::Posted;
        corrupted.sequence_number = Some(1);
        journal.insert_entry(corrupted).unwrap();

        let result = FiscalService::close_period(&journal, &mut periods, &NullSink, ids[0], &ctx());
        assert!(matches!(result, Err(FiscalError::UnbalancedPeriod { .. })));
    }

    #[test]
    fn test_year_end_posts_closing_entry_and_closes_period() {
        let mut journal = MemoryLedger::new();
        let mut periods = MemoryLedger::new();
        let mut accounts = MemoryLedger::new();
        let (year_id, ids) = quarter_year(&mut periods);

        let cash = account(&mut accounts, "1000", AccountType::Asset);
        let revenue = account(&mut accounts, "4000", AccountType::Revenue);
        let expense = account(&mut accounts, "5000", AccountType::Expense);
        let retained = account(&mut accounts, "3900", AccountType::Equity);

        // Revenue 50,000.00 and expenses 30,000.00 over the year
        post_entry(
            &mut journal,
            &periods,
            date(2026, 2, 10),
            vec![
                JournalLine::debit(cash, money(5_000_000)),
                JournalLine::credit(revenue, money(5_000_000)),
            ],
        );
        post_entry(
            &mut journal,
            &periods,
            date(2026, 5, 10),
            vec![
                JournalLine::debit(expense, money(3_000_000)),
                JournalLine::credit(cash, money(3_000_000)),
            ],
        );

        // Close the first three quarters
        for id in &ids[..3] {
            FiscalService::close_period(&journal, &mut periods, &NullSink, *id, &ctx()).unwrap();
        }

        let sink = MemorySink::new();
        let result = FiscalService::process_year_end(
            &mut journal,
            &mut periods,
            &accounts,
            &sink,
            year_id,
            retained,
            &ctx(),
        )
        .unwrap();

        // Net income 20,000.00 credited to retained earnings
        assert_eq!(result.net_income, money(2_000_000));
        let closing = result.closing_entry.unwrap();
        assert_eq!(closing.status, EntryStatus::Posted);
        let retained_line = closing
            .lines
            .iter()
            .find(|l| l.account_id == retained)
            .unwrap();
        assert_eq!(retained_line.credit, money(2_000_000));

        // Final period is closed; revenue and expense accounts are zeroed
        assert_eq!(result.closed_period.status, PeriodStatus::Closed);
        let revenue_balance =
            crate::ledger::account_balance(&journal, &accounts, revenue, date(2026, 12, 31))
                .unwrap();
        assert!(revenue_balance.balance.is_zero());
        let expense_balance =
            crate::ledger::account_balance(&journal, &accounts, expense, date(2026, 12, 31))
                .unwrap();
        assert!(expense_balance.balance.is_zero());

        // Both the year-end event and the period-closed event fired
        let actions: Vec<AuditAction> = sink.events().iter().map(|e| e.action).collect();
        assert!(actions.contains(&AuditAction::YearEndClosed));
        assert!(actions.contains(&AuditAction::PeriodClosed));
    }

    #[test]
    fn test_year_end_requires_earlier_periods_closed() {
        let mut journal = MemoryLedger::new();
        let mut periods = MemoryLedger::new();
        let mut accounts = MemoryLedger::new();
        let (year_id, _) = quarter_year(&mut periods);
        let retained = account(&mut accounts, "3900", AccountType::Equity);

        let result = FiscalService::process_year_end(
            &mut journal,
            &mut periods,
            &accounts,
            &NullSink,
            year_id,
            retained,
            &ctx(),
        );
        assert!(matches!(result, Err(FiscalError::PriorPeriodOpen { .. })));
    }

    #[test]
    fn test_year_end_with_no_activity_closes_without_entry() {
        let mut journal = MemoryLedger::new();
        let mut periods = MemoryLedger::new();
        let mut accounts = MemoryLedger::new();
        let (year_id, ids) = quarter_year(&mut periods);
        let retained = account(&mut accounts, "3900", AccountType::Equity);

        for id in &ids[..3] {
            FiscalService::close_period(&journal, &mut periods, &NullSink, *id, &ctx()).unwrap();
        }

        let result = FiscalService::process_year_end(
            &mut journal,
            &mut periods,
            &accounts,
            &NullSink,
            year_id,
            retained,
            &ctx(),
        )
        .unwrap();

        assert!(result.closing_entry.is_none());
        assert!(result.net_income.is_zero());
        assert_eq!(result.closed_period.status, PeriodStatus::Closed);
    }

    #[test]
    fn test_year_end_on_closed_year_fails() {
        let mut journal = MemoryLedger::new();
        let mut periods = MemoryLedger::new();
        let mut accounts = MemoryLedger::new();
        let (year_id, ids) = quarter_year(&mut periods);
        let retained = account(&mut accounts, "3900", AccountType::Equity);

        for id in &ids {
            FiscalService::close_period(&journal, &mut periods, &NullSink, *id, &ctx()).unwrap();
        }

        let result = FiscalService::process_year_end(
            &mut journal,
            &mut periods,
            &accounts,
            &NullSink,
            year_id,
            retained,
            &ctx(),
        );
        assert!(matches!(result, Err(FiscalError::PeriodAlreadyClosed(_))));
    }

    #[test]
    fn test_year_end_with_net_loss_debits_retained_earnings() {
        let mut journal = MemoryLedger::new();
        let mut periods = MemoryLedger::new();
        let mut accounts = MemoryLedger::new();
        let (year_id, ids) = quarter_year(&mut periods);

        let cash = account(&mut accounts, "1000", AccountType::Asset);
        let revenue = account(&mut accounts, "4000", AccountType::Revenue);
        let expense = account(&mut accounts, "5000", AccountType::Expense);
        let retained = account(&mut accounts, "3900", AccountType::Equity);

        post_entry(
            &mut journal,
            &periods,
            date(2026, 2, 10),
            vec![
                JournalLine::debit(cash, money(1_000_000)),
                JournalLine::credit(revenue, money(1_000_000)),
            ],
        );
        post_entry(
            &mut journal,
            &periods,
            date(2026, 5, 10),
            vec![
                JournalLine::debit(expense, money(2_500_000)),
                JournalLine::credit(cash, money(2_500_000)),
            ],
        );

        for id in &ids[..3] {
            FiscalService::close_period(&journal, &mut periods, &NullSink, *id, &ctx()).unwrap();
        }

        let result = FiscalService::process_year_end(
            &mut journal,
            &mut periods,
            &accounts,
            &NullSink,
            year_id,
            retained,
            &ctx(),
        )
        .unwrap();

        assert_eq!(result.net_income, money(-1_500_000));
        let closing = result.closing_entry.unwrap();
        let retained_line = closing
            .lines
            .iter()
            .find(|l| l.account_id == retained)
            .unwrap();
        assert_eq!(retained_line.debit, money(1_500_000));
    }
}
