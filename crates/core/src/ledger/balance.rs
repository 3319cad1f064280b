//! Account balance calculations.
//!
//! Balances are derived purely from the immutable history of posted lines.
//! A cache, where present, is a recomputable projection and never the
//! source of truth.

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use keystone_shared::types::{AccountId, Money, MoneyError};

use super::error::LedgerError;
use super::types::NormalBalance;
use crate::store::{AccountRepository, JournalRepository};

impl NormalBalance {
    /// Signed balance change of one line, net of the account's normal side.
    ///
    /// Debit-normal: debit - credit. Credit-normal: credit - debit.
    pub fn balance_change(self, debit: Money, credit: Money) -> Result<Money, MoneyError> {
        match self {
            Self::Debit => debit.checked_sub(credit),
            Self::Credit => credit.checked_sub(debit),
        }
    }
}

/// An account balance at a point in time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountBalance {
    /// The account.
    pub account_id: AccountId,
    /// Total posted debits up to the as-of date.
    pub debit_total: Money,
    /// Total posted credits up to the as-of date.
    pub credit_total: Money,
    /// Net balance, signed per the account's normal side.
    pub balance: Money,
}

/// Computes an account's balance as of a date by summing all posted lines,
/// net of the account's normal balance side.
///
/// # Errors
///
/// Returns an error if the account does not exist or amounts mix scales.
pub fn account_balance<J, A>(
    journal: &J,
    accounts: &A,
    account_id: AccountId,
    as_of: NaiveDate,
) -> Result<AccountBalance, LedgerError>
where
    J: JournalRepository,
    A: AccountRepository,
{
    let account = accounts
        .find_account(account_id)
        .ok_or(LedgerError::AccountNotFound(account_id))?;

    let lines = journal.posted_lines_for_account(account_id, as_of);
    let scale = lines.first().map_or(2, |l| l.debit.scale());

    let debit_total = Money::sum(scale, lines.iter().map(|l| &l.debit))?;
    let credit_total = Money::sum(scale, lines.iter().map(|l| &l.credit))?;
    let balance = account
        .normal_balance()
        .balance_change(debit_total, credit_total)?;

    Ok(AccountBalance {
        account_id,
        debit_total,
        credit_total,
        balance,
    })
}

/// A recomputable balance cache for one as-of date.
///
/// The projection is never authoritative: any posting touching an account
/// must invalidate its slot, after which the next read recomputes from the
/// posted-line history.
#[derive(Debug)]
pub struct BalanceProjection {
    as_of: NaiveDate,
    cached: HashMap<AccountId, AccountBalance>,
}

impl BalanceProjection {
    /// Creates an empty projection for the given as-of date.
    #[must_use]
    pub fn new(as_of: NaiveDate) -> Self {
        Self {
            as_of,
            cached: HashMap::new(),
        }
    }

    /// Returns the cached balance or recomputes it from posted lines.
    ///
    /// # Errors
    ///
    /// Propagates [`account_balance`] errors.
    pub fn get_or_compute<J, A>(
        &mut self,
        journal: &J,
        accounts: &A,
        account_id: AccountId,
    ) -> Result<AccountBalance, LedgerError>
    where
        J: JournalRepository,
        A: AccountRepository,
    {
        if let Some(balance) = self.cached.get(&account_id) {
            return Ok(balance.clone());
        }
        let balance = account_balance(journal, accounts, account_id, self.as_of)?;
        self.cached.insert(account_id, balance.clone());
        Ok(balance)
    }

    /// Invalidates the cached slots of every account touched by a posting.
    pub fn invalidate_accounts<'a>(&mut self, accounts: impl IntoIterator<Item = &'a AccountId>) {
        for account_id in accounts {
            self.cached.remove(account_id);
        }
    }

    /// Returns the as-of date this projection serves.
    #[must_use]
    pub fn as_of(&self) -> NaiveDate {
        self.as_of
    }
}
