//! Currency balances for the in-memory escrow gateway.
//!
//! Tracks per-account balances and the allowance each account has granted
//! the ledger. All mutations are atomic: either the full operation succeeds
//! or the entry is unchanged.

use std::collections::HashMap;

use realty_types::{AccountId, RealtyError, Result};
use rust_decimal::Decimal;

/// One account's currency position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AccountBalance {
    /// Spendable currency.
    pub balance: Decimal,
    /// Amount the account has approved the ledger to pull.
    pub allowance: Decimal,
}

/// Source of truth for account balances outside escrow.
#[derive(Debug, Default)]
pub struct BalanceManager {
    accounts: HashMap<AccountId, AccountBalance>,
}

impl BalanceManager {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fund an account (increases balance).
    pub fn deposit(&mut self, account: AccountId, amount: Decimal) {
        self.accounts.entry(account).or_default().balance += amount;
    }

    /// Set the allowance an account grants the ledger.
    pub fn approve(&mut self, account: AccountId, amount: Decimal) {
        self.accounts.entry(account).or_default().allowance = amount;
    }

    /// Pull `amount` against the account's allowance.
    ///
    /// # Errors
    /// `InsufficientAllowance` if approved < amount, `InsufficientBalance`
    /// if balance < amount.
    pub fn debit_with_allowance(&mut self, account: AccountId, amount: Decimal) -> Result<()> {
        let entry = self.accounts.get_mut(&account).ok_or(
            RealtyError::InsufficientAllowance {
                needed: amount,
                approved: Decimal::ZERO,
            },
        )?;

        if entry.allowance < amount {
            return Err(RealtyError::InsufficientAllowance {
                needed: amount,
                approved: entry.allowance,
            });
        }
        if entry.balance < amount {
            return Err(RealtyError::InsufficientBalance {
                needed: amount,
                available: entry.balance,
            });
        }

        entry.allowance -= amount;
        entry.balance -= amount;
        Ok(())
    }

    /// Credit an account (receiving side of a release).
    pub fn credit(&mut self, account: AccountId, amount: Decimal) {
        self.accounts.entry(account).or_default().balance += amount;
    }

    #[must_use]
    pub fn balance(&self, account: AccountId) -> AccountBalance {
        self.accounts.get(&account).copied().unwrap_or_default()
    }

    /// Sum of all account balances (excludes escrowed funds).
    #[must_use]
    pub fn total_balances(&self) -> Decimal {
        self.accounts.values().map(|a| a.balance).sum()
    }
}
