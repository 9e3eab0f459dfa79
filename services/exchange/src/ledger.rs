//! Monetary ledger
//!
//! The single source of truth for user balances. Owned by the supervisor
//! and only ever touched through it, so every mutation is serialised by
//! the supervisor's own exclusivity. All money that enters or leaves a bet
//! passes through here.

use persistence::UserSnapshot;
use std::collections::{BTreeMap, HashMap};
use tracing::debug;
use types::errors::{ExchangeError, NotFoundKind};
use types::ids::{BetId, UserId};
use types::numeric::Amount;

/// Public view of a user account
#[derive(Debug, Clone, PartialEq)]
pub struct UserAccount {
    pub id: UserId,
    pub name: String,
    pub balance: Amount,
}

#[derive(Debug, Clone)]
struct AccountRecord {
    name: String,
    balance: Amount,
    /// Placement order; listings return newest first.
    bets: Vec<BetId>,
}

/// User accounts keyed by id
#[derive(Debug, Default)]
pub struct Ledger {
    accounts: HashMap<UserId, AccountRecord>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new user with a zero balance
    pub fn create(&mut self, id: UserId, name: impl Into<String>) -> Result<(), ExchangeError> {
        if self.accounts.contains_key(&id) {
            return Err(ExchangeError::duplicate(&id));
        }
        self.accounts.insert(
            id,
            AccountRecord {
                name: name.into(),
                balance: Amount::ZERO,
                bets: Vec::new(),
            },
        );
        Ok(())
    }

    /// Add funds; the amount must be strictly positive
    pub fn deposit(&mut self, id: &UserId, amount: Amount) -> Result<(), ExchangeError> {
        if amount.is_zero() {
            return Err(ExchangeError::invalid_amount("deposit must be positive"));
        }
        let account = self.account_mut(id)?;
        account.balance += amount;
        debug!(user = %id, %amount, balance = %account.balance, "deposit");
        Ok(())
    }

    /// Remove funds; fails on overdraft
    pub fn withdraw(&mut self, id: &UserId, amount: Amount) -> Result<(), ExchangeError> {
        if amount.is_zero() {
            return Err(ExchangeError::invalid_amount("withdrawal must be positive"));
        }
        let account = self.account_mut(id)?;
        let remaining = account.balance.checked_sub(amount).ok_or_else(|| {
            ExchangeError::invalid_amount(format!(
                "withdrawal of {} exceeds balance {}",
                amount, account.balance
            ))
        })?;
        account.balance = remaining;
        debug!(user = %id, %amount, balance = %account.balance, "withdrawal");
        Ok(())
    }

    /// Return money to a user during refunds and payouts
    ///
    /// Unlike `deposit` a zero credit is a no-op, so refund loops can hand
    /// every bet's amount straight through.
    pub fn credit(&mut self, id: &UserId, amount: Amount) -> Result<(), ExchangeError> {
        if amount.is_zero() {
            return Ok(());
        }
        let account = self.account_mut(id)?;
        account.balance += amount;
        debug!(user = %id, %amount, balance = %account.balance, "credit");
        Ok(())
    }

    pub fn get(&self, id: &UserId) -> Result<UserAccount, ExchangeError> {
        let account = self
            .accounts
            .get(id)
            .ok_or_else(|| ExchangeError::not_found(NotFoundKind::User, id))?;
        Ok(UserAccount {
            id: id.clone(),
            name: account.name.clone(),
            balance: account.balance,
        })
    }

    /// A user's bets, newest first
    pub fn bets(&self, id: &UserId) -> Result<Vec<BetId>, ExchangeError> {
        let account = self
            .accounts
            .get(id)
            .ok_or_else(|| ExchangeError::not_found(NotFoundKind::User, id))?;
        Ok(account.bets.iter().rev().cloned().collect())
    }

    /// Record a freshly placed bet against its owner
    pub fn append_bet(&mut self, id: &UserId, bet: BetId) -> Result<(), ExchangeError> {
        self.account_mut(id)?.bets.push(bet);
        Ok(())
    }

    pub fn contains(&self, id: &UserId) -> bool {
        self.accounts.contains_key(id)
    }

    /// Dump all accounts for a snapshot
    pub fn export(&self) -> BTreeMap<String, UserSnapshot> {
        self.accounts
            .iter()
            .map(|(id, account)| {
                (
                    id.as_str().to_string(),
                    UserSnapshot {
                        name: account.name.clone(),
                        balance: account.balance,
                        bets: account.bets.iter().rev().cloned().collect(),
                    },
                )
            })
            .collect()
    }

    /// Rebuild the ledger from a snapshot
    pub fn restore(users: BTreeMap<String, UserSnapshot>) -> Self {
        let accounts = users
            .into_iter()
            .map(|(id, user)| {
                (
                    UserId::new(id),
                    AccountRecord {
                        name: user.name,
                        balance: user.balance,
                        // snapshots store newest first; keep oldest first
                        bets: user.bets.into_iter().rev().collect(),
                    },
                )
            })
            .collect();
        Self { accounts }
    }

    fn account_mut(&mut self, id: &UserId) -> Result<&mut AccountRecord, ExchangeError> {
        self.accounts
            .get_mut(id)
            .ok_or_else(|| ExchangeError::not_found(NotFoundKind::User, id))
    }
}
