//! In-memory ledger handler for testing
//!
//! Balances live behind a single lock, so each transfer debits and credits
//! atomically. Accounts can be frozen to make the ledger refuse transfers
//! touching them.

use escrow_core::{Account, Amount, LedgerEffects, LedgerError, Principal};
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};

/// One applied transfer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferRecord {
    /// Debited account
    pub from: Account,
    /// Credited account
    pub to: Account,
    /// Value moved
    pub amount: Amount,
}

#[derive(Debug, Default)]
struct LedgerState {
    balances: HashMap<Account, u64>,
    frozen: HashSet<Account>,
    transfers: Vec<TransferRecord>,
}

/// Ledger handler holding balances in memory
#[derive(Debug, Default)]
pub struct InMemoryLedger {
    state: RwLock<LedgerState>,
}

impl InMemoryLedger {
    /// Empty ledger
    pub fn new() -> Self {
        Self::default()
    }

    /// Mint `amount` to a principal
    pub fn credit(&self, principal: &Principal, amount: u64) {
        let mut state = self.state.write();
        let balance = state.balances.entry(Account::from(principal)).or_default();
        *balance = balance
            .checked_add(amount)
            .expect("test balance overflow");
    }

    /// Balance of a principal
    pub fn balance(&self, principal: &Principal) -> u64 {
        self.account_balance(&Account::from(principal))
    }

    /// Balance held by the escrow contract
    pub fn custody_balance(&self) -> u64 {
        self.account_balance(&Account::Custody)
    }

    /// Balance of any account
    pub fn account_balance(&self, account: &Account) -> u64 {
        self.state
            .read()
            .balances
            .get(account)
            .copied()
            .unwrap_or(0)
    }

    /// Sum of every balance; transfers never change it
    pub fn total_supply(&self) -> u128 {
        self.state
            .read()
            .balances
            .values()
            .map(|v| u128::from(*v))
            .sum()
    }

    /// Refuse (or stop refusing) transfers touching `account`
    pub fn set_frozen(&self, account: Account, frozen: bool) {
        let mut state = self.state.write();
        if frozen {
            state.frozen.insert(account);
        } else {
            state.frozen.remove(&account);
        }
    }

    /// Applied transfers, oldest first
    pub fn transfers(&self) -> Vec<TransferRecord> {
        self.state.read().transfers.clone()
    }
}

impl LedgerEffects for InMemoryLedger {
    fn transfer(&self, from: &Account, to: &Account, amount: Amount) -> Result<(), LedgerError> {
        let mut state = self.state.write();
        if let Some(account) = [from, to].into_iter().find(|a| state.frozen.contains(*a)) {
            return Err(LedgerError::Rejected {
                reason: format!("{account} is frozen"),
            });
        }

        let available = state.balances.get(from).copied().unwrap_or(0);
        let remaining = available
            .checked_sub(amount.value())
            .ok_or_else(|| LedgerError::InsufficientFunds {
                account: from.clone(),
                needed: amount,
                available: Amount::new(available),
            })?;
        let credited = state
            .balances
            .get(to)
            .copied()
            .unwrap_or(0)
            .checked_add(amount.value())
            .ok_or_else(|| LedgerError::Rejected {
                reason: format!("balance of {to} would overflow"),
            })?;

        state.balances.insert(from.clone(), remaining);
        state.balances.insert(to.clone(), credited);
        state.transfers.push(TransferRecord {
            from: from.clone(),
            to: to.clone(),
            amount,
        });
        tracing::trace!(from = %from, to = %to, amount = amount.value(), "ledger transfer");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transfer_moves_value() {
        let ledger = InMemoryLedger::new();
        let alice = Principal::new("alice");
        ledger.credit(&alice, 100);

        ledger
            .transfer(&Account::from(&alice), &Account::Custody, Amount::new(60))
            .unwrap();
        assert_eq!(ledger.balance(&alice), 40);
        assert_eq!(ledger.custody_balance(), 60);
        assert_eq!(ledger.total_supply(), 100);
        assert_eq!(ledger.transfers().len(), 1);
    }

    #[test]
    fn test_insufficient_funds_changes_nothing() {
        let ledger = InMemoryLedger::new();
        let alice = Principal::new("alice");
        ledger.credit(&alice, 10);

        let err = ledger
            .transfer(&Account::from(&alice), &Account::Custody, Amount::new(11))
            .unwrap_err();
        assert!(matches!(err, LedgerError::InsufficientFunds { .. }));
        assert_eq!(ledger.balance(&alice), 10);
        assert!(ledger.transfers().is_empty());
    }

    #[test]
    fn test_frozen_account_is_refused() {
        let ledger = InMemoryLedger::new();
        let alice = Principal::new("alice");
        ledger.credit(&alice, 10);
        ledger.set_frozen(Account::Custody, true);

        assert!(matches!(
            ledger.transfer(&Account::from(&alice), &Account::Custody, Amount::new(1)),
            Err(LedgerError::Rejected { .. })
        ));
        ledger.set_frozen(Account::Custody, false);
        assert!(ledger
            .transfer(&Account::from(&alice), &Account::Custody, Amount::new(1))
            .is_ok());
    }
}
