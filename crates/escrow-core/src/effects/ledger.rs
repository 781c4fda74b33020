//! Value transfer effect.

use crate::identifiers::{Account, Amount};
use serde::{Deserialize, Serialize};

/// Error type for ledger transfers.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Serialize, Deserialize)]
pub enum LedgerError {
    /// Source account cannot cover the transfer
    #[error("Insufficient funds in {account}: needed {needed}, available {available}")]
    InsufficientFunds {
        /// Account being debited
        account: Account,
        /// Amount requested
        needed: Amount,
        /// Balance at the time of the transfer
        available: Amount,
    },
    /// Ledger refused the transfer for any other reason
    #[error("Transfer rejected: {reason}")]
    Rejected {
        /// Ledger-reported reason
        reason: String,
    },
}

/// Moves value between accounts on the host ledger.
///
/// A transfer either applies completely or not at all.
pub trait LedgerEffects: Send + Sync {
    /// Move `amount` from `from` to `to`
    fn transfer(&self, from: &Account, to: &Account, amount: Amount) -> Result<(), LedgerError>;
}

impl<T: LedgerEffects + ?Sized> LedgerEffects for std::sync::Arc<T> {
    fn transfer(&self, from: &Account, to: &Account, amount: Amount) -> Result<(), LedgerError> {
        (**self).transfer(from, to, amount)
    }
}

impl<T: LedgerEffects + ?Sized> LedgerEffects for &T {
    fn transfer(&self, from: &Account, to: &Account, amount: Amount) -> Result<(), LedgerError> {
        (**self).transfer(from, to, amount)
    }
}
