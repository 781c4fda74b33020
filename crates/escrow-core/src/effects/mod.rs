//! Host ledger effect interfaces
//!
//! Pure trait definitions for the side effects the custody core needs from
//! the ledger it runs on. This module defines **what** can be performed;
//! handlers define **how**.
//!
//! - `LedgerEffects`: atomic value movement between accounts
//! - `BlockHeightEffects`: the block-height oracle used for expiry
//!
//! Both are synchronous. The core never suspends inside an operation, so a
//! handler must return (or fail) within the call.

pub mod block;
pub mod ledger;

pub use block::BlockHeightEffects;
pub use ledger::{LedgerEffects, LedgerError};
