//! Escrow Core - Foundation Layer
//!
//! Identifiers, the unified error type, configuration, and the effect
//! interfaces through which the custody core reaches the host ledger.
//!
//! # Architecture Constraints
//!
//! - YES Opaque identity and value types shared by every escrow crate
//! - YES Pure effect trait signatures (`LedgerEffects`, `BlockHeightEffects`)
//! - NO effect handler implementations (production adapters live with the
//!   host integration, test handlers live in `escrow-testkit`)
//! - NO state machine logic (that's `escrow-service`)

#![forbid(unsafe_code)]

/// Escrow, principal, amount and block-height identifiers
pub mod identifiers;

/// Unified error handling
pub mod errors;

/// Service configuration (arbiter, expiry window, description bound)
pub mod config;

/// Pure effect interfaces for the host ledger
pub mod effects;

pub use config::EscrowConfig;
pub use effects::{BlockHeightEffects, LedgerEffects, LedgerError};
pub use errors::{ErrorCode, EscrowError, Result};
pub use identifiers::{Account, Amount, BlockHeight, EscrowId, Principal};
