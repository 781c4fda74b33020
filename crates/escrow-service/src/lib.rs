//! # Escrow Service - Custody State Machine
//!
//! **Purpose**: Hold a buyer's funds against an agreement with a seller and
//! settle them by release, refund, arbitration or expiry.
//!
//! # Components
//!
//! - **Identifier Allocator** (`EscrowIdAllocator`): strictly increasing ids from 1
//! - **Entity Store** (`EscrowStore`): owns every `EscrowRecord`, with
//!   per-record claims and a status-guarded `replace`
//! - **Statistics Aggregator** (`StatsAggregator`): counters committed with
//!   each transition, re-derivable from the store
//! - **Escrow State Machine** (`EscrowService`): create, fund, release,
//!   refund, dispute, resolve, expire
//!
//! Value movement and block height come from the host through
//! `escrow_core::LedgerEffects` and `escrow_core::BlockHeightEffects`.
//!
//! ## What's NOT in this crate
//!
//! - Consensus, block production, signature verification
//! - Ledger handler implementations (test handlers live in `escrow-testkit`)
//! - Background expiry sweeps; expiry is checked when an operation runs

#![forbid(unsafe_code)]

/// Escrow identifier allocation
pub mod allocator;

/// Transition journal entries
pub mod facts;

/// State machine entry points
pub mod service;

/// Contract statistics
pub mod stats;

/// Entity store
pub mod store;

/// Record, status and request types
pub mod types;

pub use allocator::EscrowIdAllocator;
pub use facts::{EscrowFact, EscrowFactKind};
pub use service::EscrowService;
pub use stats::{ContractStats, StatsAggregator, StatsDelta};
pub use store::{EscrowStore, RecordClaim};
pub use types::{
    CreateEscrow, DisputeOutcome, EscrowRecord, EscrowStatus, Resolution, Settlement,
};

pub use escrow_core::{
    Account, Amount, BlockHeight, BlockHeightEffects, EscrowConfig, EscrowError, EscrowId,
    LedgerEffects, LedgerError, Principal, Result,
};
