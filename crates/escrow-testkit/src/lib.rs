//! Escrow Testing Infrastructure
//!
//! Deterministic handlers for the ledger effect traits plus shared fixtures,
//! so tests across the workspace drive the custody core the same way.
//!
//! # Usage
//!
//! ```toml
//! [dev-dependencies]
//! escrow-testkit = { path = "../escrow-testkit" }
//! ```
//!
//! ```rust,no_run
//! use escrow_testkit::*;
//!
//! let ledger = InMemoryLedger::new();
//! ledger.credit(&buyer(), 1_000_000);
//! let clock = ManualBlockClock::new(1);
//! clock.advance(10);
//! ```

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

pub mod clock;
pub mod fixtures;
pub mod ledger;
pub mod strategies;

pub use clock::ManualBlockClock;
pub use fixtures::*;
pub use ledger::{InMemoryLedger, TransferRecord};

/// Install a test-friendly tracing subscriber once per process.
///
/// Filtering follows `RUST_LOG`; output goes through the test harness
/// capture.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
