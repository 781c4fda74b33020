//! Escrow identifier allocation

use escrow_core::{EscrowError, EscrowId, Result};
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering::{AcqRel, Acquire};

/// Issues strictly increasing escrow identifiers, starting at 1.
///
/// Identifiers are never reused. Allocation is a single atomic
/// compare-and-swap, so concurrent creators always receive distinct ids.
#[derive(Debug, Default)]
pub struct EscrowIdAllocator {
    /// Last identifier issued; 0 before the first allocation
    last: AtomicU64,
}

impl EscrowIdAllocator {
    /// Allocator whose first identifier is 1
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocator whose first identifier is `first` (values below 1 are treated as 1)
    pub fn starting_at(first: u64) -> Self {
        Self {
            last: AtomicU64::new(first.saturating_sub(1)),
        }
    }

    /// Issue the next identifier
    ///
    /// # Errors
    /// * `EscrowError::AllocatorExhausted` once `u64::MAX` has been issued.
    ///   This is fatal for the allocator; it is never retried.
    pub fn next_id(&self) -> Result<EscrowId> {
        let bump = |last: u64| last.checked_add(1);
        match self.last.fetch_update(AcqRel, Acquire, bump) {
            Ok(previous) => Ok(EscrowId::new(previous + 1)),
            Err(last) => {
                tracing::error!(last_issued = last, "escrow id space exhausted");
                Err(EscrowError::allocator_exhausted(format!(
                    "last issued id was {last}"
                )))
            }
        }
    }

    /// Last identifier issued, if any
    pub fn last_issued(&self) -> Option<EscrowId> {
        match self.last.load(Acquire) {
            0 => None,
            last => Some(EscrowId::new(last)),
        }
    }
}
