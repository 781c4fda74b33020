//! Controllable block height for deterministic expiry tests

use escrow_core::{BlockHeight, BlockHeightEffects};
use std::sync::atomic::{AtomicU64, Ordering};

/// Block-height oracle that only moves when told to
#[derive(Debug, Default)]
pub struct ManualBlockClock {
    height: AtomicU64,
}

impl ManualBlockClock {
    /// Clock starting at `height`
    pub fn new(height: u64) -> Self {
        Self {
            height: AtomicU64::new(height),
        }
    }

    /// Mine `blocks` more blocks
    pub fn advance(&self, blocks: u64) {
        self.height.fetch_add(blocks, Ordering::AcqRel);
    }

    /// Jump to an absolute height; heights never move backwards
    pub fn set(&self, height: u64) {
        self.height.fetch_max(height, Ordering::AcqRel);
    }

    /// Current height as a raw number
    pub fn height(&self) -> u64 {
        self.height.load(Ordering::Acquire)
    }
}

impl BlockHeightEffects for ManualBlockClock {
    fn current_block(&self) -> BlockHeight {
        BlockHeight::new(self.height())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_advance_and_set() {
        let clock = ManualBlockClock::new(5);
        clock.advance(3);
        assert_eq!(clock.current_block(), BlockHeight::new(8));
        clock.set(4);
        assert_eq!(clock.height(), 8);
        clock.set(20);
        assert_eq!(clock.height(), 20);
    }
}
