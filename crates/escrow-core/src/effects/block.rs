//! Block height oracle.

use crate::identifiers::BlockHeight;

/// Reports the host ledger's current block height.
///
/// Heights are monotonically non-decreasing across calls.
pub trait BlockHeightEffects: Send + Sync {
    /// Height of the latest block
    fn current_block(&self) -> BlockHeight;
}

impl<T: BlockHeightEffects + ?Sized> BlockHeightEffects for std::sync::Arc<T> {
    fn current_block(&self) -> BlockHeight {
        (**self).current_block()
    }
}

impl<T: BlockHeightEffects + ?Sized> BlockHeightEffects for &T {
    fn current_block(&self) -> BlockHeight {
        (**self).current_block()
    }
}
