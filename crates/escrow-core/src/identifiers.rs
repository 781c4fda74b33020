//! Strongly typed escrow identifiers and value wrappers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of an escrow agreement.
///
/// Issued by the identifier allocator, strictly increasing from 1 and never
/// reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EscrowId(u64);

impl EscrowId {
    /// Create an escrow identifier from its raw value.
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Return the raw identifier.
    pub const fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for EscrowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "escrow-{}", self.0)
    }
}

/// Opaque account identity able to hold value and authorize actions.
///
/// The core only compares and hashes principals; it never inspects their
/// contents.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Principal(String);

impl Principal {
    /// Create a new principal.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the underlying identity string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Principal {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Value in the ledger's base unit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Amount(u64);

impl Amount {
    /// Create an amount from base units.
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Return the raw base-unit count.
    pub const fn value(self) -> u64 {
        self.0
    }

    /// True when the amount is zero.
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Host ledger block height, the time base for expiry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlockHeight(u64);

impl BlockHeight {
    /// Create a block height.
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Return the raw height.
    pub const fn value(self) -> u64 {
        self.0
    }

    /// Height `blocks` after this one, or `None` on overflow.
    pub fn checked_add(self, blocks: u64) -> Option<BlockHeight> {
        self.0.checked_add(blocks).map(BlockHeight)
    }

    /// True once `self` has reached or passed `deadline`.
    pub fn has_reached(self, deadline: BlockHeight) -> bool {
        self >= deadline
    }
}

impl fmt::Display for BlockHeight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Source or destination of a ledger transfer.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Account {
    /// A principal's own balance.
    Principal(Principal),
    /// Funds held by the escrow contract itself.
    Custody,
}

impl From<Principal> for Account {
    fn from(value: Principal) -> Self {
        Account::Principal(value)
    }
}

impl From<&Principal> for Account {
    fn from(value: &Principal) -> Self {
        Account::Principal(value.clone())
    }
}

impl fmt::Display for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Account::Principal(p) => write!(f, "{p}"),
            Account::Custody => f.write_str("custody"),
        }
    }
}
