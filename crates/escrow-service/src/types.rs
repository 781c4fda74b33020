//! Escrow record and lifecycle types

use escrow_core::{Amount, BlockHeight, EscrowId, Principal};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle status of an escrow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EscrowStatus {
    /// Agreement recorded, no value moved
    Created,
    /// Buyer's funds held in custody
    Funded,
    /// Funds paid to the seller
    Released,
    /// Funds returned to the buyer
    Refunded,
    /// Funds frozen pending arbiter decision
    Disputed,
    /// Arbiter settled the dispute
    Resolved,
    /// Deadline passed before settlement
    Expired,
}

impl EscrowStatus {
    /// Terminal statuses accept no further transition
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            EscrowStatus::Released
                | EscrowStatus::Refunded
                | EscrowStatus::Resolved
                | EscrowStatus::Expired
        )
    }

    /// True while the escrow's amount sits in custody
    pub fn locks_value(self) -> bool {
        matches!(self, EscrowStatus::Funded | EscrowStatus::Disputed)
    }
}

impl fmt::Display for EscrowStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EscrowStatus::Created => write!(f, "created"),
            EscrowStatus::Funded => write!(f, "funded"),
            EscrowStatus::Released => write!(f, "released"),
            EscrowStatus::Refunded => write!(f, "refunded"),
            EscrowStatus::Disputed => write!(f, "disputed"),
            EscrowStatus::Resolved => write!(f, "resolved"),
            EscrowStatus::Expired => write!(f, "expired"),
        }
    }
}

/// Arbiter's decision on a disputed escrow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DisputeOutcome {
    /// Custody returns to the buyer
    FavorBuyer,
    /// Custody pays the seller
    FavorSeller,
}

/// Where the value of a settled escrow ended up
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Settlement {
    /// Amount transferred to the seller
    PaidSeller,
    /// Amount transferred back to the buyer
    ReturnedBuyer,
    /// Escrow lapsed before any value was custodied
    Lapsed,
}

/// Outcome recorded when an escrow reaches a terminal status
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    /// Final disposition of the value
    pub outcome: Settlement,
    /// Principal that received the amount, if any moved
    pub recipient: Option<Principal>,
    /// Block height at settlement
    pub settled_at: BlockHeight,
}

/// One escrow agreement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EscrowRecord {
    /// Allocated identifier
    pub id: EscrowId,
    /// Party whose funds are custodied
    pub buyer: Principal,
    /// Counterparty paid on release
    pub seller: Principal,
    /// Custodied value, always positive
    pub amount: Amount,
    /// Informational text, bounded by configuration
    pub description: String,
    /// Current lifecycle status
    pub status: EscrowStatus,
    /// Height at creation
    pub created_at: BlockHeight,
    /// Height from which expiry applies; always after `created_at`
    pub expires_at: BlockHeight,
    /// Party that opened a dispute, if any
    pub disputed_by: Option<Principal>,
    /// Set once, on reaching a terminal status
    pub resolution: Option<Resolution>,
    /// Bumped on every committed replacement
    pub version: u64,
}

impl EscrowRecord {
    /// True if `principal` is the buyer or the seller
    pub fn is_party(&self, principal: &Principal) -> bool {
        &self.buyer == principal || &self.seller == principal
    }

    /// True once `now` has reached `expires_at`
    pub fn is_expired_at(&self, now: BlockHeight) -> bool {
        now.has_reached(self.expires_at)
    }

    /// Copy of this record moved to `status`
    pub(crate) fn with_status(&self, status: EscrowStatus) -> Self {
        Self {
            status,
            ..self.clone()
        }
    }

    /// Copy of this record moved to a terminal `status` with its resolution
    pub(crate) fn settled(&self, status: EscrowStatus, resolution: Resolution) -> Self {
        Self {
            status,
            resolution: Some(resolution),
            ..self.clone()
        }
    }
}

/// Parameters for `create_escrow`; the buyer is the caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateEscrow {
    /// Counterparty
    pub seller: Principal,
    /// Value to custody
    pub amount: Amount,
    /// Informational text
    pub description: String,
    /// Blocks until expiry; the configured default when `None`
    pub expires_in: Option<u64>,
}

impl CreateEscrow {
    /// Request using the configured expiry window
    pub fn new(seller: impl Into<Principal>, amount: u64, description: impl Into<String>) -> Self {
        Self {
            seller: seller.into(),
            amount: Amount::new(amount),
            description: description.into(),
            expires_in: None,
        }
    }

    /// Override the expiry window
    pub fn expires_in(mut self, blocks: u64) -> Self {
        self.expires_in = Some(blocks);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_statuses() {
        use EscrowStatus::*;
        for status in [Released, Refunded, Resolved, Expired] {
            assert!(status.is_terminal(), "{status} should be terminal");
            assert!(!status.locks_value());
        }
        for status in [Created, Funded, Disputed] {
            assert!(!status.is_terminal(), "{status} should not be terminal");
        }
        assert!(Funded.locks_value());
        assert!(Disputed.locks_value());
        assert!(!Created.locks_value());
    }

    #[test]
    fn test_create_request_builder() {
        let req = CreateEscrow::new("ST2SELLER", 1_000_000, "laptop").expires_in(10);
        assert_eq!(req.amount, Amount::new(1_000_000));
        assert_eq!(req.expires_in, Some(10));
    }
}
