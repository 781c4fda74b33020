//! Escrow transition facts
//!
//! Every committed transition appends one fact to the store's journal in the
//! same write as the record change. The journal is append-only; facts are
//! never rewritten.

use crate::types::{DisputeOutcome, EscrowStatus};
use escrow_core::{BlockHeight, EscrowId, Principal};
use serde::{Deserialize, Serialize};

/// What happened to an escrow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EscrowFactKind {
    /// Agreement recorded
    Created,
    /// Buyer's funds moved into custody
    Funded,
    /// Custody paid to the seller
    Released,
    /// Custody returned to the buyer
    Refunded,
    /// A party opened a dispute
    Disputed,
    /// Arbiter settled the dispute
    Resolved(DisputeOutcome),
    /// Deadline passed before settlement
    Expired {
        /// True when custodied funds went back to the buyer
        refunded: bool,
    },
}

impl EscrowFactKind {
    /// Status a record holds after this fact
    pub fn resulting_status(self) -> EscrowStatus {
        match self {
            EscrowFactKind::Created => EscrowStatus::Created,
            EscrowFactKind::Funded => EscrowStatus::Funded,
            EscrowFactKind::Released => EscrowStatus::Released,
            EscrowFactKind::Refunded => EscrowStatus::Refunded,
            EscrowFactKind::Disputed => EscrowStatus::Disputed,
            EscrowFactKind::Resolved(_) => EscrowStatus::Resolved,
            EscrowFactKind::Expired { .. } => EscrowStatus::Expired,
        }
    }
}

/// Journal entry for one committed transition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EscrowFact {
    /// Escrow the fact belongs to
    pub escrow_id: EscrowId,
    /// Transition that was committed
    pub kind: EscrowFactKind,
    /// Caller that triggered it
    pub actor: Principal,
    /// Block height at commit
    pub block: BlockHeight,
}

impl EscrowFact {
    /// Create a fact
    pub fn new(
        escrow_id: EscrowId,
        kind: EscrowFactKind,
        actor: Principal,
        block: BlockHeight,
    ) -> Self {
        Self {
            escrow_id,
            kind,
            actor,
            block,
        }
    }
}
