//! Unified error type for escrow operations
//!
//! Every core operation returns `Result<T, EscrowError>`. No transition
//! partially applies: when an error is returned, the record, the ledger
//! balances and the statistics are exactly as they were before the call.

use crate::effects::LedgerError;
use serde::{Deserialize, Serialize};

/// Unified error type for all escrow operations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum EscrowError {
    /// Non-positive amount, buyer equal to seller, oversized description
    #[error("Invalid input: {message}")]
    InvalidInput {
        /// What was wrong with the input
        message: String,
    },

    /// Referenced escrow does not exist
    #[error("Not found: {message}")]
    NotFound {
        /// What was not found
        message: String,
    },

    /// Store already holds a record with this identifier
    #[error("Duplicate id: {message}")]
    DuplicateId {
        /// Which identifier collided
        message: String,
    },

    /// Caller is not the party required for the transition
    #[error("Unauthorized: {message}")]
    Unauthorized {
        /// Which party was required
        message: String,
    },

    /// Operation is not legal from the current status
    #[error("Invalid transition: {message}")]
    InvalidTransition {
        /// Current status and attempted operation
        message: String,
    },

    /// Operation attempted at or past `expires_at`
    #[error("Expired: {message}")]
    Expired {
        /// Expiry height and current height
        message: String,
    },

    /// Another transition holds or changed the record; re-read before retrying
    #[error("Concurrent modification: {message}")]
    ConcurrentModification {
        /// Which record was contended
        message: String,
    },

    /// Identifier space is exhausted
    #[error("Allocator exhausted: {message}")]
    AllocatorExhausted {
        /// Last identifier issued
        message: String,
    },

    /// Host ledger refused a value transfer
    #[error("Ledger error: {message}")]
    Ledger {
        /// Ledger-reported reason
        message: String,
    },

    /// Configuration could not be loaded or failed validation
    #[error("Configuration error: {message}")]
    Config {
        /// Offending field or parse failure
        message: String,
    },

    /// Internal invariant violation
    #[error("Internal error: {message}")]
    Internal {
        /// Description of the violated invariant
        message: String,
    },
}

/// Stable structured code for each error kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorCode {
    /// `EscrowError::InvalidInput`
    InvalidInput,
    /// `EscrowError::NotFound`
    NotFound,
    /// `EscrowError::DuplicateId`
    DuplicateId,
    /// `EscrowError::Unauthorized`
    Unauthorized,
    /// `EscrowError::InvalidTransition`
    InvalidTransition,
    /// `EscrowError::Expired`
    Expired,
    /// `EscrowError::ConcurrentModification`
    ConcurrentModification,
    /// `EscrowError::AllocatorExhausted`
    AllocatorExhausted,
    /// `EscrowError::Ledger`
    Ledger,
    /// `EscrowError::Config`
    Config,
    /// `EscrowError::Internal`
    Internal,
}

impl EscrowError {
    /// Create an invalid input error
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// Create a not found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    /// Create a duplicate id error
    pub fn duplicate_id(message: impl Into<String>) -> Self {
        Self::DuplicateId {
            message: message.into(),
        }
    }

    /// Create an unauthorized error
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized {
            message: message.into(),
        }
    }

    /// Create an invalid transition error
    pub fn invalid_transition(message: impl Into<String>) -> Self {
        Self::InvalidTransition {
            message: message.into(),
        }
    }

    /// Create an expired error
    pub fn expired(message: impl Into<String>) -> Self {
        Self::Expired {
            message: message.into(),
        }
    }

    /// Create a concurrent modification error
    pub fn concurrent_modification(message: impl Into<String>) -> Self {
        Self::ConcurrentModification {
            message: message.into(),
        }
    }

    /// Create an allocator exhausted error
    pub fn allocator_exhausted(message: impl Into<String>) -> Self {
        Self::AllocatorExhausted {
            message: message.into(),
        }
    }

    /// Create a ledger error
    pub fn ledger(message: impl Into<String>) -> Self {
        Self::Ledger {
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Structured code for this error
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::InvalidInput { .. } => ErrorCode::InvalidInput,
            Self::NotFound { .. } => ErrorCode::NotFound,
            Self::DuplicateId { .. } => ErrorCode::DuplicateId,
            Self::Unauthorized { .. } => ErrorCode::Unauthorized,
            Self::InvalidTransition { .. } => ErrorCode::InvalidTransition,
            Self::Expired { .. } => ErrorCode::Expired,
            Self::ConcurrentModification { .. } => ErrorCode::ConcurrentModification,
            Self::AllocatorExhausted { .. } => ErrorCode::AllocatorExhausted,
            Self::Ledger { .. } => ErrorCode::Ledger,
            Self::Config { .. } => ErrorCode::Config,
            Self::Internal { .. } => ErrorCode::Internal,
        }
    }

    /// True for errors the caller may resolve by re-reading and retrying
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::ConcurrentModification { .. })
    }
}

/// Standard Result type for escrow operations
pub type Result<T> = std::result::Result<T, EscrowError>;

impl From<LedgerError> for EscrowError {
    fn from(err: LedgerError) -> Self {
        Self::ledger(err.to_string())
    }
}

impl From<toml::de::Error> for EscrowError {
    fn from(err: toml::de::Error) -> Self {
        Self::config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Account, Amount};

    #[test]
    fn test_codes_match_variants() {
        assert_eq!(
            EscrowError::invalid_transition("released").code(),
            ErrorCode::InvalidTransition
        );
        assert_eq!(EscrowError::expired("late").code(), ErrorCode::Expired);
        let contended = EscrowError::concurrent_modification("escrow-1");
        assert!(contended.is_retryable());
        assert!(!EscrowError::unauthorized("seller").is_retryable());
    }

    #[test]
    fn test_ledger_error_conversion() {
        let err: EscrowError = LedgerError::InsufficientFunds {
            account: Account::Custody,
            needed: Amount::new(10),
            available: Amount::new(3),
        }
        .into();
        assert_eq!(err.code(), ErrorCode::Ledger);
        assert!(err.to_string().contains("custody"));
    }
}
