//! Contract statistics
//!
//! `StatsAggregator` keeps running counters updated by the same commit that
//! changes a record. The counters are a cache: `recompute` rebuilds them from
//! the records and must always agree with the incremental values.

use crate::types::{EscrowRecord, EscrowStatus};
use escrow_core::{Amount, EscrowError, Result};
use serde::{Deserialize, Serialize};

/// Aggregate view over every escrow in a store
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractStats {
    /// Escrows ever created
    pub total_created: u64,
    /// Escrows paid to the seller by release
    pub total_released: u64,
    /// Escrows returned to the buyer by refund
    pub total_refunded: u64,
    /// Escrows that entered a dispute
    pub total_disputed: u64,
    /// Disputes settled by the arbiter
    pub total_resolved: u64,
    /// Escrows that lapsed at expiry
    pub total_expired: u64,
    /// Sum of amounts currently `Funded` or `Disputed`
    pub total_value_locked: u128,
}

/// Counter changes caused by one status transition
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsDelta {
    created: u64,
    released: u64,
    refunded: u64,
    disputed: u64,
    resolved: u64,
    expired: u64,
    locked_in: u64,
    locked_out: u64,
}

impl StatsDelta {
    /// Delta for a record moving from `from` (`None` on creation) to `to`
    pub fn for_transition(from: Option<EscrowStatus>, to: EscrowStatus, amount: Amount) -> Self {
        let mut delta = StatsDelta::default();
        if from.is_none() {
            delta.created = 1;
        }
        if from == Some(to) {
            return delta;
        }

        let was_locked = from.is_some_and(EscrowStatus::locks_value);
        match (was_locked, to.locks_value()) {
            (false, true) => delta.locked_in = amount.value(),
            (true, false) => delta.locked_out = amount.value(),
            _ => {}
        }

        match to {
            EscrowStatus::Released => delta.released = 1,
            EscrowStatus::Refunded => delta.refunded = 1,
            EscrowStatus::Disputed => delta.disputed = 1,
            EscrowStatus::Resolved => {
                delta.resolved = 1;
                // Resolution implies a dispute; count it if it was skipped
                if from != Some(EscrowStatus::Disputed) {
                    delta.disputed = 1;
                }
            }
            EscrowStatus::Expired => delta.expired = 1,
            EscrowStatus::Created | EscrowStatus::Funded => {}
        }
        delta
    }

    /// True if applying this delta changes nothing
    pub fn is_empty(&self) -> bool {
        *self == StatsDelta::default()
    }
}

/// Incrementally maintained `ContractStats`
#[derive(Debug, Clone, Default)]
pub struct StatsAggregator {
    stats: ContractStats,
}

impl StatsAggregator {
    /// Empty aggregator
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the current counters
    pub fn snapshot(&self) -> ContractStats {
        self.stats
    }

    /// Apply a delta; the counters are untouched if any step would overflow
    /// or underflow.
    pub fn apply(&mut self, delta: StatsDelta) -> Result<()> {
        self.stats = Self::applied(self.stats, delta)?;
        Ok(())
    }

    fn applied(stats: ContractStats, delta: StatsDelta) -> Result<ContractStats> {
        fn add(value: u64, by: u64, field: &str) -> Result<u64> {
            value
                .checked_add(by)
                .ok_or_else(|| EscrowError::internal(format!("{field} counter overflow")))
        }

        let total_value_locked = stats
            .total_value_locked
            .checked_add(u128::from(delta.locked_in))
            .and_then(|v| v.checked_sub(u128::from(delta.locked_out)))
            .ok_or_else(|| {
                EscrowError::internal(format!(
                    "value locked would leave range: {} + {} - {}",
                    stats.total_value_locked, delta.locked_in, delta.locked_out
                ))
            })?;

        Ok(ContractStats {
            total_created: add(stats.total_created, delta.created, "created")?,
            total_released: add(stats.total_released, delta.released, "released")?,
            total_refunded: add(stats.total_refunded, delta.refunded, "refunded")?,
            total_disputed: add(stats.total_disputed, delta.disputed, "disputed")?,
            total_resolved: add(stats.total_resolved, delta.resolved, "resolved")?,
            total_expired: add(stats.total_expired, delta.expired, "expired")?,
            total_value_locked,
        })
    }

    /// Rebuild counters from the records themselves.
    ///
    /// A resolved escrow counts as disputed too, since resolution is only
    /// reachable from a dispute.
    pub fn recompute<'a>(records: impl IntoIterator<Item = &'a EscrowRecord>) -> ContractStats {
        let mut stats = ContractStats::default();
        for record in records {
            stats.total_created += 1;
            match record.status {
                EscrowStatus::Released => stats.total_released += 1,
                EscrowStatus::Refunded => stats.total_refunded += 1,
                EscrowStatus::Disputed => stats.total_disputed += 1,
                EscrowStatus::Resolved => {
                    stats.total_disputed += 1;
                    stats.total_resolved += 1;
                }
                EscrowStatus::Expired => stats.total_expired += 1,
                EscrowStatus::Created | EscrowStatus::Funded => {}
            }
            if record.status.locks_value() {
                stats.total_value_locked += u128::from(record.amount.value());
            }
        }
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use EscrowStatus::*;

    fn amt(v: u64) -> Amount {
        Amount::new(v)
    }

    #[test]
    fn test_lifecycle_deltas() {
        let mut agg = StatsAggregator::new();
        agg.apply(StatsDelta::for_transition(None, Created, amt(500)))
            .unwrap();
        agg.apply(StatsDelta::for_transition(Some(Created), Funded, amt(500)))
            .unwrap();
        assert_eq!(agg.snapshot().total_value_locked, 500);

        agg.apply(StatsDelta::for_transition(Some(Funded), Disputed, amt(500)))
            .unwrap();
        let mid = agg.snapshot();
        assert_eq!(mid.total_disputed, 1);
        assert_eq!(mid.total_value_locked, 500);

        agg.apply(StatsDelta::for_transition(Some(Disputed), Resolved, amt(500)))
            .unwrap();
        let end = agg.snapshot();
        assert_eq!(end.total_created, 1);
        assert_eq!(end.total_resolved, 1);
        assert_eq!(end.total_value_locked, 0);
    }

    #[test]
    fn test_expiry_of_unfunded_moves_no_value() {
        let delta = StatsDelta::for_transition(Some(Created), Expired, amt(42));
        let mut agg = StatsAggregator::new();
        agg.apply(StatsDelta::for_transition(None, Created, amt(42)))
            .unwrap();
        agg.apply(delta).unwrap();
        assert_eq!(agg.snapshot().total_expired, 1);
        assert_eq!(agg.snapshot().total_value_locked, 0);
    }

    #[test]
    fn test_same_status_is_empty() {
        let delta = StatsDelta::for_transition(Some(Disputed), Disputed, amt(9));
        assert!(delta.is_empty());
    }

    #[test]
    fn test_underflow_leaves_counters_untouched() {
        let mut agg = StatsAggregator::new();
        let before = agg.snapshot();
        let err = agg
            .apply(StatsDelta::for_transition(Some(Funded), Released, amt(1)))
            .unwrap_err();
        assert_matches!(err, EscrowError::Internal { .. });
        assert_eq!(agg.snapshot(), before);
    }

    #[test]
    fn test_stats_serialize_with_contract_field_names() {
        let stats = ContractStats {
            total_created: 2,
            total_value_locked: 7,
            ..ContractStats::default()
        };
        let json = serde_json::to_value(stats).unwrap();
        assert_eq!(json["total_created"], 2);
        assert_eq!(json["total_value_locked"], 7);
        assert_eq!(json["total_resolved"], 0);
    }
}
