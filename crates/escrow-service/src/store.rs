//! Escrow entity store
//!
//! The store exclusively owns every `EscrowRecord`, together with the
//! statistics aggregator and the transition journal. A record write, its
//! statistics delta and its journal fact are applied under one write guard,
//! so readers never observe one without the others.
//!
//! Per-record serialization uses non-blocking claims: a transition claims
//! its escrow id before reading, and a second claim on the same id fails
//! immediately with `ConcurrentModification` instead of waiting.

use crate::facts::EscrowFact;
use crate::stats::{ContractStats, StatsAggregator, StatsDelta};
use crate::types::{EscrowRecord, EscrowStatus};
use escrow_core::{EscrowError, EscrowId, Principal, Result};
use parking_lot::{Mutex, RwLock};
use std::collections::{BTreeMap, HashSet};

#[derive(Debug, Default)]
struct StoreState {
    records: BTreeMap<EscrowId, EscrowRecord>,
    stats: StatsAggregator,
    journal: Vec<EscrowFact>,
}

/// Authoritative mapping from escrow id to escrow record
#[derive(Debug, Default)]
pub struct EscrowStore {
    state: RwLock<StoreState>,
    claims: Mutex<HashSet<EscrowId>>,
}

/// Exclusive right to transition one escrow; released on drop
#[derive(Debug)]
pub struct RecordClaim<'a> {
    store: &'a EscrowStore,
    id: EscrowId,
}

impl RecordClaim<'_> {
    /// Claimed escrow id
    pub fn id(&self) -> EscrowId {
        self.id
    }
}

impl Drop for RecordClaim<'_> {
    fn drop(&mut self) {
        self.store.claims.lock().remove(&self.id);
    }
}

impl EscrowStore {
    /// Empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `id` for a read-modify-write sequence.
    ///
    /// # Errors
    /// * `EscrowError::ConcurrentModification` if another claim on `id` is live
    pub fn claim(&self, id: EscrowId) -> Result<RecordClaim<'_>> {
        if !self.claims.lock().insert(id) {
            return Err(EscrowError::concurrent_modification(format!(
                "{id} is being modified by another operation"
            )));
        }
        Ok(RecordClaim { store: self, id })
    }

    /// Insert a new record
    ///
    /// # Errors
    /// * `EscrowError::DuplicateId` if a record with the same id exists
    pub fn insert(&self, record: EscrowRecord) -> Result<EscrowId> {
        self.insert_with_fact(record, None)
    }

    pub(crate) fn insert_with_fact(
        &self,
        record: EscrowRecord,
        fact: Option<EscrowFact>,
    ) -> Result<EscrowId> {
        let id = record.id;
        let mut state = self.state.write();
        if state.records.contains_key(&id) {
            return Err(EscrowError::duplicate_id(format!("{id} already exists")));
        }

        let delta = StatsDelta::for_transition(None, record.status, record.amount);
        state.stats.apply(delta)?;
        state.records.insert(id, record);
        state.journal.extend(fact);
        Ok(id)
    }

    /// Read a record
    ///
    /// # Errors
    /// * `EscrowError::NotFound` if no record has this id
    pub fn get(&self, id: EscrowId) -> Result<EscrowRecord> {
        self.state
            .read()
            .records
            .get(&id)
            .cloned()
            .ok_or_else(|| EscrowError::not_found(format!("{id} does not exist")))
    }

    /// Atomically swap a record, guarded by the status the caller validated
    /// against. Returns the stored record (with its bumped version).
    ///
    /// # Errors
    /// * `EscrowError::NotFound` if no record has this id
    /// * `EscrowError::ConcurrentModification` if the stored status is not
    ///   `expected`
    /// * `EscrowError::Internal` if the new record changes an immutable field
    pub fn replace(
        &self,
        id: EscrowId,
        expected: EscrowStatus,
        new_record: EscrowRecord,
    ) -> Result<EscrowRecord> {
        self.replace_with_fact(id, expected, new_record, None)
    }

    pub(crate) fn replace_with_fact(
        &self,
        id: EscrowId,
        expected: EscrowStatus,
        mut new_record: EscrowRecord,
        fact: Option<EscrowFact>,
    ) -> Result<EscrowRecord> {
        let mut state = self.state.write();
        let current = state
            .records
            .get(&id)
            .ok_or_else(|| EscrowError::not_found(format!("{id} does not exist")))?;

        if current.status != expected {
            return Err(EscrowError::concurrent_modification(format!(
                "{id} is {} but {expected} was expected",
                current.status
            )));
        }
        if new_record.id != id
            || new_record.buyer != current.buyer
            || new_record.seller != current.seller
            || new_record.amount != current.amount
            || new_record.created_at != current.created_at
        {
            return Err(EscrowError::internal(format!(
                "replacement for {id} changes an immutable field"
            )));
        }

        let delta = StatsDelta::for_transition(
            Some(current.status),
            new_record.status,
            current.amount,
        );
        new_record.version = current.version + 1;

        state.stats.apply(delta)?;
        state.records.insert(id, new_record.clone());
        state.journal.extend(fact);
        Ok(new_record)
    }

    /// All records in id order
    pub fn list(&self) -> Vec<EscrowRecord> {
        self.state.read().records.values().cloned().collect()
    }

    /// Records where `principal` is buyer or seller, in id order
    pub fn list_for(&self, principal: &Principal) -> Vec<EscrowRecord> {
        self.state
            .read()
            .records
            .values()
            .filter(|r| r.is_party(principal))
            .cloned()
            .collect()
    }

    /// Number of records
    pub fn len(&self) -> usize {
        self.state.read().records.len()
    }

    /// True if no record was ever inserted
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Incrementally maintained statistics as of the last commit
    pub fn stats(&self) -> ContractStats {
        self.state.read().stats.snapshot()
    }

    /// Statistics rebuilt from the records
    pub fn recompute_stats(&self) -> ContractStats {
        StatsAggregator::recompute(self.state.read().records.values())
    }

    /// Journal facts for one escrow, oldest first
    pub fn facts_for(&self, id: EscrowId) -> Vec<EscrowFact> {
        self.state
            .read()
            .journal
            .iter()
            .filter(|f| f.escrow_id == id)
            .cloned()
            .collect()
    }
}
