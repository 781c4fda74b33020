//! Escrow state machine
//!
//! `EscrowService` validates and executes escrow transitions against one
//! record at a time:
//!
//! ```text
//!            fund             release / refund
//! Created ─────────▶ Funded ───────────────────▶ Released | Refunded
//!    │                 │  │
//!    │ expire          │  │ dispute        resolve
//!    ▼                 │  └──────▶ Disputed ───────▶ Resolved
//! Expired ◀────────────┘ expire
//! ```
//!
//! Each state-changing call follows the same sequence: claim the record,
//! read it, check preconditions (status first, then caller, then expiry),
//! move value through `LedgerEffects`, then commit the record, its
//! statistics delta and its journal fact in one store write. A failure at
//! any step leaves the record, balances and statistics untouched.
//!
//! Expiry is evaluated lazily against `BlockHeightEffects` whenever an
//! operation inspects `expires_at`; nothing runs in the background.

use crate::allocator::EscrowIdAllocator;
use crate::facts::{EscrowFact, EscrowFactKind};
use crate::stats::ContractStats;
use crate::store::EscrowStore;
use crate::types::{
    CreateEscrow, DisputeOutcome, EscrowRecord, EscrowStatus, Resolution, Settlement,
};
use escrow_core::{
    Account, BlockHeight, BlockHeightEffects, EscrowConfig, EscrowError, EscrowId, LedgerEffects,
    Principal, Result,
};

/// Planned effect of one transition, computed before anything is applied
#[derive(Debug)]
struct Transition {
    next: EscrowRecord,
    /// Movement of the escrow's full amount, if any
    transfer: Option<(Account, Account)>,
    fact: EscrowFactKind,
}

/// Escrow custody state machine over a host ledger
///
/// The service owns the entity store and identifier allocator; the ledger
/// and block-height oracle are supplied by the host.
///
/// # Example
///
/// ```ignore
/// let service = EscrowService::new(EscrowConfig::default(), ledger, clock)?;
/// let id = service.create_escrow(&buyer, CreateEscrow::new(seller, 1_000_000, "laptop"))?;
/// service.fund_escrow(id, &buyer)?;
/// service.release_escrow(id, &buyer)?;
/// ```
#[derive(Debug)]
pub struct EscrowService<L, B> {
    config: EscrowConfig,
    ledger: L,
    clock: B,
    allocator: EscrowIdAllocator,
    store: EscrowStore,
}

impl<L, B> EscrowService<L, B>
where
    L: LedgerEffects,
    B: BlockHeightEffects,
{
    /// Create a service with an empty store
    ///
    /// # Errors
    /// * `EscrowError::Config` if the configuration fails validation
    pub fn new(config: EscrowConfig, ledger: L, clock: B) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            ledger,
            clock,
            allocator: EscrowIdAllocator::new(),
            store: EscrowStore::new(),
        })
    }

    /// Active configuration
    pub fn config(&self) -> &EscrowConfig {
        &self.config
    }

    /// Ledger handler
    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    /// Block-height oracle
    pub fn clock(&self) -> &B {
        &self.clock
    }

    /// Underlying entity store
    pub fn store(&self) -> &EscrowStore {
        &self.store
    }

    /// Record a new escrow agreement with `buyer` as the caller.
    ///
    /// No value moves; the escrow starts `Created` and expires
    /// `expires_in` (or the configured default) blocks from now.
    ///
    /// # Errors
    /// * `EscrowError::InvalidInput` for a zero amount, buyer equal to
    ///   seller, an oversized description, or a zero or overflowing window
    /// * `EscrowError::AllocatorExhausted` when no identifier remains
    pub fn create_escrow(&self, buyer: &Principal, request: CreateEscrow) -> Result<EscrowId> {
        let now = self.clock.current_block();
        let record = self.validate_create(buyer, request, now).map_err(|err| {
            tracing::debug!(buyer = %buyer, error = %err, "escrow creation rejected");
            err
        })?;

        let id = record.id;
        let fact = EscrowFact::new(id, EscrowFactKind::Created, buyer.clone(), now);
        self.store.insert_with_fact(record, Some(fact))?;
        tracing::info!(
            escrow_id = %id,
            buyer = %buyer,
            block = now.value(),
            "escrow created"
        );
        Ok(id)
    }

    fn validate_create(
        &self,
        buyer: &Principal,
        request: CreateEscrow,
        now: BlockHeight,
    ) -> Result<EscrowRecord> {
        if request.amount.is_zero() {
            return Err(EscrowError::invalid_input("amount must be positive"));
        }
        if &request.seller == buyer {
            return Err(EscrowError::invalid_input("buyer and seller must differ"));
        }
        let description_len = request.description.chars().count();
        if description_len > self.config.max_description_len {
            return Err(EscrowError::invalid_input(format!(
                "description is {description_len} characters, limit is {}",
                self.config.max_description_len
            )));
        }
        let window = request
            .expires_in
            .unwrap_or(self.config.default_expiry_blocks);
        if window == 0 {
            return Err(EscrowError::invalid_input("expiry window must be positive"));
        }
        let expires_at = now.checked_add(window).ok_or_else(|| {
            EscrowError::invalid_input(format!("expiry window of {window} blocks overflows"))
        })?;

        Ok(EscrowRecord {
            id: self.allocator.next_id()?,
            buyer: buyer.clone(),
            seller: request.seller,
            amount: request.amount,
            description: request.description,
            status: EscrowStatus::Created,
            created_at: now,
            expires_at,
            disputed_by: None,
            resolution: None,
            version: 0,
        })
    }

    /// Move the buyer's funds into custody
    ///
    /// # Errors
    /// * `EscrowError::InvalidTransition` unless the escrow is `Created`
    /// * `EscrowError::Unauthorized` unless `caller` is the buyer
    /// * `EscrowError::Expired` at or past `expires_at`
    /// * `EscrowError::Ledger` if the buyer cannot cover the amount
    pub fn fund_escrow(&self, id: EscrowId, caller: &Principal) -> Result<EscrowRecord> {
        self.transition(id, caller, "fund", |record, now| {
            require_status(record, &[EscrowStatus::Created], "fund")?;
            if caller != &record.buyer {
                return Err(EscrowError::unauthorized(format!(
                    "only the buyer may fund {id}"
                )));
            }
            require_not_expired(record, now, "fund")?;
            Ok(Some(Transition {
                next: record.with_status(EscrowStatus::Funded),
                transfer: Some((Account::from(&record.buyer), Account::Custody)),
                fact: EscrowFactKind::Funded,
            }))
        })
    }

    /// Pay custodied funds to the seller
    ///
    /// # Errors
    /// * `EscrowError::InvalidTransition` unless the escrow is `Funded`
    /// * `EscrowError::Unauthorized` unless `caller` is the buyer or arbiter
    /// * `EscrowError::Expired` at or past `expires_at`
    pub fn release_escrow(&self, id: EscrowId, caller: &Principal) -> Result<EscrowRecord> {
        self.transition(id, caller, "release", |record, now| {
            require_status(record, &[EscrowStatus::Funded], "release")?;
            if caller != &record.buyer && !self.is_arbiter(caller) {
                return Err(EscrowError::unauthorized(format!(
                    "only the buyer or arbiter may release {id}"
                )));
            }
            require_not_expired(record, now, "release")?;
            Ok(Some(settle(
                record,
                EscrowStatus::Released,
                Settlement::PaidSeller,
                now,
                EscrowFactKind::Released,
            )))
        })
    }

    /// Return custodied funds to the buyer.
    ///
    /// The seller may refund at any time; once `expires_at` is reached anyone
    /// may.
    ///
    /// # Errors
    /// * `EscrowError::InvalidTransition` unless the escrow is `Funded`
    /// * `EscrowError::Unauthorized` before expiry for anyone but the seller
    pub fn refund_escrow(&self, id: EscrowId, caller: &Principal) -> Result<EscrowRecord> {
        self.transition(id, caller, "refund", |record, now| {
            require_status(record, &[EscrowStatus::Funded], "refund")?;
            if caller != &record.seller && !record.is_expired_at(now) {
                return Err(EscrowError::unauthorized(format!(
                    "only the seller may refund {id} before block {}",
                    record.expires_at.value()
                )));
            }
            Ok(Some(settle(
                record,
                EscrowStatus::Refunded,
                Settlement::ReturnedBuyer,
                now,
                EscrowFactKind::Refunded,
            )))
        })
    }

    /// Freeze custodied funds pending arbitration.
    ///
    /// A party may dispute at any time while funds are in custody, including
    /// after `expires_at`; from then on only the arbiter can settle the
    /// escrow. Disputing an already disputed escrow returns it unchanged.
    ///
    /// # Errors
    /// * `EscrowError::InvalidTransition` unless the escrow is `Funded` or
    ///   `Disputed`
    /// * `EscrowError::Unauthorized` unless `caller` is the buyer or seller
    pub fn dispute_escrow(&self, id: EscrowId, caller: &Principal) -> Result<EscrowRecord> {
        self.transition(id, caller, "dispute", |record, _now| {
            require_status(
                record,
                &[EscrowStatus::Funded, EscrowStatus::Disputed],
                "dispute",
            )?;
            if !record.is_party(caller) {
                return Err(EscrowError::unauthorized(format!(
                    "only the buyer or seller may dispute {id}"
                )));
            }
            if record.status == EscrowStatus::Disputed {
                return Ok(None);
            }

            let mut next = record.with_status(EscrowStatus::Disputed);
            next.disputed_by = Some(caller.clone());
            Ok(Some(Transition {
                next,
                transfer: None,
                fact: EscrowFactKind::Disputed,
            }))
        })
    }

    /// Settle a dispute in favor of one party
    ///
    /// # Errors
    /// * `EscrowError::InvalidTransition` unless the escrow is `Disputed`
    /// * `EscrowError::Unauthorized` unless `caller` is the configured arbiter
    pub fn resolve_dispute(
        &self,
        id: EscrowId,
        caller: &Principal,
        outcome: DisputeOutcome,
    ) -> Result<EscrowRecord> {
        self.transition(id, caller, "resolve", |record, now| {
            require_status(record, &[EscrowStatus::Disputed], "resolve")?;
            if !self.is_arbiter(caller) {
                return Err(EscrowError::unauthorized(format!(
                    "only the arbiter may resolve {id}"
                )));
            }
            let settlement = match outcome {
                DisputeOutcome::FavorBuyer => Settlement::ReturnedBuyer,
                DisputeOutcome::FavorSeller => Settlement::PaidSeller,
            };
            Ok(Some(settle(
                record,
                EscrowStatus::Resolved,
                settlement,
                now,
                EscrowFactKind::Resolved(outcome),
            )))
        })
    }

    /// Close an escrow whose deadline has passed. Anyone may call this.
    ///
    /// A funded escrow returns its amount to the buyer; an unfunded one
    /// lapses without moving value.
    ///
    /// # Errors
    /// * `EscrowError::InvalidTransition` unless the escrow is `Created` or
    ///   `Funded` and `expires_at` has been reached
    pub fn expire_escrow(&self, id: EscrowId, caller: &Principal) -> Result<EscrowRecord> {
        self.transition(id, caller, "expire", |record, now| {
            require_status(
                record,
                &[EscrowStatus::Created, EscrowStatus::Funded],
                "expire",
            )?;
            if !record.is_expired_at(now) {
                return Err(EscrowError::invalid_transition(format!(
                    "{id} does not expire until block {}",
                    record.expires_at.value()
                )));
            }
            let refunded = record.status == EscrowStatus::Funded;
            let (settlement, transfer) = if refunded {
                (
                    Settlement::ReturnedBuyer,
                    Some((Account::Custody, Account::from(&record.buyer))),
                )
            } else {
                (Settlement::Lapsed, None)
            };
            Ok(Some(Transition {
                next: record.settled(
                    EscrowStatus::Expired,
                    Resolution {
                        outcome: settlement,
                        recipient: refunded.then(|| record.buyer.clone()),
                        settled_at: now,
                    },
                ),
                transfer,
                fact: EscrowFactKind::Expired { refunded },
            }))
        })
    }

    /// Read one escrow
    ///
    /// # Errors
    /// * `EscrowError::NotFound` if the id was never issued
    pub fn get_escrow(&self, id: EscrowId) -> Result<EscrowRecord> {
        self.store.get(id)
    }

    /// Escrows where `principal` is buyer or seller
    pub fn escrows_for(&self, principal: &Principal) -> Vec<EscrowRecord> {
        self.store.list_for(principal)
    }

    /// Aggregate statistics as of the last committed transition
    pub fn get_contract_stats(&self) -> ContractStats {
        self.store.stats()
    }

    /// Statistics rebuilt from every stored record
    pub fn recompute_stats(&self) -> ContractStats {
        self.store.recompute_stats()
    }

    /// True when the incremental statistics match a full recompute
    pub fn stats_consistent(&self) -> bool {
        let incremental = self.get_contract_stats();
        let rebuilt = self.recompute_stats();
        if incremental != rebuilt {
            tracing::error!(?incremental, ?rebuilt, "escrow statistics diverged");
            return false;
        }
        true
    }

    /// Committed transitions of one escrow, oldest first
    pub fn history(&self, id: EscrowId) -> Vec<EscrowFact> {
        self.store.facts_for(id)
    }

    fn is_arbiter(&self, caller: &Principal) -> bool {
        self.config.arbiter.as_ref() == Some(caller)
    }

    /// Claim, plan, transfer, commit.
    ///
    /// `plan` returns `Ok(None)` for a no-op, in which case the current
    /// record is returned and nothing is written.
    fn transition<F>(
        &self,
        id: EscrowId,
        caller: &Principal,
        operation: &'static str,
        plan: F,
    ) -> Result<EscrowRecord>
    where
        F: FnOnce(&EscrowRecord, BlockHeight) -> Result<Option<Transition>>,
    {
        let _claim = self.store.claim(id).map_err(|err| {
            tracing::warn!(
                escrow_id = %id,
                operation,
                actor = %caller,
                error = %err,
                "escrow contended"
            );
            err
        })?;

        let current = self.store.get(id)?;
        let now = self.clock.current_block();
        let transition = match plan(&current, now) {
            Ok(Some(transition)) => transition,
            Ok(None) => {
                tracing::debug!(
                    escrow_id = %id,
                    operation,
                    status = %current.status,
                    "escrow unchanged"
                );
                return Ok(current);
            }
            Err(err) => {
                tracing::debug!(
                    escrow_id = %id,
                    operation,
                    actor = %caller,
                    status = %current.status,
                    error = %err,
                    "escrow operation rejected"
                );
                return Err(err);
            }
        };

        if let Some((from, to)) = &transition.transfer {
            self.ledger.transfer(from, to, current.amount).map_err(|err| {
                tracing::debug!(
                    escrow_id = %id,
                    operation,
                    error = %err,
                    "escrow transfer refused"
                );
                EscrowError::from(err)
            })?;
        }

        let fact = EscrowFact::new(id, transition.fact, caller.clone(), now);
        match self
            .store
            .replace_with_fact(id, current.status, transition.next, Some(fact))
        {
            Ok(stored) => {
                tracing::info!(
                    escrow_id = %id,
                    from = %current.status,
                    to = %stored.status,
                    actor = %caller,
                    amount = current.amount.value(),
                    block = now.value(),
                    "escrow transition committed"
                );
                Ok(stored)
            }
            Err(err) => {
                if let Some((from, to)) = &transition.transfer {
                    self.compensate(id, to, from, &current, &err)?;
                }
                Err(err)
            }
        }
    }

    /// Undo a transfer whose commit failed
    fn compensate(
        &self,
        id: EscrowId,
        from: &Account,
        to: &Account,
        record: &EscrowRecord,
        cause: &EscrowError,
    ) -> Result<()> {
        self.ledger.transfer(from, to, record.amount).map_err(|err| {
            tracing::error!(
                escrow_id = %id,
                from = %from,
                to = %to,
                amount = record.amount.value(),
                cause = %cause,
                error = %err,
                "failed to reverse escrow transfer"
            );
            EscrowError::internal(format!(
                "commit of {id} failed ({cause}) and the transfer could not be reversed: {err}"
            ))
        })
    }
}

fn require_status(record: &EscrowRecord, allowed: &[EscrowStatus], operation: &str) -> Result<()> {
    if allowed.contains(&record.status) {
        return Ok(());
    }
    Err(EscrowError::invalid_transition(format!(
        "cannot {operation} {} while {}",
        record.id, record.status
    )))
}

fn require_not_expired(record: &EscrowRecord, now: BlockHeight, operation: &str) -> Result<()> {
    if record.is_expired_at(now) {
        return Err(EscrowError::expired(format!(
            "cannot {operation} {}: expired at block {} (now {})",
            record.id,
            record.expires_at.value(),
            now.value()
        )));
    }
    Ok(())
}

/// Terminal transition paying the full amount out of custody
fn settle(
    record: &EscrowRecord,
    status: EscrowStatus,
    settlement: Settlement,
    now: BlockHeight,
    fact: EscrowFactKind,
) -> Transition {
    let recipient = match settlement {
        Settlement::PaidSeller => record.seller.clone(),
        Settlement::ReturnedBuyer | Settlement::Lapsed => record.buyer.clone(),
    };
    Transition {
        next: record.settled(
            status,
            Resolution {
                outcome: settlement,
                recipient: Some(recipient.clone()),
                settled_at: now,
            },
        ),
        transfer: Some((Account::Custody, Account::Principal(recipient))),
        fact,
    }
}
