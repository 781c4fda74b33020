//! Property tests for statistics and identifier allocation
//!
//! Random operation sequences drive one service; after every step the
//! incremental statistics must equal a full recompute and the locked value
//! must equal what the ledger holds in custody.

use escrow_core::config::DEFAULT_MAX_DESCRIPTION_LEN;
use escrow_service::{
    CreateEscrow, DisputeOutcome, EscrowConfig, EscrowError, EscrowId, EscrowService, Principal,
};
use escrow_testkit::strategies::{arb_amount, arb_description, arb_distinct_pair, arb_principal};
use escrow_testkit::{InMemoryLedger, ManualBlockClock};
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Op {
    Create {
        buyer: Principal,
        seller: Principal,
        amount: u64,
        description: String,
        expires_in: u64,
    },
    Fund(usize),
    Release(usize, Principal),
    Refund(usize, Principal),
    Dispute(usize, Principal),
    Resolve(usize, Principal, DisputeOutcome),
    Expire(usize, Principal),
    Advance(u64),
}

fn arb_outcome() -> impl Strategy<Value = DisputeOutcome> {
    prop_oneof![Just(DisputeOutcome::FavorBuyer), Just(DisputeOutcome::FavorSeller)]
}

fn arb_op() -> impl Strategy<Value = Op> {
    let slot = 0usize..8;
    prop_oneof![
        3 => (arb_distinct_pair(), arb_amount(), arb_description(), 1u64..20).prop_map(
            |((buyer, seller), amount, description, expires_in)| Op::Create {
                buyer,
                seller,
                amount: amount.value(),
                description,
                expires_in,
            }
        ),
        3 => slot.clone().prop_map(Op::Fund),
        2 => (slot.clone(), arb_principal()).prop_map(|(i, p)| Op::Release(i, p)),
        2 => (slot.clone(), arb_principal()).prop_map(|(i, p)| Op::Refund(i, p)),
        2 => (slot.clone(), arb_principal()).prop_map(|(i, p)| Op::Dispute(i, p)),
        2 => (slot.clone(), arb_principal(), arb_outcome())
            .prop_map(|(i, p, o)| Op::Resolve(i, p, o)),
        1 => (slot, arb_principal()).prop_map(|(i, p)| Op::Expire(i, p)),
        1 => (1u64..8).prop_map(Op::Advance),
    ]
}

fn service() -> EscrowService<InMemoryLedger, ManualBlockClock> {
    let ledger = InMemoryLedger::new();
    for name in ["alice", "bob", "carol", "dave", "arbiter"] {
        ledger.credit(&Principal::new(name), 100_000_000);
    }
    EscrowService::new(
        EscrowConfig::default().with_arbiter("arbiter"),
        ledger,
        ManualBlockClock::new(1),
    )
    .unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    /// Property: incremental statistics always equal a full recompute, and
    /// locked value always equals the custody balance
    #[test]
    fn stats_match_recompute(ops in prop::collection::vec(arb_op(), 1..60)) {
        let svc = service();
        let mut ids: Vec<EscrowId> = Vec::new();
        let supply = svc.ledger().total_supply();

        for op in ops {
            let pick = |i: usize| ids.get(i % ids.len().max(1)).copied();
            // Outcomes are ignored; only the resulting state is checked
            match op {
                Op::Create { buyer, seller, amount, description, expires_in } => {
                    let oversized = description.chars().count() > DEFAULT_MAX_DESCRIPTION_LEN;
                    let request = CreateEscrow::new(seller, amount, description)
                        .expires_in(expires_in);
                    match svc.create_escrow(&buyer, request) {
                        Ok(id) => {
                            prop_assert!(!oversized);
                            if let Some(last) = ids.last() {
                                prop_assert!(id > *last);
                            }
                            ids.push(id);
                        }
                        Err(err) => {
                            prop_assert!(oversized);
                            let is_invalid_input = matches!(err, EscrowError::InvalidInput { .. });
                            prop_assert!(is_invalid_input);
                        }
                    }
                }
                Op::Fund(i) => {
                    if let Some(id) = pick(i) {
                        let buyer = svc.get_escrow(id).unwrap().buyer;
                        let _ = svc.fund_escrow(id, &buyer);
                    }
                }
                Op::Release(i, caller) => {
                    if let Some(id) = pick(i) {
                        let _ = svc.release_escrow(id, &caller);
                    }
                }
                Op::Refund(i, caller) => {
                    if let Some(id) = pick(i) {
                        let _ = svc.refund_escrow(id, &caller);
                    }
                }
                Op::Dispute(i, caller) => {
                    if let Some(id) = pick(i) {
                        let _ = svc.dispute_escrow(id, &caller);
                    }
                }
                Op::Resolve(i, caller, outcome) => {
                    if let Some(id) = pick(i) {
                        let _ = svc.resolve_dispute(id, &caller, outcome);
                    }
                }
                Op::Expire(i, caller) => {
                    if let Some(id) = pick(i) {
                        let _ = svc.expire_escrow(id, &caller);
                    }
                }
                Op::Advance(blocks) => svc.clock().advance(blocks),
            }

            let stats = svc.get_contract_stats();
            prop_assert_eq!(stats, svc.recompute_stats());
            prop_assert_eq!(
                stats.total_value_locked,
                u128::from(svc.ledger().custody_balance())
            );
            prop_assert_eq!(svc.ledger().total_supply(), supply);
        }

        prop_assert_eq!(svc.get_contract_stats().total_created, ids.len() as u64);
    }

    /// Property: a record's journal replays to its stored status
    #[test]
    fn history_replays_to_status(ops in prop::collection::vec(arb_op(), 1..40)) {
        let svc = service();
        let mut ids: Vec<EscrowId> = Vec::new();

        for op in ops {
            let pick = |i: usize| ids.get(i % ids.len().max(1)).copied();
            match op {
                Op::Create { buyer, seller, amount, description, expires_in } => {
                    let request = CreateEscrow::new(seller, amount, description)
                        .expires_in(expires_in);
                    if let Ok(id) = svc.create_escrow(&buyer, request) {
                        ids.push(id);
                    }
                }
                Op::Fund(i) => {
                    if let Some(id) = pick(i) {
                        let buyer = svc.get_escrow(id).unwrap().buyer;
                        let _ = svc.fund_escrow(id, &buyer);
                    }
                }
                Op::Dispute(i, caller) => {
                    if let Some(id) = pick(i) {
                        let _ = svc.dispute_escrow(id, &caller);
                    }
                }
                Op::Resolve(i, caller, outcome) => {
                    if let Some(id) = pick(i) {
                        let _ = svc.resolve_dispute(id, &caller, outcome);
                    }
                }
                Op::Release(i, caller) => {
                    if let Some(id) = pick(i) {
                        let _ = svc.release_escrow(id, &caller);
                    }
                }
                Op::Refund(i, caller) | Op::Expire(i, caller) => {
                    if let Some(id) = pick(i) {
                        let _ = svc.refund_escrow(id, &caller);
                        let _ = svc.expire_escrow(id, &caller);
                    }
                }
                Op::Advance(blocks) => svc.clock().advance(blocks),
            }
        }

        for id in ids {
            let record = svc.get_escrow(id).unwrap();
            let history = svc.history(id);
            prop_assert_eq!(history.len() as u64, record.version + 1);
            let last = history.last().map(|f| f.kind.resulting_status());
            prop_assert_eq!(last, Some(record.status));
            prop_assert_eq!(record.status.is_terminal(), record.resolution.is_some());
        }
    }
}
