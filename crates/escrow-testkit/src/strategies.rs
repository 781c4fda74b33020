//! Proptest strategies for escrow core types

use escrow_core::{Amount, Principal};
use proptest::prelude::*;

/// Principal drawn from a small named pool, so generated operations often
/// hit the parties of an escrow
pub fn arb_principal() -> impl Strategy<Value = Principal> {
    prop::sample::select(vec!["alice", "bob", "carol", "dave", "arbiter"])
        .prop_map(Principal::new)
}

/// Two distinct principals
pub fn arb_distinct_pair() -> impl Strategy<Value = (Principal, Principal)> {
    (arb_principal(), arb_principal()).prop_filter("parties must differ", |(a, b)| a != b)
}

/// Positive escrow amount, small enough that sums never overflow
pub fn arb_amount() -> impl Strategy<Value = Amount> {
    (1u64..=1_000_000).prop_map(Amount::new)
}

/// Description of up to 320 characters, so some exceed the default
/// 256-character bound
pub fn arb_description() -> impl Strategy<Value = String> {
    "[a-z ]{0,320}"
}
