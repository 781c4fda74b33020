//! Standard principals, mirroring a simnet's named accounts

use escrow_core::Principal;

/// Default buyer (`wallet_1`)
pub fn buyer() -> Principal {
    Principal::new("ST1SJ3DTE5DN7X54YDH5D64R3BCB6A2AG2ZQ8YPD5")
}

/// Default seller (`wallet_2`)
pub fn seller() -> Principal {
    Principal::new("ST2CY5V39NHDPWSXMW9QDT3HC3GD6Q6XX4CFRK9AG")
}

/// Default arbiter (`deployer`)
pub fn arbiter() -> Principal {
    Principal::new("ST1PQHQKV0RJXZFY1DGX8MNSNYVE3VGZJSRTPGZGM")
}

/// Unrelated third party (`wallet_3`)
pub fn outsider() -> Principal {
    Principal::new("ST2JHG361ZXG51QTKY2NQCVBPPRRE2KZB1HR05NNC")
}
