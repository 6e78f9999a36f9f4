//! Constants Module - Single Source of Truth
//!
//! Default tables and conversion helpers used across the engine.
//! Tunable policy lives in `SentinelConfig`; these are its defaults.

// ============================================
// APPLICATION CONSTANTS
// ============================================

/// Application name
pub const APP_NAME: &str = "Cerberus Sentinel";

/// Application version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Ensemble model version reported on the wire
pub const MODEL_VERSION: &str = "v2.0.0-advanced";

// ============================================
// UNIT CONVERSIONS
// ============================================

/// Wei per ETH
pub const WEI_PER_ETH: f64 = 1e18;

/// Wei per gwei
pub const WEI_PER_GWEI: f64 = 1e9;

/// Convert a wei amount to normalized ETH units
#[inline]
pub fn wei_to_eth(wei: u128) -> f64 {
    wei as f64 / WEI_PER_ETH
}

/// Convert a wei gas price to gwei
#[inline]
pub fn wei_to_gwei(wei: u128) -> f64 {
    wei as f64 / WEI_PER_GWEI
}

// ============================================
// HISTORY CAPACITIES
// ============================================

/// Gas-price observation window (FIFO)
pub const DEFAULT_GAS_HISTORY_CAPACITY: usize = 1000;

/// Rolling ensemble-result window
pub const DEFAULT_RESULT_HISTORY_CAPACITY: usize = 1000;

/// In-memory threat report store (oldest evicted beyond this)
pub const DEFAULT_REPORT_STORE_CAPACITY: usize = 10_000;

// ============================================
// FEATURE TABLES
// ============================================

/// Transfer/approve selectors flagged as suspicious when they lead calldata
pub const DEFAULT_TRANSFER_SELECTORS: [&str; 3] = [
    "0xa9059cbb", // transfer(address,uint256)
    "0x095ea7b3", // approve(address,uint256)
    "0x23b872dd", // transferFrom(address,address,uint256)
];

/// Upgrade/proxy selectors that trip the proxy-pattern flag
pub const DEFAULT_PROXY_SELECTORS: [&str; 3] = [
    "0x3659cfe6", // upgradeTo(address)
    "0x4f1ef286", // upgradeToAndCall(address,bytes)
    "0x52d1902d", // proxiableUUID()
];

/// "Nice" ETH values that trip the round-number flag
pub const DEFAULT_ROUND_VALUES: [f64; 7] = [0.1, 0.5, 1.0, 5.0, 10.0, 50.0, 100.0];

/// Canonical gas limits that suggest a templated/scripted transaction
pub const DEFAULT_EXACT_GAS_LIMITS: [u64; 4] = [21_000, 51_000, 100_000, 200_000];

/// Minimum calldata length (hex chars, 0x + 8) for a function selector
pub const SELECTOR_MIN_DATA_LEN: usize = 10;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wei_conversions() {
        assert_eq!(wei_to_eth(1_000_000_000_000_000_000), 1.0);
        assert_eq!(wei_to_gwei(20_000_000_000), 20.0);
        assert_eq!(wei_to_eth(0), 0.0);
    }

    #[test]
    fn test_selector_tables_are_selectors() {
        for sel in DEFAULT_TRANSFER_SELECTORS
            .iter()
            .chain(DEFAULT_PROXY_SELECTORS.iter())
        {
            assert!(sel.starts_with("0x"));
            assert_eq!(sel.len(), SELECTOR_MIN_DATA_LEN);
        }
    }
}
