//! Stateful Feature Extraction Pipeline
//!
//! Turns one raw transaction record into a flat, mutually-consistent
//! feature set. Five groups with disjoint key sets:
//! 1. Base       - normalized gas/value/calldata fields
//! 2. Temporal   - clock features plus gas-price percentile/deviation
//! 3. Pattern    - sender profile aggregates, value buckets
//! 4. Network    - function selector analysis, calldata entropy
//! 5. Behavioral - gas efficiency and automation indicators
//!
//! Extraction is total: a malformed numeric field resolves to 0, never
//! an error. Side effects per call: the sender's profile is updated and
//! the gas price is appended to the bounded history window.

use chrono::{DateTime, Datelike, Timelike, Utc};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use crate::core::profile::AddressProfileStore;
use crate::models::config::SentinelConfig;
use crate::models::types::{FeatureSet, TransactionRecord};
use crate::utils::constants::{wei_to_eth, wei_to_gwei, SELECTOR_MIN_DATA_LEN, WEI_PER_ETH};

/// Injectable clock so time-window features are testable
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Mutable extraction state, serialized behind one coarse lock so the
/// read-modify-write sequences (profile counters, history append) never
/// interleave across concurrent scoring calls.
struct ExtractorState {
    profiles: AddressProfileStore,
    gas_history: VecDeque<u128>,
}

pub struct FeatureExtractor {
    cfg: Arc<SentinelConfig>,
    state: Mutex<ExtractorState>,
    clock: Clock,
}

impl FeatureExtractor {
    pub fn new(cfg: Arc<SentinelConfig>) -> Self {
        Self::with_clock(cfg, Arc::new(Utc::now))
    }

    pub fn with_clock(cfg: Arc<SentinelConfig>, clock: Clock) -> Self {
        Self {
            state: Mutex::new(ExtractorState {
                profiles: AddressProfileStore::new(),
                gas_history: VecDeque::with_capacity(cfg.gas_history_capacity),
            }),
            cfg,
            clock,
        }
    }

    /// Extract the full feature set for one transaction. Never fails.
    pub fn extract(&self, tx: &TransactionRecord) -> FeatureSet {
        let now = (self.clock)();
        let gas_price = parse_quantity(tx.gas_price.as_ref());
        let gas_limit = parse_quantity(tx.gas_limit.as_ref());
        let value_wei = parse_quantity(tx.value.as_ref());
        let value_eth = wei_to_eth(value_wei);
        let data = tx.data.as_deref().unwrap_or("");

        let mut features = FeatureSet::new();
        self.base_features(&mut features, tx, gas_price, gas_limit, value_wei, value_eth, data);

        // The lock spans every stateful sub-computation so one scoring
        // call observes and mutates a single consistent snapshot.
        {
            let mut state = self
                .state
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            self.temporal_features(&mut features, &mut state, now, gas_price);
            self.pattern_features(&mut features, &mut state, tx, value_eth, now);
        }

        self.network_features(&mut features, data);
        self.behavioral_features(&mut features, gas_price, gas_limit, value_eth);

        features
    }

    fn base_features(
        &self,
        features: &mut FeatureSet,
        tx: &TransactionRecord,
        gas_price: u128,
        gas_limit: u128,
        value_wei: u128,
        value_eth: f64,
        data: &str,
    ) {
        features.set("gas_price_gwei", wei_to_gwei(gas_price));
        features.set("gas_limit", gas_limit as f64);
        features.set("value_eth", value_eth);
        features.set("value_wei", value_wei as f64);
        features.set("is_contract_creation", tx.is_contract_creation());
        features.set("data_size", data.len() as u64);
        features.set("has_data", !data.is_empty() && data != "0x");
        features.set("nonce", parse_quantity(tx.nonce.as_ref()) as f64);
    }

    fn temporal_features(
        &self,
        features: &mut FeatureSet,
        state: &mut ExtractorState,
        now: DateTime<Utc>,
        gas_price: u128,
    ) {
        let hour = now.hour();
        let is_weekend = now.weekday().number_from_monday() >= 6;
        let is_night = hour < self.cfg.night_end_hour || hour > self.cfg.night_start_hour;

        // Append first, then rank the current price within the window
        state.gas_history.push_back(gas_price);
        while state.gas_history.len() > self.cfg.gas_history_capacity {
            state.gas_history.pop_front();
        }

        let percentile = gas_price_percentile(&state.gas_history, gas_price);
        let mean = history_mean(&state.gas_history);
        let deviation = (gas_price as f64 - mean).abs();

        features.set("hour_of_day", hour as u64);
        features.set("is_weekend", is_weekend);
        features.set("is_night_time", is_night);
        features.set("gas_price_percentile", percentile);
        features.set("gas_price_deviation", deviation);
    }

    fn pattern_features(
        &self,
        features: &mut FeatureSet,
        state: &mut ExtractorState,
        tx: &TransactionRecord,
        value_eth: f64,
        now: DateTime<Utc>,
    ) {
        let (tx_count, total_value, age_hours) = match tx.from.as_deref() {
            Some(from) if !from.is_empty() => {
                let view =
                    state
                        .profiles
                        .observe(from, value_eth, tx.is_contract_creation(), now);
                (view.tx_count, view.total_value_eth, view.age_hours)
            }
            _ => (0, 0.0, 0.0),
        };

        features.set("from_tx_count", tx_count);
        features.set("from_total_value", total_value);
        features.set("value_bucket", self.value_bucket(value_eth));
        features.set("is_round_number", self.is_round_number(value_eth));
        features.set("address_age_hours", age_hours);
    }

    fn network_features(&self, features: &mut FeatureSet, data: &str) {
        let selector = if data.len() >= SELECTOR_MIN_DATA_LEN {
            data[..SELECTOR_MIN_DATA_LEN].to_lowercase()
        } else {
            String::new()
        };

        let has_suspicious = self.cfg.transfer_selectors.iter().any(|s| *s == selector);
        let has_proxy = self.cfg.proxy_selectors.iter().any(|s| *s == selector);

        features.set("function_signature", selector);
        features.set("has_suspicious_signature", has_suspicious);
        features.set("data_entropy", shannon_entropy(data));
        features.set("has_proxy_pattern", has_proxy);
    }

    fn behavioral_features(
        &self,
        features: &mut FeatureSet,
        gas_price: u128,
        gas_limit: u128,
        value_eth: f64,
    ) {
        let gas_efficiency = if gas_limit > 0 {
            gas_price as f64 / gas_limit as f64
        } else {
            0.0
        };
        let value_to_gas = if gas_price > 0 {
            value_eth / (gas_price as f64 / WEI_PER_ETH)
        } else {
            0.0
        };

        features.set("gas_efficiency", gas_efficiency);
        features.set("is_zero_value", value_eth == 0.0);
        features.set(
            "is_exact_gas_limit",
            self.cfg.exact_gas_limits.contains(&(gas_limit as u64)),
        );
        features.set("value_to_gas_ratio", value_to_gas);
    }

    fn value_bucket(&self, value_eth: f64) -> &'static str {
        let b = &self.cfg.buckets;
        if value_eth == 0.0 {
            "zero"
        } else if value_eth < b.dust_max {
            "dust"
        } else if value_eth < b.small_max {
            "small"
        } else if value_eth < b.medium_max {
            "medium"
        } else if value_eth < b.large_max {
            "large"
        } else {
            "whale"
        }
    }

    fn is_round_number(&self, value_eth: f64) -> bool {
        self.cfg.round_values.iter().any(|v| *v == value_eth)
    }

    /// Number of distinct sender addresses profiled so far
    pub fn unique_addresses(&self) -> usize {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .profiles
            .len()
    }

    /// Number of gas-price observations currently in the window
    pub fn gas_samples(&self) -> usize {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .gas_history
            .len()
    }
}

/// Normalize a loosely-typed numeric field: JSON number, decimal string
/// or 0x-hex string all map to the same integer; anything unparsable
/// maps to 0.
pub fn parse_quantity(value: Option<&serde_json::Value>) -> u128 {
    match value {
        Some(serde_json::Value::Number(n)) => {
            if let Some(u) = n.as_u64() {
                u as u128
            } else if let Some(f) = n.as_f64() {
                if f.is_finite() && f >= 0.0 {
                    f as u128
                } else {
                    0
                }
            } else {
                0
            }
        }
        Some(serde_json::Value::String(s)) => {
            let s = s.trim();
            if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
                u128::from_str_radix(hex, 16).unwrap_or(0)
            } else {
                s.parse::<u128>().unwrap_or(0)
            }
        }
        _ => 0,
    }
}

/// Percentile rank of `price` within the observation window: index of
/// the first equal value after sorting, so ties resolve to the lowest
/// rank. Defaults to 50 until more than 10 samples exist.
fn gas_price_percentile(history: &VecDeque<u128>, price: u128) -> f64 {
    if history.len() <= 10 {
        return 50.0;
    }
    let mut sorted: Vec<u128> = history.iter().copied().collect();
    sorted.sort_unstable();
    match sorted.iter().position(|p| *p == price) {
        Some(idx) => (idx as f64 / sorted.len() as f64) * 100.0,
        None => 50.0,
    }
}

fn history_mean(history: &VecDeque<u128>) -> f64 {
    if history.is_empty() {
        return 0.0;
    }
    history.iter().map(|p| *p as f64).sum::<f64>() / history.len() as f64
}

/// Shannon entropy over character frequency, 0 for fewer than 2 chars
fn shannon_entropy(data: &str) -> f64 {
    if data.len() < 2 {
        return 0.0;
    }
    let mut counts = std::collections::HashMap::new();
    for c in data.chars() {
        *counts.entry(c).or_insert(0usize) += 1;
    }
    let len = data.chars().count() as f64;
    counts
        .values()
        .map(|&count| {
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}
