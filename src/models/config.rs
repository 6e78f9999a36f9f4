//! Configuration module for Cerberus Sentinel
//!
//! Every scoring threshold, table and capacity lives here as data.
//! Detector logic never hardcodes a tunable value.

use crate::models::errors::{AppError, AppResult, ErrorCode};
use crate::utils::constants::{
    DEFAULT_EXACT_GAS_LIMITS, DEFAULT_GAS_HISTORY_CAPACITY, DEFAULT_PROXY_SELECTORS,
    DEFAULT_RESULT_HISTORY_CAPACITY, DEFAULT_ROUND_VALUES, DEFAULT_TRANSFER_SELECTORS,
};

/// Fixed per-detector ensemble weights. Invariant: they sum to 1.0.
#[derive(Debug, Clone, Copy)]
pub struct DetectorWeights {
    pub rule_based: f64,
    pub anomaly: f64,
    pub pattern: f64,
    pub behavioral: f64,
    pub meta: f64,
}

impl DetectorWeights {
    pub fn sum(&self) -> f64 {
        self.rule_based + self.anomaly + self.pattern + self.behavioral + self.meta
    }
}

impl Default for DetectorWeights {
    fn default() -> Self {
        Self {
            rule_based: 0.30,
            anomaly: 0.25,
            pattern: 0.20,
            behavioral: 0.15,
            meta: 0.10,
        }
    }
}

/// Value bucket upper bounds in normalized (ETH) units.
/// zero / dust / small / medium / large / whale.
#[derive(Debug, Clone, Copy)]
pub struct ValueBuckets {
    pub dust_max: f64,
    pub small_max: f64,
    pub medium_max: f64,
    pub large_max: f64,
}

impl Default for ValueBuckets {
    fn default() -> Self {
        Self {
            dust_max: 0.001,
            small_max: 0.1,
            medium_max: 1.0,
            large_max: 10.0,
        }
    }
}

/// Statistical anomaly scoring knobs
#[derive(Debug, Clone, Copy)]
pub struct AnomalyConfig {
    /// Minimum prior observations before a z-score contributes
    pub min_observations: u64,
    /// Floor applied to running std to avoid division blow-up
    pub std_floor: f64,
    /// Per-feature cap on z-score contribution (z * 10 capped here)
    pub contribution_cap: f64,
    /// Weight of the statistical sum in the blended confidence
    pub stat_weight: f64,
    /// Weight of the external model contribution in the blended confidence
    pub model_weight: f64,
    /// Confidence above which the category flips to ANOMALOUS_BEHAVIOR
    pub category_threshold: f64,
}

impl Default for AnomalyConfig {
    fn default() -> Self {
        Self {
            min_observations: 10,
            std_floor: 0.1,
            contribution_cap: 30.0,
            stat_weight: 0.8,
            model_weight: 0.9,
            category_threshold: 30.0,
        }
    }
}

/// Engine configuration: detector weights, verdict thresholds,
/// history capacities and the fixed feature tables
#[derive(Debug, Clone)]
pub struct SentinelConfig {
    pub weights: DetectorWeights,
    /// Weighted confidence above which a verdict can be malicious
    pub malicious_confidence_threshold: f64,
    /// Consensus ratio above which a verdict can be malicious
    pub malicious_consensus_threshold: f64,
    /// Gas-price window capacity (FIFO, oldest evicted)
    pub gas_history_capacity: usize,
    /// Rolling ensemble-result window capacity
    pub result_history_capacity: usize,
    pub anomaly: AnomalyConfig,
    pub buckets: ValueBuckets,
    /// "Nice" values that trip the round-number flag
    pub round_values: Vec<f64>,
    /// Known transfer/approve selectors (first 4 bytes of calldata, 0x-hex)
    pub transfer_selectors: Vec<String>,
    /// Known upgrade/proxy selectors
    pub proxy_selectors: Vec<String>,
    /// Canonical gas limits that trip the exact-gas-limit flag
    pub exact_gas_limits: Vec<u64>,
    /// Night window: hour < night_end or hour > night_start
    pub night_start_hour: u32,
    pub night_end_hour: u32,
}

impl Default for SentinelConfig {
    fn default() -> Self {
        Self {
            weights: DetectorWeights::default(),
            malicious_confidence_threshold: 30.0,
            malicious_consensus_threshold: 0.4,
            gas_history_capacity: DEFAULT_GAS_HISTORY_CAPACITY,
            result_history_capacity: DEFAULT_RESULT_HISTORY_CAPACITY,
            anomaly: AnomalyConfig::default(),
            buckets: ValueBuckets::default(),
            round_values: DEFAULT_ROUND_VALUES.to_vec(),
            transfer_selectors: DEFAULT_TRANSFER_SELECTORS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            proxy_selectors: DEFAULT_PROXY_SELECTORS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            exact_gas_limits: DEFAULT_EXACT_GAS_LIMITS.to_vec(),
            night_start_hour: 22,
            night_end_hour: 6,
        }
    }
}

impl SentinelConfig {
    /// Validate invariants that detector logic relies on
    pub fn validate(&self) -> AppResult<()> {
        let sum = self.weights.sum();
        if (sum - 1.0).abs() > 1e-6 {
            return Err(AppError::new(
                ErrorCode::ConfigBadWeights,
                format!("detector weights sum to {:.6}, expected 1.0", sum),
            ));
        }
        if self.gas_history_capacity == 0 || self.result_history_capacity == 0 {
            return Err(AppError::config_invalid("history capacities must be > 0"));
        }
        if self.anomaly.std_floor <= 0.0 {
            return Err(AppError::config_invalid("anomaly std_floor must be > 0"));
        }
        if !(0.0..=1.0).contains(&self.malicious_consensus_threshold) {
            return Err(AppError::config_invalid(
                "consensus threshold must lie in [0, 1]",
            ));
        }
        Ok(())
    }
}

/// Service-level configuration read from the environment
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Path to the pre-trained anomaly model artifact
    pub model_path: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: std::env::var("SENTINEL_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            // Railway-style PORT first, SENTINEL_PORT for local dev
            port: std::env::var("PORT")
                .or_else(|_| std::env::var("SENTINEL_PORT"))
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(5001),
            model_path: std::env::var("MODEL_PATH").unwrap_or_else(|_| "model.json".to_string()),
        }
    }
}
