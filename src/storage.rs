//! Threat report persistence boundary
//!
//! The engine records every verdict through the `ThreatReportStore`
//! capability and treats failures as fire-and-forget. The shipped
//! implementation is in-process and bounded; a relational store would
//! plug in behind the same trait.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::Serialize;

use crate::models::errors::{AppError, AppResult};
use crate::models::types::{EnsembleResult, FeatureSet, ThreatCategory};
use crate::utils::constants::DEFAULT_REPORT_STORE_CAPACITY;

/// One stored verdict, keyed by transaction hash
#[derive(Debug, Clone, Serialize)]
pub struct ThreatReport {
    pub tx_hash: String,
    pub timestamp: DateTime<Utc>,
    pub confidence: f64,
    pub threat_category: ThreatCategory,
    pub threat_level: u8,
    pub is_malicious: bool,
    pub features: serde_json::Value,
    pub predictions: serde_json::Value,
}

/// Cumulative aggregates over every recorded verdict. Counters are not
/// decremented on eviction, so they reflect lifetime traffic rather than
/// current occupancy.
#[derive(Debug, Clone, Default, Serialize)]
pub struct StoreStats {
    pub total_reports: u64,
    pub malicious_count: u64,
    pub avg_confidence: f64,
    pub category_counts: HashMap<String, u64>,
}

pub trait ThreatReportStore: Send + Sync {
    /// Record one verdict. Same hash replaces the previous report.
    fn record(
        &self,
        tx_hash: &str,
        result: &EnsembleResult,
        features: &FeatureSet,
    ) -> AppResult<()>;

    fn get(&self, tx_hash: &str) -> Option<ThreatReport>;

    fn stats(&self) -> StoreStats;

    /// Number of reports currently held
    fn len(&self) -> usize;
}

struct Aggregates {
    total: u64,
    malicious: u64,
    confidence_sum: f64,
    category_counts: HashMap<String, u64>,
    insertion_order: VecDeque<String>,
}

/// Bounded concurrent in-process store. Lookups go through the
/// concurrent map; aggregates and the eviction ring sit behind one lock
/// taken only on writes and stat reads.
pub struct MemoryReportStore {
    capacity: usize,
    reports: DashMap<String, ThreatReport>,
    aggregates: Mutex<Aggregates>,
}

impl MemoryReportStore {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_REPORT_STORE_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            reports: DashMap::new(),
            aggregates: Mutex::new(Aggregates {
                total: 0,
                malicious: 0,
                confidence_sum: 0.0,
                category_counts: HashMap::new(),
                insertion_order: VecDeque::new(),
            }),
        }
    }
}

impl Default for MemoryReportStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ThreatReportStore for MemoryReportStore {
    fn record(
        &self,
        tx_hash: &str,
        result: &EnsembleResult,
        features: &FeatureSet,
    ) -> AppResult<()> {
        let report = ThreatReport {
            tx_hash: tx_hash.to_string(),
            timestamp: Utc::now(),
            confidence: result.final_confidence,
            threat_category: result.threat_category,
            threat_level: result.threat_level,
            is_malicious: result.is_malicious,
            features: serde_json::to_value(features)
                .map_err(|e| AppError::store_write_failed(format!("feature encode: {}", e)))?,
            predictions: serde_json::to_value(&result.individual_predictions)
                .map_err(|e| AppError::store_write_failed(format!("prediction encode: {}", e)))?,
        };

        let replaced = self.reports.insert(tx_hash.to_string(), report).is_some();

        let mut agg = self
            .aggregates
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        agg.total += 1;
        agg.confidence_sum += result.final_confidence;
        if result.is_malicious {
            agg.malicious += 1;
        }
        *agg.category_counts
            .entry(result.threat_category.as_str().to_string())
            .or_insert(0) += 1;

        if !replaced {
            agg.insertion_order.push_back(tx_hash.to_string());
            while agg.insertion_order.len() > self.capacity {
                if let Some(oldest) = agg.insertion_order.pop_front() {
                    self.reports.remove(&oldest);
                }
            }
        }

        Ok(())
    }

    fn get(&self, tx_hash: &str) -> Option<ThreatReport> {
        self.reports.get(tx_hash).map(|r| r.value().clone())
    }

    fn stats(&self) -> StoreStats {
        let agg = self
            .aggregates
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        StoreStats {
            total_reports: agg.total,
            malicious_count: agg.malicious,
            avg_confidence: if agg.total > 0 {
                agg.confidence_sum / agg.total as f64
            } else {
                0.0
            },
            category_counts: agg.category_counts.clone(),
        }
    }

    fn len(&self) -> usize {
        self.reports.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::types::EnsembleResult;

    fn verdict(confidence: f64, malicious: bool) -> EnsembleResult {
        EnsembleResult {
            final_confidence: confidence,
            is_malicious: malicious,
            ..EnsembleResult::neutral()
        }
    }

    #[test]
    fn test_record_and_get() {
        let store = MemoryReportStore::new();
        store
            .record("0xabc", &verdict(42.0, true), &FeatureSet::new())
            .unwrap();
        let report = store.get("0xabc").unwrap();
        assert_eq!(report.confidence, 42.0);
        assert!(report.is_malicious);
        assert!(store.get("0xmissing").is_none());
    }

    #[test]
    fn test_same_hash_replaces() {
        let store = MemoryReportStore::new();
        store
            .record("0x1", &verdict(10.0, false), &FeatureSet::new())
            .unwrap();
        store
            .record("0x1", &verdict(90.0, true), &FeatureSet::new())
            .unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(store.get("0x1").unwrap().confidence, 90.0);
        // Lifetime counters see both writes
        assert_eq!(store.stats().total_reports, 2);
    }

    #[test]
    fn test_capacity_enforced() {
        let store = MemoryReportStore::with_capacity(5);
        for i in 0..20 {
            store
                .record(&format!("0x{}", i), &verdict(1.0, false), &FeatureSet::new())
                .unwrap();
        }
        assert_eq!(store.len(), 5);
        // Oldest evicted, newest retained
        assert!(store.get("0x0").is_none());
        assert!(store.get("0x19").is_some());
    }

    #[test]
    fn test_stats_aggregation() {
        let store = MemoryReportStore::new();
        store
            .record("0x1", &verdict(20.0, false), &FeatureSet::new())
            .unwrap();
        store
            .record("0x2", &verdict(80.0, true), &FeatureSet::new())
            .unwrap();
        let stats = store.stats();
        assert_eq!(stats.total_reports, 2);
        assert_eq!(stats.malicious_count, 1);
        assert!((stats.avg_confidence - 50.0).abs() < 1e-9);
        assert_eq!(stats.category_counts.get("UNKNOWN"), Some(&2));
    }
}
