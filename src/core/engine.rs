//! Sentinel engine
//!
//! One long-lived value wiring the feature extractor, the ensemble and
//! the report store together. `analyze` is total: extraction never
//! fails, detector failures are skipped by the combiner, and a report
//! store failure is logged and swallowed.

use std::sync::Arc;

use tracing::{info, warn};

use crate::core::ensemble::{EnsembleCombiner, VerdictSummary};
use crate::core::features::{Clock, FeatureExtractor};
use crate::core::model::{AnomalyModel, LinearDecisionModel};
use crate::models::config::SentinelConfig;
use crate::models::errors::AppResult;
use crate::models::types::{EnsembleResult, FeatureSet, TransactionRecord};
use crate::storage::{StoreStats, ThreatReportStore};

/// Names of the detectors in ensemble order, reported by health checks
pub const DETECTOR_NAMES: [&str; 5] = ["rule_based", "anomaly", "pattern", "behavioral", "meta"];

pub struct SentinelEngine {
    cfg: Arc<SentinelConfig>,
    extractor: FeatureExtractor,
    combiner: EnsembleCombiner,
    store: Arc<dyn ThreatReportStore>,
    model_loaded: bool,
}

impl SentinelEngine {
    pub fn new(
        cfg: SentinelConfig,
        model: Option<Arc<dyn AnomalyModel>>,
        store: Arc<dyn ThreatReportStore>,
    ) -> AppResult<Self> {
        cfg.validate()?;
        let cfg = Arc::new(cfg);
        Ok(Self {
            extractor: FeatureExtractor::new(Arc::clone(&cfg)),
            combiner: EnsembleCombiner::new(Arc::clone(&cfg), model.clone()),
            model_loaded: model.is_some(),
            store,
            cfg,
        })
    }

    /// Same as `new` but with an injected clock for the time-window
    /// features, used by tests that need a fixed hour.
    pub fn with_clock(
        cfg: SentinelConfig,
        model: Option<Arc<dyn AnomalyModel>>,
        store: Arc<dyn ThreatReportStore>,
        clock: Clock,
    ) -> AppResult<Self> {
        cfg.validate()?;
        let cfg = Arc::new(cfg);
        Ok(Self {
            extractor: FeatureExtractor::with_clock(Arc::clone(&cfg), clock),
            combiner: EnsembleCombiner::new(Arc::clone(&cfg), model.clone()),
            model_loaded: model.is_some(),
            store,
            cfg,
        })
    }

    /// Load the anomaly model artifact, degrading to no model on any
    /// failure. The detector runs purely statistical without it.
    pub fn load_model(path: &str) -> Option<Arc<dyn AnomalyModel>> {
        match LinearDecisionModel::from_file(path) {
            Ok(model) => Some(Arc::new(model)),
            Err(e) => {
                warn!("⚠️ Anomaly model unavailable, running statistical only: {}", e);
                None
            }
        }
    }

    /// Score one transaction end to end. Never fails.
    pub fn analyze(&self, tx: &TransactionRecord) -> (EnsembleResult, FeatureSet) {
        let features = self.extractor.extract(tx);
        let result = self.combiner.combine(&features);

        if let Err(e) = self.store.record(tx.hash_or_unknown(), &result, &features) {
            warn!(code = e.code_str(), "Report store write failed: {}", e);
        }

        info!(
            tx = tx.hash_or_unknown(),
            danger = %format_args!("{:.1}", result.final_confidence),
            category = %result.threat_category,
            consensus = %format_args!("{:.2}", result.model_consensus),
            "Analysis complete"
        );

        (result, features)
    }

    pub fn config(&self) -> &SentinelConfig {
        &self.cfg
    }

    pub fn model_loaded(&self) -> bool {
        self.model_loaded
    }

    pub fn prediction_history_len(&self) -> usize {
        self.combiner.history_len()
    }

    pub fn recent_verdicts(&self) -> Vec<VerdictSummary> {
        self.combiner.recent_verdicts()
    }

    pub fn unique_addresses(&self) -> usize {
        self.extractor.unique_addresses()
    }

    pub fn gas_price_samples(&self) -> usize {
        self.extractor.gas_samples()
    }

    pub fn store_stats(&self) -> StoreStats {
        self.store.stats()
    }
}
