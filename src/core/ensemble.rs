//! Ensemble combination
//!
//! Runs every detector over one feature set and folds the surviving
//! predictions into a single verdict. Detector failures are logged and
//! skipped without reweighting: a failed detector's weight simply
//! deflates the weighted confidence, biasing the verdict toward benign.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use tracing::{debug, error};

use crate::core::detectors::{
    feature_complexity, AnomalyDetector, BehavioralAnalyzer, Detector, MetaLearner,
    PatternMatcher, RuleBasedDetector,
};
use crate::core::model::AnomalyModel;
use crate::models::config::SentinelConfig;
use crate::models::types::{EnsembleResult, FeatureSet, MetaFeatures, ModelPrediction, ThreatCategory};

struct WeightedDetector {
    weight: f64,
    detector: Box<dyn Detector>,
}

/// Compact record of one past verdict, kept in the rolling window
#[derive(Debug, Clone, Copy)]
pub struct VerdictSummary {
    pub final_confidence: f64,
    pub threat_category: ThreatCategory,
    pub is_malicious: bool,
}

pub struct EnsembleCombiner {
    cfg: Arc<SentinelConfig>,
    detectors: Vec<WeightedDetector>,
    history: Mutex<VecDeque<VerdictSummary>>,
}

impl EnsembleCombiner {
    pub fn new(cfg: Arc<SentinelConfig>, model: Option<Arc<dyn AnomalyModel>>) -> Self {
        let w = cfg.weights;
        let detectors = vec![
            WeightedDetector {
                weight: w.rule_based,
                detector: Box::new(RuleBasedDetector::new()),
            },
            WeightedDetector {
                weight: w.anomaly,
                detector: Box::new(AnomalyDetector::new(cfg.anomaly, model)),
            },
            WeightedDetector {
                weight: w.pattern,
                detector: Box::new(PatternMatcher::new(Arc::clone(&cfg))),
            },
            WeightedDetector {
                weight: w.behavioral,
                detector: Box::new(BehavioralAnalyzer::new()),
            },
            WeightedDetector {
                weight: w.meta,
                detector: Box::new(MetaLearner::new()),
            },
        ];
        Self {
            cfg,
            detectors,
            history: Mutex::new(VecDeque::new()),
        }
    }

    /// Run all detectors and combine their predictions into one verdict.
    /// Never fails: if every detector errors out, the neutral verdict is
    /// returned and recorded.
    pub fn combine(&self, features: &FeatureSet) -> EnsembleResult {
        let mut predictions: Vec<ModelPrediction> = Vec::with_capacity(self.detectors.len());
        let mut weighted_confidence = 0.0;

        for entry in &self.detectors {
            match entry.detector.predict(features) {
                Ok(prediction) => {
                    debug!(
                        detector = prediction.detector,
                        confidence = prediction.confidence,
                        category = %prediction.threat_category,
                        "Detector prediction"
                    );
                    weighted_confidence += prediction.confidence * entry.weight;
                    predictions.push(prediction);
                }
                Err(e) => {
                    error!(detector = entry.detector.name(), "Detector failed: {}", e);
                }
            }
        }

        if predictions.is_empty() {
            let result = EnsembleResult::neutral();
            self.record(&result);
            return result;
        }

        let (majority_category, consensus) = Self::majority_category(&predictions);

        let avg_level = predictions
            .iter()
            .map(|p| p.threat_level as f64)
            .sum::<f64>()
            / predictions.len() as f64;
        let threat_level = (avg_level.round() as u8).min(5);

        let is_malicious = weighted_confidence > self.cfg.malicious_confidence_threshold
            && consensus > self.cfg.malicious_consensus_threshold;

        let meta_features = Self::meta_features(&predictions, features);

        let result = EnsembleResult {
            final_confidence: weighted_confidence.clamp(0.0, 100.0),
            threat_category: majority_category,
            threat_level,
            is_malicious,
            model_consensus: consensus,
            individual_predictions: predictions,
            meta_features,
        };

        self.record(&result);
        result
    }

    /// Majority category with first-occurrence tie-break: on equal counts
    /// the category reported by the earliest detector wins.
    fn majority_category(predictions: &[ModelPrediction]) -> (ThreatCategory, f64) {
        let mut best = predictions[0].threat_category;
        let mut best_count = 0usize;

        for prediction in predictions {
            let count = predictions
                .iter()
                .filter(|p| p.threat_category == prediction.threat_category)
                .count();
            if count > best_count {
                best = prediction.threat_category;
                best_count = count;
            }
        }

        (best, best_count as f64 / predictions.len() as f64)
    }

    fn meta_features(predictions: &[ModelPrediction], features: &FeatureSet) -> MetaFeatures {
        let confidences: Vec<f64> = predictions.iter().map(|p| p.confidence).collect();
        let n = confidences.len() as f64;
        let mean = confidences.iter().sum::<f64>() / n;
        let variance = confidences.iter().map(|c| (c - mean).powi(2)).sum::<f64>() / n;
        let max = confidences.iter().cloned().fold(f64::MIN, f64::max);
        let min = confidences.iter().cloned().fold(f64::MAX, f64::min);

        let first = predictions[0].threat_category;
        let agreement = predictions.iter().all(|p| p.threat_category == first);

        MetaFeatures {
            confidence_std: variance.sqrt(),
            confidence_range: max - min,
            high_confidence_count: confidences.iter().filter(|c| **c > 80.0).count(),
            model_agreement: agreement,
            avg_confidence: mean,
            feature_complexity_score: feature_complexity(features),
        }
    }

    fn record(&self, result: &EnsembleResult) {
        let mut history = self
            .history
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if history.len() >= self.cfg.result_history_capacity {
            history.pop_front();
        }
        history.push_back(VerdictSummary {
            final_confidence: result.final_confidence,
            threat_category: result.threat_category,
            is_malicious: result.is_malicious,
        });
    }

    pub fn history_len(&self) -> usize {
        self.history
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    /// Snapshot of the rolling verdict window, oldest first
    pub fn recent_verdicts(&self) -> Vec<VerdictSummary> {
        self.history
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .iter()
            .copied()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn combiner() -> EnsembleCombiner {
        EnsembleCombiner::new(Arc::new(SentinelConfig::default()), None)
    }

    fn quiet_features() -> FeatureSet {
        let mut fs = FeatureSet::new();
        fs.set("gas_price_gwei", 20.0);
        fs.set("value_eth", 0.1);
        fs.set("gas_limit", 21_000.0);
        fs.set("data_size", 0u64);
        fs
    }

    fn hot_features() -> FeatureSet {
        let mut fs = FeatureSet::new();
        fs.set("gas_price_gwei", 150.0);
        fs.set("value_eth", 120.0);
        fs.set("gas_limit", 500_000.0);
        fs.set("data_size", 2_000u64);
        fs.set("is_contract_creation", true);
        fs.set("is_night_time", true);
        fs.set("is_round_number", false);
        fs
    }

    #[test]
    fn test_quiet_verdict_is_benign() {
        let result = combiner().combine(&quiet_features());
        assert!(!result.is_malicious);
        assert!(result.final_confidence < 30.0);
        assert_eq!(result.individual_predictions.len(), 5);
    }

    #[test]
    fn test_confidence_always_in_range() {
        let c = combiner();
        for fs in [quiet_features(), hot_features(), FeatureSet::new()] {
            let result = c.combine(&fs);
            assert!((0.0..=100.0).contains(&result.final_confidence));
            assert!(result.threat_level <= 5);
            assert!((0.0..=1.0).contains(&result.model_consensus));
        }
    }

    #[test]
    fn test_consensus_counts_majority() {
        let result = combiner().combine(&quiet_features());
        // With disjoint category vocabularies across detectors the
        // majority share is bounded by 2/5
        assert!(result.model_consensus <= 0.4 + 1e-9);
        assert!(result.model_consensus >= 0.2);
    }

    #[test]
    fn test_hot_transaction_scores_high() {
        let result = combiner().combine(&hot_features());
        assert!(result.final_confidence > 30.0, "got {}", result.final_confidence);
        assert!(!result.threat_category.is_benign() || result.model_consensus <= 0.4);
    }

    #[test]
    fn test_weight_deflation_biases_benign() {
        // All five detectors at confidence 100 give weighted 100; the
        // weighted sum with every weight present is the ceiling, so any
        // skipped detector can only lower it
        let w = SentinelConfig::default().weights;
        let all = 100.0 * w.sum();
        let without_rule = 100.0 * (w.sum() - w.rule_based);
        assert!((all - 100.0).abs() < 1e-9);
        assert!(without_rule < all);
    }

    #[test]
    fn test_history_is_bounded() {
        let mut cfg = SentinelConfig::default();
        cfg.result_history_capacity = 10;
        let c = EnsembleCombiner::new(Arc::new(cfg), None);
        for _ in 0..25 {
            c.combine(&quiet_features());
        }
        assert_eq!(c.history_len(), 10);
        let recent = c.recent_verdicts();
        assert_eq!(recent.len(), 10);
        assert!(recent.iter().all(|v| !v.is_malicious));
    }

    #[test]
    fn test_meta_features_consistency() {
        let result = combiner().combine(&hot_features());
        let m = &result.meta_features;
        assert!(m.confidence_std >= 0.0);
        assert!(m.confidence_range >= 0.0);
        assert!(m.avg_confidence >= 0.0 && m.avg_confidence <= 100.0);
        assert!(!m.model_agreement, "disjoint vocabularies cannot fully agree");
    }

    #[test]
    fn test_first_occurrence_tie_break() {
        // Quiet input: rule_based says UNKNOWN, anomaly NORMAL, pattern
        // UNKNOWN, behavioral BEHAVIORAL_ANOMALY, meta META_ANALYSIS.
        // UNKNOWN wins with 2/5 and is also first in detector order.
        let result = combiner().combine(&quiet_features());
        assert_eq!(result.threat_category, ThreatCategory::Unknown);
        assert!((result.model_consensus - 0.4).abs() < 1e-9);
    }
}
