//! Statistical anomaly detector
//!
//! Two signals blended per transaction: running z-scores over a small set
//! of tracked features, and an optional pre-trained decision model. Both
//! degrade independently. Trackers score the incoming value BEFORE
//! folding it in, so the current observation never dilutes its own
//! surprise.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tracing::warn;

use super::{level_from_score, Detector};
use crate::core::model::AnomalyModel;
use crate::core::stats::StatTracker;
use crate::models::config::AnomalyConfig;
use crate::models::errors::AppResult;
use crate::models::types::{FeatureSet, ModelPrediction, ThreatCategory};

/// Features kept under statistical surveillance
const TRACKED_FEATURES: [&str; 4] = ["gas_price_gwei", "value_eth", "gas_limit", "data_size"];

pub struct AnomalyDetector {
    cfg: AnomalyConfig,
    trackers: Mutex<HashMap<&'static str, StatTracker>>,
    model: Option<Arc<dyn AnomalyModel>>,
}

impl AnomalyDetector {
    pub fn new(cfg: AnomalyConfig, model: Option<Arc<dyn AnomalyModel>>) -> Self {
        let trackers = TRACKED_FEATURES
            .iter()
            .map(|name| (*name, StatTracker::new()))
            .collect();
        Self {
            cfg,
            trackers: Mutex::new(trackers),
            model,
        }
    }

    /// Per-sample count of a named tracker, for warm-up inspection
    pub fn observation_count(&self, feature: &str) -> u64 {
        let trackers = self
            .trackers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        trackers.get(feature).map(|t| t.count()).unwrap_or(0)
    }

    /// Statistical half: z-score each tracked feature against its running
    /// distribution, then fold the observation in. Cold trackers (at or
    /// below the warm-up floor) contribute nothing but still learn.
    fn statistical_score(
        &self,
        features: &FeatureSet,
        importance: &mut HashMap<String, f64>,
    ) -> f64 {
        let mut score = 0.0;
        let mut trackers = self
            .trackers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        for name in TRACKED_FEATURES {
            let value = features.num(name);
            let tracker = trackers.entry(name).or_default();

            if tracker.count() > self.cfg.min_observations {
                let z = tracker.z_score(value, self.cfg.std_floor);
                let contribution = (z * 10.0).min(self.cfg.contribution_cap);
                score += contribution;
                importance.insert(name.to_string(), contribution / self.cfg.contribution_cap);
            }

            tracker.update(value);
        }

        score
    }

    /// Model half: consult the pre-trained artifact and map its decision
    /// score (lower = more anomalous) onto a 0-100 risk. Any failure on
    /// the model boundary degrades to zero.
    fn model_score(&self, features: &FeatureSet, importance: &mut HashMap<String, f64>) -> f64 {
        let model = match &self.model {
            Some(model) => model,
            None => return 0.0,
        };

        let vector = [
            features.num("gas_price_gwei") * 1e9,
            features.num("gas_limit"),
            features.num("value_eth"),
            if features.flag("is_contract_creation") {
                1.0
            } else {
                0.0
            },
        ];

        match model.score_vector(&vector) {
            Ok(decision) => {
                let risk = ((1.0 - decision) * 50.0).clamp(0.0, 100.0);
                importance.insert("decision_model".to_string(), risk / 100.0);
                risk
            }
            Err(e) => {
                warn!("Anomaly model scoring degraded: {}", e);
                0.0
            }
        }
    }
}

impl Detector for AnomalyDetector {
    fn name(&self) -> &'static str {
        "anomaly"
    }

    fn predict(&self, features: &FeatureSet) -> AppResult<ModelPrediction> {
        let mut feature_importance = HashMap::new();

        let stat = self.statistical_score(features, &mut feature_importance);
        let ml = self.model_score(features, &mut feature_importance);

        let blended = (stat * self.cfg.stat_weight + ml * self.cfg.model_weight).min(100.0);

        let category = if blended > self.cfg.category_threshold {
            ThreatCategory::AnomalousBehavior
        } else {
            ThreatCategory::Normal
        };

        Ok(ModelPrediction {
            detector: self.name(),
            confidence: blended,
            threat_category: category,
            threat_level: level_from_score(blended),
            reasoning: format!("Stat anomaly: {:.1}; model risk: {:.1}", stat, ml),
            feature_importance,
        })
    }
}
