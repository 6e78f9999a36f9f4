//! Meta-learner
//!
//! Scores the complexity of the input itself rather than any threat
//! signature. Complex transactions deserve more scrutiny even when no
//! other detector fires.

use std::collections::HashMap;

use super::{feature_complexity, level_from_score, Detector};
use crate::models::errors::AppResult;
use crate::models::types::{FeatureSet, ModelPrediction, ThreatCategory};

#[derive(Debug, Default)]
pub struct MetaLearner;

impl MetaLearner {
    pub fn new() -> Self {
        Self
    }
}

impl Detector for MetaLearner {
    fn name(&self) -> &'static str {
        "meta"
    }

    fn predict(&self, features: &FeatureSet) -> AppResult<ModelPrediction> {
        let complexity = feature_complexity(features);
        let confidence = (complexity * 0.5).min(100.0);

        let mut feature_importance = HashMap::new();
        feature_importance.insert("meta_complexity".to_string(), complexity / 100.0);

        Ok(ModelPrediction {
            detector: self.name(),
            confidence,
            threat_category: ThreatCategory::MetaAnalysis,
            threat_level: level_from_score(confidence),
            reasoning: format!("Meta-analysis confidence: {:.1}", confidence),
            feature_importance,
        })
    }
}
