//! Behavioral analysis detector
//!
//! Small additive indicators over timing, gas usage and sender activity.
//! Always reports the behavioral category regardless of score; the
//! ensemble decides whether a low-confidence claim matters.

use std::collections::HashMap;

use super::{level_from_score, Detector};
use crate::models::errors::AppResult;
use crate::models::types::{FeatureSet, ModelPrediction, ThreatCategory};

const NIGHT_VALUE_ETH: f64 = 1.0;
const AUTOMATION_EFFICIENCY: f64 = 0.001;
const HIGH_ACTIVITY_TX_COUNT: f64 = 100.0;

#[derive(Debug, Default)]
pub struct BehavioralAnalyzer;

impl BehavioralAnalyzer {
    pub fn new() -> Self {
        Self
    }
}

impl Detector for BehavioralAnalyzer {
    fn name(&self) -> &'static str {
        "behavioral"
    }

    fn predict(&self, features: &FeatureSet) -> AppResult<ModelPrediction> {
        let mut score: f64 = 0.0;
        let mut indicators: Vec<&str> = Vec::new();

        if features.flag("is_night_time") && features.num("value_eth") > NIGHT_VALUE_ETH {
            score += 15.0;
            indicators.push("Suspicious timing");
        }

        // Very high value moved per unit of gas suggests automation
        if features.num("gas_efficiency") > AUTOMATION_EFFICIENCY {
            score += 10.0;
            indicators.push("Automated gas optimization");
        }

        if features.num("from_tx_count") > HIGH_ACTIVITY_TX_COUNT {
            score += 5.0;
            indicators.push("High activity address");
        }

        let mut feature_importance = HashMap::new();
        feature_importance.insert("behavior_score".to_string(), score / 100.0);

        Ok(ModelPrediction {
            detector: self.name(),
            confidence: score.min(100.0),
            threat_category: ThreatCategory::BehavioralAnomaly,
            threat_level: level_from_score(score),
            reasoning: if indicators.is_empty() {
                "Normal behavior".to_string()
            } else {
                indicators.join("; ")
            },
            feature_importance,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn features(night: bool, value: f64, efficiency: f64, tx_count: f64) -> FeatureSet {
        let mut fs = FeatureSet::new();
        fs.set("is_night_time", night);
        fs.set("value_eth", value);
        fs.set("gas_efficiency", efficiency);
        fs.set("from_tx_count", tx_count);
        fs
    }

    #[test]
    fn test_quiet_behavior() {
        let pred = BehavioralAnalyzer::new()
            .predict(&features(false, 0.1, 0.0, 3.0))
            .unwrap();
        assert_eq!(pred.confidence, 0.0);
        assert_eq!(pred.reasoning, "Normal behavior");
        // Category is fixed even at zero confidence
        assert_eq!(pred.threat_category, ThreatCategory::BehavioralAnomaly);
    }

    #[test]
    fn test_night_indicator_needs_value() {
        let pred = BehavioralAnalyzer::new()
            .predict(&features(true, 0.5, 0.0, 0.0))
            .unwrap();
        assert_eq!(pred.confidence, 0.0);

        let pred = BehavioralAnalyzer::new()
            .predict(&features(true, 2.0, 0.0, 0.0))
            .unwrap();
        assert_eq!(pred.confidence, 15.0);
        assert!(pred.reasoning.contains("Suspicious timing"));
    }

    #[test]
    fn test_all_indicators_stack() {
        let pred = BehavioralAnalyzer::new()
            .predict(&features(true, 5.0, 0.01, 500.0))
            .unwrap();
        assert_eq!(pred.confidence, 30.0);
        assert_eq!(pred.threat_level, 1);
        assert!(pred.reasoning.contains("Automated gas optimization"));
        assert!(pred.reasoning.contains("High activity address"));
    }
}
