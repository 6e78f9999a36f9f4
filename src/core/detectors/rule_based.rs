//! Rule-based threat detector
//!
//! Pure function of the feature set. The numeric score accumulates from
//! independent additive thresholds; the category is chosen by a separate
//! fixed decision order over the same inputs. Score and category are
//! computed by different rule sets and can disagree, which is documented
//! behavior rather than a bug.

use std::collections::HashMap;

use super::{level_from_score, Detector};
use crate::models::errors::AppResult;
use crate::models::types::{FeatureSet, ModelPrediction, ThreatCategory};

// Additive score thresholds
const VERY_HIGH_GAS_GWEI: f64 = 100.0;
const HIGH_GAS_GWEI: f64 = 50.0;
const VERY_HIGH_VALUE_ETH: f64 = 100.0;
const HIGH_VALUE_ETH: f64 = 10.0;
const NIGHT_VALUE_ETH: f64 = 5.0;

// Category decision thresholds
const EXPLOIT_SCORE_CUTOFF: f64 = 60.0;
const FRONT_RUNNING_GAS_GWEI: f64 = 80.0;
const RUG_PULL_VALUE_ETH: f64 = 50.0;

#[derive(Debug, Default)]
pub struct RuleBasedDetector;

impl RuleBasedDetector {
    pub fn new() -> Self {
        Self
    }

    fn determine_category(features: &FeatureSet, score: f64) -> ThreatCategory {
        if features.flag("is_contract_creation") && score > EXPLOIT_SCORE_CUTOFF {
            ThreatCategory::SmartContractExploit
        } else if features.num("gas_price_gwei") > FRONT_RUNNING_GAS_GWEI {
            ThreatCategory::FrontRunning
        } else if features.num("value_eth") > RUG_PULL_VALUE_ETH {
            ThreatCategory::RugPull
        } else if features.flag("has_suspicious_signature") {
            ThreatCategory::PhishingContract
        } else {
            ThreatCategory::Unknown
        }
    }
}

impl Detector for RuleBasedDetector {
    fn name(&self) -> &'static str {
        "rule_based"
    }

    fn predict(&self, features: &FeatureSet) -> AppResult<ModelPrediction> {
        let mut score = 0.0;
        let mut reasoning: Vec<String> = Vec::new();

        let gas_price_gwei = features.num("gas_price_gwei");
        if gas_price_gwei > VERY_HIGH_GAS_GWEI {
            score += 30.0;
            reasoning.push(format!("Very high gas price: {:.1} gwei", gas_price_gwei));
        } else if gas_price_gwei > HIGH_GAS_GWEI {
            score += 15.0;
            reasoning.push(format!("High gas price: {:.1} gwei", gas_price_gwei));
        }

        let value_eth = features.num("value_eth");
        if value_eth > VERY_HIGH_VALUE_ETH {
            score += 35.0;
            reasoning.push(format!("Very high value: {:.2} ETH", value_eth));
        } else if value_eth > HIGH_VALUE_ETH {
            score += 20.0;
            reasoning.push(format!("High value: {:.2} ETH", value_eth));
        }

        if features.flag("is_contract_creation") {
            score += 25.0;
            reasoning.push("Contract creation detected".to_string());
        }

        if features.flag("is_night_time") && value_eth > NIGHT_VALUE_ETH {
            score += 10.0;
            reasoning.push("Large transaction during night hours".to_string());
        }

        if features.flag("has_suspicious_signature") {
            score += 20.0;
            reasoning.push("Suspicious function signature detected".to_string());
        }

        let category = Self::determine_category(features, score);
        let confidence = score.min(100.0);

        let mut feature_importance = HashMap::new();
        feature_importance.insert("gas_price".to_string(), (gas_price_gwei / 100.0).min(1.0));
        feature_importance.insert("value".to_string(), (value_eth / 100.0).min(1.0));
        feature_importance.insert(
            "contract_creation".to_string(),
            if features.flag("is_contract_creation") {
                1.0
            } else {
                0.0
            },
        );

        Ok(ModelPrediction {
            detector: self.name(),
            confidence,
            threat_category: category,
            threat_level: level_from_score(score),
            reasoning: if reasoning.is_empty() {
                "Normal transaction".to_string()
            } else {
                reasoning.join("; ")
            },
            feature_importance,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn features(pairs: &[(&str, f64)], flags: &[(&str, bool)]) -> FeatureSet {
        let mut fs = FeatureSet::new();
        for (k, v) in pairs {
            fs.set(*k, *v);
        }
        for (k, v) in flags {
            fs.set(*k, *v);
        }
        fs
    }

    #[test]
    fn test_quiet_transaction() {
        let fs = features(&[("gas_price_gwei", 20.0), ("value_eth", 0.1)], &[]);
        let pred = RuleBasedDetector::new().predict(&fs).unwrap();
        assert_eq!(pred.confidence, 0.0);
        assert_eq!(pred.threat_level, 0);
        assert_eq!(pred.threat_category, ThreatCategory::Unknown);
        assert_eq!(pred.reasoning, "Normal transaction");
    }

    #[test]
    fn test_exploit_category_needs_score_above_cutoff() {
        // Creation alone scores 25: falls through to UNKNOWN
        let fs = features(&[], &[("is_contract_creation", true)]);
        let pred = RuleBasedDetector::new().predict(&fs).unwrap();
        assert_eq!(pred.threat_category, ThreatCategory::Unknown);

        // Creation + whale value + night pushes past the cutoff
        let fs = features(
            &[("value_eth", 150.0)],
            &[("is_contract_creation", true), ("is_night_time", true)],
        );
        let pred = RuleBasedDetector::new().predict(&fs).unwrap();
        assert_eq!(pred.threat_category, ThreatCategory::SmartContractExploit);
        assert!(pred.confidence >= 60.0);
        assert!(pred.threat_level >= 3);
    }

    #[test]
    fn test_front_running_category() {
        let fs = features(&[("gas_price_gwei", 90.0)], &[]);
        let pred = RuleBasedDetector::new().predict(&fs).unwrap();
        assert_eq!(pred.threat_category, ThreatCategory::FrontRunning);
    }

    #[test]
    fn test_category_and_score_may_disagree() {
        // Gas at 90 gwei scores only 15 but the category rule fires
        let fs = features(&[("gas_price_gwei", 90.0)], &[]);
        let pred = RuleBasedDetector::new().predict(&fs).unwrap();
        assert_eq!(pred.threat_category, ThreatCategory::FrontRunning);
        assert_eq!(pred.confidence, 15.0);
        assert_eq!(pred.threat_level, 0);
    }

    #[test]
    fn test_suspicious_signature_in_reasoning() {
        let fs = features(
            &[("gas_price_gwei", 30.0)],
            &[("has_suspicious_signature", true)],
        );
        let pred = RuleBasedDetector::new().predict(&fs).unwrap();
        assert!(pred.reasoning.contains("Suspicious function signature"));
        assert_eq!(pred.threat_category, ThreatCategory::PhishingContract);
    }

    #[test]
    fn test_confidence_clamped_to_100() {
        let fs = features(
            &[("gas_price_gwei", 200.0), ("value_eth", 500.0)],
            &[
                ("is_contract_creation", true),
                ("is_night_time", true),
                ("has_suspicious_signature", true),
            ],
        );
        let pred = RuleBasedDetector::new().predict(&fs).unwrap();
        assert_eq!(pred.confidence, 100.0);
        assert_eq!(pred.threat_level, 5);
    }
}
