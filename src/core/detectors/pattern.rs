//! Signature-table threat detector
//!
//! Declarative pattern table, each entry a predicate plus a fixed score
//! and category. The highest-scoring match wins; earlier entries win
//! ties because later matches must be strictly higher to replace them.

use std::collections::HashMap;
use std::sync::Arc;

use super::{level_from_score, Detector};
use crate::models::config::SentinelConfig;
use crate::models::errors::AppResult;
use crate::models::types::{FeatureSet, ModelPrediction, ThreatCategory};

struct ThreatPattern {
    name: &'static str,
    matches: fn(&FeatureSet, &SentinelConfig) -> bool,
    score: f64,
    category: ThreatCategory,
}

const PATTERNS: [ThreatPattern; 2] = [
    ThreatPattern {
        name: "deploy_and_drain",
        matches: |f, cfg| {
            f.flag("is_contract_creation") && f.num("value_eth") > cfg.buckets.large_max
        },
        score: 85.0,
        category: ThreatCategory::SmartContractExploit,
    },
    ThreatPattern {
        name: "rug_pull",
        matches: |f, _| f.num("value_eth") > 20.0 && f.flag("is_round_number"),
        score: 75.0,
        category: ThreatCategory::RugPull,
    },
];

pub struct PatternMatcher {
    cfg: Arc<SentinelConfig>,
}

impl PatternMatcher {
    pub fn new(cfg: Arc<SentinelConfig>) -> Self {
        Self { cfg }
    }
}

impl Detector for PatternMatcher {
    fn name(&self) -> &'static str {
        "pattern"
    }

    fn predict(&self, features: &FeatureSet) -> AppResult<ModelPrediction> {
        let mut max_score = 0.0;
        let mut matched = ThreatCategory::Unknown;
        let mut reasoning = "No malicious patterns detected".to_string();

        for pattern in &PATTERNS {
            if (pattern.matches)(features, &self.cfg) && pattern.score > max_score {
                max_score = pattern.score;
                matched = pattern.category;
                reasoning = format!("Matched pattern: {}", pattern.name);
            }
        }

        let mut feature_importance = HashMap::new();
        feature_importance.insert("pattern_match".to_string(), max_score / 100.0);

        Ok(ModelPrediction {
            detector: self.name(),
            confidence: max_score,
            threat_category: matched,
            threat_level: level_from_score(max_score),
            reasoning,
            feature_importance,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matcher() -> PatternMatcher {
        PatternMatcher::new(Arc::new(SentinelConfig::default()))
    }

    fn features(value_eth: f64, round: bool, creation: bool) -> FeatureSet {
        let mut fs = FeatureSet::new();
        fs.set("value_eth", value_eth);
        fs.set("is_round_number", round);
        fs.set("is_contract_creation", creation);
        fs
    }

    #[test]
    fn test_no_match() {
        let pred = matcher().predict(&features(1.0, false, false)).unwrap();
        assert_eq!(pred.confidence, 0.0);
        assert_eq!(pred.threat_category, ThreatCategory::Unknown);
        assert_eq!(pred.reasoning, "No malicious patterns detected");
    }

    #[test]
    fn test_rug_pull_needs_both_conditions() {
        // Large but not round
        let pred = matcher().predict(&features(50.0, false, false)).unwrap();
        assert_eq!(pred.threat_category, ThreatCategory::Unknown);

        // Round but too small
        let pred = matcher().predict(&features(10.0, true, false)).unwrap();
        assert_eq!(pred.threat_category, ThreatCategory::Unknown);

        let pred = matcher().predict(&features(50.0, true, false)).unwrap();
        assert_eq!(pred.confidence, 75.0);
        assert_eq!(pred.threat_category, ThreatCategory::RugPull);
        assert_eq!(pred.threat_level, 3);
    }

    #[test]
    fn test_deploy_and_drain() {
        let pred = matcher().predict(&features(15.0, false, true)).unwrap();
        assert_eq!(pred.confidence, 85.0);
        assert_eq!(pred.threat_category, ThreatCategory::SmartContractExploit);
        assert_eq!(pred.threat_level, 4);
    }

    #[test]
    fn test_highest_score_wins_when_both_match() {
        let pred = matcher().predict(&features(50.0, true, true)).unwrap();
        assert_eq!(pred.confidence, 85.0);
        assert_eq!(pred.threat_category, ThreatCategory::SmartContractExploit);
        assert!(pred.reasoning.contains("deploy_and_drain"));
    }
}
