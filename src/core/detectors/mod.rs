//! Detector capability and its five implementations
//!
//! Each detector maps a feature set to a single typed prediction. No
//! detector is authoritative; the ensemble weighs them all. A detector
//! that fails is skipped by the combiner, never fatal.

pub mod anomaly;
pub mod behavioral;
pub mod meta;
pub mod pattern;
pub mod rule_based;

pub use anomaly::AnomalyDetector;
pub use behavioral::BehavioralAnalyzer;
pub use meta::MetaLearner;
pub use pattern::PatternMatcher;
pub use rule_based::RuleBasedDetector;

use crate::models::errors::AppResult;
use crate::models::types::{FeatureSet, ModelPrediction};

/// Polymorphic scoring strategy
pub trait Detector: Send + Sync {
    fn name(&self) -> &'static str;

    fn predict(&self, features: &FeatureSet) -> AppResult<ModelPrediction>;
}

/// Complexity score of the input features, shared by the meta-learner
/// and the ensemble meta-features: weighted sum of calldata entropy,
/// gas-price percentile and sender activity, capped at 100.
pub fn feature_complexity(features: &FeatureSet) -> f64 {
    let mut complexity = 0.0;
    complexity += features.num("data_entropy") * 10.0;
    complexity += features.num("gas_price_percentile") / 10.0;
    complexity += features.num("from_tx_count") / 100.0;
    complexity.min(100.0)
}

/// Integer threat level derived from a 0-100 score, clamped to [0, 5]
pub(crate) fn level_from_score(score: f64) -> u8 {
    ((score / 20.0) as u8).min(5)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_from_score() {
        assert_eq!(level_from_score(0.0), 0);
        assert_eq!(level_from_score(19.9), 0);
        assert_eq!(level_from_score(20.0), 1);
        assert_eq!(level_from_score(100.0), 5);
        assert_eq!(level_from_score(250.0), 5);
    }

    #[test]
    fn test_feature_complexity_cap() {
        let mut fs = FeatureSet::new();
        fs.set("data_entropy", 50.0);
        fs.set("gas_price_percentile", 100.0);
        fs.set("from_tx_count", 100_000u64);
        assert_eq!(feature_complexity(&fs), 100.0);
    }

    #[test]
    fn test_feature_complexity_empty_is_zero() {
        assert_eq!(feature_complexity(&FeatureSet::new()), 0.0);
    }
}
