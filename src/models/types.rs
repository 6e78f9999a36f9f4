//! Type definitions for Cerberus Sentinel
//! All core data structures for ensemble threat scoring

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Threat category tags emitted by detectors and the ensemble
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ThreatCategory {
    FrontRunning,
    RugPull,
    HoneyPot,
    SmartContractExploit,
    PhishingContract,
    AnomalousBehavior,
    BehavioralAnomaly,
    MetaAnalysis,
    Normal,
    Unknown,
}

impl ThreatCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ThreatCategory::FrontRunning => "FRONT_RUNNING",
            ThreatCategory::RugPull => "RUG_PULL",
            ThreatCategory::HoneyPot => "HONEY_POT",
            ThreatCategory::SmartContractExploit => "SMART_CONTRACT_EXPLOIT",
            ThreatCategory::PhishingContract => "PHISHING_CONTRACT",
            ThreatCategory::AnomalousBehavior => "ANOMALOUS_BEHAVIOR",
            ThreatCategory::BehavioralAnomaly => "BEHAVIORAL_ANOMALY",
            ThreatCategory::MetaAnalysis => "META_ANALYSIS",
            ThreatCategory::Normal => "NORMAL",
            ThreatCategory::Unknown => "UNKNOWN",
        }
    }

    /// True for the non-verdict tags a quiet transaction ends up with
    pub fn is_benign(&self) -> bool {
        matches!(self, ThreatCategory::Normal | ThreatCategory::Unknown)
    }
}

impl std::fmt::Display for ThreatCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw transaction record as received from the caller.
///
/// Numeric fields arrive as JSON numbers, decimal strings or 0x-hex
/// strings depending on the upstream node library, so they are kept as
/// loose `serde_json::Value`s and normalized by the feature extractor.
/// A missing `to` means contract creation.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRecord {
    #[serde(default)]
    pub hash: Option<String>,
    #[serde(default)]
    pub from: Option<String>,
    #[serde(default)]
    pub to: Option<String>,
    #[serde(default)]
    pub value: Option<serde_json::Value>,
    #[serde(default, alias = "gas_price")]
    pub gas_price: Option<serde_json::Value>,
    #[serde(default, alias = "gas_limit", alias = "gas")]
    pub gas_limit: Option<serde_json::Value>,
    #[serde(default)]
    pub nonce: Option<serde_json::Value>,
    #[serde(default)]
    pub data: Option<String>,
}

impl TransactionRecord {
    pub fn hash_or_unknown(&self) -> &str {
        self.hash.as_deref().unwrap_or("unknown")
    }

    pub fn is_contract_creation(&self) -> bool {
        self.to.is_none()
    }
}

/// A single scalar feature value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FeatureValue {
    Float(f64),
    Int(u64),
    Bool(bool),
    Text(String),
}

impl From<f64> for FeatureValue {
    fn from(v: f64) -> Self {
        FeatureValue::Float(v)
    }
}
impl From<u64> for FeatureValue {
    fn from(v: u64) -> Self {
        FeatureValue::Int(v)
    }
}
impl From<bool> for FeatureValue {
    fn from(v: bool) -> Self {
        FeatureValue::Bool(v)
    }
}
impl From<&str> for FeatureValue {
    fn from(v: &str) -> Self {
        FeatureValue::Text(v.to_string())
    }
}
impl From<String> for FeatureValue {
    fn from(v: String) -> Self {
        FeatureValue::Text(v)
    }
}

/// Flat feature mapping produced per transaction.
///
/// Detectors only read through the typed accessors, which resolve a
/// missing or mistyped key to 0/false so every detector sees a defined
/// value for every key it uses.
#[derive(Debug, Clone, Default, Serialize)]
pub struct FeatureSet {
    #[serde(flatten)]
    values: HashMap<String, FeatureValue>,
}

impl FeatureSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<FeatureValue>) {
        self.values.insert(key.into(), value.into());
    }

    /// Numeric view of a feature (bool maps to 1/0, text and absent to 0)
    pub fn num(&self, key: &str) -> f64 {
        match self.values.get(key) {
            Some(FeatureValue::Float(v)) => *v,
            Some(FeatureValue::Int(v)) => *v as f64,
            Some(FeatureValue::Bool(v)) => {
                if *v {
                    1.0
                } else {
                    0.0
                }
            }
            _ => 0.0,
        }
    }

    /// Boolean view of a feature (absent or non-bool resolves to false)
    pub fn flag(&self, key: &str) -> bool {
        matches!(self.values.get(key), Some(FeatureValue::Bool(true)))
    }

    /// Text view of a feature (absent or non-text resolves to "")
    pub fn text(&self, key: &str) -> &str {
        match self.values.get(key) {
            Some(FeatureValue::Text(v)) => v.as_str(),
            _ => "",
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Prediction from a single detector, immutable once produced
#[derive(Debug, Clone, Serialize)]
pub struct ModelPrediction {
    pub detector: &'static str,
    /// Confidence in [0, 100]
    pub confidence: f64,
    pub threat_category: ThreatCategory,
    /// Threat level in [0, 5]
    pub threat_level: u8,
    pub reasoning: String,
    /// Feature name -> importance weight in [0, 1]
    pub feature_importance: HashMap<String, f64>,
}

/// Derived statistics over the individual detector outputs
#[derive(Debug, Clone, Default, Serialize)]
pub struct MetaFeatures {
    pub confidence_std: f64,
    pub confidence_range: f64,
    pub high_confidence_count: usize,
    pub model_agreement: bool,
    pub avg_confidence: f64,
    pub feature_complexity_score: f64,
}

/// Final ensemble verdict for one transaction
#[derive(Debug, Clone, Serialize)]
pub struct EnsembleResult {
    /// Weighted confidence, clamped to [0, 100]
    pub final_confidence: f64,
    pub threat_category: ThreatCategory,
    /// Rounded average threat level in [0, 5]
    pub threat_level: u8,
    pub is_malicious: bool,
    /// Fraction of detectors agreeing on the majority category, in [0, 1]
    pub model_consensus: f64,
    pub individual_predictions: Vec<ModelPrediction>,
    pub meta_features: MetaFeatures,
}

impl EnsembleResult {
    /// Neutral verdict returned when every detector failed
    pub fn neutral() -> Self {
        Self {
            final_confidence: 0.0,
            threat_category: ThreatCategory::Unknown,
            threat_level: 0,
            is_malicious: false,
            model_consensus: 0.0,
            individual_predictions: Vec::new(),
            meta_features: MetaFeatures::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feature_set_defaults() {
        let fs = FeatureSet::new();
        assert_eq!(fs.num("gas_price_gwei"), 0.0);
        assert!(!fs.flag("is_night_time"));
        assert_eq!(fs.text("function_signature"), "");
    }

    #[test]
    fn test_feature_set_typed_access() {
        let mut fs = FeatureSet::new();
        fs.set("value_eth", 1.5);
        fs.set("nonce", 7u64);
        fs.set("is_weekend", true);
        fs.set("value_bucket", "large");

        assert_eq!(fs.num("value_eth"), 1.5);
        assert_eq!(fs.num("nonce"), 7.0);
        assert_eq!(fs.num("is_weekend"), 1.0);
        assert!(fs.flag("is_weekend"));
        assert_eq!(fs.text("value_bucket"), "large");
        // Mistyped access degrades to the zero default
        assert_eq!(fs.num("value_bucket"), 0.0);
        assert!(!fs.flag("value_eth"));
    }

    #[test]
    fn test_contract_creation_flag() {
        let tx = TransactionRecord {
            to: None,
            ..Default::default()
        };
        assert!(tx.is_contract_creation());

        let tx = TransactionRecord {
            to: Some("0xdead".to_string()),
            ..Default::default()
        };
        assert!(!tx.is_contract_creation());
    }

    #[test]
    fn test_transaction_record_aliases() {
        let json = r#"{"hash":"0xabc","from":"0xf00","gasPrice":"0x5d21dba00","gas_limit":21000}"#;
        let tx: TransactionRecord = serde_json::from_str(json).unwrap();
        assert_eq!(tx.hash_or_unknown(), "0xabc");
        assert!(tx.gas_price.is_some());
        assert!(tx.gas_limit.is_some());
    }

    #[test]
    fn test_neutral_result() {
        let r = EnsembleResult::neutral();
        assert_eq!(r.final_confidence, 0.0);
        assert_eq!(r.threat_category, ThreatCategory::Unknown);
        assert!(!r.is_malicious);
        assert!(r.individual_predictions.is_empty());
    }
}
