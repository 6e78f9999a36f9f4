//! External Anomaly Model boundary
//!
//! The engine never trains anything. It consults a pre-trained scoring
//! artifact through the `AnomalyModel` capability and treats it as a
//! black box: a decision-function score in the model's native range,
//! lower meaning more anomalous. Any failure on this boundary degrades
//! to a zero risk contribution upstream.

use serde::Deserialize;
use std::path::Path;
use tracing::info;

use crate::models::errors::{AppError, AppResult};

/// Column order the engine feeds to the model. Missing features map to 0.
pub const MODEL_COLUMNS: [&str; 4] = ["gas_price", "gas_used", "value", "is_contract_creation"];

/// Black-box pre-trained anomaly scoring capability
pub trait AnomalyModel: Send + Sync {
    fn name(&self) -> &'static str;

    /// Decision-function score for one feature vector.
    /// Sign convention: lower = more anomalous.
    fn score_vector(&self, features: &[f64]) -> AppResult<f64>;
}

/// Standardized linear decision function loaded from a JSON artifact.
///
/// Artifact layout:
/// ```json
/// {
///   "columns": ["gas_price", "gas_used", "value", "is_contract_creation"],
///   "means":   [2.0e10, 50000.0, 0.8, 0.0],
///   "scales":  [5.0e9, 15000.0, 1.2, 1.0],
///   "weights": [-0.4, -0.3, -0.2, -0.6],
///   "bias": 0.1
/// }
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct LinearDecisionModel {
    columns: Vec<String>,
    means: Vec<f64>,
    scales: Vec<f64>,
    weights: Vec<f64>,
    bias: f64,
}

impl LinearDecisionModel {
    /// Load and validate the artifact. A missing or malformed file is an
    /// error for the caller to degrade on, never a panic.
    pub fn from_file(path: impl AsRef<Path>) -> AppResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            AppError::model_load_failed(format!("cannot read {}: {}", path.display(), e))
        })?;
        let model: Self = serde_json::from_str(&raw)?;
        model.validate()?;
        info!(
            columns = model.columns.len(),
            "Anomaly model artifact loaded from {}",
            path.display()
        );
        Ok(model)
    }

    fn validate(&self) -> AppResult<()> {
        let n = self.columns.len();
        if n == 0 {
            return Err(AppError::model_invalid_artifact("empty column list"));
        }
        if self.means.len() != n || self.scales.len() != n || self.weights.len() != n {
            return Err(AppError::model_invalid_artifact(format!(
                "column/means/scales/weights lengths disagree ({}/{}/{}/{})",
                n,
                self.means.len(),
                self.scales.len(),
                self.weights.len()
            )));
        }
        if self.scales.iter().any(|s| *s <= 0.0 || !s.is_finite()) {
            return Err(AppError::model_invalid_artifact(
                "scales must be finite and positive",
            ));
        }
        Ok(())
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }
}

impl AnomalyModel for LinearDecisionModel {
    fn name(&self) -> &'static str {
        "linear_decision"
    }

    fn score_vector(&self, features: &[f64]) -> AppResult<f64> {
        if features.len() != self.columns.len() {
            return Err(AppError::model_schema_mismatch(
                self.columns.len(),
                features.len(),
            ));
        }
        let score = self
            .weights
            .iter()
            .zip(features)
            .zip(self.means.iter().zip(&self.scales))
            .map(|((w, x), (mean, scale))| w * ((x - mean) / scale))
            .sum::<f64>()
            + self.bias;
        if !score.is_finite() {
            return Err(AppError::model_score_failed("non-finite decision score"));
        }
        Ok(score)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model() -> LinearDecisionModel {
        LinearDecisionModel {
            columns: MODEL_COLUMNS.iter().map(|c| c.to_string()).collect(),
            means: vec![20.0e9, 50_000.0, 0.8, 0.0],
            scales: vec![5.0e9, 15_000.0, 1.2, 1.0],
            weights: vec![-0.4, -0.3, -0.2, -0.6],
            bias: 0.1,
        }
    }

    #[test]
    fn test_normal_vector_scores_high() {
        let m = model();
        // On-mean observation keeps only the bias
        let score = m.score_vector(&[20.0e9, 50_000.0, 0.8, 0.0]).unwrap();
        assert!((score - 0.1).abs() < 1e-9);
    }

    #[test]
    fn test_anomalous_vector_scores_lower() {
        let m = model();
        let normal = m.score_vector(&[20.0e9, 50_000.0, 0.8, 0.0]).unwrap();
        let hot = m
            .score_vector(&[150.0e9, 500_000.0, 100.0, 1.0])
            .unwrap();
        assert!(hot < normal, "lower = more anomalous ({} vs {})", hot, normal);
    }

    #[test]
    fn test_wrong_arity_rejected() {
        let m = model();
        let err = m.score_vector(&[1.0, 2.0]).unwrap_err();
        assert_eq!(err.code_str(), "MODEL_SCHEMA_MISMATCH");
    }

    #[test]
    fn test_artifact_validation() {
        let mut m = model();
        m.scales[0] = 0.0;
        assert!(m.validate().is_err());

        let mut m = model();
        m.weights.pop();
        assert!(m.validate().is_err());
    }

    #[test]
    fn test_missing_file_is_error_not_panic() {
        let err = LinearDecisionModel::from_file("/nonexistent/model.json").unwrap_err();
        assert_eq!(err.code_str(), "MODEL_LOAD_FAILED");
    }
}
