//! API Request/Response Types

use serde::Serialize;

use crate::models::config::DetectorWeights;
use crate::models::types::{MetaFeatures, ModelPrediction, ThreatCategory};
use crate::storage::StoreStats;

/// API Response wrapper
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ApiError>,
    pub latency_ms: f64,
    pub timestamp: i64,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(data: T, latency_ms: f64) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            latency_ms,
            timestamp: chrono::Utc::now().timestamp(),
        }
    }
}

impl ApiResponse<()> {
    pub fn error(error: ApiError, latency_ms: f64) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error),
            latency_ms,
            timestamp: chrono::Utc::now().timestamp(),
        }
    }
}

/// API Error
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            code: "API_BAD_REQUEST".to_string(),
            message: message.into(),
            details: None,
        }
    }

    pub fn rate_limited(retry_after: u64) -> Self {
        Self {
            code: "API_RATE_LIMITED".to_string(),
            message: format!("Rate limit exceeded. Retry after {} seconds", retry_after),
            details: Some(format!("retry_after: {}", retry_after)),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            code: "API_INTERNAL_ERROR".to_string(),
            message: message.into(),
            details: None,
        }
    }
}

// ============================================
// Health Check
// ============================================

#[derive(Debug, Serialize)]
pub struct HealthData {
    pub status: String,
    pub service: String,
    pub version: String,
    pub model_version: String,
    pub uptime_seconds: u64,
    pub models_loaded: Vec<String>,
    pub prediction_history_size: usize,
    pub unique_addresses: usize,
    pub anomaly_model_loaded: bool,
}

// ============================================
// Prediction
// ============================================

/// Per-detector ensemble weights on the wire
#[derive(Debug, Serialize)]
pub struct WeightsData {
    pub rule_based: f64,
    pub anomaly: f64,
    pub pattern: f64,
    pub behavioral: f64,
    pub meta: f64,
}

impl From<DetectorWeights> for WeightsData {
    fn from(w: DetectorWeights) -> Self {
        Self {
            rule_based: w.rule_based,
            anomaly: w.anomaly,
            pattern: w.pattern,
            behavioral: w.behavioral,
            meta: w.meta,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct EnsembleDetails {
    pub individual_predictions: Vec<ModelPrediction>,
    pub meta_features: MetaFeatures,
    pub model_weights: WeightsData,
}

#[derive(Debug, Serialize)]
pub struct PredictData {
    pub danger_score: f64,
    pub threat_category: ThreatCategory,
    pub threat_level: u8,
    pub is_malicious: bool,
    pub confidence: f64,
    pub model_consensus: f64,
    /// Inverse-confidence convention kept for downstream consumers
    pub anomaly_score: f64,
    pub model_version: String,
    pub analysis_timestamp: String,
    pub ensemble_details: EnsembleDetails,
    pub features_analyzed: serde_json::Value,
    pub threat_signature: String,
}

/// Severity banner used in the formatted threat signature
pub fn threat_signature(category: ThreatCategory, confidence: f64) -> String {
    let severity = if confidence > 90.0 {
        "CRITICAL"
    } else if confidence > 75.0 {
        "HIGH"
    } else if confidence > 50.0 {
        "MEDIUM"
    } else {
        "LOW"
    };
    format!("{}: {} - Advanced ensemble analysis", category, severity)
}

// ============================================
// Analytics
// ============================================

#[derive(Debug, Serialize)]
pub struct SystemMetrics {
    pub total_predictions: usize,
    pub unique_addresses: usize,
    pub gas_price_samples: usize,
}

#[derive(Debug, Serialize)]
pub struct AnalyticsData {
    pub recent_statistics: StoreStats,
    pub model_performance: WeightsData,
    pub system_metrics: SystemMetrics,
}
