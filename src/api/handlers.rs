//! API Request Handlers

use axum::{
    extract::{Json, State},
    http::StatusCode,
};
use std::sync::Arc;
use std::time::Instant;
use tracing::error;

use super::types::*;
use crate::core::engine::{SentinelEngine, DETECTOR_NAMES};
use crate::models::types::TransactionRecord;
use crate::utils::constants::{APP_NAME, APP_VERSION, MODEL_VERSION};

/// Shared application state
pub struct AppState {
    pub engine: Arc<SentinelEngine>,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(engine: Arc<SentinelEngine>) -> Self {
        Self {
            engine,
            start_time: Instant::now(),
        }
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}

// ============================================
// Health Check
// ============================================

pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<ApiResponse<HealthData>> {
    let start = Instant::now();

    let data = HealthData {
        status: "active".to_string(),
        service: APP_NAME.to_string(),
        version: APP_VERSION.to_string(),
        model_version: MODEL_VERSION.to_string(),
        uptime_seconds: state.uptime_seconds(),
        models_loaded: DETECTOR_NAMES.iter().map(|n| n.to_string()).collect(),
        prediction_history_size: state.engine.prediction_history_len(),
        unique_addresses: state.engine.unique_addresses(),
        anomaly_model_loaded: state.engine.model_loaded(),
    };

    Json(ApiResponse::success(
        data,
        start.elapsed().as_secs_f64() * 1000.0,
    ))
}

// ============================================
// Prediction
// ============================================

pub async fn predict(
    State(state): State<Arc<AppState>>,
    Json(tx): Json<TransactionRecord>,
) -> Result<Json<ApiResponse<PredictData>>, (StatusCode, Json<ApiResponse<()>>)> {
    let start = Instant::now();

    let (result, features) = state.engine.analyze(&tx);

    let features_analyzed = serde_json::to_value(&features).map_err(|e| {
        error!("Feature serialization failed: {}", e);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiResponse::error(
                ApiError::internal("Feature serialization failed"),
                start.elapsed().as_secs_f64() * 1000.0,
            )),
        )
    })?;

    let data = PredictData {
        danger_score: result.final_confidence,
        threat_category: result.threat_category,
        threat_level: result.threat_level,
        is_malicious: result.is_malicious,
        confidence: result.final_confidence,
        model_consensus: result.model_consensus,
        anomaly_score: 1.0 - result.final_confidence / 100.0,
        model_version: MODEL_VERSION.to_string(),
        analysis_timestamp: chrono::Utc::now().to_rfc3339(),
        threat_signature: threat_signature(result.threat_category, result.final_confidence),
        ensemble_details: EnsembleDetails {
            meta_features: result.meta_features.clone(),
            individual_predictions: result.individual_predictions,
            model_weights: state.engine.config().weights.into(),
        },
        features_analyzed,
    };

    Ok(Json(ApiResponse::success(
        data,
        start.elapsed().as_secs_f64() * 1000.0,
    )))
}

// ============================================
// Analytics
// ============================================

pub async fn get_analytics(
    State(state): State<Arc<AppState>>,
) -> Json<ApiResponse<AnalyticsData>> {
    let start = Instant::now();

    let data = AnalyticsData {
        recent_statistics: state.engine.store_stats(),
        model_performance: state.engine.config().weights.into(),
        system_metrics: SystemMetrics {
            total_predictions: state.engine.prediction_history_len(),
            unique_addresses: state.engine.unique_addresses(),
            gas_price_samples: state.engine.gas_price_samples(),
        },
    };

    Json(ApiResponse::success(
        data,
        start.elapsed().as_secs_f64() * 1000.0,
    ))
}
