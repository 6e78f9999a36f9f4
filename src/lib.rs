//! Cerberus Sentinel Library
//!
//! Real-time ensemble threat scoring for blockchain transactions:
//! - Stateful feature extraction (gas, value, calldata, sender history)
//! - Five heterogeneous detectors combined by weighted confidence
//! - Optional pre-trained anomaly model behind a black-box boundary
//! - In-memory threat report store with rolling analytics

pub mod api;
pub mod core;
pub mod models;
pub mod storage;
pub mod utils;

pub use crate::core::{
    AnomalyModel, EnsembleCombiner, FeatureExtractor, LinearDecisionModel, SentinelEngine,
};
pub use crate::models::{
    AppError, AppResult, EnsembleResult, ErrorCode, FeatureSet, ModelPrediction, SentinelConfig,
    ServerConfig, ThreatCategory, TransactionRecord,
};
pub use crate::storage::{MemoryReportStore, StoreStats, ThreatReport, ThreatReportStore};
