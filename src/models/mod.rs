//! Data models, configuration and error types

pub mod config;
pub mod errors;
pub mod types;

pub use config::{AnomalyConfig, DetectorWeights, SentinelConfig, ServerConfig, ValueBuckets};
pub use errors::{AppError, AppResult, ErrorCode};
pub use types::{
    EnsembleResult, FeatureSet, FeatureValue, MetaFeatures, ModelPrediction, ThreatCategory,
    TransactionRecord,
};
