//! Core scoring engine: feature extraction, detectors, ensemble

pub mod detectors;
pub mod engine;
pub mod ensemble;
pub mod features;
pub mod model;
pub mod profile;
pub mod stats;

pub use engine::SentinelEngine;
pub use ensemble::EnsembleCombiner;
pub use features::FeatureExtractor;
pub use model::{AnomalyModel, LinearDecisionModel};
