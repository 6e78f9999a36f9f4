//! Centralized Error Handling Module
//!
//! Every failure carries a unique error code for log monitoring.
//!
//! Error codes follow pattern: CATEGORY_SPECIFIC_ERROR
//! - DET_xxx:   detector errors
//! - MODEL_xxx: external anomaly model errors
//! - STORE_xxx: persistence collaborator errors
//! - API_xxx:   API errors
//! - CFG_xxx:   configuration errors

use std::fmt;

/// Application-wide error type
#[derive(Debug)]
pub struct AppError {
    /// Unique error code for logging/monitoring
    pub code: ErrorCode,
    /// Human-readable message
    pub message: String,
    /// Optional underlying error
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl AppError {
    /// Create a new AppError
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            source: None,
        }
    }

    /// Create AppError with source error
    pub fn with_source(
        code: ErrorCode,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            code,
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Get error code as string (for logging)
    pub fn code_str(&self) -> &'static str {
        self.code.as_str()
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code.as_str(), self.message)
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

/// Unique error codes for monitoring
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // ============================================
    // Detector Errors
    // ============================================
    /// A single detector's computation failed
    DetectorFailed,
    /// Detector produced an out-of-range output
    DetectorInvalidOutput,

    // ============================================
    // External Anomaly Model Errors
    // ============================================
    /// Model artifact could not be loaded
    ModelLoadFailed,
    /// Model artifact is internally inconsistent
    ModelInvalidArtifact,
    /// Scoring call failed
    ModelScoreFailed,
    /// Feature vector does not match the model's column layout
    ModelSchemaMismatch,
    /// Scoring call exceeded its deadline
    ModelTimeout,

    // ============================================
    // Persistence Errors
    // ============================================
    /// Report store write failed
    StoreWriteFailed,

    // ============================================
    // API Errors
    // ============================================
    /// Invalid request format
    ApiBadRequest,
    /// Rate limit exceeded
    ApiRateLimited,
    /// Internal server error
    ApiInternalError,

    // ============================================
    // Configuration Errors
    // ============================================
    /// Invalid configuration value
    ConfigInvalidValue,
    /// Detector weights do not sum to 1.0
    ConfigBadWeights,

    // ============================================
    // Generic Errors
    // ============================================
    /// Unknown error
    Unknown,
}

impl ErrorCode {
    /// Get string representation of error code
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DetectorFailed => "DET_FAILED",
            Self::DetectorInvalidOutput => "DET_INVALID_OUTPUT",

            Self::ModelLoadFailed => "MODEL_LOAD_FAILED",
            Self::ModelInvalidArtifact => "MODEL_INVALID_ARTIFACT",
            Self::ModelScoreFailed => "MODEL_SCORE_FAILED",
            Self::ModelSchemaMismatch => "MODEL_SCHEMA_MISMATCH",
            Self::ModelTimeout => "MODEL_TIMEOUT",

            Self::StoreWriteFailed => "STORE_WRITE_FAILED",

            Self::ApiBadRequest => "API_BAD_REQUEST",
            Self::ApiRateLimited => "API_RATE_LIMITED",
            Self::ApiInternalError => "API_INTERNAL_ERROR",

            Self::ConfigInvalidValue => "CFG_INVALID_VALUE",
            Self::ConfigBadWeights => "CFG_BAD_WEIGHTS",

            Self::Unknown => "UNKNOWN_ERROR",
        }
    }

    /// Get HTTP status code for API responses
    pub fn http_status(&self) -> u16 {
        match self {
            Self::ApiBadRequest | Self::ConfigInvalidValue | Self::ConfigBadWeights => 400,
            Self::ApiRateLimited => 429,
            _ => 500,
        }
    }

    /// Errors that degrade to a zero contribution instead of failing the call
    pub fn is_degradable(&self) -> bool {
        matches!(
            self,
            Self::ModelLoadFailed
                | Self::ModelScoreFailed
                | Self::ModelSchemaMismatch
                | Self::ModelTimeout
                | Self::StoreWriteFailed
        )
    }
}

// ============================================
// Convenience constructors
// ============================================

impl AppError {
    /// Detector failure
    pub fn detector_failed(detector: &str, msg: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::DetectorFailed,
            format!("{}: {}", detector, msg.into()),
        )
    }

    /// Model artifact load failure
    pub fn model_load_failed(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::ModelLoadFailed, msg)
    }

    /// Model artifact inconsistency
    pub fn model_invalid_artifact(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::ModelInvalidArtifact, msg)
    }

    /// Model scoring failure
    pub fn model_score_failed(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::ModelScoreFailed, msg)
    }

    /// Feature vector arity/layout mismatch
    pub fn model_schema_mismatch(expected: usize, got: usize) -> Self {
        Self::new(
            ErrorCode::ModelSchemaMismatch,
            format!("expected {} columns, got {}", expected, got),
        )
    }

    /// Report store write failure
    pub fn store_write_failed(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::StoreWriteFailed, msg)
    }

    /// API bad request
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::ApiBadRequest, msg)
    }

    /// API internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::ApiInternalError, msg)
    }

    /// Invalid configuration value
    pub fn config_invalid(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::ConfigInvalidValue, msg)
    }
}

// ============================================
// Result type alias
// ============================================

/// Application Result type
pub type AppResult<T> = Result<T, AppError>;

// ============================================
// Conversion from common error types
// ============================================

impl From<eyre::Report> for AppError {
    fn from(err: eyre::Report) -> Self {
        Self::new(ErrorCode::Unknown, err.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        Self::with_source(ErrorCode::ModelLoadFailed, "IO error", err)
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::with_source(ErrorCode::ModelInvalidArtifact, "JSON parse error", err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let err = AppError::detector_failed("rule_based", "division by zero");
        assert_eq!(err.code, ErrorCode::DetectorFailed);
        assert_eq!(err.code_str(), "DET_FAILED");
        assert!(err.to_string().contains("rule_based"));
    }

    #[test]
    fn test_degradable() {
        assert!(ErrorCode::ModelScoreFailed.is_degradable());
        assert!(ErrorCode::StoreWriteFailed.is_degradable());
        assert!(!ErrorCode::ApiBadRequest.is_degradable());
    }

    #[test]
    fn test_http_status() {
        assert_eq!(ErrorCode::ApiBadRequest.http_status(), 400);
        assert_eq!(ErrorCode::ApiRateLimited.http_status(), 429);
        assert_eq!(ErrorCode::ModelScoreFailed.http_status(), 500);
    }

    #[test]
    fn test_schema_mismatch_message() {
        let err = AppError::model_schema_mismatch(4, 3);
        assert!(err.message.contains("expected 4"));
        assert!(err.message.contains("got 3"));
    }
}
