//! Error types for model loading and scoring.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum InferenceError {
    /// The artifact could not be read, timed out, or failed to decode.
    #[error("model artifact {path:?} unavailable: {reason}")]
    ModelUnavailable { path: PathBuf, reason: String },

    /// Raised by a runtime while decoding artifact bytes; the adapter rewraps
    /// it as `ModelUnavailable` with the artifact path.
    #[error("invalid model artifact: {0}")]
    InvalidArtifact(String),

    /// The feature vector does not match the model's declared inputs.
    #[error("feature schema mismatch: {0}")]
    SchemaMismatch(String),

    /// The model produced a probability outside [0, 1]. This points at a
    /// runtime/artifact version mismatch and is never clamped.
    #[error("model returned probability {probability} outside [0, 1]")]
    InvalidOutput { probability: f64 },

    #[error("model load cancelled")]
    Cancelled,
}

impl InferenceError {
    pub fn invalid_artifact(message: impl Into<String>) -> Self {
        Self::InvalidArtifact(message.into())
    }

    pub fn schema_mismatch(message: impl Into<String>) -> Self {
        Self::SchemaMismatch(message.into())
    }

    pub fn unavailable(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::ModelUnavailable {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Get a short error code for logging.
    pub fn code(&self) -> &'static str {
        match self {
            Self::ModelUnavailable { .. } => "model_unavailable",
            Self::InvalidArtifact(_) => "invalid_artifact",
            Self::SchemaMismatch(_) => "schema_mismatch",
            Self::InvalidOutput { .. } => "invalid_output",
            Self::Cancelled => "cancelled",
        }
    }
}
