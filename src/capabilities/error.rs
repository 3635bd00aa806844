//! Caller-facing error for capability invocations.

use serde::Serialize;
use thiserror::Error;

use crate::cache::CachePoisoned;
use crate::inference::InferenceError;
use crate::search::SearchError;
use crate::stats::StatsError;

/// The named failure kinds a capability caller can see.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    NotFound,
    SourceUnavailable,
    MalformedRecord,
    ModelUnavailable,
    SchemaMismatch,
    ProviderUnavailable,
    Cancelled,
    InvalidArguments,
    UnknownCapability,
    Internal,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::NotFound => "not_found",
            ErrorKind::SourceUnavailable => "source_unavailable",
            ErrorKind::MalformedRecord => "malformed_record",
            ErrorKind::ModelUnavailable => "model_unavailable",
            ErrorKind::SchemaMismatch => "schema_mismatch",
            ErrorKind::ProviderUnavailable => "provider_unavailable",
            ErrorKind::Cancelled => "cancelled",
            ErrorKind::InvalidArguments => "invalid_arguments",
            ErrorKind::UnknownCapability => "unknown_capability",
            ErrorKind::Internal => "internal",
        }
    }
}

#[derive(Debug, Error)]
pub enum CapabilityError {
    #[error(transparent)]
    Stats(#[from] StatsError),

    #[error(transparent)]
    Inference(#[from] InferenceError),

    #[error(transparent)]
    Search(#[from] SearchError),

    #[error("invalid arguments for {capability}: {message}")]
    InvalidArguments {
        capability: &'static str,
        message: String,
    },

    #[error("unknown capability '{0}'")]
    UnknownCapability(String),

    #[error("{0}")]
    Internal(String),
}

impl From<CachePoisoned> for CapabilityError {
    fn from(err: CachePoisoned) -> Self {
        Self::Internal(err.to_string())
    }
}

impl CapabilityError {
    pub fn invalid_arguments(capability: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidArguments {
            capability,
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Stats(e) => match e {
                StatsError::NotFound { .. } => ErrorKind::NotFound,
                StatsError::SourceUnavailable { .. } => ErrorKind::SourceUnavailable,
                StatsError::MalformedRecord { .. } => ErrorKind::MalformedRecord,
                StatsError::Cancelled => ErrorKind::Cancelled,
            },
            Self::Inference(e) => match e {
                InferenceError::SchemaMismatch(_) => ErrorKind::SchemaMismatch,
                InferenceError::Cancelled => ErrorKind::Cancelled,
                InferenceError::ModelUnavailable { .. }
                | InferenceError::InvalidArtifact(_)
                | InferenceError::InvalidOutput { .. } => ErrorKind::ModelUnavailable,
            },
            Self::Search(e) => match e {
                SearchError::Cancelled => ErrorKind::Cancelled,
                _ => ErrorKind::ProviderUnavailable,
            },
            Self::InvalidArguments { .. } => ErrorKind::InvalidArguments,
            Self::UnknownCapability(_) => ErrorKind::UnknownCapability,
            Self::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Get a short error code for logging.
    pub fn code(&self) -> &'static str {
        self.kind().as_str()
    }

    /// Row number of a malformed table row, when that is the failure.
    pub fn malformed_row(&self) -> Option<u64> {
        match self {
            Self::Stats(StatsError::MalformedRecord { row, .. }) => Some(*row),
            _ => None,
        }
    }
}
