//! Hall-of-fame inference over an opaque, pre-trained classifier artifact.
//!
//! The adapter never inspects the artifact. It reads the bytes, hands them to
//! a [`ModelRuntime`], and talks to the decoded model only through
//! [`ScoreableModel`]: check the declared input schema, score, read back
//! label, probability and raw margin.

pub mod error;
pub mod gam;

use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::player::{FeatureColumn, FeatureVector, PlayerRecord};

pub use error::InferenceError;
pub use gam::{GamArtifact, GamModel, GamRuntime, PlattCalibrator, ShapeFunction};

// =============================================================================
// TRAITS
// =============================================================================

/// Model output before range validation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawPrediction {
    pub predicted_label: bool,
    pub probability: f64,
    pub score: f64,
}

/// A decoded classifier that can score one feature vector.
pub trait ScoreableModel: Send + Sync {
    /// Input columns the model was trained on, in order.
    fn input_schema(&self) -> &[FeatureColumn];

    fn score(&self, features: &FeatureVector) -> Result<RawPrediction, InferenceError>;
}

/// Turns artifact bytes into a scoreable model.
pub trait ModelRuntime: Send + Sync {
    fn name(&self) -> &'static str;

    fn decode(&self, artifact: &[u8]) -> Result<Arc<dyn ScoreableModel>, InferenceError>;
}

// =============================================================================
// PREDICTION
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Prediction {
    pub predicted_label: bool,
    /// Calibrated probability in [0, 1].
    pub probability: f64,
    /// Raw, unbounded model margin.
    pub score: f64,
}

impl TryFrom<RawPrediction> for Prediction {
    type Error = InferenceError;

    fn try_from(raw: RawPrediction) -> Result<Self, Self::Error> {
        // NaN fails the range check too.
        if !(0.0..=1.0).contains(&raw.probability) {
            return Err(InferenceError::InvalidOutput {
                probability: raw.probability,
            });
        }
        Ok(Self {
            predicted_label: raw.predicted_label,
            probability: raw.probability,
            score: raw.score,
        })
    }
}

// =============================================================================
// ADAPTER
// =============================================================================

#[derive(Clone)]
pub struct InferenceAdapter {
    model: Arc<dyn ScoreableModel>,
    source: Option<PathBuf>,
    fingerprint: String,
}

impl std::fmt::Debug for InferenceAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InferenceAdapter")
            .field("source", &self.source)
            .field("fingerprint", &self.fingerprint)
            .field("inputs", &self.model.input_schema().len())
            .finish()
    }
}

impl InferenceAdapter {
    /// Wrap an already-decoded model.
    pub fn new(model: Arc<dyn ScoreableModel>) -> Self {
        Self {
            model,
            source: None,
            fingerprint: String::new(),
        }
    }

    /// Decode artifact bytes through `runtime`.
    pub fn from_artifact_bytes(
        bytes: &[u8],
        runtime: &dyn ModelRuntime,
    ) -> Result<Self, InferenceError> {
        let fingerprint = blake3::hash(bytes).to_hex().to_string();
        let model = runtime.decode(bytes)?;
        debug!(runtime = runtime.name(), %fingerprint, "decoded model artifact");
        Ok(Self {
            model,
            source: None,
            fingerprint,
        })
    }

    /// Read and decode the artifact at `path`.
    pub fn from_path(
        path: impl AsRef<Path>,
        runtime: &dyn ModelRuntime,
    ) -> Result<Self, InferenceError> {
        let path = path.as_ref();
        let bytes =
            std::fs::read(path).map_err(|e| InferenceError::unavailable(path, e.to_string()))?;
        let mut adapter = Self::from_artifact_bytes(&bytes, runtime).map_err(|e| match e {
            InferenceError::InvalidArtifact(reason) => InferenceError::unavailable(path, reason),
            other => other,
        })?;
        adapter.source = Some(path.to_path_buf());
        info!(
            path = %path.display(),
            fingerprint = %adapter.fingerprint,
            "loaded model artifact"
        );
        Ok(adapter)
    }

    /// Load on the blocking pool, bounded by `timeout`.
    pub async fn load(
        path: impl AsRef<Path>,
        runtime: Arc<dyn ModelRuntime>,
        timeout: Duration,
        cancel_flag: Option<&AtomicBool>,
    ) -> Result<Self, InferenceError> {
        if crate::is_cancelled(cancel_flag) {
            return Err(InferenceError::Cancelled);
        }
        let path = path.as_ref().to_path_buf();
        let task_path = path.clone();
        let task =
            tokio::task::spawn_blocking(move || Self::from_path(task_path, runtime.as_ref()));
        match tokio::time::timeout(timeout, task).await {
            Ok(Ok(result)) => result,
            Ok(Err(join)) => Err(InferenceError::unavailable(
                path,
                format!("load task failed: {join}"),
            )),
            Err(_) => Err(InferenceError::unavailable(
                path,
                format!("load timed out after {timeout:?}"),
            )),
        }
    }

    /// blake3 digest of the artifact bytes; empty for in-memory models.
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    pub fn input_schema(&self) -> &[FeatureColumn] {
        self.model.input_schema()
    }

    /// Score one player.
    pub fn predict_hall_of_fame_probability(
        &self,
        record: &PlayerRecord,
    ) -> Result<Prediction, InferenceError> {
        let prediction = self.predict_features(&record.features())?;
        debug!(
            player = %record.full_name,
            probability = prediction.probability,
            score = prediction.score,
            "scored player"
        );
        Ok(prediction)
    }

    /// Score a raw feature vector after checking it against the model schema.
    pub fn predict_features(&self, features: &FeatureVector) -> Result<Prediction, InferenceError> {
        check_schema(self.model.input_schema(), features)?;
        Prediction::try_from(self.model.score(features)?)
    }
}

/// Require `features` to carry exactly the declared columns, in order, with
/// matching kinds.
pub fn check_schema(
    expected: &[FeatureColumn],
    features: &FeatureVector,
) -> Result<(), InferenceError> {
    for (idx, (column, feature)) in expected.iter().zip(features.iter()).enumerate() {
        if column.name != feature.name {
            return Err(InferenceError::schema_mismatch(format!(
                "position {idx}: expected column '{}', found '{}'",
                column.name, feature.name
            )));
        }
        if column.kind != feature.value.kind() {
            return Err(InferenceError::schema_mismatch(format!(
                "column '{}': expected {:?}, found {:?}",
                column.name,
                column.kind,
                feature.value.kind()
            )));
        }
    }

    if let Some(missing) = expected.get(features.len()) {
        return Err(InferenceError::schema_mismatch(format!(
            "missing column '{}'",
            missing.name
        )));
    }
    if let Some(extra) = features.iter().nth(expected.len()) {
        return Err(InferenceError::schema_mismatch(format!(
            "unexpected column '{}'",
            extra.name
        )));
    }
    Ok(())
}
