//! Bundled runtime for generalized additive binary classifiers.
//!
//! The artifact is a JSON pipeline: the declared input columns, an intercept,
//! one binned shape function per scored feature and a Platt calibrator.
//!
//! ```text
//! score       = intercept + Σ effects[bin(feature)]
//! probability = 1 / (1 + exp(slope * score + offset))
//! label       = score > 0
//! ```
//!
//! A value falls in the first bin whose upper bound is `>=` the value; values
//! above every bound fall in the trailing bin.

use std::collections::HashSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::error::InferenceError;
use super::{ModelRuntime, RawPrediction, ScoreableModel};
use crate::player::{FeatureColumn, FeatureKind, FeatureVector};

pub const GAM_FORMAT: &str = "gam-binary-classifier";
pub const GAM_FORMAT_VERSION: u32 = 1;

// =============================================================================
// ARTIFACT
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GamArtifact {
    pub format: String,
    pub version: u32,
    pub inputs: Vec<FeatureColumn>,
    pub intercept: f64,
    pub shape_functions: Vec<ShapeFunction>,
    pub calibrator: PlattCalibrator,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ShapeFunction {
    pub feature: String,
    /// Ascending upper bounds; one fewer than `bin_effects`.
    pub bin_upper_bounds: Vec<f64>,
    pub bin_effects: Vec<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PlattCalibrator {
    pub slope: f64,
    pub offset: f64,
}

impl PlattCalibrator {
    pub fn probability(&self, score: f64) -> f64 {
        1.0 / (1.0 + (self.slope * score + self.offset).exp())
    }
}

impl ShapeFunction {
    fn effect(&self, value: f64) -> f64 {
        let bin = self.bin_upper_bounds.partition_point(|&bound| bound < value);
        self.bin_effects[bin]
    }

    fn validate(&self) -> Result<(), InferenceError> {
        if self.bin_effects.len() != self.bin_upper_bounds.len() + 1 {
            return Err(InferenceError::invalid_artifact(format!(
                "shape function '{}' has {} effects for {} bounds",
                self.feature,
                self.bin_effects.len(),
                self.bin_upper_bounds.len()
            )));
        }
        let finite = self
            .bin_upper_bounds
            .iter()
            .chain(&self.bin_effects)
            .all(|v| v.is_finite());
        let ascending = self.bin_upper_bounds.windows(2).all(|w| w[0] < w[1]);
        if !finite || !ascending {
            return Err(InferenceError::invalid_artifact(format!(
                "shape function '{}' needs finite, strictly ascending bins",
                self.feature
            )));
        }
        Ok(())
    }
}

// =============================================================================
// MODEL
// =============================================================================

#[derive(Debug, Clone)]
pub struct GamModel {
    artifact: GamArtifact,
}

impl GamModel {
    pub fn from_artifact(artifact: GamArtifact) -> Result<Self, InferenceError> {
        if artifact.format != GAM_FORMAT {
            return Err(InferenceError::invalid_artifact(format!(
                "unsupported format '{}'",
                artifact.format
            )));
        }
        if artifact.version != GAM_FORMAT_VERSION {
            return Err(InferenceError::invalid_artifact(format!(
                "unsupported version {} (runtime supports {GAM_FORMAT_VERSION})",
                artifact.version
            )));
        }

        let mut seen = HashSet::new();
        for column in &artifact.inputs {
            if !seen.insert(column.name.as_str()) {
                return Err(InferenceError::invalid_artifact(format!(
                    "input column '{}' declared twice",
                    column.name
                )));
            }
        }

        for shape in &artifact.shape_functions {
            let declared = artifact.inputs.iter().find(|c| c.name == shape.feature);
            match declared {
                Some(column) if column.kind == FeatureKind::Numeric => shape.validate()?,
                Some(_) => {
                    return Err(InferenceError::invalid_artifact(format!(
                        "shape function '{}' targets a text column",
                        shape.feature
                    )))
                }
                None => {
                    return Err(InferenceError::invalid_artifact(format!(
                        "shape function '{}' targets an undeclared column",
                        shape.feature
                    )))
                }
            }
        }

        if !artifact.intercept.is_finite()
            || !artifact.calibrator.slope.is_finite()
            || !artifact.calibrator.offset.is_finite()
        {
            return Err(InferenceError::invalid_artifact(
                "intercept and calibrator must be finite",
            ));
        }

        Ok(Self { artifact })
    }

    pub fn artifact(&self) -> &GamArtifact {
        &self.artifact
    }
}

impl ScoreableModel for GamModel {
    fn input_schema(&self) -> &[FeatureColumn] {
        &self.artifact.inputs
    }

    fn score(&self, features: &FeatureVector) -> Result<RawPrediction, InferenceError> {
        let mut score = self.artifact.intercept;
        for shape in &self.artifact.shape_functions {
            let value = features.numeric(&shape.feature).ok_or_else(|| {
                InferenceError::schema_mismatch(format!(
                    "numeric column '{}' missing",
                    shape.feature
                ))
            })?;
            score += shape.effect(value);
        }

        Ok(RawPrediction {
            predicted_label: score > 0.0,
            probability: self.artifact.calibrator.probability(score),
            score,
        })
    }
}

// =============================================================================
// RUNTIME
// =============================================================================

/// Decodes [`GamArtifact`] JSON into a [`GamModel`].
#[derive(Debug, Clone, Copy, Default)]
pub struct GamRuntime;

impl ModelRuntime for GamRuntime {
    fn name(&self) -> &'static str {
        "gam-json"
    }

    fn decode(&self, artifact: &[u8]) -> Result<Arc<dyn ScoreableModel>, InferenceError> {
        let artifact: GamArtifact = serde_json::from_slice(artifact)
            .map_err(|e| InferenceError::invalid_artifact(format!("invalid JSON: {e}")))?;
        Ok(Arc::new(GamModel::from_artifact(artifact)?))
    }
}
