//! The regression model behind the prediction endpoint.
//!
//! The handler only sees [`EnergyModel`]; the process wires in a
//! [`RandomForestModel`] read from disk once at startup.

use std::fs;
use std::path::{Path, PathBuf};

use log::info;
use serde::{Deserialize, Serialize};
use smartcore::ensemble::random_forest_regressor::RandomForestRegressor;
use smartcore::linalg::basic::matrix::DenseMatrix;
use thiserror::Error;

use crate::features::{FeatureVector, FEATURE_NAMES};

pub type Forest = RandomForestRegressor<f64, f64, DenseMatrix<f64>, Vec<f64>>;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("failed to read model artifact {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode model artifact {path:?}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("model artifact was trained on features {found:?}, expected {expected:?}")]
    FeatureMismatch {
        expected: Vec<String>,
        found: Vec<String>,
    },

    #[error("failed to write model artifact {path:?}: {message}")]
    Write { path: PathBuf, message: String },

    #[error("inference failed: {0}")]
    Inference(String),
}

/// A regressor over [`FeatureVector`]s whose output is in log1p space.
pub trait EnergyModel: Send + Sync {
    fn predict_log(&self, features: &FeatureVector) -> Result<f64, ModelError>;
}

/// On-disk envelope: the forest plus the column order it was fitted with.
#[derive(Serialize, Deserialize)]
pub struct ModelArtifact {
    pub feature_names: Vec<String>,
    pub model: Forest,
}

pub struct RandomForestModel {
    forest: Forest,
}

impl RandomForestModel {
    pub fn new(forest: Forest) -> Self {
        Self { forest }
    }

    pub fn load(path: &Path) -> Result<Self, ModelError> {
        let raw = fs::read(path).map_err(|source| ModelError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let artifact: ModelArtifact =
            serde_json::from_slice(&raw).map_err(|source| ModelError::Decode {
                path: path.to_path_buf(),
                source,
            })?;

        if artifact.feature_names != FEATURE_NAMES {
            return Err(ModelError::FeatureMismatch {
                expected: FEATURE_NAMES.iter().map(|s| s.to_string()).collect(),
                found: artifact.feature_names,
            });
        }

        info!("Loaded random forest from {:?} ({} bytes)", path, raw.len());
        Ok(Self::new(artifact.model))
    }

    /// Writes the forest with the current [`FEATURE_NAMES`] attached.
    pub fn save(&self, path: &Path) -> Result<(), ModelError> {
        let artifact = ArtifactRef {
            feature_names: &FEATURE_NAMES,
            model: &self.forest,
        };
        let json = serde_json::to_vec(&artifact).map_err(|e| ModelError::Write {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        fs::write(path, json).map_err(|e| ModelError::Write {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }
}

#[derive(Serialize)]
struct ArtifactRef<'a> {
    feature_names: &'a [&'a str],
    model: &'a Forest,
}

impl EnergyModel for RandomForestModel {
    fn predict_log(&self, features: &FeatureVector) -> Result<f64, ModelError> {
        let x = DenseMatrix::from_2d_vec(&vec![features.to_array().to_vec()]);
        let y = self
            .forest
            .predict(&x)
            .map_err(|e| ModelError::Inference(e.to_string()))?;

        y.first()
            .copied()
            .ok_or_else(|| ModelError::Inference("model returned no prediction".to_string()))
    }
}
