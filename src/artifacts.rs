use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;

use crate::error::{Result, RiskError};
use crate::inference::RiskPipeline;
use crate::model::RegressionModel;
use crate::scaler::StandardScaler;

pub const DEFAULT_ARTIFACT_DIR: &str = "assets";
pub const SCALER_FILE: &str = "scaler.json";
pub const MODEL_FILE: &str = "acl_risk_model.json";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub scaler: PathBuf,
    pub model: PathBuf,
}

impl ArtifactPaths {
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            scaler: dir.join(SCALER_FILE),
            model: dir.join(MODEL_FILE),
        }
    }
}

impl Default for ArtifactPaths {
    fn default() -> Self {
        Self::in_dir(DEFAULT_ARTIFACT_DIR)
    }
}

pub fn load_scaler(path: &Path) -> Result<StandardScaler> {
    read_json("scaler", path)
}

pub fn load_model(path: &Path) -> Result<RegressionModel> {
    read_json("model", path)
}

/// Loads both artifacts and runs the cross-artifact schema check. Any failure
/// here means nothing can be scored.
pub fn load_pipeline(paths: &ArtifactPaths) -> Result<RiskPipeline> {
    let scaler = load_scaler(&paths.scaler)?;
    let model = load_model(&paths.model)?;
    tracing::info!(
        scaler = %paths.scaler.display(),
        model = %paths.model.display(),
        "artifacts loaded"
    );
    RiskPipeline::new(scaler, model)
}

fn read_json<T: DeserializeOwned>(artifact: &'static str, path: &Path) -> Result<T> {
    let load_err = |reason: String| RiskError::ArtifactLoad {
        artifact,
        path: path.to_path_buf(),
        reason,
    };
    let raw = fs::read_to_string(path).map_err(|e| load_err(e.to_string()))?;
    serde_json::from_str::<T>(&raw).map_err(|e| load_err(e.to_string()))
}
