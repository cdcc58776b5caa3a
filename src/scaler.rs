use serde::{Deserialize, Serialize};

use crate::error::{Result, RiskError};
use crate::features::{FeatureVector, describe_mismatch};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScalerKind {
    #[default]
    Standard,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StandardScalerArtifact {
    #[serde(default)]
    kind: ScalerKind,
    #[serde(default)]
    feature_names: Option<Vec<String>>,
    mean: Vec<f64>,
    scale: Vec<f64>,
    #[serde(default = "default_true")]
    with_mean: bool,
    #[serde(default = "default_true")]
    with_std: bool,
    #[serde(default)]
    schema_sha256: Option<String>,
}

fn default_true() -> bool {
    true
}

/// Fitted per-column standardization: `(x - mean) / scale`.
///
/// Only constructible through deserialization or [`StandardScaler::new`],
/// both of which reject mean/scale/name lists of differing length.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "StandardScalerArtifact", into = "StandardScalerArtifact")]
pub struct StandardScaler {
    feature_names: Option<Vec<String>>,
    mean: Vec<f64>,
    scale: Vec<f64>,
    with_mean: bool,
    with_std: bool,
    schema_sha256: Option<String>,
}

impl TryFrom<StandardScalerArtifact> for StandardScaler {
    type Error = String;

    fn try_from(raw: StandardScalerArtifact) -> std::result::Result<Self, Self::Error> {
        let mut scaler = StandardScaler::new(raw.mean, raw.scale)?;
        scaler.with_mean = raw.with_mean;
        scaler.with_std = raw.with_std;
        scaler.schema_sha256 = raw.schema_sha256;
        if let Some(names) = raw.feature_names
            && !names.is_empty()
        {
            scaler = scaler.with_feature_names(names)?;
        }
        Ok(scaler)
    }
}

impl From<StandardScaler> for StandardScalerArtifact {
    fn from(s: StandardScaler) -> Self {
        Self {
            kind: ScalerKind::Standard,
            feature_names: s.feature_names,
            mean: s.mean,
            scale: s.scale,
            with_mean: s.with_mean,
            with_std: s.with_std,
            schema_sha256: s.schema_sha256,
        }
    }
}

impl StandardScaler {
    pub fn new(mean: Vec<f64>, scale: Vec<f64>) -> std::result::Result<Self, String> {
        if mean.is_empty() {
            return Err("scaler has no columns".to_string());
        }
        if mean.len() != scale.len() {
            return Err(format!(
                "scaler mean has {} entries but scale has {}",
                mean.len(),
                scale.len()
            ));
        }
        Ok(Self {
            feature_names: None,
            mean,
            scale,
            with_mean: true,
            with_std: true,
            schema_sha256: None,
        })
    }

    pub fn with_feature_names(mut self, names: Vec<String>) -> std::result::Result<Self, String> {
        if names.len() != self.mean.len() {
            return Err(format!(
                "scaler declares {} feature names but was fitted on {} columns",
                names.len(),
                self.mean.len()
            ));
        }
        self.feature_names = Some(names);
        Ok(self)
    }

    pub fn with_schema_sha256(mut self, hex: impl Into<String>) -> Self {
        self.schema_sha256 = Some(hex.into());
        self
    }

    /// Feature names recorded at fit time, if the artifact carries them.
    pub fn declared_feature_names(&self) -> Option<&[String]> {
        self.feature_names.as_deref()
    }

    pub fn declared_fingerprint(&self) -> Option<&str> {
        self.schema_sha256.as_deref()
    }

    pub fn n_features(&self) -> usize {
        self.mean.len()
    }

    /// Scales one row. The vector must have exactly the fitted width and, when
    /// names were recorded, exactly those names in that order.
    pub fn transform(&self, vector: &FeatureVector) -> Result<Vec<f64>> {
        if vector.len() != self.n_features() {
            return Err(RiskError::schema_mismatch(format!(
                "scaler was fitted on {} columns, vector has {}",
                self.n_features(),
                vector.len()
            )));
        }
        if let Some(names) = self.declared_feature_names()
            && let Some(detail) = describe_mismatch(names, vector.columns())
        {
            return Err(RiskError::schema_mismatch(detail));
        }

        Ok(vector
            .values()
            .iter()
            .enumerate()
            .map(|(idx, x)| self.standardize(*x, idx))
            .collect())
    }

    fn standardize(&self, raw: f64, idx: usize) -> f64 {
        let centered = if self.with_mean {
            raw - self.mean[idx]
        } else {
            raw
        };
        if !self.with_std {
            return centered;
        }
        // Constant training columns are stored with scale 0; divide by 1 instead.
        let scale = self.scale[idx];
        if scale == 0.0 || !scale.is_finite() {
            centered
        } else {
            centered / scale
        }
    }
}
