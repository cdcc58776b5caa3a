use std::path::PathBuf;

/// Result type for the scoring pipeline.
pub type Result<T> = std::result::Result<T, RiskError>;

#[derive(Debug, thiserror::Error)]
pub enum RiskError {
    /// Assembled columns differ from what the scaler/model were fitted on.
    #[error("feature schema mismatch: {detail}")]
    SchemaMismatch { detail: String },

    /// A scaler or model file could not be read or deserialized.
    #[error("failed to load {artifact} artifact from {}: {reason}", path.display())]
    ArtifactLoad {
        artifact: &'static str,
        path: PathBuf,
        reason: String,
    },

    /// Both artifacts deserialized but do not agree with each other or the schema.
    #[error("incompatible artifacts: {0}")]
    IncompatibleArtifacts(String),
}

impl RiskError {
    pub(crate) fn schema_mismatch(detail: impl Into<String>) -> Self {
        Self::SchemaMismatch {
            detail: detail.into(),
        }
    }

    pub fn is_schema_mismatch(&self) -> bool {
        matches!(self, Self::SchemaMismatch { .. })
    }
}
