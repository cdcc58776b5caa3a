pub mod artifacts;
pub mod athlete;
pub mod config;
pub mod error;
pub mod features;
pub mod inference;
pub mod logging;
pub mod model;
pub mod scaler;
pub mod state;

pub use artifacts::{ArtifactPaths, load_pipeline};
pub use athlete::{Affiliation, AthleteProfile, NumericField, Sex, Sport};
pub use error::{Result, RiskError};
pub use features::{FeatureSchema, FeatureVector};
pub use inference::{Advice, RiskAssessment, RiskPipeline, RiskScore};
