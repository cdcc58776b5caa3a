use std::fmt;

use crate::athlete::AthleteProfile;
use crate::error::{Result, RiskError};
use crate::features::{FeatureSchema, FeatureVector, SchemaSource, assemble, describe_mismatch};
use crate::model::RegressionModel;
use crate::scaler::StandardScaler;

/// Scores strictly above this route to the warning branch.
pub const RISK_THRESHOLD: f64 = 4.0;

pub const CONNECT_LABEL: &str = "Get connected";

const ELEVATED_MESSAGE: &str = "ACL risk too high! You're advised to contact a health professional. Do you want to be connected with a health professional?";
const ELEVATED_LINK: &str =
    "https://tobi3333a.github.io/Final-Four-s-ACL-Injury-Website/health.html";
const CLEAR_MESSAGE: &str =
    "You're good to go. Do you still want to be connected with a health professional?";
const CLEAR_LINK: &str =
    "https://tobi3333a.github.io/Final-Four-s-ACL-Injury-Website/HTML-Files/health.html";

/// Raw model output. Not clamped.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct RiskScore(f64);

impl RiskScore {
    pub fn new(value: f64) -> Self {
        Self(value)
    }

    pub fn value(self) -> f64 {
        self.0
    }

    pub fn is_elevated(self) -> bool {
        self.0 > RISK_THRESHOLD
    }

    pub fn advice(self) -> Advice {
        if self.is_elevated() {
            Advice::SeekProfessional
        } else {
            Advice::GoodToGo
        }
    }
}

impl fmt::Display for RiskScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advice {
    SeekProfessional,
    GoodToGo,
}

impl Advice {
    pub fn message(self) -> &'static str {
        match self {
            Advice::SeekProfessional => ELEVATED_MESSAGE,
            Advice::GoodToGo => CLEAR_MESSAGE,
        }
    }

    pub fn link(self) -> &'static str {
        match self {
            Advice::SeekProfessional => ELEVATED_LINK,
            Advice::GoodToGo => CLEAR_LINK,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RiskAssessment {
    pub features: FeatureVector,
    pub score: RiskScore,
}

impl RiskAssessment {
    pub fn advice(&self) -> Advice {
        self.score.advice()
    }
}

/// Loaded scaler + model and the schema resolved from them. Immutable once
/// built; share it by reference across render cycles.
#[derive(Debug, Clone)]
pub struct RiskPipeline {
    schema: FeatureSchema,
    scaler: StandardScaler,
    model: RegressionModel,
}

impl RiskPipeline {
    /// Resolves the schema and checks both artifacts against it before any
    /// prediction is attempted.
    pub fn new(scaler: StandardScaler, model: RegressionModel) -> Result<Self> {
        let schema = FeatureSchema::resolve(scaler.declared_feature_names());
        if schema.source() == SchemaSource::Fallback {
            tracing::warn!(
                columns = schema.len(),
                "scaler declares no feature names; using built-in fallback schema"
            );
        }

        if scaler.n_features() != schema.len() {
            return Err(RiskError::IncompatibleArtifacts(format!(
                "scaler was fitted on {} columns but the schema has {}",
                scaler.n_features(),
                schema.len()
            )));
        }
        if model.n_features() != schema.len() {
            return Err(RiskError::IncompatibleArtifacts(format!(
                "{} model expects {} columns but the schema has {}",
                model.kind_label(),
                model.n_features(),
                schema.len()
            )));
        }
        if let Some(names) = model.declared_feature_names()
            && let Some(detail) = describe_mismatch(schema.columns(), names)
        {
            return Err(RiskError::IncompatibleArtifacts(format!(
                "model feature names disagree with the schema: {detail}"
            )));
        }

        let fingerprint = schema.fingerprint();
        if let Some(declared) = scaler.declared_fingerprint()
            && !declared.trim().eq_ignore_ascii_case(&fingerprint)
        {
            return Err(RiskError::IncompatibleArtifacts(format!(
                "schema fingerprint {fingerprint} does not match declared {}",
                declared.trim()
            )));
        }

        tracing::info!(
            source = ?schema.source(),
            columns = schema.len(),
            model = model.kind_label(),
            %fingerprint,
            "risk pipeline ready"
        );
        Ok(Self {
            schema,
            scaler,
            model,
        })
    }

    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    pub fn model(&self) -> &RegressionModel {
        &self.model
    }

    pub fn assemble(&self, profile: &AthleteProfile) -> FeatureVector {
        assemble(profile, &self.schema)
    }

    pub fn scale(&self, vector: &FeatureVector) -> Result<Vec<f64>> {
        if let Some(detail) = describe_mismatch(self.schema.columns(), vector.columns()) {
            return Err(RiskError::schema_mismatch(detail));
        }
        self.scaler.transform(vector)
    }

    /// Scale then predict a single row.
    pub fn score(&self, vector: &FeatureVector) -> Result<RiskScore> {
        let scaled = self.scale(vector)?;
        let raw = self.model.predict(&scaled)?;
        Ok(RiskScore::new(raw))
    }

    pub fn evaluate(&self, profile: &AthleteProfile) -> Result<RiskAssessment> {
        let features = self.assemble(profile);
        let score = self.score(&features).inspect_err(|err| {
            tracing::error!(error = %err, "scoring aborted");
        })?;
        tracing::debug!(score = score.value(), "scored profile");
        Ok(RiskAssessment { features, score })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::athlete::{Affiliation, Sex, Sport};
    use crate::features::FALLBACK_SCHEMA;
    use crate::model::LinearModel;

    fn fallback_names() -> Vec<String> {
        FALLBACK_SCHEMA.iter().map(|c| c.to_string()).collect()
    }

    fn identity_scaler(n: usize) -> StandardScaler {
        StandardScaler::new(vec![0.0; n], vec![1.0; n]).unwrap()
    }

    fn linear(coef: Vec<f64>, intercept: f64) -> RegressionModel {
        RegressionModel::Linear(LinearModel {
            coef,
            intercept,
            feature_names: None,
        })
    }

    #[test]
    fn threshold_is_strict() {
        assert_eq!(RiskScore::new(4.0).advice(), Advice::GoodToGo);
        assert_eq!(RiskScore::new(4.000001).advice(), Advice::SeekProfessional);
        assert_eq!(RiskScore::new(-2.0).advice(), Advice::GoodToGo);
    }

    #[test]
    fn score_displays_two_decimals() {
        assert_eq!(RiskScore::new(4.0).to_string(), "4.00");
        assert_eq!(RiskScore::new(3.127).to_string(), "3.13");
        assert_eq!(RiskScore::new(12.5).to_string(), "12.50");
    }

    #[test]
    fn advice_links_differ_per_branch() {
        assert_ne!(Advice::SeekProfessional.link(), Advice::GoodToGo.link());
        assert!(Advice::SeekProfessional.message().starts_with("ACL risk too high"));
        assert!(Advice::GoodToGo.message().starts_with("You're good to go"));
    }

    #[test]
    fn evaluates_with_fallback_schema() {
        // Weight only the Age column.
        let mut coef = vec![0.0; 20];
        coef[0] = 0.25;
        let pipeline = RiskPipeline::new(identity_scaler(20), linear(coef, 1.0)).unwrap();
        assert_eq!(pipeline.schema().source(), SchemaSource::Fallback);

        let profile = AthleteProfile {
            age: 16,
            sex: Sex::Female,
            sport: Sport::Soccer,
            affiliation: Affiliation::Club,
            ..AthleteProfile::default()
        };
        let assessment = pipeline.evaluate(&profile).unwrap();
        assert_eq!(assessment.score.value(), 5.0);
        assert_eq!(assessment.advice(), Advice::SeekProfessional);
    }

    #[test]
    fn scoring_is_deterministic() {
        let coef: Vec<f64> = (0..20).map(|i| i as f64 * 0.1 - 1.0).collect();
        let pipeline = RiskPipeline::new(identity_scaler(20), linear(coef, 0.3)).unwrap();
        let v = pipeline.assemble(&AthleteProfile::default());
        let a = pipeline.score(&v).unwrap();
        let b = pipeline.score(&v).unwrap();
        assert_eq!(a.value().to_bits(), b.value().to_bits());
    }

    #[test]
    fn misordered_vector_is_a_schema_mismatch() {
        let pipeline = RiskPipeline::new(identity_scaler(20), linear(vec![0.0; 20], 0.0)).unwrap();
        let mut cols = fallback_names();
        cols.swap(0, 1);
        let v = FeatureVector::from_parts(cols, vec![1.0; 20]).unwrap();
        let err = pipeline.score(&v).unwrap_err();
        assert!(err.is_schema_mismatch(), "{err}");
    }

    #[test]
    fn rejects_width_disagreements_at_load() {
        let err = RiskPipeline::new(identity_scaler(19), linear(vec![0.0; 20], 0.0)).unwrap_err();
        assert!(matches!(err, RiskError::IncompatibleArtifacts(_)));

        let err = RiskPipeline::new(identity_scaler(20), linear(vec![0.0; 21], 0.0)).unwrap_err();
        assert!(matches!(err, RiskError::IncompatibleArtifacts(_)));
    }

    #[test]
    fn rejects_model_names_that_disagree() {
        let mut names = fallback_names();
        names.reverse();
        let model = RegressionModel::Linear(LinearModel {
            coef: vec![0.0; 20],
            intercept: 0.0,
            feature_names: Some(names),
        });
        let err = RiskPipeline::new(identity_scaler(20), model).unwrap_err();
        assert!(err.to_string().contains("model feature names"));
    }

    #[test]
    fn verifies_declared_fingerprint() {
        let good = identity_scaler(20).with_schema_sha256(
            "319588B79A39288EE4D7FFDDC71976C1AACBCD7B2385BDC599ABE2E98B021CA7",
        );
        assert!(RiskPipeline::new(good, linear(vec![0.0; 20], 0.0)).is_ok());

        let bad = identity_scaler(20).with_schema_sha256("00");
        let err = RiskPipeline::new(bad, linear(vec![0.0; 20], 0.0)).unwrap_err();
        assert!(err.to_string().contains("fingerprint"));
    }

    #[test]
    fn scaler_names_take_priority_over_fallback() {
        let names = vec!["Sport_Soccer".to_string(), "Age".to_string()];
        let scaler = identity_scaler(2).with_feature_names(names).unwrap();
        let pipeline = RiskPipeline::new(scaler, linear(vec![2.0, 0.125], 0.0)).unwrap();
        assert_eq!(pipeline.schema().source(), SchemaSource::Scaler);

        let profile = AthleteProfile {
            sport: Sport::Soccer,
            age: 16,
            ..AthleteProfile::default()
        };
        let score = pipeline.evaluate(&profile).unwrap().score;
        assert_eq!(score.value(), 4.0);
        assert_eq!(score.advice(), Advice::GoodToGo);
    }
}
