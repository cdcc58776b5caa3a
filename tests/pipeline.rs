use std::fs;
use std::path::PathBuf;

use acl_risk_terminal::artifacts::{self, ArtifactPaths};
use acl_risk_terminal::athlete::{AthleteProfile, Sex, Sport};
use acl_risk_terminal::features::{FALLBACK_SCHEMA, FeatureVector, SchemaSource};
use acl_risk_terminal::inference::{Advice, RiskPipeline};
use acl_risk_terminal::RiskError;

fn fixture_path(name: &str) -> PathBuf {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    path
}

fn pipeline(scaler: &str, model: &str) -> RiskPipeline {
    try_pipeline(scaler, model).expect("fixture artifacts should load")
}

fn try_pipeline(scaler: &str, model: &str) -> acl_risk_terminal::Result<RiskPipeline> {
    artifacts::load_pipeline(&ArtifactPaths {
        scaler: fixture_path(scaler),
        model: fixture_path(model),
    })
}

fn soccer_profile() -> AthleteProfile {
    let raw = fs::read_to_string(fixture_path("profile_soccer.json")).expect("profile fixture");
    serde_json::from_str(&raw).expect("profile fixture should parse")
}

#[test]
fn female_soccer_player_lands_exactly_on_threshold() {
    let pipeline = pipeline("scaler_named.json", "model_linear.json");
    let assessment = pipeline.evaluate(&soccer_profile()).expect("scores");

    assert_eq!(assessment.features.get("Sex_Female"), Some(1.0));
    assert_eq!(assessment.features.get("Sex_Male"), Some(0.0));
    assert_eq!(assessment.features.get("Sport_Soccer"), Some(1.0));
    assert_eq!(assessment.features.get("Affiliation_Club"), Some(1.0));
    assert_eq!(assessment.features.get("Affiliation_School"), Some(0.0));

    // (16 - 10) / 2 * 0.5 + 1.0 + 0.5 + 1.0
    assert_eq!(assessment.score.value(), 4.0);
    assert_eq!(assessment.score.to_string(), "4.00");
    assert_eq!(assessment.advice(), Advice::GoodToGo);
}

#[test]
fn older_athlete_crosses_into_elevated_risk() {
    let pipeline = pipeline("scaler_named.json", "model_linear.json");
    let mut profile = soccer_profile();
    profile.age = 18;
    let assessment = pipeline.evaluate(&profile).expect("scores");
    assert_eq!(assessment.score.to_string(), "4.50");
    assert_eq!(assessment.advice(), Advice::SeekProfessional);
    assert!(assessment.advice().link().ends_with("/health.html"));
    assert!(!assessment.advice().link().contains("HTML-Files"));
}

#[test]
fn unlisted_sport_zeroes_every_sport_column() {
    let pipeline = pipeline("scaler_named.json", "model_linear.json");
    let mut profile = soccer_profile();
    profile.sport = Sport::Unlisted;
    let assessment = pipeline.evaluate(&profile).expect("scores");

    let sport_total: f64 = assessment
        .features
        .iter()
        .filter(|(name, _)| name.starts_with("Sport_"))
        .map(|(_, v)| v)
        .sum();
    assert_eq!(sport_total, 0.0);
    assert_eq!(assessment.score.value(), 3.5);
}

#[test]
fn unnamed_scaler_falls_back_to_built_in_columns() {
    let pipeline = pipeline("scaler_unnamed.json", "model_linear.json");
    assert_eq!(pipeline.schema().source(), SchemaSource::Fallback);
    assert_eq!(pipeline.schema().columns(), FALLBACK_SCHEMA.as_slice());

    let score = pipeline.evaluate(&soccer_profile()).expect("scores").score;
    // 16 * 0.5 + 1.0 + 0.5 + 1.0
    assert_eq!(score.value(), 10.5);
}

#[test]
fn scaler_names_decide_column_order() {
    let pipeline = pipeline("scaler_reordered.json", "model_linear.json");
    assert_eq!(pipeline.schema().source(), SchemaSource::Scaler);
    assert_eq!(pipeline.schema().columns()[0], "BMI");

    let profile = soccer_profile();
    let vector = pipeline.assemble(&profile);
    assert_eq!(vector.values()[0], 22.0);
    assert_eq!(vector.values()[1], 16.0);
    // first coefficient now weighs BMI
    let score = pipeline.score(&vector).expect("scores");
    assert_eq!(score.value(), 13.5);
}

#[test]
fn tree_ensemble_averages_its_trees() {
    let pipeline = pipeline("scaler_named.json", "model_tree.json");
    assert_eq!(pipeline.model().kind_label(), "tree_ensemble");

    let elevated = pipeline.evaluate(&soccer_profile()).expect("scores");
    assert_eq!(elevated.score.value(), 5.5);
    assert_eq!(elevated.advice(), Advice::SeekProfessional);

    let mut profile = soccer_profile();
    profile.sex = Sex::Male;
    profile.age = 12;
    let clear = pipeline.evaluate(&profile).expect("scores");
    assert_eq!(clear.score.value(), 1.5);
    assert_eq!(clear.advice(), Advice::GoodToGo);
}

#[test]
fn same_profile_scores_identically() {
    let pipeline = pipeline("scaler_named.json", "model_tree.json");
    let profile = soccer_profile();
    let first = pipeline.evaluate(&profile).expect("scores");
    let second = pipeline.evaluate(&profile).expect("scores");
    assert_eq!(first, second);
    assert_eq!(first.score.value().to_bits(), second.score.value().to_bits());
}

#[test]
fn misordered_vector_is_refused() {
    let pipeline = pipeline("scaler_named.json", "model_linear.json");
    let vector = pipeline.assemble(&soccer_profile());
    let mut columns = vector.columns().to_vec();
    let mut values = vector.values().to_vec();
    columns.swap(0, 1);
    values.swap(0, 1);

    let err = pipeline
        .score(&FeatureVector::from_parts(columns, values).expect("same length"))
        .unwrap_err();
    assert!(err.is_schema_mismatch(), "unexpected error: {err}");
}

#[test]
fn wrong_fingerprint_is_rejected_at_load() {
    let err = try_pipeline("scaler_wrong_sha.json", "model_linear.json").unwrap_err();
    assert!(matches!(err, RiskError::IncompatibleArtifacts(_)), "{err}");
}

#[test]
fn narrow_model_is_rejected_at_load() {
    let err = try_pipeline("scaler_named.json", "model_narrow.json").unwrap_err();
    match err {
        RiskError::IncompatibleArtifacts(msg) => assert!(msg.contains("12"), "{msg}"),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn unreadable_model_files_are_load_errors() {
    for name in ["model_unknown_kind.json", "model_truncated.json", "missing.json"] {
        let err = try_pipeline("scaler_named.json", name).unwrap_err();
        match err {
            RiskError::ArtifactLoad { artifact, path, .. } => {
                assert_eq!(artifact, "model");
                assert!(path.ends_with(name));
            }
            other => panic!("{name}: unexpected error: {other}"),
        }
    }
}
