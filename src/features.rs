use std::collections::HashMap;

use sha2::{Digest, Sha256};

use crate::athlete::{Affiliation, AthleteProfile, Categorical, NumericField, Sex, Sport};
use crate::error::{Result, RiskError};

/// Column order used when the scaler does not declare its own feature names.
/// Has to be kept in step with the training pipeline by hand.
pub const FALLBACK_SCHEMA: [&str; 20] = [
    "Age",
    "BMI",
    "Recovery_Days_Per_Week",
    "Training_Hours_Per_Week",
    "Training_Intensity",
    "Match_Count_Per_Week",
    "Rest_Between_Events_Days",
    "Load_Balance_Score",
    "Weight_kg",
    "Height_cm",
    "Sex_Female",
    "Sex_Male",
    "Sport_Basketball",
    "Sport_Football",
    "Sport_Soccer",
    "Sport_Lacrosse",
    "Sport_Gymnastics",
    "Sport_Other",
    "Affiliation_Club",
    "Affiliation_School",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaSource {
    /// Names the scaler was fitted on.
    Scaler,
    /// Built-in `FALLBACK_SCHEMA`.
    Fallback,
}

/// Ordered column names the artifacts were fitted against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureSchema {
    columns: Vec<String>,
    source: SchemaSource,
}

impl FeatureSchema {
    pub fn fallback() -> Self {
        Self {
            columns: FALLBACK_SCHEMA.iter().map(|c| c.to_string()).collect(),
            source: SchemaSource::Fallback,
        }
    }

    /// Declared names win verbatim; otherwise the fallback list is used.
    pub fn resolve(declared: Option<&[String]>) -> Self {
        match declared {
            Some(names) if !names.is_empty() => Self {
                columns: names.to_vec(),
                source: SchemaSource::Scaler,
            },
            _ => Self::fallback(),
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn source(&self) -> SchemaSource {
        self.source
    }

    pub fn fingerprint(&self) -> String {
        schema_fingerprint(&self.columns)
    }
}

/// Lowercase hex SHA-256 of the column names joined with `\n`.
pub fn schema_fingerprint<S: AsRef<str>>(columns: &[S]) -> String {
    let mut hasher = Sha256::new();
    for (idx, col) in columns.iter().enumerate() {
        if idx > 0 {
            hasher.update(b"\n");
        }
        hasher.update(col.as_ref().as_bytes());
    }
    hasher
        .finalize()
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}

/// Named numeric row, ordered exactly like the schema it was assembled for.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector {
    columns: Vec<String>,
    values: Vec<f64>,
}

impl FeatureVector {
    /// Pairs `columns` with `values`; both must have the same length.
    pub fn from_parts(columns: Vec<String>, values: Vec<f64>) -> Result<Self> {
        if columns.len() != values.len() {
            return Err(RiskError::schema_mismatch(format!(
                "{} column names for {} values",
                columns.len(),
                values.len()
            )));
        }
        Ok(Self { columns, values })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, column: &str) -> Option<f64> {
        self.columns
            .iter()
            .position(|c| c == column)
            .map(|idx| self.values[idx])
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.columns
            .iter()
            .map(String::as_str)
            .zip(self.values.iter().copied())
    }
}

/// Raw columns for a profile before schema alignment: numerics verbatim,
/// then one indicator per offered category value.
pub fn expand(profile: &AthleteProfile) -> Vec<(String, f64)> {
    let mut out = Vec::with_capacity(
        NumericField::ALL.len()
            + Sex::OPTIONS.len()
            + Sport::OPTIONS.len()
            + Affiliation::OPTIONS.len(),
    );
    for field in NumericField::ALL {
        out.push((field.column().to_string(), profile.numeric(field) as f64));
    }
    one_hot(profile.sex, &mut out);
    one_hot(profile.sport, &mut out);
    one_hot(profile.affiliation, &mut out);
    out
}

fn one_hot<C: Categorical>(value: C, out: &mut Vec<(String, f64)>) {
    for option in C::OPTIONS {
        let hit = if *option == value { 1.0 } else { 0.0 };
        out.push((format!("{}_{}", C::FIELD, option.label()), hit));
    }
}

/// Aligns the expansion of `profile` to `schema`. Schema columns the
/// expansion lacks are 0; expansion columns the schema lacks are dropped.
pub fn assemble(profile: &AthleteProfile, schema: &FeatureSchema) -> FeatureVector {
    let raw: HashMap<String, f64> = expand(profile).into_iter().collect();
    let values = schema
        .columns()
        .iter()
        .map(|col| raw.get(col).copied().unwrap_or(0.0))
        .collect();
    FeatureVector {
        columns: schema.columns().to_vec(),
        values,
    }
}

/// Human-readable description of the first difference between two column
/// lists, or `None` when they are identical.
pub(crate) fn describe_mismatch(expected: &[String], found: &[String]) -> Option<String> {
    if expected.len() != found.len() {
        return Some(format!(
            "expected {} columns, found {}",
            expected.len(),
            found.len()
        ));
    }
    expected
        .iter()
        .zip(found)
        .position(|(e, f)| e != f)
        .map(|idx| {
            format!(
                "column {idx}: expected `{}`, found `{}`",
                expected[idx], found[idx]
            )
        })
}
