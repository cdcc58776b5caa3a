//! Athlete attributes entered on the form.
//!
//! Numeric ranges here are widget constraints only. The feature assembler
//! trusts whatever it is handed and never re-checks them.

use std::convert::Infallible;
use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A closed set of category values that is one-hot expanded into
/// `<FIELD>_<value>` columns.
pub trait Categorical: Copy + PartialEq + 'static {
    const FIELD: &'static str;
    /// Values offered by the form, in widget order.
    const OPTIONS: &'static [Self];

    fn label(self) -> &'static str;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Sex {
    Male,
    Female,
    /// Anything outside the option set. Encodes as all-zero columns.
    #[serde(other)]
    Unlisted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Sport {
    Basketball,
    Football,
    Soccer,
    Lacrosse,
    Gymnastics,
    Other,
    #[serde(other)]
    Unlisted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Affiliation {
    School,
    Club,
    #[serde(other)]
    Unlisted,
}

impl Categorical for Sex {
    const FIELD: &'static str = "Sex";
    const OPTIONS: &'static [Self] = &[Sex::Male, Sex::Female];

    fn label(self) -> &'static str {
        match self {
            Sex::Male => "Male",
            Sex::Female => "Female",
            Sex::Unlisted => "Unlisted",
        }
    }
}

impl Categorical for Sport {
    const FIELD: &'static str = "Sport";
    const OPTIONS: &'static [Self] = &[
        Sport::Basketball,
        Sport::Football,
        Sport::Soccer,
        Sport::Lacrosse,
        Sport::Gymnastics,
        Sport::Other,
    ];

    fn label(self) -> &'static str {
        match self {
            Sport::Basketball => "Basketball",
            Sport::Football => "Football",
            Sport::Soccer => "Soccer",
            Sport::Lacrosse => "Lacrosse",
            Sport::Gymnastics => "Gymnastics",
            Sport::Other => "Other",
            Sport::Unlisted => "Unlisted",
        }
    }
}

impl Categorical for Affiliation {
    const FIELD: &'static str = "Affiliation";
    const OPTIONS: &'static [Self] = &[Affiliation::School, Affiliation::Club];

    fn label(self) -> &'static str {
        match self {
            Affiliation::School => "School",
            Affiliation::Club => "Club",
            Affiliation::Unlisted => "Unlisted",
        }
    }
}

fn parse_category<C: Categorical>(raw: &str, unlisted: C) -> C {
    let raw = raw.trim();
    C::OPTIONS
        .iter()
        .copied()
        .find(|c| c.label().eq_ignore_ascii_case(raw))
        .unwrap_or(unlisted)
}

// Parsing never fails: unknown values become `Unlisted`.
impl FromStr for Sex {
    type Err = Infallible;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(parse_category(s, Sex::Unlisted))
    }
}

impl FromStr for Sport {
    type Err = Infallible;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(parse_category(s, Sport::Unlisted))
    }
}

impl FromStr for Affiliation {
    type Err = Infallible;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(parse_category(s, Affiliation::Unlisted))
    }
}

impl fmt::Display for Sex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl fmt::Display for Sport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl fmt::Display for Affiliation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Numeric attributes, in training-time column order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NumericField {
    Age,
    Bmi,
    RecoveryDays,
    TrainingHours,
    TrainingIntensity,
    MatchCount,
    RestDays,
    LoadBalance,
    WeightKg,
    HeightCm,
}

impl NumericField {
    pub const ALL: [NumericField; 10] = [
        NumericField::Age,
        NumericField::Bmi,
        NumericField::RecoveryDays,
        NumericField::TrainingHours,
        NumericField::TrainingIntensity,
        NumericField::MatchCount,
        NumericField::RestDays,
        NumericField::LoadBalance,
        NumericField::WeightKg,
        NumericField::HeightCm,
    ];

    /// Column name the fitted artifacts know this attribute by.
    pub fn column(self) -> &'static str {
        match self {
            NumericField::Age => "Age",
            NumericField::Bmi => "BMI",
            NumericField::RecoveryDays => "Recovery_Days_Per_Week",
            NumericField::TrainingHours => "Training_Hours_Per_Week",
            NumericField::TrainingIntensity => "Training_Intensity",
            NumericField::MatchCount => "Match_Count_Per_Week",
            NumericField::RestDays => "Rest_Between_Events_Days",
            NumericField::LoadBalance => "Load_Balance_Score",
            NumericField::WeightKg => "Weight_kg",
            NumericField::HeightCm => "Height_cm",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            NumericField::Age => "Age",
            NumericField::Bmi => "BMI",
            NumericField::RecoveryDays => "Recovery Days per Week",
            NumericField::TrainingHours => "Training Hours per Week",
            NumericField::TrainingIntensity => "Training Intensity (1-5)",
            NumericField::MatchCount => "Match Count per Week",
            NumericField::RestDays => "Rest Between Events (days)",
            NumericField::LoadBalance => "Load Balance Score (0-10)",
            NumericField::WeightKg => "Weight (kg)",
            NumericField::HeightCm => "Height (cm)",
        }
    }

    pub fn range(self) -> RangeInclusive<u32> {
        match self {
            NumericField::Age => 13..=25,
            NumericField::Bmi => 10..=40,
            NumericField::RecoveryDays => 0..=7,
            NumericField::TrainingHours => 0..=40,
            NumericField::TrainingIntensity => 1..=5,
            NumericField::MatchCount => 0..=10,
            NumericField::RestDays => 0..=7,
            NumericField::LoadBalance => 0..=10,
            NumericField::WeightKg => 45..=105,
            NumericField::HeightCm => 120..=220,
        }
    }

    pub fn clamp(self, value: u32) -> u32 {
        let range = self.range();
        value.clamp(*range.start(), *range.end())
    }
}

/// One form submission. Ephemeral: rebuilt from widget state on every change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AthleteProfile {
    pub age: u32,
    pub sex: Sex,
    pub sport: Sport,
    pub affiliation: Affiliation,
    pub bmi: u32,
    pub recovery_days: u32,
    pub training_hours: u32,
    pub training_intensity: u32,
    pub match_count: u32,
    pub rest_days: u32,
    pub load_balance: u32,
    pub weight_kg: u32,
    pub height_cm: u32,
}

impl Default for AthleteProfile {
    /// Every numeric widget starts at its minimum, every selector at its first option.
    fn default() -> Self {
        Self {
            age: *NumericField::Age.range().start(),
            sex: Sex::OPTIONS[0],
            sport: Sport::OPTIONS[0],
            affiliation: Affiliation::OPTIONS[0],
            bmi: *NumericField::Bmi.range().start(),
            recovery_days: *NumericField::RecoveryDays.range().start(),
            training_hours: *NumericField::TrainingHours.range().start(),
            training_intensity: *NumericField::TrainingIntensity.range().start(),
            match_count: *NumericField::MatchCount.range().start(),
            rest_days: *NumericField::RestDays.range().start(),
            load_balance: *NumericField::LoadBalance.range().start(),
            weight_kg: *NumericField::WeightKg.range().start(),
            height_cm: *NumericField::HeightCm.range().start(),
        }
    }
}

impl AthleteProfile {
    pub fn numeric(&self, field: NumericField) -> u32 {
        match field {
            NumericField::Age => self.age,
            NumericField::Bmi => self.bmi,
            NumericField::RecoveryDays => self.recovery_days,
            NumericField::TrainingHours => self.training_hours,
            NumericField::TrainingIntensity => self.training_intensity,
            NumericField::MatchCount => self.match_count,
            NumericField::RestDays => self.rest_days,
            NumericField::LoadBalance => self.load_balance,
            NumericField::WeightKg => self.weight_kg,
            NumericField::HeightCm => self.height_cm,
        }
    }

    /// Stores `value` as given; range enforcement belongs to the caller.
    pub fn set_numeric(&mut self, field: NumericField, value: u32) {
        let slot = match field {
            NumericField::Age => &mut self.age,
            NumericField::Bmi => &mut self.bmi,
            NumericField::RecoveryDays => &mut self.recovery_days,
            NumericField::TrainingHours => &mut self.training_hours,
            NumericField::TrainingIntensity => &mut self.training_intensity,
            NumericField::MatchCount => &mut self.match_count,
            NumericField::RestDays => &mut self.rest_days,
            NumericField::LoadBalance => &mut self.load_balance,
            NumericField::WeightKg => &mut self.weight_kg,
            NumericField::HeightCm => &mut self.height_cm,
        };
        *slot = value;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_category_parses_as_unlisted() {
        assert_eq!("Rugby".parse::<Sport>().unwrap(), Sport::Unlisted);
        assert_eq!(" soccer ".parse::<Sport>().unwrap(), Sport::Soccer);
        assert_eq!("Club".parse::<Affiliation>().unwrap(), Affiliation::Club);
    }

    #[test]
    fn unlisted_is_never_offered() {
        assert!(!Sport::OPTIONS.contains(&Sport::Unlisted));
        assert!(!Sex::OPTIONS.contains(&Sex::Unlisted));
        assert!(!Affiliation::OPTIONS.contains(&Affiliation::Unlisted));
    }

    #[test]
    fn default_profile_sits_at_widget_minimums() {
        let p = AthleteProfile::default();
        for field in NumericField::ALL {
            assert_eq!(p.numeric(field), *field.range().start(), "{field:?}");
        }
        assert_eq!(p.sex, Sex::Male);
        assert_eq!(p.sport, Sport::Basketball);
        assert_eq!(p.affiliation, Affiliation::School);
    }

    #[test]
    fn deserializes_unknown_sport_without_error() {
        let raw = r#"{"age":16,"sex":"Female","sport":"Curling","affiliation":"Club",
            "bmi":22,"recovery_days":2,"training_hours":10,"training_intensity":3,
            "match_count":2,"rest_days":1,"load_balance":6,"weight_kg":60,"height_cm":165}"#;
        let p: AthleteProfile = serde_json::from_str(raw).expect("profile parses");
        assert_eq!(p.sport, Sport::Unlisted);
        assert_eq!(p.sex, Sex::Female);
    }

    #[test]
    fn clamp_respects_widget_range() {
        assert_eq!(NumericField::Age.clamp(40), 25);
        assert_eq!(NumericField::TrainingIntensity.clamp(0), 1);
        assert_eq!(NumericField::HeightCm.clamp(180), 180);
    }
}
