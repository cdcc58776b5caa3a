use std::collections::VecDeque;

use rand::Rng;

use crate::athlete::{Affiliation, AthleteProfile, Categorical, NumericField, Sex, Sport};
use crate::inference::{Advice, RiskAssessment, RiskPipeline};

const MAX_LOGS: usize = 200;
const MAX_ENTRY_DIGITS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    Numeric(NumericField),
    Sex,
    Sport,
    Affiliation,
}

/// Widgets in on-screen order.
pub const FORM_FIELDS: [FormField; 13] = [
    FormField::Numeric(NumericField::Age),
    FormField::Sex,
    FormField::Sport,
    FormField::Affiliation,
    FormField::Numeric(NumericField::Bmi),
    FormField::Numeric(NumericField::RecoveryDays),
    FormField::Numeric(NumericField::TrainingHours),
    FormField::Numeric(NumericField::TrainingIntensity),
    FormField::Numeric(NumericField::MatchCount),
    FormField::Numeric(NumericField::RestDays),
    FormField::Numeric(NumericField::LoadBalance),
    FormField::Numeric(NumericField::WeightKg),
    FormField::Numeric(NumericField::HeightCm),
];

impl FormField {
    pub fn label(self) -> &'static str {
        match self {
            FormField::Numeric(f) => f.label(),
            FormField::Sex => "Sex",
            FormField::Sport => "Sport",
            FormField::Affiliation => "Affiliation",
        }
    }

    pub fn hint(self) -> String {
        match self {
            FormField::Numeric(f) => {
                let r = f.range();
                format!("{}-{}", r.start(), r.end())
            }
            FormField::Sex => options_hint::<Sex>(),
            FormField::Sport => options_hint::<Sport>(),
            FormField::Affiliation => options_hint::<Affiliation>(),
        }
    }
}

fn options_hint<C: Categorical>() -> String {
    C::OPTIONS
        .iter()
        .map(|c| c.label())
        .collect::<Vec<_>>()
        .join("/")
}

#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Pending,
    Scored(RiskAssessment),
    /// Pipeline refused to score. Shown instead of a number.
    Failed(String),
}

#[derive(Debug)]
pub struct AppState {
    pub profile: AthleteProfile,
    pub selected: usize,
    /// Digits typed into the selected numeric field, not yet committed.
    pub entry: Option<String>,
    pub outcome: Outcome,
    pub logs: VecDeque<String>,
    pub help_overlay: bool,
    pub runs: u64,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

impl AppState {
    pub fn new() -> Self {
        Self {
            profile: AthleteProfile::default(),
            selected: 0,
            entry: None,
            outcome: Outcome::Pending,
            logs: VecDeque::with_capacity(MAX_LOGS),
            help_overlay: false,
            runs: 0,
        }
    }

    pub fn selected_field(&self) -> FormField {
        FORM_FIELDS[self.selected % FORM_FIELDS.len()]
    }

    pub fn select_next(&mut self) {
        self.commit_entry();
        self.selected = (self.selected + 1) % FORM_FIELDS.len();
    }

    pub fn select_prev(&mut self) {
        self.commit_entry();
        if self.selected == 0 {
            self.selected = FORM_FIELDS.len() - 1;
        } else {
            self.selected -= 1;
        }
    }

    /// Moves a numeric field by `delta` inside its range, or cycles a selector.
    pub fn step(&mut self, delta: i32) {
        self.commit_entry();
        match self.selected_field() {
            FormField::Numeric(field) => {
                let current = self.profile.numeric(field) as i64;
                let range = field.range();
                let next = (current + delta as i64)
                    .clamp(*range.start() as i64, *range.end() as i64);
                self.profile.set_numeric(field, next as u32);
            }
            FormField::Sex => self.profile.sex = cycle(self.profile.sex, delta),
            FormField::Sport => self.profile.sport = cycle(self.profile.sport, delta),
            FormField::Affiliation => {
                self.profile.affiliation = cycle(self.profile.affiliation, delta)
            }
        }
    }

    pub fn type_digit(&mut self, c: char) {
        if !c.is_ascii_digit() || !matches!(self.selected_field(), FormField::Numeric(_)) {
            return;
        }
        let entry = self.entry.get_or_insert_with(String::new);
        if entry.len() < MAX_ENTRY_DIGITS {
            entry.push(c);
        }
    }

    pub fn backspace(&mut self) {
        if let Some(entry) = self.entry.as_mut() {
            entry.pop();
        }
    }

    /// True while typed digits are pending, so the shown score may not match
    /// the form.
    pub fn is_stale(&self) -> bool {
        self.entry.is_some()
    }

    pub fn cancel_entry(&mut self) -> bool {
        self.entry.take().is_some()
    }

    /// Applies typed digits to the selected field, clamped into its range.
    pub fn commit_entry(&mut self) {
        let Some(entry) = self.entry.take() else {
            return;
        };
        let FormField::Numeric(field) = self.selected_field() else {
            return;
        };
        if let Ok(value) = entry.parse::<u32>() {
            self.profile.set_numeric(field, field.clamp(value));
        }
    }

    pub fn randomize<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.entry = None;
        for field in NumericField::ALL {
            let value = rng.gen_range(field.range());
            self.profile.set_numeric(field, value);
        }
        self.profile.sex = pick(rng);
        self.profile.sport = pick(rng);
        self.profile.affiliation = pick(rng);
    }

    pub fn reset(&mut self) {
        self.entry = None;
        self.profile = AthleteProfile::default();
    }

    /// Display text for a widget; shows the typing buffer for the selected one.
    pub fn field_value(&self, idx: usize) -> String {
        let field = FORM_FIELDS[idx];
        if idx == self.selected
            && let Some(entry) = &self.entry
        {
            return entry.clone();
        }
        match field {
            FormField::Numeric(f) => self.profile.numeric(f).to_string(),
            FormField::Sex => self.profile.sex.to_string(),
            FormField::Sport => self.profile.sport.to_string(),
            FormField::Affiliation => self.profile.affiliation.to_string(),
        }
    }

    /// Re-runs assemble, scale and predict for the current profile.
    pub fn recompute(&mut self, pipeline: &RiskPipeline) {
        self.runs += 1;
        let previous = self.advice();
        match pipeline.evaluate(&self.profile) {
            Ok(assessment) => {
                let advice = assessment.advice();
                if previous != Some(advice) {
                    self.push_log(format!(
                        "[INFO] Score {} -> {}",
                        assessment.score,
                        advice_tag(advice)
                    ));
                }
                self.outcome = Outcome::Scored(assessment);
            }
            Err(err) => {
                self.push_log(format!("[ERROR] {err}"));
                self.outcome = Outcome::Failed(err.to_string());
            }
        }
    }

    pub fn advice(&self) -> Option<Advice> {
        match &self.outcome {
            Outcome::Scored(a) => Some(a.advice()),
            _ => None,
        }
    }

    pub fn push_log(&mut self, msg: impl Into<String>) {
        let stamp = chrono::Local::now().format("%H:%M:%S");
        self.logs.push_back(format!("{stamp} {}", msg.into()));
        while self.logs.len() > MAX_LOGS {
            self.logs.pop_front();
        }
    }
}

fn cycle<C: Categorical>(current: C, delta: i32) -> C {
    let n = C::OPTIONS.len() as i64;
    let Some(idx) = C::OPTIONS.iter().position(|c| *c == current) else {
        return C::OPTIONS[0];
    };
    let next = (idx as i64 + delta as i64).rem_euclid(n);
    C::OPTIONS[next as usize]
}

fn pick<C: Categorical, R: Rng + ?Sized>(rng: &mut R) -> C {
    C::OPTIONS[rng.gen_range(0..C::OPTIONS.len())]
}

pub fn advice_tag(advice: Advice) -> &'static str {
    match advice {
        Advice::SeekProfessional => "HIGH",
        Advice::GoodToGo => "OK",
    }
}
