use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::error::ValidationError;

pub const MAX_RATING: f64 = 10.0;
pub const MAX_VACANCY_RATE: f64 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Grade {
    #[serde(rename = "ECDE")]
    Ecde,
    Primary,
    Secondary,
    University,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Ownership {
    Public,
    Private,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Stream {
    Coed,
    Boys,
    Girls,
}

/// Category ratings, each in [0, 10]. `None` means the school was never rated.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Ratings {
    #[serde(default)]
    pub academic: Option<f64>,
    #[serde(default)]
    pub infrastructure: Option<f64>,
    #[serde(default)]
    pub facilities: Option<f64>,
    #[serde(default)]
    pub sports: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct School {
    pub id: u64,
    pub name: String,
    pub grade: Grade,
    pub ownership: Ownership,
    #[serde(default)]
    pub streams: BTreeSet<Stream>,
    pub monthly_fee: u64,
    pub yearly_fee: u64,
    #[serde(default)]
    pub ratings: Ratings,
    #[serde(default)]
    pub vacancy_rate: Option<f64>,
    #[serde(default)]
    pub penalized: bool,
}

impl School {
    pub fn new(id: u64, name: impl Into<String>, grade: Grade, ownership: Ownership) -> Self {
        Self {
            id,
            name: name.into(),
            grade,
            ownership,
            streams: BTreeSet::new(),
            monthly_fee: 0,
            yearly_fee: 0,
            ratings: Ratings::default(),
            vacancy_rate: None,
            penalized: false,
        }
    }

    /// Consumes the record and returns it only if every invariant holds.
    pub fn validated(self) -> Result<Self, ValidationError> {
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(invalid("name", "must not be empty"));
        }

        let ratings = [
            ("academic", self.ratings.academic),
            ("infrastructure", self.ratings.infrastructure),
            ("facilities", self.ratings.facilities),
            ("sports", self.ratings.sports),
        ];
        for (field, value) in ratings {
            check_range(field, value, MAX_RATING)?;
        }

        check_range("vacancy_rate", self.vacancy_rate, MAX_VACANCY_RATE)
    }

    /// Applies `update` only if the resulting record is valid; otherwise `self` is left untouched.
    pub fn apply_update(&mut self, update: SchoolUpdate) -> Result<(), ValidationError> {
        let mut candidate = self.clone();
        if let Some(name) = update.name {
            candidate.name = name;
        }
        if let Some(streams) = update.streams {
            candidate.streams = streams;
        }
        if let Some(fee) = update.monthly_fee {
            candidate.monthly_fee = fee;
        }
        if let Some(fee) = update.yearly_fee {
            candidate.yearly_fee = fee;
        }
        if let Some(ratings) = update.ratings {
            candidate.ratings = ratings;
        }
        if let Some(rate) = update.vacancy_rate {
            candidate.vacancy_rate = Some(rate);
        }
        if let Some(penalized) = update.penalized {
            candidate.penalized = penalized;
        }

        candidate.validate()?;
        *self = candidate;
        Ok(())
    }
}

/// Partial change set for a school record.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SchoolUpdate {
    pub name: Option<String>,
    pub streams: Option<BTreeSet<Stream>>,
    pub monthly_fee: Option<u64>,
    pub yearly_fee: Option<u64>,
    pub ratings: Option<Ratings>,
    pub vacancy_rate: Option<f64>,
    pub penalized: Option<bool>,
}

fn check_range(field: &'static str, value: Option<f64>, max: f64) -> Result<(), ValidationError> {
    match value {
        Some(v) if !v.is_finite() => Err(invalid(field, "must be a finite number")),
        Some(v) if !(0.0..=max).contains(&v) => {
            Err(invalid(field, &format!("{} is outside [0, {}]", v, max)))
        }
        _ => Ok(()),
    }
}

fn invalid(field: &'static str, reason: &str) -> ValidationError {
    ValidationError::InvalidSchool {
        field,
        reason: reason.to_string(),
    }
}
