use serde::{Deserialize, Serialize};

use super::models::{Grade, Ownership, School, Stream};

/// Optional constraints on a school listing. An absent constraint matches everything.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterCriteria {
    #[serde(default)]
    pub grade: Option<Grade>,
    #[serde(default)]
    pub stream: Option<Stream>,
    /// Compared against the monthly fee.
    #[serde(default)]
    pub max_fee: Option<u64>,
    #[serde(default)]
    pub ownership: Option<Ownership>,
    #[serde(default)]
    pub exclude_penalized: bool,
}

impl FilterCriteria {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn matches(&self, school: &School) -> bool {
        if let Some(grade) = self.grade {
            if school.grade != grade {
                return false;
            }
        }

        if let Some(stream) = self.stream {
            if !school.streams.contains(&stream) {
                return false;
            }
        }

        if let Some(max_fee) = self.max_fee {
            if school.monthly_fee > max_fee {
                return false;
            }
        }

        if let Some(ownership) = self.ownership {
            if school.ownership != ownership {
                return false;
            }
        }

        !(self.exclude_penalized && school.penalized)
    }
}

/// Returns the schools matching `criteria`, in input order.
pub fn filter(schools: &[School], criteria: &FilterCriteria) -> Vec<School> {
    schools
        .iter()
        .filter(|school| criteria.matches(school))
        .cloned()
        .collect()
}
