use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use super::filter::{filter, FilterCriteria};
use super::models::School;
use super::score::score;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    #[default]
    Score,
    Fee,
    Name,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

/// A school together with its score, computed for display only.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredSchool {
    #[serde(flatten)]
    pub school: School,
    pub score: i64,
}

impl ScoredSchool {
    pub fn new(school: School) -> Self {
        let score = score(&school);
        Self { school, score }
    }
}

/// Stable sort: schools with equal keys keep their input order for both directions.
pub fn sort(schools: &[School], key: SortKey, order: SortOrder) -> Vec<School> {
    let mut scored: Vec<ScoredSchool> = schools.iter().cloned().map(ScoredSchool::new).collect();
    sort_scored(&mut scored, key, order);
    scored.into_iter().map(|entry| entry.school).collect()
}

/// Filter, score and sort in one pass over the listing.
pub fn rank(
    schools: &[School],
    criteria: &FilterCriteria,
    key: SortKey,
    order: SortOrder,
) -> Vec<ScoredSchool> {
    let mut scored: Vec<ScoredSchool> = filter(schools, criteria)
        .into_iter()
        .map(ScoredSchool::new)
        .collect();
    sort_scored(&mut scored, key, order);
    scored
}

fn sort_scored(entries: &mut [ScoredSchool], key: SortKey, order: SortOrder) {
    entries.sort_by(|a, b| {
        let ordering = compare_by(key, a, b);
        match order {
            SortOrder::Asc => ordering,
            SortOrder::Desc => ordering.reverse(),
        }
    });
}

fn compare_by(key: SortKey, a: &ScoredSchool, b: &ScoredSchool) -> Ordering {
    match key {
        SortKey::Score => a.score.cmp(&b.score),
        SortKey::Fee => a.school.monthly_fee.cmp(&b.school.monthly_fee),
        SortKey::Name => compare_names(&a.school.name, &b.school.name),
    }
}

// Case-insensitive first so "academy" and "Academy" sit together.
fn compare_names(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}
