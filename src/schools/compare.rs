use serde::Serialize;

use super::models::School;
use super::sort::ScoredSchool;

/// Side-by-side view of a handful of schools picked by the parent.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Comparison {
    pub entries: Vec<ScoredSchool>,
    pub leaders: CategoryLeaders,
}

/// Id of the best school per category. Ties go to the school selected first.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CategoryLeaders {
    pub highest_score: Option<u64>,
    pub lowest_fee: Option<u64>,
    pub best_academic: Option<u64>,
    pub most_vacancies: Option<u64>,
}

/// Builds a comparison for `ids` in the order they were selected.
///
/// Unknown ids and repeats are skipped; at most `limit` schools are kept.
pub fn compare(schools: &[School], ids: &[u64], limit: usize) -> Comparison {
    let mut entries: Vec<ScoredSchool> = Vec::new();
    for id in ids {
        if entries.len() == limit {
            break;
        }
        if entries.iter().any(|entry| entry.school.id == *id) {
            continue;
        }
        if let Some(school) = schools.iter().find(|s| s.id == *id) {
            entries.push(ScoredSchool::new(school.clone()));
        }
    }

    let leaders = CategoryLeaders {
        highest_score: leader(&entries, |e| Some(e.score as f64), true),
        lowest_fee: leader(&entries, |e| Some(e.school.monthly_fee as f64), false),
        best_academic: leader(&entries, |e| e.school.ratings.academic, true),
        most_vacancies: leader(&entries, |e| e.school.vacancy_rate, true),
    };

    Comparison { entries, leaders }
}

fn leader<F>(entries: &[ScoredSchool], value: F, highest: bool) -> Option<u64>
where
    F: Fn(&ScoredSchool) -> Option<f64>,
{
    let mut best: Option<(u64, f64)> = None;
    for entry in entries {
        let Some(v) = value(entry) else { continue };
        let better = match best {
            None => true,
            Some((_, current)) if highest => v > current,
            Some((_, current)) => v < current,
        };
        if better {
            best = Some((entry.school.id, v));
        }
    }
    best.map(|(id, _)| id)
}
