use super::models::School;

pub const ACADEMIC_WEIGHT: f64 = 3.0;
pub const INFRASTRUCTURE_WEIGHT: f64 = 2.0;
pub const FACILITIES_WEIGHT: f64 = 2.0;
pub const SPORTS_WEIGHT: f64 = 1.5;
pub const VACANCY_WEIGHT: f64 = 1.5;

/// Weighted sum of the rating fields and vacancy rate, rounded to the nearest integer.
///
/// A missing value contributes nothing, same as a rating of zero.
pub fn score(school: &School) -> i64 {
    let ratings = &school.ratings;
    let weighted = [
        (ratings.academic, ACADEMIC_WEIGHT),
        (ratings.infrastructure, INFRASTRUCTURE_WEIGHT),
        (ratings.facilities, FACILITIES_WEIGHT),
        (ratings.sports, SPORTS_WEIGHT),
        (school.vacancy_rate, VACANCY_WEIGHT),
    ];

    let total: f64 = weighted
        .iter()
        .map(|(value, weight)| value.unwrap_or(0.0) * weight)
        .sum();

    total.round() as i64
}
