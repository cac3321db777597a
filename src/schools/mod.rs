//! School listing pipeline for the portal
//!
//! Pure functions over school records: filtering by parent criteria,
//! scoring, sorting and side-by-side comparison. Nothing here mutates the
//! records it is given.

pub mod compare;
pub mod filter;
pub mod models;
pub mod score;
pub mod sort;

pub use compare::{compare, CategoryLeaders, Comparison};
pub use filter::{filter, FilterCriteria};
pub use models::{Grade, Ownership, Ratings, School, SchoolUpdate, Stream};
pub use score::score;
pub use sort::{rank, sort, ScoredSchool, SortKey, SortOrder};

use crate::error::AppError;
use tracing::{debug, warn};

/// Parses a JSON array of school records, validating each one.
pub fn load_schools(json: &str) -> Result<Vec<School>, AppError> {
    let schools: Vec<School> = serde_json::from_str(json)?;
    for school in &schools {
        if let Err(e) = school.validate() {
            warn!("Rejected school {} ({}): {}", school.id, school.name, e);
            return Err(e.into());
        }
    }
    debug!("Loaded {} schools", schools.len());
    Ok(schools)
}
