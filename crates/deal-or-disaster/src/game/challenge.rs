use std::collections::HashSet;
use std::fmt;

use chrono::{Datelike, NaiveDate};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use super::cases::{CaseCatalog, CaseId, CatalogError};

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChallengeId(pub String);

impl fmt::Display for ChallengeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The case every player gets on a given day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyChallenge {
    pub id: ChallengeId,
    pub date: NaiveDate,
    pub case_id: CaseId,
}

impl DailyChallenge {
    /// Deterministic pick: the same date always maps to the same case for a given catalog.
    pub fn for_date(date: NaiveDate, catalog: &CaseCatalog) -> Result<Self, CatalogError> {
        let seed = u64::from(date.num_days_from_ce().unsigned_abs());
        let mut rng = StdRng::seed_from_u64(seed);
        let case = catalog.random_case(&HashSet::new(), &mut rng)?;

        Ok(Self {
            id: Self::id_for(date),
            date,
            case_id: case.id,
        })
    }

    pub fn id_for(date: NaiveDate) -> ChallengeId {
        ChallengeId(format!("daily-{}", date.format("%Y-%m-%d")))
    }
}
