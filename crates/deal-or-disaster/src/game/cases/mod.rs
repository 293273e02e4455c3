//! Case repository: loads authored property cases and hands out fresh copies for play.

pub mod domain;

use std::collections::HashSet;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;
use tracing::warn;

pub use domain::{
    CaseDataError, CaseId, FlagQuiz, Lien, OccupancyStatus, PropertyCase, RedFlag, RepairEstimate,
    Severity,
};

const BUILTIN_CASES: &str = include_str!("../../../data/cases.json");

/// Immutable set of canonical cases. Every accessor returns an owned copy so play-throughs
/// never write back into the catalog.
#[derive(Debug, Clone)]
pub struct CaseCatalog {
    cases: Vec<PropertyCase>,
}

impl CaseCatalog {
    pub fn new(cases: Vec<PropertyCase>) -> Result<Self, CatalogError> {
        if cases.is_empty() {
            return Err(CatalogError::Empty);
        }

        let mut ids = HashSet::new();
        for case in &cases {
            case.validate().map_err(|source| CatalogError::Invalid {
                case_id: case.id.clone(),
                source,
            })?;
            if !ids.insert(case.id.clone()) {
                return Err(CatalogError::DuplicateCase(case.id.clone()));
            }
        }

        let catalog = Self { cases };
        for finding in catalog.audit() {
            warn!(case_id = %finding.case_id, detail = %finding.detail, "case ground truth disagrees with its numbers");
        }
        Ok(catalog)
    }

    /// Cases compiled into the binary.
    pub fn builtin() -> Result<Self, CatalogError> {
        Self::from_reader(BUILTIN_CASES.as_bytes())
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file))
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, CatalogError> {
        let cases: Vec<PropertyCase> = serde_json::from_reader(reader)?;
        Self::new(cases)
    }

    pub fn len(&self) -> usize {
        self.cases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cases.is_empty()
    }

    pub fn ids(&self) -> Vec<CaseId> {
        self.cases.iter().map(|case| case.id.clone()).collect()
    }

    pub fn get(&self, id: &CaseId) -> Option<PropertyCase> {
        self.cases
            .iter()
            .find(|case| &case.id == id)
            .map(fresh_copy)
    }

    /// Uniform pick among cases whose id is not excluded.
    pub fn random_case<R>(
        &self,
        exclude: &HashSet<CaseId>,
        rng: &mut R,
    ) -> Result<PropertyCase, CatalogError>
    where
        R: Rng + ?Sized,
    {
        let candidates: Vec<&PropertyCase> = self
            .cases
            .iter()
            .filter(|case| !exclude.contains(&case.id))
            .collect();

        candidates
            .choose(rng)
            .map(|case| fresh_copy(case))
            .ok_or(CatalogError::Exhausted)
    }

    /// Like [`CaseCatalog::random_case`] but starts over with the full set once every case
    /// has been seen.
    pub fn random_case_cycling<R>(
        &self,
        exclude: &HashSet<CaseId>,
        rng: &mut R,
    ) -> Result<PropertyCase, CatalogError>
    where
        R: Rng + ?Sized,
    {
        match self.random_case(exclude, rng) {
            Err(CatalogError::Exhausted) => self.random_case(&HashSet::new(), rng),
            other => other,
        }
    }

    /// Cases whose `isGoodDeal` flag contradicts the acquisition-cost arithmetic.
    pub fn audit(&self) -> Vec<AuditFinding> {
        self.cases
            .iter()
            .filter(|case| !case.ground_truth_consistent())
            .map(|case| AuditFinding {
                case_id: case.id.clone(),
                is_good_deal: case.is_good_deal,
                actual_value: case.actual_value,
                acquisition_cost: case.acquisition_cost(),
                detail: format!(
                    "isGoodDeal={} but actual value {} vs acquisition cost {}",
                    case.is_good_deal,
                    case.actual_value,
                    case.acquisition_cost()
                ),
            })
            .collect()
    }
}

fn fresh_copy(case: &PropertyCase) -> PropertyCase {
    let mut copy = case.clone();
    copy.reset_flags();
    copy
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuditFinding {
    pub case_id: CaseId,
    pub is_good_deal: bool,
    pub actual_value: u64,
    pub acquisition_cost: u64,
    pub detail: String,
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("failed to read case data: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid case data: {0}")]
    Json(#[from] serde_json::Error),
    #[error("case '{case_id}' is invalid: {source}")]
    Invalid {
        case_id: CaseId,
        source: CaseDataError,
    },
    #[error("case id '{0}' appears more than once")]
    DuplicateCase(CaseId),
    #[error("case catalog is empty")]
    Empty,
    #[error("no cases remaining")]
    Exhausted,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn catalog() -> CaseCatalog {
        CaseCatalog::builtin().expect("builtin cases load")
    }

    #[test]
    fn builtin_cases_are_consistent() {
        let catalog = catalog();
        assert_eq!(catalog.len(), 5);
        assert!(catalog.audit().is_empty());
    }

    #[test]
    fn random_case_never_returns_excluded_ids() {
        let catalog = catalog();
        let mut rng = StdRng::seed_from_u64(7);
        let exclude: HashSet<CaseId> = catalog.ids().into_iter().skip(1).collect();

        for _ in 0..20 {
            let case = catalog.random_case(&exclude, &mut rng).expect("one left");
            assert!(!exclude.contains(&case.id));
        }
    }

    #[test]
    fn random_case_copies_are_independent() {
        let catalog = catalog();
        let only = catalog.ids()[0].clone();
        let exclude: HashSet<CaseId> = catalog
            .ids()
            .into_iter()
            .filter(|id| id != &only)
            .collect();
        let mut rng = StdRng::seed_from_u64(1);

        let mut first = catalog.random_case(&exclude, &mut rng).expect("case");
        first.red_flags[0].discovered = true;
        let second = catalog.random_case(&exclude, &mut rng).expect("case");

        assert_eq!(first.id, second.id);
        assert!(!second.red_flags[0].discovered);
        assert!(!catalog.get(&only).expect("present").red_flags[0].discovered);
    }

    #[test]
    fn random_case_reports_exhaustion() {
        let catalog = catalog();
        let exclude: HashSet<CaseId> = catalog.ids().into_iter().collect();
        let mut rng = StdRng::seed_from_u64(3);

        assert!(matches!(
            catalog.random_case(&exclude, &mut rng),
            Err(CatalogError::Exhausted)
        ));
        assert!(catalog.random_case_cycling(&exclude, &mut rng).is_ok());
    }

    #[test]
    fn missing_red_flags_fail_to_load() {
        let json = r#"[{
            "id": "case-x", "address": "1 Main St", "city": "Ames", "state": "IA", "zip": "50010",
            "propertyValue": 100000, "auctionPrice": 50000, "repairEstimate": 10000,
            "actualValue": 90000, "isGoodDeal": true
        }]"#;

        match CaseCatalog::from_reader(json.as_bytes()) {
            Err(CatalogError::Json(err)) => assert!(err.to_string().contains("redFlags")),
            other => panic!("expected json error, got {other:?}"),
        }
    }

    #[test]
    fn oversized_amounts_fail_to_load() {
        let json = r#"[{
            "id": "case-huge", "address": "1 Main St", "city": "Ames", "state": "IA", "zip": "50010",
            "propertyValue": 100000, "auctionPrice": 18446744073709551615, "repairEstimate": 10000,
            "actualValue": 90000, "isGoodDeal": false, "redFlags": []
        }]"#;

        match CaseCatalog::from_reader(json.as_bytes()) {
            Err(CatalogError::Invalid { case_id, source }) => {
                assert_eq!(case_id, CaseId::from("case-huge"));
                assert_eq!(source, CaseDataError::AmountOverflow);
            }
            other => panic!("expected invalid case, got {other:?}"),
        }
    }

    #[test]
    fn surviving_liens_past_the_signed_range_fail_to_load() {
        let mut case = catalog().get(&CaseId::from("case-harbor-view")).expect("case");
        case.liens[0].amount = u64::MAX / 2;
        case.liens[0].survives_foreclosure = true;

        let err = CaseCatalog::new(vec![case]).expect_err("overflow");
        assert!(matches!(
            err,
            CatalogError::Invalid {
                source: CaseDataError::AmountOverflow,
                ..
            }
        ));
    }

    #[test]
    fn duplicate_case_ids_are_rejected() {
        let mut case = catalog().get(&CaseId::from("case-ironwood")).expect("case");
        case.red_flags.clear();
        let err = CaseCatalog::new(vec![case.clone(), case]).expect_err("duplicate");
        assert!(matches!(err, CatalogError::DuplicateCase(_)));
    }

    #[test]
    fn audit_flags_inconsistent_ground_truth() {
        let mut case = catalog().get(&CaseId::from("case-maple-grove")).expect("case");
        case.is_good_deal = false;
        let catalog = CaseCatalog::new(vec![case]).expect("still loads");
        let findings = catalog.audit();
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].acquisition_cost, 175_000);
    }
}
