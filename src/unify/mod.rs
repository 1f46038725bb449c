//! Observation unification engine.
//!
//! Turns the raw actual-count and modeled-estimate tables into one summary
//! relation: every table is grouped by location, given a total, a duration
//! bucket and a facility classification, and the per-table results are
//! concatenated.

pub mod aggregate;
pub mod bucket;
pub mod duration;
pub mod facility;
pub mod merge;
pub mod types;
pub mod utility;

use crate::config::{BucketScheme, Ruleset};
use bucket::{BucketPolicy, TermBuckets, ThresholdBuckets};
use facility::{FacilityPolicy, FacilityRules};

pub use merge::{unify, unify_concurrent};

/// The bucketing and facility policies a run is evaluated with.
pub struct Policies {
    pub buckets: Box<dyn BucketPolicy>,
    pub facilities: Box<dyn FacilityPolicy>,
}

impl Policies {
    pub fn from_ruleset(ruleset: &Ruleset) -> Self {
        let buckets: Box<dyn BucketPolicy> = match ruleset.bucket_scheme {
            BucketScheme::Numeric => Box::new(ThresholdBuckets),
            BucketScheme::Binary => Box::new(TermBuckets {
                short_term_max_hours: ruleset.short_term_max_hours,
            }),
        };

        Self {
            buckets,
            facilities: Box::new(FacilityRules {
                pedestrian: ruleset.pedestrian_facility,
            }),
        }
    }
}
