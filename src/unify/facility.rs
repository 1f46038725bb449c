//! Facility classification.
//!
//! Actual sources use a fixed lookup per category. Modeled pedestrian and
//! bicycle rows carry no structural metadata, so their facility type is
//! guessed from the location name by [`is_intersection_name`].

use serde::{Deserialize, Serialize};

use crate::unify::types::{FacilityType, SourceCategory};

/// Substrings that mark a location as trail-like. Any of them vetoes an
/// intersection match.
const TRAIL_TOKENS: &[&str] = &["trail", "greenway", "path", "riverwalk", "rail", "boardwalk"];

/// Single-character connectors: `X & Y`, `X @ Y`, `X/Y`.
const SYMBOL_CONNECTORS: &[char] = &['&', '@', '/'];

/// Whole-word connectors: `X and Y`, `X at Y`.
const WORD_CONNECTORS: &[&str] = &["and", "at"];

/// Decides whether a modeled location name describes an intersection.
///
/// True when the name joins two non-empty parts with a connector and mentions
/// none of the trail tokens. Matching is case-insensitive.
pub fn is_intersection_name(name: &str) -> bool {
    let lower = name.to_lowercase();

    if TRAIL_TOKENS.iter().any(|t| lower.contains(t)) {
        return false;
    }

    has_symbol_connector(&lower) || has_word_connector(&lower)
}

fn has_symbol_connector(name: &str) -> bool {
    SYMBOL_CONNECTORS.iter().any(|&c| {
        name.match_indices(c).any(|(i, m)| {
            !name[..i].trim().is_empty() && !name[i + m.len()..].trim().is_empty()
        })
    })
}

fn has_word_connector(name: &str) -> bool {
    let words: Vec<&str> = name.split_whitespace().collect();
    words
        .iter()
        .enumerate()
        .any(|(i, w)| i > 0 && i + 1 < words.len() && WORD_CONNECTORS.contains(w))
}

/// Facility type assigned to actual pedestrian-only counts.
///
/// Earlier deployments filed pilot pedestrian counts as sidewalk counts; later
/// ones file them as intersection counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum PedestrianFacility {
    #[default]
    Sidewalk,
    Intersection,
}

/// Assigns a facility type to a summary row.
pub trait FacilityPolicy: Send + Sync {
    fn facility_type(&self, category: SourceCategory, location: &str) -> FacilityType;
}

/// The facility rules used by every ruleset generation so far.
#[derive(Debug, Clone, Copy, Default)]
pub struct FacilityRules {
    pub pedestrian: PedestrianFacility,
}

impl FacilityPolicy for FacilityRules {
    fn facility_type(&self, category: SourceCategory, location: &str) -> FacilityType {
        match category {
            SourceCategory::ActualPedestrian => match self.pedestrian {
                PedestrianFacility::Sidewalk => FacilityType::Sidewalk,
                PedestrianFacility::Intersection => FacilityType::Intersection,
            },
            SourceCategory::ActualBicycle => FacilityType::SidewalkBikeLane,
            SourceCategory::ActualCombined => FacilityType::Intersection,
            SourceCategory::ActualTrail | SourceCategory::ModeledTrail => {
                FacilityType::OffStreetTrail
            }
            SourceCategory::ModeledPedestrian | SourceCategory::ModeledBicycle => {
                if is_intersection_name(location) {
                    FacilityType::Intersection
                } else {
                    FacilityType::SidewalkBikeLane
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intersection_name_table() {
        let cases = [
            ("Main St & 5th Ave", true),
            ("MAIN ST & 5TH AVE", true),
            ("Main St and Oak Ave", true),
            ("State St at Park St", true),
            ("Elm St @ 3rd Ave", true),
            ("Elm St/3rd Ave", true),
            ("Elm St / 3rd Ave", true),
            ("Johnson St&Broom St", true),
            ("Elm St", false),
            ("Andover Rd", false),
            ("Atwood Ave", false),
            ("Main St and", false),
            ("at Main St", false),
            ("& Main St", false),
            ("Main St /", false),
            ("", false),
            ("Riverwalk Trail & Overlook", false),
            ("Rail Trail & 5th St", false),
            ("Oak Leaf Path / 76th St", false),
            ("Southwest Greenway and Park St", false),
            ("Boardwalk at Lake Monona", false),
            ("Milwaukee Riverwalk @ Wells St", false),
            ("Hank Aaron State Trail", false),
        ];

        for (name, expected) in cases {
            assert_eq!(is_intersection_name(name), expected, "{name:?}");
        }
    }

    #[test]
    fn test_actual_lookup() {
        let rules = FacilityRules::default();
        assert_eq!(
            rules.facility_type(SourceCategory::ActualPedestrian, "Main St & 5th Ave"),
            FacilityType::Sidewalk
        );
        assert_eq!(
            rules.facility_type(SourceCategory::ActualBicycle, "Main St & 5th Ave"),
            FacilityType::SidewalkBikeLane
        );
        assert_eq!(
            rules.facility_type(SourceCategory::ActualCombined, "Elm St"),
            FacilityType::Intersection
        );
        assert_eq!(
            rules.facility_type(SourceCategory::ActualTrail, "Elm St & Oak St"),
            FacilityType::OffStreetTrail
        );
    }

    #[test]
    fn test_pedestrian_generation_switch() {
        let rules = FacilityRules {
            pedestrian: PedestrianFacility::Intersection,
        };
        assert_eq!(
            rules.facility_type(SourceCategory::ActualPedestrian, "Elm St"),
            FacilityType::Intersection
        );
    }

    #[test]
    fn test_modeled_rows_use_name_heuristic() {
        let rules = FacilityRules::default();
        assert_eq!(
            rules.facility_type(SourceCategory::ModeledPedestrian, "Main St & 5th Ave"),
            FacilityType::Intersection
        );
        assert_eq!(
            rules.facility_type(SourceCategory::ModeledBicycle, "Riverwalk Trail & Overlook"),
            FacilityType::SidewalkBikeLane
        );
        assert_eq!(
            rules.facility_type(SourceCategory::ModeledPedestrian, "Elm St"),
            FacilityType::SidewalkBikeLane
        );
        assert_eq!(
            rules.facility_type(SourceCategory::ModeledTrail, "Main St & 5th Ave"),
            FacilityType::OffStreetTrail
        );
    }
}
