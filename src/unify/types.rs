//! Data types used by the unification pipeline.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Placeholder used whenever a source row has no usable location name.
pub const UNKNOWN_LOCATION: &str = "(Unknown)";

/// A single timestamped count from an actual-count export.
#[derive(Debug, Clone, PartialEq)]
pub struct RawObservation {
    pub location_name: String,
    pub timestamp: NaiveDateTime,
    pub count: u64,
    pub direction: Option<String>,
}

/// One row of a modeled annual-estimate table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModeledEstimate {
    pub location_name: Option<String>,
    pub estimated_annual: f64,
    pub duration_text: Option<String>,
    pub longitude: Option<f64>,
    pub latitude: Option<f64>,
    pub date_of_count: Option<NaiveDate>,
    pub month: Option<u32>,
}

/// Whether a summary row comes from sensor observations or a model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SourceType {
    Actual,
    Modeled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Mode {
    Pedestrian,
    Bicyclist,
    Both,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Pedestrian => "Pedestrian",
            Mode::Bicyclist => "Bicyclist",
            Mode::Both => "Both",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pedestrian" | "ped" => Ok(Mode::Pedestrian),
            "bicyclist" | "bicycle" | "bike" => Ok(Mode::Bicyclist),
            "both" => Ok(Mode::Both),
            other => Err(anyhow::anyhow!("unknown mode '{other}'")),
        }
    }
}

/// Coarse facility classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FacilityGroup {
    #[serde(rename = "On-Street")]
    OnStreet,
    #[serde(rename = "Off-Street Trail")]
    OffStreetTrail,
}

/// Fine-grained facility classification within a [`FacilityGroup`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FacilityType {
    #[serde(rename = "On-Street (sidewalk)")]
    Sidewalk,
    #[serde(rename = "On-Street (sidewalk/bike lane)")]
    SidewalkBikeLane,
    #[serde(rename = "Intersection")]
    Intersection,
    #[serde(rename = "Off-Street Trail")]
    OffStreetTrail,
}

impl FacilityType {
    pub fn group(&self) -> FacilityGroup {
        match self {
            FacilityType::OffStreetTrail => FacilityGroup::OffStreetTrail,
            _ => FacilityGroup::OnStreet,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FacilityType::Sidewalk => "On-Street (sidewalk)",
            FacilityType::SidewalkBikeLane => "On-Street (sidewalk/bike lane)",
            FacilityType::Intersection => "Intersection",
            FacilityType::OffStreetTrail => "Off-Street Trail",
        }
    }
}

impl FromStr for FacilityType {
    type Err = anyhow::Error;

    /// Accepts the column labels as well as short names such as `trail`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "on-street (sidewalk)" | "sidewalk" => Ok(FacilityType::Sidewalk),
            "on-street (sidewalk/bike lane)" | "sidewalk/bike lane" | "sidewalk_bike_lane"
            | "bike lane" => Ok(FacilityType::SidewalkBikeLane),
            "intersection" => Ok(FacilityType::Intersection),
            "off-street trail" | "trail" => Ok(FacilityType::OffStreetTrail),
            other => Err(anyhow::anyhow!("unknown facility type '{other}'")),
        }
    }
}

/// Meteorological season, used by the explore view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Season {
    Winter,
    Spring,
    Summer,
    Fall,
}

impl Season {
    /// Maps a calendar month (1–12) to its season. Out-of-range months map to `None`.
    pub fn from_month(month: u32) -> Option<Season> {
        match month {
            12 | 1 | 2 => Some(Season::Winter),
            3..=5 => Some(Season::Spring),
            6..=8 => Some(Season::Summer),
            9..=11 => Some(Season::Fall),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Season::Winter => "Winter",
            Season::Spring => "Spring",
            Season::Summer => "Summer",
            Season::Fall => "Fall",
        }
    }
}

impl FromStr for Season {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "winter" => Ok(Season::Winter),
            "spring" => Ok(Season::Spring),
            "summer" => Ok(Season::Summer),
            "fall" | "autumn" => Ok(Season::Fall),
            other => Err(anyhow::anyhow!("unknown season '{other}'")),
        }
    }
}

/// The seven raw input categories the engine understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceCategory {
    ActualPedestrian,
    ActualBicycle,
    ActualCombined,
    ActualTrail,
    ModeledPedestrian,
    ModeledBicycle,
    ModeledTrail,
}

impl SourceCategory {
    /// All categories in merge order.
    pub const ALL: [SourceCategory; 7] = [
        SourceCategory::ActualPedestrian,
        SourceCategory::ActualBicycle,
        SourceCategory::ActualCombined,
        SourceCategory::ActualTrail,
        SourceCategory::ModeledPedestrian,
        SourceCategory::ModeledBicycle,
        SourceCategory::ModeledTrail,
    ];

    pub fn source_type(&self) -> SourceType {
        match self {
            SourceCategory::ActualPedestrian
            | SourceCategory::ActualBicycle
            | SourceCategory::ActualCombined
            | SourceCategory::ActualTrail => SourceType::Actual,
            _ => SourceType::Modeled,
        }
    }

    pub fn mode(&self) -> Mode {
        match self {
            SourceCategory::ActualPedestrian | SourceCategory::ModeledPedestrian => {
                Mode::Pedestrian
            }
            SourceCategory::ActualBicycle | SourceCategory::ModeledBicycle => Mode::Bicyclist,
            SourceCategory::ActualCombined
            | SourceCategory::ActualTrail
            | SourceCategory::ModeledTrail => Mode::Both,
        }
    }

    /// Provenance label written to the `Source` column.
    pub fn source_label(&self) -> &'static str {
        match self {
            SourceCategory::ActualPedestrian
            | SourceCategory::ActualBicycle
            | SourceCategory::ActualCombined => "Wisconsin Pilot Counting Counts",
            SourceCategory::ActualTrail => "Wisconsin Pilot Trail Counts",
            SourceCategory::ModeledPedestrian
            | SourceCategory::ModeledBicycle
            | SourceCategory::ModeledTrail => "Wisconsin Ped/Bike Count Database",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            SourceCategory::ActualPedestrian => "actual_pedestrian",
            SourceCategory::ActualBicycle => "actual_bicycle",
            SourceCategory::ActualCombined => "actual_combined",
            SourceCategory::ActualTrail => "actual_trail",
            SourceCategory::ModeledPedestrian => "modeled_pedestrian",
            SourceCategory::ModeledBicycle => "modeled_bicycle",
            SourceCategory::ModeledTrail => "modeled_trail",
        }
    }
}

impl fmt::Display for SourceCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A raw source table tagged with its category. Each variant carries the
/// schema its category is exported in.
#[derive(Debug, Clone, PartialEq)]
pub enum SourceTable {
    ActualPedestrian(Vec<RawObservation>),
    ActualBicycle(Vec<RawObservation>),
    ActualCombined(Vec<RawObservation>),
    ActualTrail(Vec<RawObservation>),
    ModeledPedestrian(Vec<ModeledEstimate>),
    ModeledBicycle(Vec<ModeledEstimate>),
    ModeledTrail(Vec<ModeledEstimate>),
}

impl SourceTable {
    pub fn category(&self) -> SourceCategory {
        match self {
            SourceTable::ActualPedestrian(_) => SourceCategory::ActualPedestrian,
            SourceTable::ActualBicycle(_) => SourceCategory::ActualBicycle,
            SourceTable::ActualCombined(_) => SourceCategory::ActualCombined,
            SourceTable::ActualTrail(_) => SourceCategory::ActualTrail,
            SourceTable::ModeledPedestrian(_) => SourceCategory::ModeledPedestrian,
            SourceTable::ModeledBicycle(_) => SourceCategory::ModeledBicycle,
            SourceTable::ModeledTrail(_) => SourceCategory::ModeledTrail,
        }
    }

    /// Wraps actual-count rows in the variant for `category`.
    ///
    /// Returns `None` when `category` is a modeled category.
    pub fn actual(category: SourceCategory, rows: Vec<RawObservation>) -> Option<Self> {
        match category {
            SourceCategory::ActualPedestrian => Some(SourceTable::ActualPedestrian(rows)),
            SourceCategory::ActualBicycle => Some(SourceTable::ActualBicycle(rows)),
            SourceCategory::ActualCombined => Some(SourceTable::ActualCombined(rows)),
            SourceCategory::ActualTrail => Some(SourceTable::ActualTrail(rows)),
            _ => None,
        }
    }

    /// Wraps modeled-estimate rows in the variant for `category`.
    ///
    /// Returns `None` when `category` is an actual category.
    pub fn modeled(category: SourceCategory, rows: Vec<ModeledEstimate>) -> Option<Self> {
        match category {
            SourceCategory::ModeledPedestrian => Some(SourceTable::ModeledPedestrian(rows)),
            SourceCategory::ModeledBicycle => Some(SourceTable::ModeledBicycle(rows)),
            SourceCategory::ModeledTrail => Some(SourceTable::ModeledTrail(rows)),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            SourceTable::ActualPedestrian(rows)
            | SourceTable::ActualBicycle(rows)
            | SourceTable::ActualCombined(rows)
            | SourceTable::ActualTrail(rows) => rows.len(),
            SourceTable::ModeledPedestrian(rows)
            | SourceTable::ModeledBicycle(rows)
            | SourceTable::ModeledTrail(rows) => rows.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One row of the unified summary relation.
///
/// Serializes to exactly the ten summary columns; `observed_hours` and
/// `seasons` stay in memory for the explore view.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnifiedSummaryRecord {
    #[serde(rename = "Location")]
    pub location: String,
    #[serde(rename = "Duration")]
    pub duration: String,
    #[serde(rename = "Total counts")]
    pub total_counts: u64,
    #[serde(rename = "Source type")]
    pub source_type: SourceType,
    #[serde(rename = "Longitude")]
    pub longitude: Option<f64>,
    #[serde(rename = "Latitude")]
    pub latitude: Option<f64>,
    #[serde(rename = "Source")]
    pub source_label: String,
    #[serde(rename = "Facility type")]
    pub facility_type: FacilityType,
    #[serde(rename = "Facility group")]
    pub facility_group: FacilityGroup,
    #[serde(rename = "Mode")]
    pub mode: Mode,
    #[serde(skip)]
    pub observed_hours: f64,
    #[serde(skip)]
    pub seasons: Vec<Season>,
}
