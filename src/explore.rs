//! Read-only explore view over the unified summary.
//!
//! Filters summary rows by mode, season, duration bucket and facility type
//! and shapes them into the
//! `{locations, map, summary}` payload the dashboard renders.

use anyhow::{Result, anyhow};
use serde::Serialize;
use std::collections::BTreeSet;

use crate::unify::bucket::BucketPolicy;
use crate::unify::types::{
    FacilityGroup, FacilityType, Mode, Season, SourceType, UnifiedSummaryRecord,
};

/// Filter parameters. `None` matches everything.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExploreQuery {
    pub mode: Option<Mode>,
    pub season: Option<Season>,
    /// One of the active bucket scheme's labels.
    pub duration: Option<&'static str>,
    pub facility_type: Option<FacilityType>,
}

impl ExploreQuery {
    /// Builds a query from raw parameter values; absent, empty, or `All` means no filter.
    pub fn parse(mode: Option<&str>, season: Option<&str>) -> Result<Self> {
        Ok(Self {
            mode: unless_all(mode).map(str::parse).transpose()?,
            season: unless_all(season).map(str::parse).transpose()?,
            ..Self::default()
        })
    }

    /// Restricts the query to one duration bucket of `buckets`, ignoring case.
    pub fn with_duration(mut self, label: Option<&str>, buckets: &dyn BucketPolicy) -> Result<Self> {
        let Some(label) = unless_all(label) else {
            self.duration = None;
            return Ok(self);
        };

        let found = buckets
            .labels()
            .iter()
            .copied()
            .find(|l| l.eq_ignore_ascii_case(label))
            .ok_or_else(|| {
                anyhow!(
                    "unknown duration '{label}', expected one of: {}",
                    buckets.labels().join(", ")
                )
            })?;
        self.duration = Some(found);
        Ok(self)
    }

    pub fn with_facility_type(mut self, facility_type: Option<&str>) -> Result<Self> {
        self.facility_type = unless_all(facility_type).map(str::parse).transpose()?;
        Ok(self)
    }

    pub fn matches(&self, record: &UnifiedSummaryRecord) -> bool {
        self.mode.is_none_or(|m| record.mode == m)
            && self.season.is_none_or(|s| record.seasons.contains(&s))
            && self.duration.is_none_or(|d| record.duration == d)
            && self.facility_type.is_none_or(|f| record.facility_type == f)
    }
}

fn unless_all(value: Option<&str>) -> Option<&str> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty() && !v.eq_ignore_ascii_case("all"))
}

#[derive(Debug, Serialize)]
pub struct LocationEntry {
    pub location: String,
    pub mode: Mode,
    pub source: String,
    pub source_type: SourceType,
    pub facility_type: FacilityType,
    pub facility_group: FacilityGroup,
    pub duration: String,
    pub total_counts: u64,
    pub longitude: Option<f64>,
    pub latitude: Option<f64>,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct MapPoint {
    pub location: String,
    pub latitude: f64,
    pub longitude: f64,
    pub total_counts: u64,
}

#[derive(Debug, Serialize)]
pub struct MapView {
    /// Mean position of the plotted points, `[latitude, longitude]`.
    pub center: Option<[f64; 2]>,
    pub points: Vec<MapPoint>,
}

#[derive(Debug, Serialize)]
pub struct ExploreResponse {
    pub locations: Vec<LocationEntry>,
    pub map: MapView,
    pub summary: String,
}

/// Applies `query` to the summary rows and builds the explore payload.
pub fn explore(records: &[UnifiedSummaryRecord], query: &ExploreQuery) -> ExploreResponse {
    let selected: Vec<&UnifiedSummaryRecord> =
        records.iter().filter(|r| query.matches(r)).collect();

    let locations = selected
        .iter()
        .map(|r| LocationEntry {
            location: r.location.clone(),
            mode: r.mode,
            source: r.source_label.clone(),
            source_type: r.source_type,
            facility_type: r.facility_type,
            facility_group: r.facility_group,
            duration: r.duration.clone(),
            total_counts: r.total_counts,
            longitude: r.longitude,
            latitude: r.latitude,
        })
        .collect();

    let points: Vec<MapPoint> = selected
        .iter()
        .filter_map(|r| match (r.latitude, r.longitude) {
            (Some(latitude), Some(longitude)) => Some(MapPoint {
                location: r.location.clone(),
                latitude,
                longitude,
                total_counts: r.total_counts,
            }),
            _ => None,
        })
        .collect();

    let center = if points.is_empty() {
        None
    } else {
        let n = points.len() as f64;
        Some([
            points.iter().map(|p| p.latitude).sum::<f64>() / n,
            points.iter().map(|p| p.longitude).sum::<f64>() / n,
        ])
    };

    let distinct: BTreeSet<&str> = selected.iter().map(|r| r.location.as_str()).collect();
    let total: u64 = selected.iter().map(|r| r.total_counts).sum();

    let summary = format!(
        "{} of {} summary rows across {} locations, {} total counts \
         (mode: {}, season: {}, duration: {}, facility type: {})",
        selected.len(),
        records.len(),
        distinct.len(),
        total,
        query.mode.map_or("All", |m| m.as_str()),
        query.season.map_or("All", |s| s.as_str()),
        query.duration.unwrap_or("All"),
        query.facility_type.map_or("All", |f| f.as_str()),
    );

    ExploreResponse {
        locations,
        map: MapView { center, points },
        summary,
    }
}
