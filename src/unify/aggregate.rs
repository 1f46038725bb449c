use chrono::{Datelike, NaiveDateTime};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

use crate::unify::Policies;
use crate::unify::duration::{span_hours, worst_case_hours};
use crate::unify::types::{
    ModeledEstimate, RawObservation, Season, SourceCategory, SourceTable, UnifiedSummaryRecord,
};
use crate::unify::utility::{first_present, normalize_location, round_count};

/// Aggregates one source table into summary rows, one per location.
///
/// Rows come out ordered by location name. An empty table yields no rows.
pub fn aggregate(table: &SourceTable, policies: &Policies) -> Vec<UnifiedSummaryRecord> {
    let category = table.category();

    let records = match table {
        SourceTable::ActualPedestrian(rows)
        | SourceTable::ActualBicycle(rows)
        | SourceTable::ActualCombined(rows)
        | SourceTable::ActualTrail(rows) => aggregate_actual(category, rows, policies),
        SourceTable::ModeledPedestrian(rows)
        | SourceTable::ModeledBicycle(rows)
        | SourceTable::ModeledTrail(rows) => aggregate_modeled(category, rows, policies),
    };

    debug!(
        category = %category,
        input_rows = table.len(),
        output_rows = records.len(),
        "Aggregated source table"
    );

    records
}

fn aggregate_actual(
    category: SourceCategory,
    rows: &[RawObservation],
    policies: &Policies,
) -> Vec<UnifiedSummaryRecord> {
    let mut groups: BTreeMap<String, Vec<&RawObservation>> = BTreeMap::new();
    for row in rows {
        groups
            .entry(normalize_location(Some(&row.location_name)))
            .or_default()
            .push(row);
    }

    groups
        .into_iter()
        .map(|(location, group)| {
            let total: u64 = group.iter().map(|r| r.count).sum();
            let hours = span_hours(group.iter().map(|r| r.timestamp));
            let seasons = seasons_of(group.iter().map(|r| r.timestamp));

            build_record(
                category,
                location,
                Totals {
                    total,
                    hours,
                    longitude: None,
                    latitude: None,
                    seasons,
                },
                policies,
            )
        })
        .collect()
}

fn aggregate_modeled(
    category: SourceCategory,
    rows: &[ModeledEstimate],
    policies: &Policies,
) -> Vec<UnifiedSummaryRecord> {
    let mut groups: BTreeMap<String, Vec<&ModeledEstimate>> = BTreeMap::new();
    for row in rows {
        groups
            .entry(normalize_location(row.location_name.as_deref()))
            .or_default()
            .push(row);
    }

    groups
        .into_iter()
        .map(|(location, group)| {
            let estimated: f64 = group
                .iter()
                .map(|r| r.estimated_annual)
                .filter(|v| v.is_finite())
                .sum();
            let hours = worst_case_hours(group.iter().map(|r| r.duration_text.as_deref()));

            let (longitude, latitude) = group.iter().fold((None, None), |(lon, lat), r| {
                (first_present(lon, r.longitude), first_present(lat, r.latitude))
            });

            let seasons = group
                .iter()
                .filter_map(|r| r.date_of_count.map(|d| d.month()).or(r.month))
                .filter_map(Season::from_month)
                .collect::<BTreeSet<_>>()
                .into_iter()
                .collect();

            build_record(
                category,
                location,
                Totals {
                    total: round_count(estimated),
                    hours,
                    longitude,
                    latitude,
                    seasons,
                },
                policies,
            )
        })
        .collect()
}

struct Totals {
    total: u64,
    hours: f64,
    longitude: Option<f64>,
    latitude: Option<f64>,
    seasons: Vec<Season>,
}

fn build_record(
    category: SourceCategory,
    location: String,
    totals: Totals,
    policies: &Policies,
) -> UnifiedSummaryRecord {
    let facility_type = policies.facilities.facility_type(category, &location);

    UnifiedSummaryRecord {
        duration: policies.buckets.label(totals.hours).to_string(),
        total_counts: totals.total,
        source_type: category.source_type(),
        longitude: totals.longitude,
        latitude: totals.latitude,
        source_label: category.source_label().to_string(),
        facility_type,
        facility_group: facility_type.group(),
        mode: category.mode(),
        observed_hours: totals.hours,
        seasons: totals.seasons,
        location,
    }
}

fn seasons_of<I>(timestamps: I) -> Vec<Season>
where
    I: IntoIterator<Item = NaiveDateTime>,
{
    timestamps
        .into_iter()
        .filter_map(|ts| Season::from_month(ts.month()))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Ruleset;
    use crate::unify::duration::UNKNOWN_HOURS;
    use crate::unify::types::{FacilityGroup, FacilityType, Mode, SourceType, UNKNOWN_LOCATION};
    use chrono::NaiveDate;

    fn obs(location: &str, day: u32, hour: u32, count: u64) -> RawObservation {
        RawObservation {
            location_name: location.to_string(),
            timestamp: NaiveDate::from_ymd_opt(2024, 7, day)
                .unwrap()
                .and_hms_opt(hour, 0, 0)
                .unwrap(),
            count,
            direction: Some("North".to_string()),
        }
    }

    fn estimate(location: Option<&str>, annual: f64, duration: Option<&str>) -> ModeledEstimate {
        ModeledEstimate {
            location_name: location.map(str::to_string),
            estimated_annual: annual,
            duration_text: duration.map(str::to_string),
            ..Default::default()
        }
    }

    fn policies() -> Policies {
        Policies::from_ruleset(&Ruleset::default())
    }

    #[test]
    fn test_empty_table_yields_no_rows() {
        let table = SourceTable::ActualTrail(vec![]);
        assert!(aggregate(&table, &policies()).is_empty());
    }

    #[test]
    fn test_actual_groups_by_location() {
        let table = SourceTable::ActualPedestrian(vec![
            obs("Elm St", 1, 8, 10),
            obs("Oak St", 1, 8, 4),
            obs("Elm St", 1, 9, 5),
        ]);
        let records = aggregate(&table, &policies());

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].location, "Elm St");
        assert_eq!(records[0].total_counts, 15);
        assert_eq!(records[0].observed_hours, 2.0);
        assert_eq!(records[0].duration, "0-15h");
        assert_eq!(records[0].source_type, SourceType::Actual);
        assert_eq!(records[0].mode, Mode::Pedestrian);
        assert_eq!(records[0].facility_type, FacilityType::Sidewalk);
        assert_eq!(records[0].longitude, None);
        assert_eq!(records[0].seasons, vec![Season::Summer]);
        assert_eq!(records[1].location, "Oak St");
        assert_eq!(records[1].observed_hours, 1.0);
    }

    #[test]
    fn test_actual_trail_long_span() {
        let table = SourceTable::ActualTrail(vec![obs("Lakeshore", 1, 0, 3), obs("Lakeshore", 31, 0, 3)]);
        let records = aggregate(&table, &policies());

        assert_eq!(records[0].observed_hours, 721.0);
        assert_eq!(records[0].duration, "1-3mo");
        assert_eq!(records[0].facility_group, FacilityGroup::OffStreetTrail);
        assert_eq!(records[0].mode, Mode::Both);
    }

    #[test]
    fn test_modeled_worst_case_duration() {
        let table = SourceTable::ModeledPedestrian(vec![
            estimate(Some("Main St & 5th Ave"), 1000.0, Some("10")),
            estimate(Some("Main St & 5th Ave"), 500.0, Some("40 days")),
        ]);
        let records = aggregate(&table, &policies());

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].total_counts, 1500);
        assert_eq!(records[0].observed_hours, 960.0);
        assert_eq!(records[0].duration, "1-3mo");
        assert_eq!(records[0].facility_type, FacilityType::Intersection);
        assert_eq!(records[0].source_type, SourceType::Modeled);
    }

    #[test]
    fn test_modeled_missing_name_and_duration() {
        let table = SourceTable::ModeledBicycle(vec![
            estimate(None, 20.0, None),
            estimate(Some(""), 30.0, Some("n/a")),
        ]);
        let records = aggregate(&table, &policies());

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].location, UNKNOWN_LOCATION);
        assert_eq!(records[0].total_counts, 50);
        assert_eq!(records[0].observed_hours, UNKNOWN_HOURS);
        assert_eq!(records[0].duration, ">6mo");
    }

    #[test]
    fn test_modeled_coordinates_take_first_present() {
        let mut first = estimate(Some("Elm St"), 1.0, Some("6 hrs"));
        first.latitude = Some(43.07);
        let mut second = estimate(Some("Elm St"), 1.0, Some("6 hrs"));
        second.longitude = Some(-89.40);
        second.latitude = Some(43.10);

        let table = SourceTable::ModeledPedestrian(vec![first, second]);
        let records = aggregate(&table, &policies());

        assert_eq!(records[0].longitude, Some(-89.40));
        assert_eq!(records[0].latitude, Some(43.07));
    }

    #[test]
    fn test_modeled_seasons_from_date_or_month() {
        let mut dated = estimate(Some("Elm St"), 1.0, Some("6 hrs"));
        dated.date_of_count = NaiveDate::from_ymd_opt(2023, 10, 3);
        let mut by_month = estimate(Some("Elm St"), 1.0, Some("6 hrs"));
        by_month.month = Some(4);

        let table = SourceTable::ModeledTrail(vec![dated, by_month]);
        let records = aggregate(&table, &policies());

        assert_eq!(records[0].seasons, vec![Season::Spring, Season::Fall]);
    }
}
