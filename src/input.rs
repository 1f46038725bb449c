//! Loading raw source tables from CSV exports.
//!
//! Each table lives in its own file inside an input directory. Actual-count
//! tables use the long `location_name,date,direction,count` layout; modeled
//! tables use the statewide wide schema, of which only the columns the engine
//! needs are read. A missing file is an empty table.

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use csv::{ByteRecord, ReaderBuilder, StringRecord};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::fs::File;
use std::path::Path;
use tracing::{debug, info, warn};

use crate::config::EcoLayout;
use crate::unify::types::{
    ModeledEstimate, RawObservation, SourceCategory, SourceTable, SourceType,
};

pub const ECO_PED_FILE: &str = "eco_ped_traffic_data.csv";
pub const ECO_BIKE_FILE: &str = "eco_bike_traffic_data.csv";
pub const ECO_BOTH_FILE: &str = "eco_both_traffic_data.csv";
pub const ECO_MERGED_FILE: &str = "eco_traffic_data.csv";
pub const TRAIL_FILE: &str = "trail_traffic_data.csv";
pub const STATEWIDE_PED_FILE: &str = "statewide_pedestrian.csv";
pub const STATEWIDE_BIKE_FILE: &str = "statewide_bicyclist.csv";
pub const STATEWIDE_TRAIL_FILE: &str = "statewide_trailuser.csv";

/// File name and category for every table read under `layout`, in merge order.
pub fn table_files(layout: EcoLayout) -> Vec<(&'static str, SourceCategory)> {
    let mut files = match layout {
        EcoLayout::PerMode => vec![
            (ECO_PED_FILE, SourceCategory::ActualPedestrian),
            (ECO_BIKE_FILE, SourceCategory::ActualBicycle),
            (ECO_BOTH_FILE, SourceCategory::ActualCombined),
        ],
        EcoLayout::Merged => vec![(ECO_MERGED_FILE, SourceCategory::ActualCombined)],
    };

    files.extend([
        (TRAIL_FILE, SourceCategory::ActualTrail),
        (STATEWIDE_PED_FILE, SourceCategory::ModeledPedestrian),
        (STATEWIDE_BIKE_FILE, SourceCategory::ModeledBicycle),
        (STATEWIDE_TRAIL_FILE, SourceCategory::ModeledTrail),
    ]);
    files
}

/// Loads every table `layout` calls for from `dir`.
#[tracing::instrument(skip_all, fields(dir = %dir.display(), layout = ?layout))]
pub fn load_tables(dir: &Path, layout: EcoLayout) -> Result<Vec<SourceTable>> {
    let mut tables = Vec::new();

    for (file_name, category) in table_files(layout) {
        let path = dir.join(file_name);
        let table = if category.source_type() == SourceType::Actual {
            let rows = load_actual(&path)?;
            SourceTable::actual(category, rows)
        } else {
            let rows = load_modeled(&path)?;
            SourceTable::modeled(category, rows)
        };

        // table_files only pairs actual files with actual categories and modeled with modeled.
        if let Some(table) = table {
            info!(category = %category, file = file_name, rows = table.len(), "Loaded source table");
            tables.push(table);
        }
    }

    Ok(tables)
}

#[derive(Debug, Deserialize)]
struct ActualCsvRow {
    #[serde(default)]
    location_name: Option<String>,
    #[serde(default)]
    date: Option<String>,
    #[serde(default)]
    direction: Option<String>,
    #[serde(default)]
    count: Option<String>,
}

/// Reads an actual-count table. Rows with an unparseable timestamp are skipped
/// and their counts reported.
pub fn load_actual(path: &Path) -> Result<Vec<RawObservation>> {
    if !path.exists() {
        info!(path = %path.display(), "Table file not found, treating as empty");
        return Ok(Vec::new());
    }

    let mut rows = Vec::new();
    let mut skipped = 0usize;
    let mut skipped_counts = 0u64;

    for record in read_rows::<ActualCsvRow>(path)? {
        let Some(timestamp) = record.date.as_deref().and_then(parse_timestamp) else {
            skipped += 1;
            skipped_counts += parse_count(record.count.as_deref());
            continue;
        };

        rows.push(RawObservation {
            location_name: record.location_name.unwrap_or_default(),
            timestamp,
            count: parse_count(record.count.as_deref()),
            direction: record.direction,
        });
    }

    if skipped > 0 {
        warn!(
            path = %path.display(),
            skipped,
            skipped_counts,
            kept = rows.len(),
            "Skipped rows without a usable timestamp"
        );
    }

    Ok(rows)
}

#[derive(Debug, Deserialize)]
struct ModeledCsvRow {
    #[serde(default)]
    location_name: Option<String>,
    #[serde(default)]
    estimated_annual: Option<String>,
    #[serde(default)]
    duration: Option<String>,
    #[serde(default)]
    longitude: Option<String>,
    #[serde(default)]
    latitude: Option<String>,
    #[serde(default)]
    date_of_count: Option<String>,
    #[serde(default)]
    month: Option<String>,
}

/// Reads a modeled-estimate table. Non-numeric values are read as missing.
pub fn load_modeled(path: &Path) -> Result<Vec<ModeledEstimate>> {
    if !path.exists() {
        info!(path = %path.display(), "Table file not found, treating as empty");
        return Ok(Vec::new());
    }

    let mut rows = Vec::new();

    for record in read_rows::<ModeledCsvRow>(path)? {
        rows.push(ModeledEstimate {
            location_name: record.location_name,
            estimated_annual: parse_number(record.estimated_annual.as_deref()).unwrap_or(0.0),
            duration_text: record.duration,
            longitude: parse_number(record.longitude.as_deref()),
            latitude: parse_number(record.latitude.as_deref()),
            date_of_count: record
                .date_of_count
                .as_deref()
                .and_then(parse_timestamp)
                .map(|dt| dt.date()),
            month: parse_number(record.month.as_deref())
                .filter(|m| (1.0..=12.0).contains(m))
                .map(|m| m as u32),
        });
    }

    Ok(rows)
}

/// Deserializes every row of the CSV file at `path`.
///
/// Rows may have fewer or more fields than the header, and invalid UTF-8 is
/// decoded lossily. Rows that still cannot be read are skipped with a warning.
fn read_rows<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    let mut rdr = ReaderBuilder::new().flexible(true).from_reader(file);
    let headers = lossy(
        rdr.byte_headers()
            .with_context(|| format!("failed to read header of {}", path.display()))?,
    );

    let mut rows = Vec::new();
    let mut malformed = 0usize;

    for (line, result) in rdr.byte_records().enumerate() {
        let parsed = result.and_then(|record| lossy(&record).deserialize::<T>(Some(&headers)));

        match parsed {
            Ok(row) => rows.push(row),
            Err(e) => {
                malformed += 1;
                debug!(path = %path.display(), row = line + 1, error = %e, "Unreadable row");
            }
        }
    }

    if malformed > 0 {
        warn!(path = %path.display(), malformed, kept = rows.len(), "Skipped unreadable rows");
    }

    Ok(rows)
}

fn lossy(record: &ByteRecord) -> StringRecord {
    record.iter().map(String::from_utf8_lossy).collect()
}

const TIMESTAMP_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

/// Parses the timestamp shapes produced by the count exports. Offsets are
/// dropped in favour of the local wall-clock time; a bare date means midnight.
pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.naive_local());
    }

    TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .or_else(|| parse_date(value).and_then(|d| d.and_hms_opt(0, 0, 0)))
}

fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(value, "%m/%d/%Y"))
        .ok()
}

fn parse_number(value: Option<&str>) -> Option<f64> {
    value
        .and_then(|v| v.trim().parse::<f64>().ok())
        .filter(|v| v.is_finite())
}

/// Counts are coerced the way the exports were cleaned: anything non-numeric
/// or negative is 0.
fn parse_count(value: Option<&str>) -> u64 {
    match parse_number(value) {
        Some(v) if v >= 0.0 => v.round() as u64,
        other => {
            debug!(value = ?value, parsed = ?other, "Coercing count to 0");
            0
        }
    }
}
