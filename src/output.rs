//! Output formatting and persistence for the unified summary.
//!
//! Supports pretty-printing, JSON serialization, and CSV export (optionally
//! gzip-compressed).

use anyhow::{Context, Result};
use csv::WriterBuilder;
use flate2::Compression;
use flate2::write::GzEncoder;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use tracing::{debug, info};

use crate::unify::types::UnifiedSummaryRecord;

/// Column names of the summary relation, in order.
pub const SUMMARY_COLUMNS: [&str; 10] = [
    "Location",
    "Duration",
    "Total counts",
    "Source type",
    "Longitude",
    "Latitude",
    "Source",
    "Facility type",
    "Facility group",
    "Mode",
];

/// Logs summary rows using Rust's debug pretty-print format.
pub fn print_pretty(records: &[UnifiedSummaryRecord]) {
    for record in records {
        debug!("{:#?}", record);
    }
}

/// Serializes summary rows as pretty-printed JSON.
pub fn to_json(records: &[UnifiedSummaryRecord]) -> Result<String> {
    Ok(serde_json::to_string_pretty(records)?)
}

/// Writes the summary relation as CSV to `path`, replacing any existing file.
///
/// The header row is always written, so an empty summary still carries its
/// column names. With `gzip` the file is gzip-compressed.
pub fn write_summary(path: &str, records: &[UnifiedSummaryRecord], gzip: bool) -> Result<()> {
    if let Some(parent) = Path::new(path).parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }

    let file = File::create(path).with_context(|| format!("failed to create {path}"))?;

    if gzip {
        let mut encoder = GzEncoder::new(file, Compression::default());
        write_csv(&mut encoder, records)?;
        encoder.finish()?.flush()?;
    } else {
        let mut file = file;
        write_csv(&mut file, records)?;
    }

    info!(path, rows = records.len(), gzip, "Summary written");
    Ok(())
}

fn write_csv<W: Write>(out: W, records: &[UnifiedSummaryRecord]) -> Result<()> {
    let mut writer = WriterBuilder::new().has_headers(false).from_writer(out);

    writer.write_record(SUMMARY_COLUMNS)?;
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::unify::types::{FacilityGroup, FacilityType, Mode, SourceType};
    use flate2::read::GzDecoder;
    use std::env;
    use std::fs;
    use std::io::Read;

    fn temp_path(name: &str) -> String {
        format!("{}/{}", env::temp_dir().display(), name)
    }

    fn record() -> UnifiedSummaryRecord {
        UnifiedSummaryRecord {
            location: "Main St & 5th Ave".to_string(),
            duration: "0-15h".to_string(),
            total_counts: 1200,
            source_type: SourceType::Modeled,
            longitude: Some(-89.38),
            latitude: None,
            source_label: "Wisconsin Ped/Bike Count Database".to_string(),
            facility_type: FacilityType::Intersection,
            facility_group: FacilityGroup::OnStreet,
            mode: Mode::Pedestrian,
            observed_hours: 6.0,
            seasons: vec![],
        }
    }

    #[test]
    fn test_print_pretty_does_not_panic() {
        print_pretty(&[record()]);
    }

    #[test]
    fn test_to_json_uses_column_names() {
        let json = to_json(&[record()]).unwrap();
        assert!(json.contains("\"Total counts\": 1200"));
        assert!(json.contains("\"Facility group\": \"On-Street\""));
        assert!(!json.contains("observed_hours"));
    }

    #[test]
    fn test_write_summary_columns_and_rows() {
        let path = temp_path("count_unify_test_summary.csv");
        let _ = fs::remove_file(&path);

        write_summary(&path, &[record(), record()], false).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(
            lines[0],
            "Location,Duration,Total counts,Source type,Longitude,Latitude,Source,Facility type,Facility group,Mode"
        );
        assert_eq!(
            lines[1],
            "Main St & 5th Ave,0-15h,1200,Modeled,-89.38,,Wisconsin Ped/Bike Count Database,Intersection,On-Street,Pedestrian"
        );

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_write_summary_replaces_file() {
        let path = temp_path("count_unify_test_replace.csv");
        let _ = fs::remove_file(&path);

        write_summary(&path, &[record(), record()], false).unwrap();
        write_summary(&path, &[], false).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 1);

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_write_summary_gzip() {
        let path = temp_path("count_unify_test_summary.csv.gz");
        let _ = fs::remove_file(&path);

        write_summary(&path, &[record()], true).unwrap();

        let mut decoded = String::new();
        GzDecoder::new(File::open(&path).unwrap())
            .read_to_string(&mut decoded)
            .unwrap();
        assert!(decoded.starts_with("Location,Duration"));
        assert_eq!(decoded.lines().count(), 2);

        fs::remove_file(&path).unwrap();
    }
}
