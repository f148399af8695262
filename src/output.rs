//! Output formatting and persistence for estimates.
//!
//! Supports pretty-printing, JSON serialization, and CSV append.

use anyhow::Result;
use chrono::{DateTime, Utc};
use csv::WriterBuilder;
use serde::Serialize;
use std::fs::OpenOptions;
use std::path::Path;
use tracing::{debug, info};

use crate::intensity::Estimate;

/// One fuel type's line of an estimate, as written to CSV.
#[derive(Debug, Serialize)]
pub struct IntensityRow {
    pub computed_at: DateTime<Utc>,
    pub requested_year: i32,
    pub year: i32,
    pub is_provisional: bool,
    pub area_code: Option<String>,
    /// Mode codes joined with `;`.
    pub modes: Option<String>,
    pub fuel_type: String,
    pub wh_per_km: f64,
    pub weight: f64,
    pub agencies: usize,
}

impl IntensityRow {
    /// Flattens an estimate into one row per fuel type plus `overall`.
    pub fn from_estimate(estimate: &Estimate) -> Vec<Self> {
        let Some(table) = &estimate.intensities else {
            return Vec::new();
        };
        let metadata = &estimate.metadata;
        let computed_at = Utc::now();

        table
            .entries()
            .map(|(fuel_type, aggregate)| IntensityRow {
                computed_at,
                requested_year: metadata.requested_year,
                year: metadata.year,
                is_provisional: metadata.is_provisional,
                area_code: metadata.area_code.clone(),
                modes: metadata.modes.as_ref().map(|m| m.join(";")),
                fuel_type: fuel_type.to_string(),
                wh_per_km: aggregate.wh_per_km,
                weight: aggregate.weight,
                agencies: metadata.contributing_agency_ids.len(),
            })
            .collect()
    }
}

/// Logs an estimate using Rust's debug pretty-print format.
pub fn print_pretty(estimate: &Estimate) {
    debug!("{:#?}", estimate);
}

/// Logs an estimate as pretty-printed JSON.
pub fn print_json(estimate: &Estimate) -> Result<()> {
    info!("{}", serde_json::to_string_pretty(estimate)?);
    Ok(())
}

/// Appends an estimate's rows to a CSV file.
///
/// Creates the file with headers if it does not already exist. An estimate
/// without data writes nothing.
pub fn append_record(path: &str, estimate: &Estimate) -> Result<()> {
    let rows = IntensityRow::from_estimate(estimate);
    if rows.is_empty() {
        debug!(path, "No intensities to append");
        return Ok(());
    }

    let file_exists = Path::new(path).exists();
    debug!(path, file_exists, rows = rows.len(), "Appending CSV records");

    let file = OpenOptions::new().append(true).create(true).open(path)?;

    let mut writer = WriterBuilder::new()
        .has_headers(!file_exists) // IMPORTANT when appending
        .from_writer(file);

    for row in &rows {
        writer.serialize(row)?;
    }
    writer.flush()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fuel::FuelType;
    use crate::intensity::types::{FuelTypeAggregate, IntensityTable, QueryMetadata};
    use std::collections::BTreeMap;
    use std::env;
    use std::fs;

    fn temp_path(name: &str) -> String {
        format!("{}/{}", env::temp_dir().display(), name)
    }

    fn estimate(with_data: bool) -> Estimate {
        let aggregate = FuelTypeAggregate {
            wh_per_km: 700.0,
            weight: 1.0,
        };
        Estimate {
            intensities: with_data.then(|| IntensityTable {
                by_fuel: BTreeMap::from([(FuelType::Diesel, aggregate)]),
                overall: aggregate,
            }),
            metadata: QueryMetadata {
                data_sources: vec!["ntd2022".to_string()],
                data_source_urls: vec![],
                is_provisional: false,
                requested_year: 2022,
                year: 2022,
                area_code: Some("16264".to_string()),
                modes: Some(vec!["MB".to_string(), "RB".to_string()]),
                contributing_agency_ids: vec!["A".to_string()],
                requested_coords: None,
                requested_postal_code: None,
            },
        }
    }

    #[test]
    fn test_print_pretty_does_not_panic() {
        print_pretty(&estimate(true));
    }

    #[test]
    fn test_print_json_does_not_panic() {
        print_json(&estimate(false)).unwrap();
    }

    #[test]
    fn test_rows_per_fuel_type() {
        let rows = IntensityRow::from_estimate(&estimate(true));

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].fuel_type, "diesel");
        assert_eq!(rows[1].fuel_type, "overall");
        assert_eq!(rows[0].modes.as_deref(), Some("MB;RB"));
    }

    #[test]
    fn test_append_record_writes_header_once() {
        let path = temp_path("transit_intensity_test_header.csv");
        let _ = fs::remove_file(&path);

        append_record(&path, &estimate(true)).unwrap();
        append_record(&path, &estimate(true)).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let header_count = content.lines().filter(|l| l.contains("computed_at")).count();
        assert_eq!(header_count, 1);
        // 1 header + 2 estimates of 2 rows each
        assert_eq!(content.lines().count(), 5);

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_append_record_skips_empty_estimate() {
        let path = temp_path("transit_intensity_test_empty.csv");
        let _ = fs::remove_file(&path);

        append_record(&path, &estimate(false)).unwrap();
        assert!(!Path::new(&path).exists());
    }
}
