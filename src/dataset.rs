//! Reference dataset records and the JSON interchange format they arrive in.
//!
//! A dataset document covers one year:
//!
//! ```json
//! {
//!   "records": [
//!     {"NTD ID": "Agency A", "UACE Code": "99999", "Mode": "MB",
//!      "Diesel (%)": 100, "Diesel (Wh/pkm)": 600,
//!      "Unlinked Passenger Trips": 600}
//!   ],
//!   "metadata": {"year": 9999, "data_source_urls": ["https://fake.url"]}
//! }
//! ```
//!
//! Documents may be gzip-compressed; [`YearDataset::from_bytes`] detects that
//! from the magic bytes.

use crate::error::{Error, Result};
use crate::fuel::FuelType;
use flate2::read::GzDecoder;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::io::Read;

const AGENCY_KEY: &str = "NTD ID";
const AREA_KEY: &str = "UACE Code";
const MODE_KEY: &str = "Mode";
const UPT_KEY: &str = "Unlinked Passenger Trips";

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Share of an agency/mode's trips attributable to one fuel type.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FuelShare {
    pub fuel_type: FuelType,
    /// Percentage of trips, 0-100.
    pub percent: f64,
    /// Energy intensity in watt-hours per passenger-kilometer.
    pub wh_per_km: f64,
}

impl FuelShare {
    /// Only shares with a non-zero percentage and intensity take part in aggregation.
    pub fn contributes(&self) -> bool {
        self.percent != 0.0 && self.wh_per_km != 0.0
    }
}

/// One agency/mode observation for a year.
#[derive(Debug, Clone, PartialEq)]
pub struct IntensityRecord {
    pub agency_id: String,
    pub area_code: Option<String>,
    pub mode_code: String,
    pub unlinked_passenger_trips: f64,
    pub fuels: Vec<FuelShare>,
}

impl IntensityRecord {
    pub fn new(
        agency_id: impl Into<String>,
        area_code: Option<&str>,
        mode_code: impl Into<String>,
        unlinked_passenger_trips: f64,
    ) -> Self {
        Self {
            agency_id: agency_id.into(),
            area_code: area_code.map(str::to_string),
            mode_code: mode_code.into(),
            unlinked_passenger_trips,
            fuels: Vec::new(),
        }
    }

    /// Adds a fuel share to the record.
    pub fn with_fuel(mut self, fuel_type: FuelType, percent: f64, wh_per_km: f64) -> Self {
        self.fuels.push(FuelShare {
            fuel_type,
            percent,
            wh_per_km,
        });
        self
    }

    /// Fuel shares that take part in aggregation.
    pub fn contributing_fuels(&self) -> impl Iterator<Item = &FuelShare> {
        self.fuels.iter().filter(|f| f.contributes())
    }

    fn from_json(entry: &Map<String, Value>) -> Result<Self> {
        let agency_id = string_field(entry, AGENCY_KEY).ok_or_else(|| Error::InvalidDataset {
            message: format!("record without \"{AGENCY_KEY}\""),
        })?;
        let mode_code = string_field(entry, MODE_KEY).ok_or_else(|| Error::InvalidDataset {
            message: format!("record for agency {agency_id} without \"{MODE_KEY}\""),
        })?;
        let upt = number_field(entry, UPT_KEY).unwrap_or(0.0);
        if upt < 0.0 {
            return Err(Error::InvalidDataset {
                message: format!("negative trip count for agency {agency_id} mode {mode_code}"),
            });
        }

        let fuels = FuelType::ALL
            .into_iter()
            .filter_map(|fuel_type| {
                let percent = number_field(entry, &fuel_type.percent_key())?;
                let wh_per_km = number_field(entry, &fuel_type.intensity_key())?;
                Some(FuelShare {
                    fuel_type,
                    percent,
                    wh_per_km,
                })
            })
            .collect();

        Ok(Self {
            agency_id,
            area_code: string_field(entry, AREA_KEY),
            mode_code,
            unlinked_passenger_trips: upt,
            fuels,
        })
    }
}

/// Provenance of a loaded dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetMetadata {
    /// The year the data actually describes.
    pub year: i32,
    pub data_source_urls: Vec<String>,
}

impl DatasetMetadata {
    /// Source identifier reported in query metadata, e.g. `ntd2022`.
    pub fn source_id(&self) -> String {
        format!("ntd{}", self.year)
    }
}

/// All records for one year, plus where they came from.
#[derive(Debug, Clone, PartialEq)]
pub struct YearDataset {
    pub records: Vec<IntensityRecord>,
    pub metadata: DatasetMetadata,
}

#[derive(Deserialize)]
struct RawDocument {
    records: Vec<Map<String, Value>>,
    metadata: RawMetadata,
}

#[derive(Deserialize)]
struct RawMetadata {
    year: Value,
    #[serde(default)]
    data_source_urls: Vec<String>,
}

impl YearDataset {
    pub fn new(year: i32, data_source_urls: Vec<String>, records: Vec<IntensityRecord>) -> Self {
        Self {
            records,
            metadata: DatasetMetadata {
                year,
                data_source_urls,
            },
        }
    }

    /// Parses a dataset document, decompressing it first if it is gzipped.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.starts_with(&GZIP_MAGIC) {
            let mut json = Vec::new();
            GzDecoder::new(bytes).read_to_end(&mut json)?;
            Self::from_json_slice(&json)
        } else {
            Self::from_json_slice(bytes)
        }
    }

    /// Parses an uncompressed dataset document.
    pub fn from_json_slice(bytes: &[u8]) -> Result<Self> {
        let raw: RawDocument = serde_json::from_slice(bytes)?;
        let year = year_value(&raw.metadata.year).ok_or_else(|| Error::InvalidDataset {
            message: format!("metadata year {} is not a year", raw.metadata.year),
        })?;
        let records = raw
            .records
            .iter()
            .map(IntensityRecord::from_json)
            .collect::<Result<Vec<_>>>()?;

        Ok(Self::new(year, raw.metadata.data_source_urls, records))
    }
}

fn string_field(entry: &Map<String, Value>, key: &str) -> Option<String> {
    match entry.get(key)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn number_field(entry: &Map<String, Value>, key: &str) -> Option<f64> {
    match entry.get(key)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn year_value(value: &Value) -> Option<i32> {
    match value {
        Value::Number(n) => n.as_i64().and_then(|y| i32::try_from(y).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::Compression;
    use flate2::write::GzEncoder;
    use std::io::Write;

    const DOC: &str = r#"{
        "records": [
            {"NTD ID": "Agency B", "UACE Code": "99999", "Mode": "MB",
             "Diesel (Wh/pkm)": 400, "Diesel (%)": 80,
             "Electric (Wh/pkm)": 300, "Electric (%)": 20,
             "Unlinked Passenger Trips": 250},
            {"NTD ID": 40001, "UACE Code": null, "Mode": "DR",
             "Gasoline (%)": 100, "Unlinked Passenger Trips": 12}
        ],
        "metadata": {"year": "2022", "data_source_urls": ["https://fake.url"]}
    }"#;

    #[test]
    fn test_parse_document() {
        let dataset = YearDataset::from_json_slice(DOC.as_bytes()).unwrap();

        assert_eq!(dataset.metadata.year, 2022);
        assert_eq!(dataset.metadata.source_id(), "ntd2022");
        assert_eq!(dataset.records.len(), 2);

        let b = &dataset.records[0];
        assert_eq!(b.area_code.as_deref(), Some("99999"));
        assert_eq!(b.unlinked_passenger_trips, 250.0);
        assert_eq!(b.fuels.len(), 2);
        assert_eq!(b.fuels[0].fuel_type, FuelType::Diesel);
        assert_eq!(b.fuels[1].fuel_type, FuelType::Electric);
    }

    #[test]
    fn test_numeric_ids_and_null_area() {
        let dataset = YearDataset::from_json_slice(DOC.as_bytes()).unwrap();
        let rural = &dataset.records[1];

        assert_eq!(rural.agency_id, "40001");
        assert_eq!(rural.area_code, None);
        // a percentage without an intensity is not a fuel share
        assert!(rural.fuels.is_empty());
    }

    #[test]
    fn test_gzip_document() {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(DOC.as_bytes()).unwrap();
        let compressed = encoder.finish().unwrap();

        let dataset = YearDataset::from_bytes(&compressed).unwrap();
        assert_eq!(dataset.records.len(), 2);
    }

    #[test]
    fn test_record_without_mode_is_rejected() {
        let doc = r#"{"records": [{"NTD ID": "A"}], "metadata": {"year": 2022}}"#;
        let err = YearDataset::from_json_slice(doc.as_bytes()).unwrap_err();
        assert!(matches!(err, Error::InvalidDataset { .. }));
    }

    #[test]
    fn test_zero_shares_do_not_contribute() {
        let record = IntensityRecord::new("A", None, "MB", 10.0)
            .with_fuel(FuelType::Diesel, 0.0, 500.0)
            .with_fuel(FuelType::Cng, 50.0, 0.0)
            .with_fuel(FuelType::Electric, 50.0, 200.0);

        let contributing: Vec<_> = record.contributing_fuels().map(|f| f.fuel_type).collect();
        assert_eq!(contributing, vec![FuelType::Electric]);
    }
}
