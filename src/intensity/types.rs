//! Data types produced by the intensity pipeline.

use crate::fuel::FuelType;
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::collections::BTreeMap;

/// Key of the pooled aggregate in a serialized [`IntensityTable`].
pub const OVERALL_KEY: &str = "overall";

/// Weighted energy intensity for one fuel type, or for all of them pooled.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct FuelTypeAggregate {
    /// UPT-share-weighted mean, in watt-hours per passenger-kilometer.
    pub wh_per_km: f64,
    /// Share of matched ridership this aggregate covers, in [0, 1].
    pub weight: f64,
}

/// Intensities by fuel type plus the pooled `overall` aggregate.
///
/// Serializes as a flat map keyed by lowercase fuel name, with the reserved
/// `"overall"` key last.
#[derive(Debug, Clone, PartialEq)]
pub struct IntensityTable {
    pub by_fuel: BTreeMap<FuelType, FuelTypeAggregate>,
    pub overall: FuelTypeAggregate,
}

impl IntensityTable {
    pub fn fuel(&self, fuel_type: FuelType) -> Option<&FuelTypeAggregate> {
        self.by_fuel.get(&fuel_type)
    }

    /// Looks up an aggregate by its serialized key, `"overall"` included.
    pub fn get(&self, key: &str) -> Option<&FuelTypeAggregate> {
        if key == OVERALL_KEY {
            return Some(&self.overall);
        }
        FuelType::from_name(key).and_then(|f| self.by_fuel.get(&f))
    }

    /// `(key, aggregate)` pairs in serialization order.
    pub fn entries(&self) -> impl Iterator<Item = (&'static str, &FuelTypeAggregate)> {
        self.by_fuel
            .iter()
            .map(|(fuel, agg)| (fuel.as_str(), agg))
            .chain(std::iter::once((OVERALL_KEY, &self.overall)))
    }
}

impl Serialize for IntensityTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.by_fuel.len() + 1))?;
        for (key, aggregate) in self.entries() {
            map.serialize_entry(key, aggregate)?;
        }
        map.end()
    }
}

/// Area and mode constraints applied to one aggregation attempt.
///
/// Empty strings and empty mode lists mean "unconstrained" and are normalized
/// to `None` on construction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Constraints {
    pub area_code: Option<String>,
    pub modes: Option<Vec<String>>,
}

impl Constraints {
    pub fn new(area_code: Option<String>, modes: Option<Vec<String>>) -> Self {
        Self {
            area_code: area_code.filter(|a| !a.is_empty()),
            modes: modes.filter(|m| !m.is_empty()),
        }
    }

    pub fn is_unconstrained(&self) -> bool {
        self.area_code.is_none() && self.modes.is_none()
    }

    pub(crate) fn without_area(&self) -> Self {
        Self {
            area_code: None,
            modes: self.modes.clone(),
        }
    }

    pub(crate) fn without_modes(&self) -> Self {
        Self {
            area_code: self.area_code.clone(),
            modes: None,
        }
    }
}

/// Provenance and resolution of one query.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct QueryMetadata {
    pub data_sources: Vec<String>,
    pub data_source_urls: Vec<String>,
    pub is_provisional: bool,
    pub requested_year: i32,
    /// The year whose data was used.
    pub year: i32,
    pub area_code: Option<String>,
    pub modes: Option<Vec<String>>,
    /// De-duplicated, in the order agencies were first seen.
    pub contributing_agency_ids: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requested_coords: Option<[f64; 2]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requested_postal_code: Option<String>,
}

/// Where a query's area constraint came from, carried into its metadata.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum QueryOrigin {
    #[default]
    AreaCode,
    Coordinates {
        longitude: f64,
        latitude: f64,
    },
    PostalCode(String),
}

/// Result of a single aggregation pass over a dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateOutcome {
    /// `None` when no record contributed; distinct from zero-valued data.
    pub intensities: Option<IntensityTable>,
    pub total_matched_upt: f64,
    pub contributing_agency_ids: Vec<String>,
}

/// A finished query: the table, if any data matched, and its metadata.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct Estimate {
    pub intensities: Option<IntensityTable>,
    pub metadata: QueryMetadata,
}
