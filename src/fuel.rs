//! The closed set of fuel types reported by the reference dataset.

use serde::Serialize;
use std::fmt;

/// A fuel type a transit agency reports trips for.
///
/// Declaration order matches the column order of the source dataset and is
/// the order fuel types appear in an [`IntensityTable`](crate::intensity::types::IntensityTable).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FuelType {
    Gasoline,
    Diesel,
    Lpg,
    Cng,
    Hydrogen,
    Electric,
    Other,
}

impl FuelType {
    pub const ALL: [FuelType; 7] = [
        FuelType::Gasoline,
        FuelType::Diesel,
        FuelType::Lpg,
        FuelType::Cng,
        FuelType::Hydrogen,
        FuelType::Electric,
        FuelType::Other,
    ];

    /// Name as it appears in the source dataset's column headers (case-sensitive).
    pub fn source_name(self) -> &'static str {
        match self {
            FuelType::Gasoline => "Gasoline",
            FuelType::Diesel => "Diesel",
            FuelType::Lpg => "LPG",
            FuelType::Cng => "CNG",
            FuelType::Hydrogen => "Hydrogen",
            FuelType::Electric => "Electric",
            FuelType::Other => "Other",
        }
    }

    /// Lowercase name used as a key in output tables.
    pub fn as_str(self) -> &'static str {
        match self {
            FuelType::Gasoline => "gasoline",
            FuelType::Diesel => "diesel",
            FuelType::Lpg => "lpg",
            FuelType::Cng => "cng",
            FuelType::Hydrogen => "hydrogen",
            FuelType::Electric => "electric",
            FuelType::Other => "other",
        }
    }

    /// Record field holding the share of trips using this fuel, e.g. `"Diesel (%)"`.
    pub fn percent_key(self) -> String {
        format!("{} (%)", self.source_name())
    }

    /// Record field holding the energy intensity, e.g. `"Diesel (Wh/pkm)"`.
    pub fn intensity_key(self) -> String {
        format!("{} (Wh/pkm)", self.source_name())
    }

    /// Parses a lowercase output name back into a fuel type.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.as_str() == name)
    }
}

impl fmt::Display for FuelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
