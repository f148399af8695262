//! Error types for the `transit_intensity` crate.
//!
//! Only hard failures live here. A query that matches no records is not an
//! error; it comes back as a `None` table next to its metadata.

/// Errors that can occur while acquiring reference data or resolving a query.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The dataset store does not hold a single year of data.
    #[error("dataset store has no years available")]
    NoYearsAvailable,

    /// The postal-code boundary map has no entry for the decade of the query year.
    #[error("no postal code boundaries for decade {decade}")]
    MissingDecade {
        /// Decade bucket, e.g. `2020`.
        decade: i32,
    },

    /// A postal-code query was made without a postal boundary map.
    #[error("no postal code boundary map configured")]
    PostalMapNotConfigured,

    /// The store resolved a year it then failed to produce.
    #[error("dataset for year {year} is not loaded")]
    YearNotLoaded {
        /// The resolved year.
        year: i32,
    },

    /// A dataset document did not have the expected shape.
    #[error("invalid dataset document: {message}")]
    InvalidDataset {
        /// Description of what went wrong.
        message: String,
    },

    /// A boundary file did not have the expected shape.
    #[error("invalid boundary data: {message}")]
    InvalidBoundaries {
        /// Description of what went wrong.
        message: String,
    },

    /// Reading a local file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// GeoJSON parsing failed.
    #[error("GeoJSON error: {0}")]
    GeoJson(#[from] geojson::Error),

    /// Fetching a remote document failed.
    #[error(transparent)]
    Fetch(#[from] anyhow::Error),
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
