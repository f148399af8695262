//! Spatial resolution: postal codes and coordinates to urban area codes.
//!
//! [`PostalBoundaryMap`] answers postal-code lookups. [`AreaPolygons`] backs
//! the dataset stores' coordinate lookups. Both are bucketed by decade, since
//! urban area boundaries are redrawn with each census.

mod polygons;
mod postal;

pub use polygons::{AreaPolygons, DecadePolygons};
pub use postal::PostalBoundaryMap;

/// Rounds a year down to its decade bucket, e.g. 2022 -> 2020.
///
/// Years whose bucket falls below `i32::MIN` clamp to it.
pub fn decade_of(year: i32) -> i32 {
    year.div_euclid(10).saturating_mul(10)
}
