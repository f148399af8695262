//! Retry policy for queries that match no records.
//!
//! A failed attempt first drops the area constraint, then the mode
//! constraint, then gives up:
//!
//! ```text
//! (area, modes) -> (none, modes) -> (none, none) -> no data
//! ```
//!
//! Each step only relaxes what the previous attempt still had, so a query
//! without an area code goes straight to dropping its modes. Dropping the
//! modes does not restore the requested area: once the area is gone it stays
//! gone, and an `(area, none)` attempt is never made.

use crate::dataset::YearDataset;
use crate::intensity::aggregate::aggregate;
use crate::intensity::types::{Constraints, Estimate, QueryMetadata, QueryOrigin};
use tracing::{error, info};

/// The constraints to try after `constraints` matched nothing, if any remain.
pub fn relax(constraints: &Constraints) -> Option<Constraints> {
    if constraints.area_code.is_some() {
        Some(constraints.without_area())
    } else if constraints.modes.is_some() {
        Some(constraints.without_modes())
    } else {
        None
    }
}

/// Every attempt the fallback sequence can make for `requested`, in order.
pub fn attempts(requested: Constraints) -> impl Iterator<Item = Constraints> {
    std::iter::successors(Some(requested), relax)
}

/// Runs the fallback sequence against an already acquired dataset.
///
/// Each attempt rescans the full record set and builds its own metadata. The
/// first attempt that yields data is returned. If none does, the result has no
/// table and its metadata describes the original request with no contributing
/// agencies.
pub fn estimate(
    dataset: &YearDataset,
    requested_year: i32,
    requested: &Constraints,
    origin: &QueryOrigin,
) -> Estimate {
    for constraints in attempts(requested.clone()) {
        info!(
            year = requested_year,
            area_code = ?constraints.area_code,
            modes = ?constraints.modes,
            "Aggregating transit intensities"
        );

        let outcome = aggregate(&dataset.records, &constraints);
        if let Some(table) = outcome.intensities {
            let metadata = metadata_for(
                dataset,
                requested_year,
                &constraints,
                origin,
                outcome.contributing_agency_ids,
            );
            info!(
                overall_wh_per_km = table.overall.wh_per_km,
                fuel_types = table.by_fuel.len(),
                agencies = metadata.contributing_agency_ids.len(),
                total_matched_upt = outcome.total_matched_upt,
                "Intensities computed"
            );
            return Estimate {
                intensities: Some(table),
                metadata,
            };
        }

        info!(
            year = requested_year,
            area_code = ?constraints.area_code,
            modes = ?constraints.modes,
            "Insufficient data; relaxing constraints"
        );
    }

    error!(
        year = requested_year,
        "No data available for any area code or modes"
    );
    Estimate {
        intensities: None,
        metadata: metadata_for(dataset, requested_year, requested, origin, Vec::new()),
    }
}

fn metadata_for(
    dataset: &YearDataset,
    requested_year: i32,
    constraints: &Constraints,
    origin: &QueryOrigin,
    contributing_agency_ids: Vec<String>,
) -> QueryMetadata {
    let (requested_coords, requested_postal_code) = match origin {
        QueryOrigin::AreaCode => (None, None),
        QueryOrigin::Coordinates {
            longitude,
            latitude,
        } => (Some([*longitude, *latitude]), None),
        QueryOrigin::PostalCode(code) => (None, Some(code.clone())),
    };

    QueryMetadata {
        data_sources: vec![dataset.metadata.source_id()],
        data_source_urls: dataset.metadata.data_source_urls.clone(),
        is_provisional: dataset.metadata.year != requested_year,
        requested_year,
        year: dataset.metadata.year,
        area_code: constraints.area_code.clone(),
        modes: constraints.modes.clone(),
        contributing_agency_ids,
        requested_coords,
        requested_postal_code,
    }
}
