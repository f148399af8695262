use crate::dataset::IntensityRecord;
use crate::fuel::FuelType;
use crate::intensity::types::{AggregateOutcome, Constraints, FuelTypeAggregate, IntensityTable};
use crate::intensity::utility::weighted_mean;
use std::collections::BTreeMap;
use tracing::debug;

/// One fuel type's slice of one agency/mode's ridership.
#[derive(Debug)]
struct Contribution {
    fuel_type: FuelType,
    share_upt: f64,
    wh_per_km: f64,
}

fn matches(record: &IntensityRecord, constraints: &Constraints) -> bool {
    if let Some(modes) = &constraints.modes {
        if !modes.iter().any(|m| *m == record.mode_code) {
            return false;
        }
    }
    if let Some(area_code) = &constraints.area_code {
        if record.area_code.as_deref() != Some(area_code.as_str()) {
            return false;
        }
    }
    true
}

/// Computes UPT-weighted energy intensities over the records matching `constraints`.
///
/// Every contribution is weighted by its share of *all* matched trips, so a
/// fuel type's `weight` is the fraction of matched ridership it carries and
/// the `overall` weight sums to 1.0. A record with zero trips still lists its
/// agency when it reports fuel data, but adds no weight to any fuel type. If
/// every matched record has zero trips there is nothing to weight by and the
/// outcome has no table.
pub fn aggregate(records: &[IntensityRecord], constraints: &Constraints) -> AggregateOutcome {
    let mut total_matched_upt = 0.0;
    let mut contributions = Vec::new();
    let mut contributing_agency_ids: Vec<String> = Vec::new();

    for record in records.iter().filter(|r| matches(r, constraints)) {
        let upt = record.unlinked_passenger_trips;
        total_matched_upt += upt;

        for share in record.contributing_fuels() {
            if !contributing_agency_ids.contains(&record.agency_id) {
                contributing_agency_ids.push(record.agency_id.clone());
            }
            if upt > 0.0 {
                contributions.push(Contribution {
                    fuel_type: share.fuel_type,
                    share_upt: share.percent / 100.0 * upt,
                    wh_per_km: share.wh_per_km,
                });
            }
        }
    }

    if total_matched_upt <= 0.0 || contributions.is_empty() {
        return AggregateOutcome {
            intensities: None,
            total_matched_upt,
            contributing_agency_ids,
        };
    }

    let weights: Vec<f64> = contributions
        .iter()
        .map(|c| c.share_upt / total_matched_upt)
        .collect();

    let mut by_fuel = BTreeMap::new();
    for fuel_type in FuelType::ALL {
        let (values, fuel_weights): (Vec<f64>, Vec<f64>) = contributions
            .iter()
            .zip(&weights)
            .filter(|(c, _)| c.fuel_type == fuel_type)
            .map(|(c, w)| (c.wh_per_km, *w))
            .unzip();
        if values.is_empty() {
            continue;
        }

        debug!(
            fuel_type = %fuel_type,
            ?values,
            weights = ?fuel_weights,
            "Fuel type contributions"
        );
        by_fuel.insert(
            fuel_type,
            FuelTypeAggregate {
                wh_per_km: weighted_mean(&values, &fuel_weights),
                weight: fuel_weights.iter().sum(),
            },
        );
    }

    let values: Vec<f64> = contributions.iter().map(|c| c.wh_per_km).collect();
    let overall = FuelTypeAggregate {
        wh_per_km: weighted_mean(&values, &weights),
        weight: weights.iter().sum(),
    };

    AggregateOutcome {
        intensities: Some(IntensityTable { by_fuel, overall }),
        total_matched_upt,
        contributing_agency_ids,
    }
}
