//! Query entry points over a [`DatasetStore`].

use crate::error::{Error, Result};
use crate::intensity::fallback;
use crate::intensity::types::{Constraints, Estimate, QueryOrigin};
use crate::spatial::PostalBoundaryMap;
use crate::store::{DatasetStore, InMemoryStore};
use std::sync::Arc;
use tracing::info;

/// Estimates transit energy intensities by year, area and mode.
///
/// The store is only touched to acquire the year's dataset (and, for
/// coordinate queries, to resolve the area code). Aggregation and fallback run
/// synchronously over the acquired dataset, so a resident store and a remote
/// one produce identical results.
pub struct TransitIntensities<S> {
    store: S,
    postal_map: Option<Arc<PostalBoundaryMap>>,
}

impl<S> TransitIntensities<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            postal_map: None,
        }
    }

    pub fn with_postal_map(mut self, postal_map: Arc<PostalBoundaryMap>) -> Self {
        self.postal_map = Some(postal_map);
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    fn postal_area_code(&self, postal_code: &str, year: i32) -> Result<Option<String>> {
        let map = self
            .postal_map
            .as_ref()
            .ok_or(Error::PostalMapNotConfigured)?;
        Ok(map.area_code_for(postal_code, year)?.map(str::to_string))
    }
}

impl<S: DatasetStore> TransitIntensities<S> {
    /// Intensities for `year` in the urban area `area_code` across `modes`.
    ///
    /// `None` (or empty) constraints are not applied. When nothing matches,
    /// the area and then the modes are dropped; see [`fallback`].
    #[tracing::instrument(skip(self))]
    pub async fn get_intensities(
        &self,
        year: i32,
        area_code: Option<String>,
        modes: Option<Vec<String>>,
    ) -> Result<Estimate> {
        self.run(year, Constraints::new(area_code, modes), QueryOrigin::AreaCode)
            .await
    }

    /// Intensities for the urban area enclosing a coordinate.
    ///
    /// A coordinate outside every known area queries without an area constraint.
    #[tracing::instrument(skip(self))]
    pub async fn get_intensities_by_coordinates(
        &self,
        year: i32,
        longitude: f64,
        latitude: f64,
        modes: Option<Vec<String>>,
    ) -> Result<Estimate> {
        let area_code = self.store.area_code_at(year, longitude, latitude).await?;
        info!(?area_code, "Resolved coordinates to area code");
        let origin = QueryOrigin::Coordinates {
            longitude,
            latitude,
        };
        self.run(year, Constraints::new(area_code, modes), origin)
            .await
    }

    /// Intensities for the urban area containing a postal code.
    ///
    /// An unknown postal code queries without an area constraint; a decade
    /// missing from the boundary map is an error.
    #[tracing::instrument(skip(self))]
    pub async fn get_intensities_by_postal_code(
        &self,
        year: i32,
        postal_code: &str,
        modes: Option<Vec<String>>,
    ) -> Result<Estimate> {
        let area_code = self.postal_area_code(postal_code, year)?;
        let origin = QueryOrigin::PostalCode(postal_code.to_string());
        self.run(year, Constraints::new(area_code, modes), origin)
            .await
    }

    async fn run(
        &self,
        year: i32,
        constraints: Constraints,
        origin: QueryOrigin,
    ) -> Result<Estimate> {
        let dataset = self.store.load(year).await?;
        Ok(fallback::estimate(&dataset, year, &constraints, &origin))
    }
}

/// Synchronous entry points for resident data; these never suspend.
impl TransitIntensities<InMemoryStore> {
    pub fn get_intensities_sync(
        &self,
        year: i32,
        area_code: Option<String>,
        modes: Option<Vec<String>>,
    ) -> Result<Estimate> {
        self.run_sync(year, Constraints::new(area_code, modes), QueryOrigin::AreaCode)
    }

    pub fn get_intensities_by_coordinates_sync(
        &self,
        year: i32,
        longitude: f64,
        latitude: f64,
        modes: Option<Vec<String>>,
    ) -> Result<Estimate> {
        let area_code = self.store.area_code_at_now(year, longitude, latitude);
        let origin = QueryOrigin::Coordinates {
            longitude,
            latitude,
        };
        self.run_sync(year, Constraints::new(area_code, modes), origin)
    }

    pub fn get_intensities_by_postal_code_sync(
        &self,
        year: i32,
        postal_code: &str,
        modes: Option<Vec<String>>,
    ) -> Result<Estimate> {
        let area_code = self.postal_area_code(postal_code, year)?;
        let origin = QueryOrigin::PostalCode(postal_code.to_string());
        self.run_sync(year, Constraints::new(area_code, modes), origin)
    }

    fn run_sync(&self, year: i32, constraints: Constraints, origin: QueryOrigin) -> Result<Estimate> {
        let dataset = self.store.load_now(year)?;
        Ok(fallback::estimate(&dataset, year, &constraints, &origin))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{IntensityRecord, YearDataset};
    use crate::fuel::FuelType;
    use crate::spatial::{AreaPolygons, DecadePolygons};
    use geo::polygon;

    fn store() -> InMemoryStore {
        let square = polygon![
            (x: -85.0, y: 38.0), (x: -84.0, y: 38.0), (x: -84.0, y: 40.0), (x: -85.0, y: 40.0)
        ];
        InMemoryStore::new()
            .with_dataset(YearDataset::new(
                2022,
                vec![],
                vec![
                    IntensityRecord::new("Metro", Some("16885"), "MB", 100.0).with_fuel(
                        FuelType::Diesel,
                        100.0,
                        1000.0,
                    ),
                    IntensityRecord::new("Elsewhere", Some("11111"), "MB", 100.0).with_fuel(
                        FuelType::Diesel,
                        100.0,
                        500.0,
                    ),
                ],
            ))
            .with_boundaries(
                DecadePolygons::default()
                    .with_decade(2020, AreaPolygons::default().with_area("16885", square)),
            )
    }

    fn postal_map() -> Arc<PostalBoundaryMap> {
        Arc::new(PostalBoundaryMap::default().with_area(2020, "16885", ["45221"]))
    }

    #[test]
    fn test_sync_coordinates() {
        let estimator = TransitIntensities::new(store());
        let estimate = estimator
            .get_intensities_by_coordinates_sync(2022, -84.5, 39.1, None)
            .unwrap();

        assert_eq!(estimate.metadata.area_code.as_deref(), Some("16885"));
        assert_eq!(estimate.intensities.unwrap().overall.wh_per_km, 1000.0);
    }

    #[test]
    fn test_sync_coordinates_outside_every_area() {
        let estimator = TransitIntensities::new(store());
        let estimate = estimator
            .get_intensities_by_coordinates_sync(2022, 10.0, 10.0, None)
            .unwrap();

        assert_eq!(estimate.metadata.area_code, None);
        assert_eq!(estimate.metadata.contributing_agency_ids.len(), 2);
        assert_eq!(estimate.metadata.requested_coords, Some([10.0, 10.0]));
    }

    #[test]
    fn test_sync_postal_code() {
        let estimator = TransitIntensities::new(store()).with_postal_map(postal_map());
        let estimate = estimator
            .get_intensities_by_postal_code_sync(2022, "45221", None)
            .unwrap();

        assert_eq!(estimate.metadata.area_code.as_deref(), Some("16885"));
        assert_eq!(estimate.metadata.requested_postal_code.as_deref(), Some("45221"));
    }

    #[test]
    fn test_postal_code_without_map() {
        let estimator = TransitIntensities::new(store());
        let err = estimator
            .get_intensities_by_postal_code_sync(2022, "45221", None)
            .unwrap_err();
        assert!(matches!(err, Error::PostalMapNotConfigured));
    }

    #[test]
    fn test_postal_code_missing_decade() {
        let estimator = TransitIntensities::new(store()).with_postal_map(postal_map());
        let err = estimator
            .get_intensities_by_postal_code_sync(2011, "45221", None)
            .unwrap_err();
        assert!(matches!(err, Error::MissingDecade { decade: 2010 }));
    }

    #[tokio::test]
    async fn test_async_matches_sync() {
        let estimator = TransitIntensities::new(store()).with_postal_map(postal_map());
        let modes = Some(vec!["MB".to_string()]);

        let sync = estimator
            .get_intensities_sync(2023, Some("16885".to_string()), modes.clone())
            .unwrap();
        let asynchronous = estimator
            .get_intensities(2023, Some("16885".to_string()), modes)
            .await
            .unwrap();

        assert_eq!(sync, asynchronous);
        assert!(asynchronous.metadata.is_provisional);
    }
}
