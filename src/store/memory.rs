use crate::dataset::YearDataset;
use crate::error::{Error, Result};
use crate::spatial::DecadePolygons;
use crate::store::DatasetStore;
use crate::temporal::resolve_year;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

/// A store whose datasets are already resident, e.g. embedded with `include_bytes!`.
///
/// Besides the async [`DatasetStore`] impl, every operation is available as a
/// plain synchronous method.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    datasets: BTreeMap<i32, Arc<YearDataset>>,
    boundaries: DecadePolygons,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a store from raw dataset documents (plain or gzipped JSON).
    pub fn from_documents<'a, I>(documents: I) -> Result<Self>
    where
        I: IntoIterator<Item = &'a [u8]>,
    {
        documents
            .into_iter()
            .try_fold(Self::new(), |store, bytes| -> Result<Self> {
                Ok(store.with_dataset(YearDataset::from_bytes(bytes)?))
            })
    }

    /// Adds a dataset under the year its metadata reports.
    pub fn with_dataset(mut self, dataset: YearDataset) -> Self {
        self.datasets
            .insert(dataset.metadata.year, Arc::new(dataset));
        self
    }

    pub fn with_boundaries(mut self, boundaries: DecadePolygons) -> Self {
        self.boundaries = boundaries;
        self
    }

    pub fn years(&self) -> Vec<i32> {
        self.datasets.keys().copied().collect()
    }

    /// Synchronous form of [`DatasetStore::load`].
    pub fn load_now(&self, year: i32) -> Result<Arc<YearDataset>> {
        let resolved = resolve_year(year, self.datasets.keys().copied())?;
        debug!(requested_year = year, year = resolved.year, "Serving resident dataset");
        self.datasets
            .get(&resolved.year)
            .cloned()
            .ok_or(Error::YearNotLoaded {
                year: resolved.year,
            })
    }

    /// Synchronous form of [`DatasetStore::area_code_at`].
    pub fn area_code_at_now(&self, year: i32, longitude: f64, latitude: f64) -> Option<String> {
        self.boundaries
            .area_code_at(year, longitude, latitude)
            .map(str::to_string)
    }
}

#[async_trait::async_trait]
impl DatasetStore for InMemoryStore {
    async fn available_years(&self) -> Result<Vec<i32>> {
        Ok(self.years())
    }

    async fn load(&self, year: i32) -> Result<Arc<YearDataset>> {
        self.load_now(year)
    }

    async fn area_code_at(
        &self,
        year: i32,
        longitude: f64,
        latitude: f64,
    ) -> Result<Option<String>> {
        Ok(self.area_code_at_now(year, longitude, latitude))
    }
}
