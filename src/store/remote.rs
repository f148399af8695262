use crate::dataset::YearDataset;
use crate::error::Result;
use crate::fetch::{HttpClient, fetch_bytes};
use crate::spatial::DecadePolygons;
use crate::store::{DatasetStore, dataset_file_name};
use crate::temporal::resolve_year;
use std::sync::Arc;
use tracing::info;

/// Fetches dataset documents over HTTP from `{base_url}/ntd{year}_intensities.json`.
///
/// The server is not asked which years it has; they are configured up front.
pub struct RemoteStore<C> {
    client: C,
    base_url: String,
    years: Vec<i32>,
    boundaries: DecadePolygons,
}

impl<C: HttpClient> RemoteStore<C> {
    pub fn new(client: C, base_url: &str, years: Vec<i32>) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            years,
            boundaries: DecadePolygons::default(),
        }
    }

    pub fn with_boundaries(mut self, boundaries: DecadePolygons) -> Self {
        self.boundaries = boundaries;
        self
    }

    /// URL the document for `year` is fetched from.
    pub fn dataset_url(&self, year: i32) -> String {
        format!("{}/{}", self.base_url, dataset_file_name(year))
    }
}

#[async_trait::async_trait]
impl<C: HttpClient> DatasetStore for RemoteStore<C> {
    async fn available_years(&self) -> Result<Vec<i32>> {
        Ok(self.years.clone())
    }

    #[tracing::instrument(skip(self), fields(base_url = %self.base_url))]
    async fn load(&self, year: i32) -> Result<Arc<YearDataset>> {
        let resolved = resolve_year(year, self.years.iter().copied())?;
        let url = self.dataset_url(resolved.year);

        let bytes = fetch_bytes(&self.client, &url).await?;
        let dataset = YearDataset::from_bytes(&bytes)?;
        info!(
            url = %url,
            bytes = bytes.len(),
            records = dataset.records.len(),
            "Dataset fetched"
        );
        Ok(Arc::new(dataset))
    }

    async fn area_code_at(
        &self,
        year: i32,
        longitude: f64,
        latitude: f64,
    ) -> Result<Option<String>> {
        Ok(self
            .boundaries
            .area_code_at(year, longitude, latitude)
            .map(str::to_string))
    }
}
