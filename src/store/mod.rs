//! Reference dataset stores.
//!
//! [`DatasetStore`] is the single seam between the intensity pipeline and
//! wherever the data lives. [`InMemoryStore`] holds resident data and never
//! suspends; [`FileStore`] and [`RemoteStore`] read from disk or HTTP on
//! demand; [`CachedStore`] wraps any of them so each year is loaded once.

mod cached;
mod file;
mod memory;
mod remote;

pub use cached::CachedStore;
pub use file::FileStore;
pub use memory::InMemoryStore;
pub use remote::RemoteStore;

use crate::dataset::YearDataset;
use crate::error::Result;
use std::sync::Arc;

/// File name a year's dataset document is published under.
pub fn dataset_file_name(year: i32) -> String {
    format!("ntd{year}_intensities.json")
}

/// Supplies yearly intensity records and resolves coordinates to area codes.
#[async_trait::async_trait]
pub trait DatasetStore: Send + Sync {
    /// Years the store holds data for.
    async fn available_years(&self) -> Result<Vec<i32>>;

    /// Loads the dataset for `year`, or for the closest available year.
    ///
    /// The returned metadata reports the year actually served. A failure here
    /// is fatal to the query; it is never treated as missing data.
    async fn load(&self, year: i32) -> Result<Arc<YearDataset>>;

    /// Urban area code enclosing the coordinate, using the boundaries in
    /// effect for `year`.
    async fn area_code_at(&self, year: i32, longitude: f64, latitude: f64)
    -> Result<Option<String>>;
}

#[async_trait::async_trait]
impl<T: DatasetStore + ?Sized> DatasetStore for Arc<T> {
    async fn available_years(&self) -> Result<Vec<i32>> {
        (**self).available_years().await
    }

    async fn load(&self, year: i32) -> Result<Arc<YearDataset>> {
        (**self).load(year).await
    }

    async fn area_code_at(
        &self,
        year: i32,
        longitude: f64,
        latitude: f64,
    ) -> Result<Option<String>> {
        (**self).area_code_at(year, longitude, latitude).await
    }
}
