use crate::dataset::YearDataset;
use crate::error::Result;
use crate::spatial::DecadePolygons;
use crate::store::{DatasetStore, dataset_file_name};
use crate::temporal::resolve_year;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

const FILE_PREFIX: &str = "ntd";
const FILE_SUFFIX: &str = "_intensities.json";
const GZIP_SUFFIX: &str = "_intensities.json.gz";

/// Reads `ntd{year}_intensities.json` (or `.json.gz`) documents from a directory.
///
/// The directory is rescanned on every call, so files added while the process
/// runs are picked up. Wrap in a [`CachedStore`](crate::store::CachedStore) to
/// avoid re-reading large documents.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
    boundaries: DecadePolygons,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            boundaries: DecadePolygons::default(),
        }
    }

    pub fn with_boundaries(mut self, boundaries: DecadePolygons) -> Self {
        self.boundaries = boundaries;
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    async fn path_for(&self, year: i32) -> Result<PathBuf> {
        let plain = self.dir.join(dataset_file_name(year));
        if tokio::fs::try_exists(&plain).await? {
            return Ok(plain);
        }
        Ok(self.dir.join(format!("{}.gz", dataset_file_name(year))))
    }
}

fn year_from_file_name(name: &str) -> Option<i32> {
    let rest = name.strip_prefix(FILE_PREFIX)?;
    let year = rest
        .strip_suffix(FILE_SUFFIX)
        .or_else(|| rest.strip_suffix(GZIP_SUFFIX))?;
    year.parse().ok()
}

#[async_trait::async_trait]
impl DatasetStore for FileStore {
    async fn available_years(&self) -> Result<Vec<i32>> {
        let mut years = Vec::new();
        let mut entries = tokio::fs::read_dir(&self.dir).await?;

        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_file() {
                continue;
            }
            if let Some(year) = entry.file_name().to_str().and_then(year_from_file_name) {
                years.push(year);
            }
        }

        years.sort_unstable();
        years.dedup();
        debug!(dir = %self.dir.display(), ?years, "Scanned dataset directory");
        Ok(years)
    }

    #[tracing::instrument(skip(self), fields(dir = %self.dir.display()))]
    async fn load(&self, year: i32) -> Result<Arc<YearDataset>> {
        let resolved = resolve_year(year, self.available_years().await?)?;
        let path = self.path_for(resolved.year).await?;

        let bytes = tokio::fs::read(&path).await?;
        let dataset = YearDataset::from_bytes(&bytes)?;
        info!(
            path = %path.display(),
            records = dataset.records.len(),
            "Dataset loaded"
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use std::env;
    use std::fs;

    fn temp_dir(name: &str) -> PathBuf {
        let dir = env::temp_dir().join(name);
        let _ = fs::remove_dir_all(&dir); // clean up any prior run
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_year_from_file_name() {
        assert_eq!(year_from_file_name("ntd2022_intensities.json"), Some(2022));
        assert_eq!(year_from_file_name("ntd2019_intensities.json.gz"), Some(2019));
        assert_eq!(year_from_file_name("egrid2022_intensities.json"), None);
        assert_eq!(year_from_file_name("ntdXXXX_intensities.json"), None);
    }

    #[tokio::test]
    async fn test_scan_and_load() {
        let dir = temp_dir("transit_intensity_file_store");
        fs::write(
            dir.join("ntd2021_intensities.json"),
            r#"{"records": [], "metadata": {"year": 2021, "data_source_urls": ["u"]}}"#,
        )
        .unwrap();
        fs::write(dir.join("notes.txt"), "ignored").unwrap();

        let store = FileStore::new(&dir);
        assert_eq!(store.available_years().await.unwrap(), vec![2021]);

        let dataset = store.load(2023).await.unwrap();
        assert_eq!(dataset.metadata.year, 2021);
        assert_eq!(dataset.metadata.data_source_urls, vec!["u"]);

        fs::remove_dir_all(&dir).unwrap();
    }

    #[tokio::test]
    async fn test_empty_directory_is_misconfigured() {
        let dir = temp_dir("transit_intensity_file_store_empty");
        let err = FileStore::new(&dir).load(2022).await.unwrap_err();
        assert!(matches!(err, Error::NoYearsAvailable));
        fs::remove_dir_all(&dir).unwrap();
    }
}
