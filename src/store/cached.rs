use crate::dataset::YearDataset;
use crate::error::Result;
use crate::store::DatasetStore;
use crate::temporal::resolve_year;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::OnceCell;
use tracing::debug;

type Slot = Arc<OnceCell<Arc<YearDataset>>>;

/// Loads each served year at most once and shares the result.
///
/// Requested years are resolved against the inner store's years first, so
/// every request that lands on the same dataset shares one slot. Concurrent
/// callers wait on a single load. A failed load is not cached, so the next
/// caller retries it.
pub struct CachedStore<S> {
    inner: S,
    slots: Mutex<HashMap<i32, Slot>>,
}

impl<S: DatasetStore> CachedStore<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            slots: Mutex::new(HashMap::new()),
        }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    fn slot(&self, year: i32) -> Slot {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        slots.entry(year).or_default().clone()
    }
}

#[async_trait::async_trait]
impl<S: DatasetStore> DatasetStore for CachedStore<S> {
    async fn available_years(&self) -> Result<Vec<i32>> {
        self.inner.available_years().await
    }

    async fn load(&self, year: i32) -> Result<Arc<YearDataset>> {
        let resolved = resolve_year(year, self.inner.available_years().await?)?.year;
        let slot = self.slot(resolved);
        if let Some(dataset) = slot.get() {
            debug!(requested_year = year, year = resolved, "Dataset served from cache");
            return Ok(dataset.clone());
        }
        let dataset = slot.get_or_try_init(|| self.inner.load(resolved)).await?;
        Ok(dataset.clone())
    }

    async fn area_code_at(
        &self,
        year: i32,
        longitude: f64,
        latitude: f64,
    ) -> Result<Option<String>> {
        self.inner.area_code_at(year, longitude, latitude).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryStore;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct CountingStore {
        inner: InMemoryStore,
        loads: AtomicUsize,
    }

    #[async_trait::async_trait]
    impl DatasetStore for CountingStore {
        async fn available_years(&self) -> Result<Vec<i32>> {
            self.inner.available_years().await
        }

        async fn load(&self, year: i32) -> Result<Arc<YearDataset>> {
            self.loads.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(20)).await;
            self.inner.load(year).await
        }

        async fn area_code_at(&self, year: i32, lon: f64, lat: f64) -> Result<Option<String>> {
            self.inner.area_code_at(year, lon, lat).await
        }
    }

    /// Fails its first load, then behaves like `inner`.
    struct FailingOnceStore {
        inner: InMemoryStore,
        loads: AtomicUsize,
    }

    #[async_trait::async_trait]
    impl DatasetStore for FailingOnceStore {
        async fn available_years(&self) -> Result<Vec<i32>> {
            self.inner.available_years().await
        }

        async fn load(&self, year: i32) -> Result<Arc<YearDataset>> {
            if self.loads.fetch_add(1, Ordering::SeqCst) == 0 {
                return Err(crate::error::Error::YearNotLoaded { year });
            }
            self.inner.load(year).await
        }

        async fn area_code_at(&self, year: i32, lon: f64, lat: f64) -> Result<Option<String>> {
            self.inner.area_code_at(year, lon, lat).await
        }
    }

    fn counting(inner: InMemoryStore) -> CachedStore<CountingStore> {
        CachedStore::new(CountingStore {
            inner,
            loads: AtomicUsize::new(0),
        })
    }

    #[tokio::test]
    async fn test_concurrent_loads_share_one_fetch() {
        let store = Arc::new(counting(
            InMemoryStore::new().with_dataset(YearDataset::new(2022, vec![], vec![])),
        ));

        let mut tasks = vec![];
        for _ in 0..8 {
            let store = store.clone();
            tasks.push(tokio::spawn(async move { store.load(2022).await }));
        }
        for task in tasks {
            assert_eq!(task.await.unwrap().unwrap().metadata.year, 2022);
        }

        assert_eq!(store.inner().loads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_years_resolving_to_one_dataset_share_a_slot() {
        let store = counting(
            InMemoryStore::new().with_dataset(YearDataset::new(2022, vec![], vec![])),
        );

        for year in 2023..2033 {
            assert_eq!(store.load(year).await.unwrap().metadata.year, 2022);
        }

        assert_eq!(store.inner().loads.load(Ordering::SeqCst), 1);
        assert_eq!(store.slots.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_failed_load_is_retried() {
        let store = CachedStore::new(FailingOnceStore {
            inner: InMemoryStore::new().with_dataset(YearDataset::new(2022, vec![], vec![])),
            loads: AtomicUsize::new(0),
        });

        assert!(store.load(2022).await.is_err());
        assert_eq!(store.load(2022).await.unwrap().metadata.year, 2022);
        assert_eq!(store.inner().loads.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_empty_store_fails_before_loading() {
        let store = counting(InMemoryStore::new());

        assert!(matches!(
            store.load(2022).await.unwrap_err(),
            crate::error::Error::NoYearsAvailable
        ));
        assert_eq!(store.inner().loads.load(Ordering::SeqCst), 0);
    }
}
