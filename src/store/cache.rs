//! Coalescing read cache for translation repositories.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{
    Mutex,
    OnceCell,
};

use super::repository::{
    RepositoryError,
    TranslationRepository,
};
use crate::types::{
    TranslationEntry,
    TranslationFilter,
    TranslationKey,
};

/// Caches reads in front of a slower repository.
///
/// Concurrent misses for the same key share a single backing read; the
/// losers wait on the winner's cell instead of stampeding the store. A save
/// drops the key's cell so the next read observes the new value.
///
/// Administrative queries are passed through uncached.
pub struct CachedRepository {
    /// The repository reads are coalesced in front of.
    inner: Arc<dyn TranslationRepository>,

    /// One fill-once cell per requested key.
    cells: Mutex<HashMap<TranslationKey, Arc<OnceCell<Option<TranslationEntry>>>>>,
}

impl CachedRepository {
    /// Wrap a repository.
    #[must_use]
    pub fn new(inner: Arc<dyn TranslationRepository>) -> Self {
        Self { inner, cells: Mutex::new(HashMap::new()) }
    }

    /// Drop every cached read.
    pub async fn clear(&self) {
        let mut cells = self.cells.lock().await;
        cells.clear();
    }

    /// The cell for a key, created on first request.
    async fn cell_for(&self, key: &TranslationKey) -> Arc<OnceCell<Option<TranslationEntry>>> {
        let mut cells = self.cells.lock().await;
        cells.entry(key.clone()).or_insert_with(|| Arc::new(OnceCell::new())).clone()
    }
}

impl std::fmt::Debug for CachedRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CachedRepository").finish_non_exhaustive()
    }
}

#[async_trait]
impl TranslationRepository for CachedRepository {
    async fn get(
        &self,
        key: &TranslationKey,
    ) -> Result<Option<TranslationEntry>, RepositoryError> {
        let cell = self.cell_for(key).await;
        let value = cell.get_or_try_init(|| self.inner.get(key)).await?;
        Ok(value.clone())
    }

    async fn save(&self, entry: &TranslationEntry) -> Result<(), RepositoryError> {
        self.inner.save(entry).await?;

        let mut cells = self.cells.lock().await;
        cells.remove(&entry.key);
        Ok(())
    }

    async fn query(
        &self,
        filter: &TranslationFilter,
    ) -> Result<Vec<TranslationEntry>, RepositoryError> {
        self.inner.query(filter).await
    }
}
