//! In-memory translation repository.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::repository::{
    RepositoryError,
    TranslationRepository,
};
use crate::types::{
    TranslationEntry,
    TranslationFilter,
    TranslationKey,
};

/// Repository holding entries in process memory.
///
/// Accepts writes; intended for tests, prototypes and as the write-through
/// target in front of read-only stores.
#[derive(Debug, Default)]
pub struct MemoryRepository {
    /// Entries keyed by their composite translation key.
    entries: RwLock<HashMap<TranslationKey, TranslationEntry>>,
}

impl MemoryRepository {
    /// Create an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a repository pre-filled with entries.
    #[must_use]
    pub fn with_entries(entries: impl IntoIterator<Item = TranslationEntry>) -> Self {
        let map = entries.into_iter().map(|entry| (entry.key.clone(), entry)).collect();
        Self { entries: RwLock::new(map) }
    }
}

#[async_trait]
impl TranslationRepository for MemoryRepository {
    async fn get(
        &self,
        key: &TranslationKey,
    ) -> Result<Option<TranslationEntry>, RepositoryError> {
        let entries = self.entries.read().await;
        Ok(entries.get(key).cloned())
    }

    async fn save(&self, entry: &TranslationEntry) -> Result<(), RepositoryError> {
        let mut entries = self.entries.write().await;
        entries.insert(entry.key.clone(), entry.clone());
        Ok(())
    }

    async fn query(
        &self,
        filter: &TranslationFilter,
    ) -> Result<Vec<TranslationEntry>, RepositoryError> {
        let compiled = filter.compile()?;
        let entries = self.entries.read().await;
        let mut matched: Vec<_> =
            entries.values().filter(|entry| compiled.matches(entry)).cloned().collect();
        matched.sort_by(|a, b| a.key.text_key.cmp(&b.key.text_key));
        Ok(matched)
    }
}
